use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::application::errors::GatewayError;
use crate::application::ports::{ObjectStore, PoolHandle, StoreError};
use crate::application::scoped_pool::ScopedPool;
use crate::domain::errors::DomainError;
use crate::domain::value_objects::{AttrMap, BucketName};

/// Maps bucket names onto pools.
///
/// Every bucket has a placeholder object in the root pool. Exclusive creation
/// of that placeholder is the single arbitration point for concurrent
/// `create_bucket` calls, and its extended attributes are the bucket's
/// attributes.
pub struct BucketRegistry {
    store: Arc<dyn ObjectStore>,
    root: ScopedPool,
}

impl BucketRegistry {
    /// Open the root pool, creating it first if it does not exist yet
    pub async fn open(
        store: Arc<dyn ObjectStore>,
        root_pool: &str,
    ) -> Result<Self, GatewayError> {
        let root = Self::open_root_pool(&store, root_pool).await?;
        info!(root_pool, "Root pool open");
        Ok(Self { store, root })
    }

    async fn open_root_pool(
        store: &Arc<dyn ObjectStore>,
        name: &str,
    ) -> Result<ScopedPool, StoreError> {
        match ScopedPool::open(store, name).await {
            Ok(pool) => return Ok(pool),
            Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        debug!(root_pool = name, "Root pool missing, creating it");
        match store.create_pool(name, None).await {
            // Another gateway process may have won the race
            Ok(()) | Err(StoreError::AlreadyExists(_)) => {}
            Err(e) => return Err(e),
        }

        ScopedPool::open(store, name).await
    }

    pub fn root_pool(&self) -> &PoolHandle {
        self.root.handle()
    }

    /// Validate a bucket name, which must also not shadow the root pool
    pub fn validate(&self, name: &str) -> Result<BucketName, GatewayError> {
        let bucket = BucketName::new(name)?;
        if bucket.as_str() == self.root.name() {
            return Err(DomainError::InvalidBucketName(format!(
                "{} is reserved",
                bucket
            ))
            .into());
        }
        Ok(bucket)
    }

    /// Register a bucket and create its pool.
    ///
    /// Fails with `BucketAlreadyExists` if the placeholder already exists. If
    /// an attribute write or the pool creation fails, the placeholder is
    /// removed again before the error is returned.
    pub async fn create_bucket(
        &self,
        name: &str,
        attrs: &AttrMap,
        owner: Option<u64>,
    ) -> Result<(), GatewayError> {
        let bucket = self.validate(name)?;

        match self.store.create(&self.root, bucket.as_str(), true).await {
            Ok(()) => {}
            Err(StoreError::AlreadyExists(_)) => {
                return Err(GatewayError::BucketAlreadyExists(bucket.to_string()))
            }
            Err(e) => return Err(e.into()),
        }

        for (attr, value) in attrs.iter().filter(|(_, v)| !v.is_empty()) {
            if let Err(e) = self
                .store
                .set_xattr(&self.root, bucket.as_str(), attr, value.clone())
                .await
            {
                warn!(%bucket, attr = %attr, error = %e, "Bucket attribute write failed, rolling back");
                self.remove_placeholder(&bucket).await;
                return Err(e.into());
            }
        }

        if let Err(e) = self.store.create_pool(bucket.as_str(), owner).await {
            warn!(%bucket, error = %e, "Pool creation failed, rolling back");
            self.remove_placeholder(&bucket).await;
            return Err(match e {
                StoreError::AlreadyExists(_) => GatewayError::BucketAlreadyExists(bucket.to_string()),
                other => other.into(),
            });
        }

        info!(%bucket, ?owner, "Bucket created");
        Ok(())
    }

    /// Best-effort removal of a bucket placeholder during rollback
    async fn remove_placeholder(&self, bucket: &BucketName) {
        if let Err(e) = self.store.remove(&self.root, bucket.as_str()).await {
            warn!(%bucket, error = %e, "Failed to remove bucket placeholder");
        }
    }

    /// Delete a bucket's pool (and every object in it), then its placeholder
    pub async fn delete_bucket(&self, name: &str) -> Result<(), GatewayError> {
        let bucket = self.validate(name)?;

        let pool = ScopedPool::open(&self.store, bucket.as_str())
            .await
            .map_err(|e| GatewayError::from_pool(name, e))?;
        self.store
            .delete_pool(&pool)
            .await
            .map_err(|e| GatewayError::from_pool(name, e))?;
        drop(pool);

        match self.store.remove(&self.root, bucket.as_str()).await {
            Ok(()) => {}
            Err(StoreError::NotFound(_)) => {
                debug!(%bucket, "Bucket had no placeholder");
            }
            Err(e) => return Err(e.into()),
        }

        info!(%bucket, "Bucket deleted");
        Ok(())
    }

    /// All attributes of a bucket
    pub async fn bucket_attrs(&self, name: &str) -> Result<AttrMap, GatewayError> {
        let bucket = self.validate(name)?;
        self.store
            .get_xattrs(&self.root, bucket.as_str())
            .await
            .map_err(|e| GatewayError::from_pool(name, e))
    }

    pub async fn get_attr(&self, name: &str, attr: &str) -> Result<Bytes, GatewayError> {
        let bucket = self.validate(name)?;
        self.store
            .get_xattr(&self.root, bucket.as_str(), attr)
            .await
            .map_err(|e| GatewayError::from_pool(name, e))
    }

    /// Set one bucket attribute. The bucket must already be registered.
    pub async fn set_attr(
        &self,
        name: &str,
        attr: &str,
        value: Bytes,
    ) -> Result<(), GatewayError> {
        let bucket = self.validate(name)?;
        self.store
            .stat(&self.root, bucket.as_str())
            .await
            .map_err(|e| GatewayError::from_pool(name, e))?;
        self.store
            .set_xattr(&self.root, bucket.as_str(), attr, value)
            .await
            .map_err(|e| GatewayError::from_pool(name, e))
    }
}
