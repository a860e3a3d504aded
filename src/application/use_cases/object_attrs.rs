use bytes::Bytes;
use std::sync::Arc;

use crate::application::errors::GatewayError;
use crate::application::ports::ObjectStore;
use crate::application::scoped_pool::ScopedPool;
use crate::application::use_cases::BucketRegistry;

/// Use case: read and write single extended attributes.
///
/// An empty key addresses the bucket itself: the attribute lives on the
/// bucket's placeholder in the root pool.
pub struct ObjectAttrsUseCase {
    store: Arc<dyn ObjectStore>,
    registry: Arc<BucketRegistry>,
}

impl ObjectAttrsUseCase {
    pub fn new(store: Arc<dyn ObjectStore>, registry: Arc<BucketRegistry>) -> Self {
        Self { store, registry }
    }

    pub async fn get_attr(
        &self,
        bucket: &str,
        key: &str,
        name: &str,
    ) -> Result<Bytes, GatewayError> {
        if key.is_empty() {
            return self.registry.get_attr(bucket, name).await;
        }

        let pool = ScopedPool::open(&self.store, bucket)
            .await
            .map_err(|e| GatewayError::from_pool(bucket, e))?;
        self.store
            .get_xattr(&pool, key, name)
            .await
            .map_err(|e| GatewayError::from_object(bucket, key, e))
    }

    pub async fn set_attr(
        &self,
        bucket: &str,
        key: &str,
        name: &str,
        value: Bytes,
    ) -> Result<(), GatewayError> {
        if key.is_empty() {
            return self.registry.set_attr(bucket, name, value).await;
        }

        let pool = ScopedPool::open(&self.store, bucket)
            .await
            .map_err(|e| GatewayError::from_pool(bucket, e))?;
        self.store
            .set_xattr(&pool, key, name, value)
            .await
            .map_err(|e| GatewayError::from_object(bucket, key, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{MockObjectStore, ObjectStat, PoolHandle, StoreError};
    use chrono::Utc;

    const ROOT: &str = ".rgw";

    fn store() -> MockObjectStore {
        let mut mock_store = MockObjectStore::new();
        mock_store
            .expect_open_pool()
            .returning(|name| Ok(PoolHandle::new(if name == ROOT { 1 } else { 2 }, name)));
        mock_store.expect_close_pool().return_const(());
        mock_store
    }

    async fn use_case(mock_store: MockObjectStore) -> ObjectAttrsUseCase {
        let store: Arc<dyn ObjectStore> = Arc::new(mock_store);
        let registry = BucketRegistry::open(Arc::clone(&store), ROOT).await.unwrap();
        ObjectAttrsUseCase::new(store, Arc::new(registry))
    }

    #[tokio::test]
    async fn test_get_object_attr() {
        let mut mock_store = store();
        mock_store
            .expect_get_xattr()
            .withf(|pool, key, name| pool.name() == "b1" && key == "k1" && name == "user.color")
            .times(1)
            .returning(|_, _, _| Ok(Bytes::from_static(b"blue")));

        let value = use_case(mock_store)
            .await
            .get_attr("b1", "k1", "user.color")
            .await
            .unwrap();
        assert_eq!(value, Bytes::from_static(b"blue"));
    }

    #[tokio::test]
    async fn test_empty_key_reads_bucket_placeholder() {
        let mut mock_store = store();
        mock_store
            .expect_get_xattr()
            .withf(|pool, key, name| pool.name() == ROOT && key == "b1" && name == "acl")
            .times(1)
            .returning(|_, _, _| Ok(Bytes::from_static(b"private")));

        let value = use_case(mock_store)
            .await
            .get_attr("b1", "", "acl")
            .await
            .unwrap();
        assert_eq!(value, Bytes::from_static(b"private"));
    }

    #[tokio::test]
    async fn test_empty_key_writes_bucket_placeholder() {
        let mut mock_store = store();
        mock_store.expect_stat().returning(|_, _| {
            Ok(ObjectStat {
                size: 0,
                mtime: Utc::now(),
            })
        });
        mock_store
            .expect_set_xattr()
            .withf(|pool, key, name, _| pool.name() == ROOT && key == "b1" && name == "acl")
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let result = use_case(mock_store)
            .await
            .set_attr("b1", "", "acl", Bytes::from_static(b"public"))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_bucket_attr_on_unregistered_bucket() {
        let mut mock_store = store();
        mock_store
            .expect_stat()
            .returning(|_, key| Err(StoreError::NotFound(key.to_string())));
        mock_store.expect_set_xattr().times(0);

        let result = use_case(mock_store)
            .await
            .set_attr("ghost", "", "acl", Bytes::from_static(b"public"))
            .await;
        assert!(matches!(result, Err(GatewayError::NoSuchBucket(_))));
    }

    #[tokio::test]
    async fn test_missing_attribute() {
        let mut mock_store = store();
        mock_store
            .expect_get_xattr()
            .returning(|_, _, name| Err(StoreError::NoSuchAttribute(name.to_string())));

        let result = use_case(mock_store)
            .await
            .get_attr("b1", "k1", "user.none")
            .await;
        assert!(matches!(result, Err(GatewayError::NoSuchAttribute(_))));
    }
}
