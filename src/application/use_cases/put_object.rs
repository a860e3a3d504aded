use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

use crate::application::errors::GatewayError;
use crate::application::ports::ObjectStore;
use crate::application::scoped_pool::ScopedPool;
use crate::domain::value_objects::{AttrMap, ObjectKey};

#[derive(Debug, Clone)]
pub struct PutObjectRequest {
    pub bucket: String,
    pub key: String,
    pub data: Bytes,
    pub attrs: AttrMap,
    /// Re-stat after the write and report the new modification time
    pub want_mtime: bool,
}

/// Use case: write or overwrite an object.
///
/// Attributes are written before the body and are not rolled back if the
/// body write fails; a reader may observe new attributes with old data.
pub struct PutObjectUseCase {
    store: Arc<dyn ObjectStore>,
}

impl PutObjectUseCase {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        request: PutObjectRequest,
    ) -> Result<Option<DateTime<Utc>>, GatewayError> {
        let key = ObjectKey::new(request.key)?;
        let bucket = request.bucket.as_str();

        // 1. Open pool
        let pool = ScopedPool::open(&self.store, bucket)
            .await
            .map_err(|e| GatewayError::from_pool(bucket, e))?;

        // 2. Attributes first, skipping empty values
        for (name, value) in request.attrs.into_iter().filter(|(_, v)| !v.is_empty()) {
            self.store
                .set_xattr(&pool, key.as_str(), &name, value)
                .await
                .map_err(|e| GatewayError::from_object(bucket, key.as_str(), e))?;
        }

        // 3. Body
        let size = request.data.len();
        self.store
            .write_full(&pool, key.as_str(), request.data)
            .await
            .map_err(|e| GatewayError::from_object(bucket, key.as_str(), e))?;
        debug!(bucket, key = %key, size, "Object written");

        // 4. Optional mtime
        if !request.want_mtime {
            return Ok(None);
        }
        let stat = self
            .store
            .stat(&pool, key.as_str())
            .await
            .map_err(|e| GatewayError::from_object(bucket, key.as_str(), e))?;
        Ok(Some(stat.mtime))
    }
}
