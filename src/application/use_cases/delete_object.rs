use std::sync::Arc;
use tracing::debug;

use crate::application::errors::GatewayError;
use crate::application::ports::ObjectStore;
use crate::application::scoped_pool::ScopedPool;

/// Use case: delete an object
pub struct DeleteObjectUseCase {
    store: Arc<dyn ObjectStore>,
}

impl DeleteObjectUseCase {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// A missing bucket and a missing key fail differently
    /// (`NoSuchBucket` vs `NoSuchKey`).
    pub async fn execute(&self, bucket: &str, key: &str) -> Result<(), GatewayError> {
        let pool = ScopedPool::open(&self.store, bucket)
            .await
            .map_err(|e| GatewayError::from_pool(bucket, e))?;

        self.store
            .remove(&pool, key)
            .await
            .map_err(|e| GatewayError::from_object(bucket, key, e))?;

        debug!(bucket, key, "Object deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{MockObjectStore, PoolHandle, StoreError};

    #[tokio::test]
    async fn test_delete_object_happy_path() {
        let mut mock_store = MockObjectStore::new();
        mock_store
            .expect_open_pool()
            .withf(|name| name == "b1")
            .returning(|name| Ok(PoolHandle::new(6, name)));
        mock_store.expect_close_pool().times(1).return_const(());
        mock_store
            .expect_remove()
            .withf(|pool, key| pool.id() == 6 && key == "k1")
            .times(1)
            .returning(|_, _| Ok(()));

        let use_case = DeleteObjectUseCase::new(Arc::new(mock_store));
        assert!(use_case.execute("b1", "k1").await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_object_not_found() {
        let mut mock_store = MockObjectStore::new();
        mock_store
            .expect_open_pool()
            .returning(|name| Ok(PoolHandle::new(6, name)));
        mock_store.expect_close_pool().times(1).return_const(());
        mock_store
            .expect_remove()
            .returning(|_, key| Err(StoreError::NotFound(key.to_string())));

        let use_case = DeleteObjectUseCase::new(Arc::new(mock_store));
        let result = use_case.execute("b1", "k1").await;

        assert!(matches!(result, Err(GatewayError::NoSuchKey { .. })));
    }

    #[tokio::test]
    async fn test_delete_object_bucket_not_found() {
        let mut mock_store = MockObjectStore::new();
        mock_store
            .expect_open_pool()
            .returning(|name| Err(StoreError::NotFound(name.to_string())));
        mock_store.expect_remove().times(0);

        let use_case = DeleteObjectUseCase::new(Arc::new(mock_store));
        let result = use_case.execute("b1", "k1").await;

        assert!(matches!(result, Err(GatewayError::NoSuchBucket(_))));
    }
}
