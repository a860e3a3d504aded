use std::ops::Deref;
use std::sync::Arc;

use crate::application::ports::{ObjectStore, PoolHandle, StoreError};

/// Pool handle that is closed when dropped, so every exit path of an
/// operation (including `?` returns) releases it.
pub struct ScopedPool {
    store: Arc<dyn ObjectStore>,
    handle: PoolHandle,
}

impl ScopedPool {
    pub async fn open(store: &Arc<dyn ObjectStore>, name: &str) -> Result<Self, StoreError> {
        let handle = store.open_pool(name).await?;
        Ok(Self {
            store: Arc::clone(store),
            handle,
        })
    }

    pub fn handle(&self) -> &PoolHandle {
        &self.handle
    }
}

impl Deref for ScopedPool {
    type Target = PoolHandle;

    fn deref(&self) -> &PoolHandle {
        &self.handle
    }
}

impl Drop for ScopedPool {
    fn drop(&mut self) {
        self.store.close_pool(&self.handle);
    }
}

impl std::fmt::Debug for ScopedPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedPool")
            .field("handle", &self.handle)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::MockObjectStore;

    #[tokio::test]
    async fn test_handle_closed_on_drop() {
        let mut mock_store = MockObjectStore::new();
        mock_store
            .expect_open_pool()
            .times(1)
            .returning(|name| Ok(PoolHandle::new(7, name)));
        mock_store
            .expect_close_pool()
            .withf(|pool| pool.id() == 7)
            .times(1)
            .return_const(());

        let store: Arc<dyn ObjectStore> = Arc::new(mock_store);
        let pool = ScopedPool::open(&store, "photos").await.unwrap();
        assert_eq!(pool.name(), "photos");
        drop(pool);
    }

    #[tokio::test]
    async fn test_failed_open_closes_nothing() {
        let mut mock_store = MockObjectStore::new();
        mock_store
            .expect_open_pool()
            .times(1)
            .returning(|name| Err(StoreError::NotFound(name.to_string())));
        mock_store.expect_close_pool().times(0);

        let store: Arc<dyn ObjectStore> = Arc::new(mock_store);
        let result = ScopedPool::open(&store, "missing").await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }
}
