use std::sync::Arc;
use tracing::info;

use crate::api::Gateway;
use crate::application::errors::GatewayError;
use crate::application::ports::ObjectStore;
use crate::config::{Config, StoreBackend};
use crate::infrastructure::storage::{InMemoryObjectStore, LocalFilesystemStore};

/// Gateway builder for dependency injection and setup
pub struct GatewayBuilder {
    config: Config,
    store: Option<Arc<dyn ObjectStore>>,
}

impl GatewayBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            store: None,
        }
    }

    /// Use an already constructed store instead of the configured backend
    pub fn with_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Initialize the store selected by `store_backend`
    pub async fn with_configured_store(mut self) -> Result<Self, GatewayError> {
        let store: Arc<dyn ObjectStore> = match self.config.store_backend {
            StoreBackend::Memory => Arc::new(InMemoryObjectStore::new()),
            StoreBackend::Filesystem => {
                let store = LocalFilesystemStore::with_durability(
                    self.config.data_root.clone(),
                    self.config.durable_writes,
                );
                store.init().await?;
                Arc::new(store)
            }
        };

        info!(backend = ?self.config.store_backend, "Store initialized");
        self.store = Some(store);
        Ok(self)
    }

    pub async fn build(self) -> Result<Gateway, GatewayError> {
        let store = self
            .store
            .ok_or_else(|| GatewayError::InvalidArgument("store not initialized".to_string()))?;
        Gateway::initialize(&self.config, store).await
    }

    /// Get configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::AttrMap;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_build_without_store() {
        let result = GatewayBuilder::new(Config::default()).build().await;
        assert!(matches!(result, Err(GatewayError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_build_memory_backend() {
        let config = Config {
            store_backend: StoreBackend::Memory,
            ..Config::default()
        };
        let gateway = GatewayBuilder::new(config)
            .with_configured_store()
            .await
            .unwrap()
            .build()
            .await
            .unwrap();

        gateway.create_bucket("b1", &AttrMap::new(), None).await.unwrap();
        assert_eq!(gateway.list_buckets().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_build_filesystem_backend() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            data_root: dir.path().to_path_buf(),
            durable_writes: false,
            ..Config::default()
        };
        let builder = GatewayBuilder::new(config).with_configured_store().await.unwrap();
        assert_eq!(builder.config().data_root, dir.path());

        let gateway = builder.build().await.unwrap();
        gateway.create_bucket("b1", &AttrMap::new(), None).await.unwrap();
        assert!(dir.path().join("pools").exists());
    }
}
