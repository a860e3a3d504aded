//! Shared test fixtures and utilities for all test types
//!
//! This module provides common test setup patterns to reduce duplication
//! and make tests more maintainable.
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tempfile::TempDir;

use pool_gateway::application::ports::{
    ListCursor, ListPage, ObjectStat, ObjectStore, PoolHandle, StoreError,
};
use pool_gateway::use_cases::PutObjectRequest;
use pool_gateway::value_objects::AttrMap;
use pool_gateway::{Config, Gateway, InMemoryObjectStore, LocalFilesystemStore};

pub const ROOT_POOL: &str = ".rgw";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Filesystem,
}

impl Backend {
    pub fn all() -> [Backend; 2] {
        [Backend::Memory, Backend::Filesystem]
    }
}

/// Test environment container with a gateway over a fresh store
pub struct TestEnvironment {
    pub gateway: Gateway,
    pub backend: Backend,
    memory: Option<Arc<InMemoryObjectStore>>,
    filesystem: Option<Arc<LocalFilesystemStore>>,
    pub data_dir: Option<TempDir>,
}

impl TestEnvironment {
    pub async fn new(backend: Backend) -> Self {
        match backend {
            Backend::Memory => Self::memory().await,
            Backend::Filesystem => Self::filesystem().await,
        }
    }

    pub async fn memory() -> Self {
        let store = Arc::new(InMemoryObjectStore::new());
        let gateway = Gateway::initialize(&test_config(), store.clone())
            .await
            .expect("Failed to initialize gateway");
        Self {
            gateway,
            backend: Backend::Memory,
            memory: Some(store),
            filesystem: None,
            data_dir: None,
        }
    }

    pub async fn filesystem() -> Self {
        let data_dir = TempDir::new().expect("Failed to create temp dir");
        let store = Arc::new(LocalFilesystemStore::with_durability(
            data_dir.path().to_path_buf(),
            false,
        ));
        store.init().await.expect("Failed to init storage");
        let gateway = Gateway::initialize(&test_config(), store.clone())
            .await
            .expect("Failed to initialize gateway");
        Self {
            gateway,
            backend: Backend::Filesystem,
            memory: None,
            filesystem: Some(store),
            data_dir: Some(data_dir),
        }
    }

    /// Pool handles currently open, the registry's root pool included
    pub fn open_handles(&self) -> usize {
        match (&self.memory, &self.filesystem) {
            (Some(store), _) => store.open_handles(),
            (_, Some(store)) => store.open_handles(),
            _ => 0,
        }
    }
}

pub fn test_config() -> Config {
    Config {
        root_pool: ROOT_POOL.to_string(),
        list_batch_size: 2,
        durable_writes: false,
        ..Config::default()
    }
}

pub fn attrs(pairs: &[(&str, &str)]) -> AttrMap {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), Bytes::copy_from_slice(value.as_bytes())))
        .collect()
}

pub fn put_request(bucket: &str, key: &str, data: &[u8], attrs: AttrMap) -> PutObjectRequest {
    PutObjectRequest {
        bucket: bucket.to_string(),
        key: key.to_string(),
        data: Bytes::copy_from_slice(data),
        attrs,
        want_mtime: true,
    }
}

/// Put every key with its own name as the body
pub async fn populate(gateway: &Gateway, bucket: &str, keys: &[&str]) {
    for key in keys {
        gateway
            .put_object(put_request(bucket, key, key.as_bytes(), AttrMap::new()))
            .await
            .expect("Failed to put object");
    }
}

/// In-memory store whose attribute writes fail for one attribute name
pub struct FailingAttrStore {
    pub inner: InMemoryObjectStore,
    failing_attr: String,
}

impl FailingAttrStore {
    pub fn new(failing_attr: &str) -> Self {
        Self {
            inner: InMemoryObjectStore::new(),
            failing_attr: failing_attr.to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for FailingAttrStore {
    async fn open_pool(&self, name: &str) -> Result<PoolHandle, StoreError> {
        self.inner.open_pool(name).await
    }

    fn close_pool(&self, pool: &PoolHandle) {
        self.inner.close_pool(pool)
    }

    async fn create_pool(&self, name: &str, owner: Option<u64>) -> Result<(), StoreError> {
        self.inner.create_pool(name, owner).await
    }

    async fn delete_pool(&self, pool: &PoolHandle) -> Result<(), StoreError> {
        self.inner.delete_pool(pool).await
    }

    async fn list_pools(&self) -> Result<Vec<String>, StoreError> {
        self.inner.list_pools().await
    }

    async fn create(&self, pool: &PoolHandle, key: &str, exclusive: bool) -> Result<(), StoreError> {
        self.inner.create(pool, key, exclusive).await
    }

    async fn write(
        &self,
        pool: &PoolHandle,
        key: &str,
        offset: u64,
        data: Bytes,
    ) -> Result<usize, StoreError> {
        self.inner.write(pool, key, offset, data).await
    }

    async fn write_full(&self, pool: &PoolHandle, key: &str, data: Bytes) -> Result<(), StoreError> {
        self.inner.write_full(pool, key, data).await
    }

    async fn read(
        &self,
        pool: &PoolHandle,
        key: &str,
        offset: u64,
        len: u64,
    ) -> Result<Bytes, StoreError> {
        self.inner.read(pool, key, offset, len).await
    }

    async fn stat(&self, pool: &PoolHandle, key: &str) -> Result<ObjectStat, StoreError> {
        self.inner.stat(pool, key).await
    }

    async fn get_xattr(&self, pool: &PoolHandle, key: &str, name: &str) -> Result<Bytes, StoreError> {
        self.inner.get_xattr(pool, key, name).await
    }

    async fn set_xattr(
        &self,
        pool: &PoolHandle,
        key: &str,
        name: &str,
        value: Bytes,
    ) -> Result<(), StoreError> {
        if name == self.failing_attr {
            return Err(StoreError::ResourceExhausted(format!("refusing {}", name)));
        }
        self.inner.set_xattr(pool, key, name, value).await
    }

    async fn get_xattrs(&self, pool: &PoolHandle, key: &str) -> Result<AttrMap, StoreError> {
        self.inner.get_xattrs(pool, key).await
    }

    async fn list_objects(
        &self,
        pool: &PoolHandle,
        max: usize,
        cursor: ListCursor,
    ) -> Result<ListPage, StoreError> {
        self.inner.list_objects(pool, max, cursor).await
    }

    async fn remove(&self, pool: &PoolHandle, key: &str) -> Result<(), StoreError> {
        self.inner.remove(pool, key).await
    }
}

/// Common assertions
pub mod assertions {
    use pool_gateway::GatewayError;

    pub fn assert_code<T: std::fmt::Debug>(result: Result<T, GatewayError>, status: u16, code: &str) {
        match result {
            Err(err) => {
                let descriptor = err.descriptor();
                assert_eq!(
                    (descriptor.status, descriptor.code),
                    (status, code),
                    "unexpected error: {}",
                    err
                );
            }
            Ok(value) => panic!("expected {} {}, got Ok({:?})", status, code, value),
        }
    }
}
