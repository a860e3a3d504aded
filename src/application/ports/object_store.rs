use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::{automock, predicate::*};
use thiserror::Error;

use crate::domain::value_objects::AttrMap;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No such attribute: {0}")]
    NoSuchAttribute(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Handle to an open pool. Obtained from [`ObjectStore::open_pool`] and
/// released with [`ObjectStore::close_pool`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    id: u64,
    name: String,
}

impl PoolHandle {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Size and modification time of a stored object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectStat {
    pub size: u64,
    pub mtime: DateTime<Utc>,
}

/// Continuation state of a paginated object enumeration.
///
/// The default value starts a fresh enumeration. Adapters that page from a
/// scan may tag the cursor with an opaque snapshot id to resume from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListCursor {
    after: Option<String>,
    snapshot: Option<u64>,
}

impl ListCursor {
    pub fn after(name: impl Into<String>) -> Self {
        Self {
            after: Some(name.into()),
            snapshot: None,
        }
    }

    pub fn with_snapshot(mut self, id: u64) -> Self {
        self.snapshot = Some(id);
        self
    }

    /// Last name handed out, if any
    pub fn position(&self) -> Option<&str> {
        self.after.as_deref()
    }

    pub fn snapshot(&self) -> Option<u64> {
        self.snapshot
    }
}

/// One batch of an object enumeration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub names: Vec<String>,
    pub cursor: ListCursor,
    pub more: bool,
}

/// Port for the backing object store: flat pools of named objects with
/// extended attributes.
///
/// Single-key calls are atomic; nothing spans calls. `create` with
/// `exclusive = true` must be linearizable per key, the bucket registry
/// depends on it for arbitration.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Open an existing pool
    async fn open_pool(&self, name: &str) -> Result<PoolHandle, StoreError>;

    /// Release a handle returned by `open_pool`
    fn close_pool(&self, pool: &PoolHandle);

    /// Create a pool, failing with `AlreadyExists` if it is present
    async fn create_pool(&self, name: &str, owner: Option<u64>) -> Result<(), StoreError>;

    /// Delete a pool together with every object in it
    async fn delete_pool(&self, pool: &PoolHandle) -> Result<(), StoreError>;

    /// Names of all pools
    async fn list_pools(&self) -> Result<Vec<String>, StoreError>;

    /// Create an empty object. With `exclusive`, an existing object is an error.
    async fn create(&self, pool: &PoolHandle, key: &str, exclusive: bool)
        -> Result<(), StoreError>;

    /// Write `data` at `offset`, extending the object as needed
    async fn write(
        &self,
        pool: &PoolHandle,
        key: &str,
        offset: u64,
        data: Bytes,
    ) -> Result<usize, StoreError>;

    /// Replace the whole object body with `data`
    async fn write_full(&self, pool: &PoolHandle, key: &str, data: Bytes)
        -> Result<(), StoreError>;

    /// Read `len` bytes at `offset`; `len == 0` reads to the end of the object
    async fn read(
        &self,
        pool: &PoolHandle,
        key: &str,
        offset: u64,
        len: u64,
    ) -> Result<Bytes, StoreError>;

    async fn stat(&self, pool: &PoolHandle, key: &str) -> Result<ObjectStat, StoreError>;

    async fn get_xattr(&self, pool: &PoolHandle, key: &str, name: &str)
        -> Result<Bytes, StoreError>;

    /// Set one attribute. Creates the object if it does not exist.
    async fn set_xattr(
        &self,
        pool: &PoolHandle,
        key: &str,
        name: &str,
        value: Bytes,
    ) -> Result<(), StoreError>;

    async fn get_xattrs(&self, pool: &PoolHandle, key: &str) -> Result<AttrMap, StoreError>;

    /// Next batch of at most `max` object names after `cursor`
    async fn list_objects(
        &self,
        pool: &PoolHandle,
        max: usize,
        cursor: ListCursor,
    ) -> Result<ListPage, StoreError>;

    async fn remove(&self, pool: &PoolHandle, key: &str) -> Result<(), StoreError>;
}
