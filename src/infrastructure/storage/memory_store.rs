use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use crate::application::ports::{
    ListCursor, ListPage, ObjectStat, ObjectStore, PoolHandle, StoreError,
};
use crate::domain::value_objects::AttrMap;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    mtime: DateTime<Utc>,
    xattrs: AttrMap,
}

impl StoredObject {
    fn empty() -> Self {
        Self {
            data: Vec::new(),
            mtime: Utc::now(),
            xattrs: AttrMap::new(),
        }
    }
}

#[derive(Debug, Default)]
struct Pool {
    objects: BTreeMap<String, StoredObject>,
}

/// Process-local object store.
///
/// Pools live in memory for the lifetime of the store. Open pool handles are
/// tracked so callers can check that every handle they acquired was released.
#[derive(Default)]
pub struct InMemoryObjectStore {
    pools: RwLock<BTreeMap<String, Pool>>,
    handles: DashMap<u64, String>,
    next_handle: AtomicU64,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pool handles currently open
    pub fn open_handles(&self) -> usize {
        self.handles.len()
    }

    fn with_pool<T>(
        &self,
        pool: &PoolHandle,
        f: impl FnOnce(&Pool) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let pools = self.pools.read();
        let entry = pools
            .get(pool.name())
            .ok_or_else(|| StoreError::NotFound(pool.name().to_string()))?;
        f(entry)
    }

    fn with_pool_mut<T>(
        &self,
        pool: &PoolHandle,
        f: impl FnOnce(&mut Pool) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut pools = self.pools.write();
        let entry = pools
            .get_mut(pool.name())
            .ok_or_else(|| StoreError::NotFound(pool.name().to_string()))?;
        f(entry)
    }

    fn with_object<T>(
        &self,
        pool: &PoolHandle,
        key: &str,
        f: impl FnOnce(&StoredObject) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        self.with_pool(pool, |p| {
            let object = p
                .objects
                .get(key)
                .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
            f(object)
        })
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn open_pool(&self, name: &str) -> Result<PoolHandle, StoreError> {
        if !self.pools.read().contains_key(name) {
            return Err(StoreError::NotFound(name.to_string()));
        }
        let id = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.handles.insert(id, name.to_string());
        Ok(PoolHandle::new(id, name))
    }

    fn close_pool(&self, pool: &PoolHandle) {
        self.handles.remove(&pool.id());
    }

    async fn create_pool(&self, name: &str, owner: Option<u64>) -> Result<(), StoreError> {
        let mut pools = self.pools.write();
        if pools.contains_key(name) {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }
        pools.insert(
            name.to_string(),
            Pool {
                objects: BTreeMap::new(),
            },
        );
        debug!(pool = name, ?owner, "Pool created");
        Ok(())
    }

    async fn delete_pool(&self, pool: &PoolHandle) -> Result<(), StoreError> {
        self.pools
            .write()
            .remove(pool.name())
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(pool.name().to_string()))
    }

    async fn list_pools(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.pools.read().keys().cloned().collect())
    }

    async fn create(&self, pool: &PoolHandle, key: &str, exclusive: bool) -> Result<(), StoreError> {
        self.with_pool_mut(pool, |p| {
            if p.objects.contains_key(key) {
                if exclusive {
                    return Err(StoreError::AlreadyExists(key.to_string()));
                }
                return Ok(());
            }
            p.objects.insert(key.to_string(), StoredObject::empty());
            Ok(())
        })
    }

    async fn write(
        &self,
        pool: &PoolHandle,
        key: &str,
        offset: u64,
        data: Bytes,
    ) -> Result<usize, StoreError> {
        let end = usize::try_from(offset)
            .ok()
            .and_then(|start| start.checked_add(data.len()))
            .ok_or_else(|| {
                StoreError::ResourceExhausted(format!("offset {} + {} bytes", offset, data.len()))
            })?;
        let offset = end - data.len();
        self.with_pool_mut(pool, |p| {
            let object = p
                .objects
                .entry(key.to_string())
                .or_insert_with(StoredObject::empty);
            if object.data.len() < end {
                object.data.resize(end, 0);
            }
            object.data[offset..end].copy_from_slice(&data);
            object.mtime = Utc::now();
            Ok(data.len())
        })
    }

    async fn write_full(&self, pool: &PoolHandle, key: &str, data: Bytes) -> Result<(), StoreError> {
        self.with_pool_mut(pool, |p| {
            let object = p
                .objects
                .entry(key.to_string())
                .or_insert_with(StoredObject::empty);
            object.data = data.to_vec();
            object.mtime = Utc::now();
            Ok(())
        })
    }

    async fn read(
        &self,
        pool: &PoolHandle,
        key: &str,
        offset: u64,
        len: u64,
    ) -> Result<Bytes, StoreError> {
        self.with_object(pool, key, |object| {
            let size = object.data.len();
            let start = usize::try_from(offset).unwrap_or(usize::MAX).min(size);
            let end = if len == 0 {
                size
            } else {
                start
                    .saturating_add(usize::try_from(len).unwrap_or(usize::MAX))
                    .min(size)
            };
            Ok(Bytes::copy_from_slice(&object.data[start..end]))
        })
    }

    async fn stat(&self, pool: &PoolHandle, key: &str) -> Result<ObjectStat, StoreError> {
        self.with_object(pool, key, |object| {
            Ok(ObjectStat {
                size: object.data.len() as u64,
                mtime: object.mtime,
            })
        })
    }

    async fn get_xattr(&self, pool: &PoolHandle, key: &str, name: &str) -> Result<Bytes, StoreError> {
        self.with_object(pool, key, |object| {
            object
                .xattrs
                .get(name)
                .cloned()
                .ok_or_else(|| StoreError::NoSuchAttribute(name.to_string()))
        })
    }

    async fn set_xattr(
        &self,
        pool: &PoolHandle,
        key: &str,
        name: &str,
        value: Bytes,
    ) -> Result<(), StoreError> {
        self.with_pool_mut(pool, |p| {
            p.objects
                .entry(key.to_string())
                .or_insert_with(StoredObject::empty)
                .xattrs
                .insert(name.to_string(), value);
            Ok(())
        })
    }

    async fn get_xattrs(&self, pool: &PoolHandle, key: &str) -> Result<AttrMap, StoreError> {
        self.with_object(pool, key, |object| Ok(object.xattrs.clone()))
    }

    async fn list_objects(
        &self,
        pool: &PoolHandle,
        max: usize,
        cursor: ListCursor,
    ) -> Result<ListPage, StoreError> {
        self.with_pool(pool, |p| {
            let lower = match cursor.position() {
                Some(after) => Bound::Excluded(after),
                None => Bound::Unbounded,
            };
            let mut remaining = p
                .objects
                .range::<str, _>((lower, Bound::Unbounded))
                .map(|(name, _)| name);

            let names: Vec<String> = remaining.by_ref().take(max.max(1)).cloned().collect();
            let more = remaining.next().is_some();
            let cursor = match names.last() {
                Some(last) => ListCursor::after(last.as_str()),
                None => cursor,
            };
            Ok(ListPage {
                names,
                cursor,
                more,
            })
        })
    }

    async fn remove(&self, pool: &PoolHandle, key: &str) -> Result<(), StoreError> {
        self.with_pool_mut(pool, |p| {
            p.objects
                .remove(key)
                .map(|_| ())
                .ok_or_else(|| StoreError::NotFound(key.to_string()))
        })
    }
}
