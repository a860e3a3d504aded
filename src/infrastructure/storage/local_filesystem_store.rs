use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::ports::{
    ListCursor, ListPage, ObjectStat, ObjectStore, PoolHandle, StoreError,
};
use crate::domain::value_objects::AttrMap;
use crate::infrastructure::storage::path_builder::{
    decode_name, sidecar_of, PathBuilder, SEGMENT_DIR_SUFFIX, SIDECAR_SUFFIX,
};

/// ENOSPC / EDQUOT
const NO_SPACE_ERRNOS: [i32; 2] = [28, 122];

/// Listings not resumed within this window are dropped
const LISTING_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Default, Serialize, Deserialize)]
struct PoolMeta {
    owner: Option<u64>,
    created_at: Option<DateTime<Utc>>,
}

/// Attribute values are stored hex-encoded so arbitrary bytes survive JSON
#[derive(Debug, Default, Serialize, Deserialize)]
struct Sidecar {
    xattrs: BTreeMap<String, String>,
}

impl Sidecar {
    fn into_attrs(self) -> Result<AttrMap, StoreError> {
        self.xattrs
            .into_iter()
            .map(|(name, value)| {
                hex::decode(&value)
                    .map(|bytes| (name, Bytes::from(bytes)))
                    .map_err(|e| StoreError::Internal(format!("corrupt attribute sidecar: {}", e)))
            })
            .collect()
    }
}

/// Sorted key scan of one pool, shared by the pages of a listing
struct ListingSnapshot {
    pool: String,
    keys: Arc<Vec<String>>,
    taken_at: Instant,
}

fn is_no_space(e: &std::io::Error) -> bool {
    e.raw_os_error()
        .is_some_and(|code| NO_SPACE_ERRNOS.contains(&code))
}

fn map_io(e: std::io::Error, what: &str) -> StoreError {
    match e.kind() {
        ErrorKind::NotFound => StoreError::NotFound(what.to_string()),
        ErrorKind::AlreadyExists => StoreError::AlreadyExists(what.to_string()),
        _ if is_no_space(&e) => StoreError::ResourceExhausted(format!("{}: {}", what, e)),
        _ => StoreError::Io(e),
    }
}

/// Failures on a temp file say nothing about the object being written
fn map_temp_io(e: std::io::Error) -> StoreError {
    if is_no_space(&e) {
        return StoreError::ResourceExhausted(format!("temp file: {}", e));
    }
    StoreError::Io(e)
}

/// Local filesystem object store.
///
/// Pools are directories and objects are files, both named by the hex
/// encoding of their names so keys may contain `/`. Extended attributes live
/// in a JSON sidecar next to each object; sidecar updates go through a temp
/// file and a rename, serialized by a store-wide lock.
///
/// An object listing scans its pool once; later pages are served from that
/// scan, so objects written mid-listing show up only in the next listing.
pub struct LocalFilesystemStore {
    path_builder: PathBuilder,
    durable_writes: bool,
    handles: DashMap<u64, String>,
    next_handle: AtomicU64,
    attr_lock: Mutex<()>,
    listings: DashMap<u64, ListingSnapshot>,
    next_listing: AtomicU64,
}

impl LocalFilesystemStore {
    pub fn new(root: PathBuf) -> Self {
        Self::with_durability(root, true)
    }

    pub fn with_durability(root: PathBuf, durable_writes: bool) -> Self {
        Self {
            path_builder: PathBuilder::new(root),
            durable_writes,
            handles: DashMap::new(),
            next_handle: AtomicU64::new(0),
            attr_lock: Mutex::new(()),
            listings: DashMap::new(),
            next_listing: AtomicU64::new(0),
        }
    }

    /// Initialize storage directories
    pub async fn init(&self) -> Result<(), StoreError> {
        fs::create_dir_all(self.path_builder.pools_root()).await?;
        fs::create_dir_all(self.path_builder.temp_root()).await?;
        Ok(())
    }

    /// Number of pool handles currently open
    pub fn open_handles(&self) -> usize {
        self.handles.len()
    }

    async fn ensure_pool(&self, pool: &PoolHandle) -> Result<PathBuf, StoreError> {
        let dir = self.path_builder.pool_dir(pool.name());
        match fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => Ok(dir),
            Ok(_) => Err(StoreError::NotFound(pool.name().to_string())),
            Err(e) => Err(map_io(e, pool.name())),
        }
    }

    /// Resolve an object path, creating the segment directories of long keys
    async fn prepare_object(&self, pool: &PoolHandle, key: &str) -> Result<PathBuf, StoreError> {
        let pool_dir = self.ensure_pool(pool).await?;
        let path = self.path_builder.object_path(pool.name(), key);
        if let Some(parent) = path.parent() {
            if parent != pool_dir {
                fs::create_dir_all(parent).await.map_err(|e| map_io(e, key))?;
            }
        }
        Ok(path)
    }

    async fn existing_object(&self, pool: &PoolHandle, key: &str) -> Result<PathBuf, StoreError> {
        self.ensure_pool(pool).await?;
        let path = self.path_builder.object_path(pool.name(), key);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(StoreError::NotFound(key.to_string())),
            Err(e) => Err(map_io(e, key)),
        }
    }

    async fn sync_file(&self, file: &File) {
        if self.durable_writes {
            if let Err(e) = file.sync_all().await {
                warn!(error = %e, "Failed to sync file");
            }
        }
    }

    /// Write `data` to a temp file, then rename it over `dest`
    async fn replace_file(&self, dest: &Path, data: &[u8]) -> Result<(), StoreError> {
        let temp_path = self.path_builder.temp_path(Uuid::new_v4());
        let staged = async {
            let mut file = File::create(&temp_path).await?;
            file.write_all(data).await?;
            file.flush().await?;
            self.sync_file(&file).await;
            Ok::<_, std::io::Error>(())
        }
        .await;

        let result = match staged {
            Ok(()) => fs::rename(&temp_path, dest)
                .await
                .map_err(|e| map_io(e, &dest.display().to_string())),
            Err(e) => Err(map_temp_io(e)),
        };
        if let Err(e) = result {
            // Best effort cleanup of the temp file
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }

        if self.durable_writes {
            if let Some(parent) = dest.parent() {
                match File::open(parent).await {
                    Ok(dir) => {
                        if let Err(e) = dir.sync_all().await {
                            warn!(error = %e, "Failed to sync parent directory after rename");
                        }
                    }
                    Err(e) => warn!(error = %e, "Failed to open parent directory for sync"),
                }
            }
        }
        Ok(())
    }

    async fn load_sidecar(&self, object_path: &Path) -> Result<Sidecar, StoreError> {
        match fs::read(sidecar_of(object_path)).await {
            Ok(raw) => Ok(serde_json::from_slice(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Sidecar::default()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// Every object key in a pool, sorted
    async fn scan_pool(&self, pool_dir: PathBuf) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        let mut pending = vec![(pool_dir, String::new())];

        while let Some((dir, prefix)) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let file_name = entry.file_name();
                let Some(name) = file_name.to_str() else {
                    continue;
                };
                if name.starts_with('.') || name.ends_with(SIDECAR_SUFFIX) {
                    continue;
                }
                if let Some(segment) = name.strip_suffix(SEGMENT_DIR_SUFFIX) {
                    pending.push((entry.path(), format!("{}{}", prefix, segment)));
                    continue;
                }
                match decode_name(&format!("{}{}", prefix, name)) {
                    Some(key) => keys.push(key),
                    None => debug!(path = %entry.path().display(), "Skipping foreign file"),
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    /// Keys of a listing in progress on `pool`, if `id` still names one
    fn resume_listing(&self, pool: &str, id: Option<u64>) -> Option<(u64, Arc<Vec<String>>)> {
        let id = id?;
        let snapshot = self.listings.get(&id)?;
        if snapshot.pool != pool {
            return None;
        }
        let keys = Arc::clone(&snapshot.keys);
        Some((id, keys))
    }

    async fn start_listing(
        &self,
        pool: &str,
        pool_dir: PathBuf,
    ) -> Result<(u64, Arc<Vec<String>>), StoreError> {
        self.listings
            .retain(|_, snapshot| snapshot.taken_at.elapsed() < LISTING_TTL);

        let keys = Arc::new(self.scan_pool(pool_dir).await?);
        let id = self.next_listing.fetch_add(1, Ordering::Relaxed);
        self.listings.insert(
            id,
            ListingSnapshot {
                pool: pool.to_string(),
                keys: Arc::clone(&keys),
                taken_at: Instant::now(),
            },
        );
        debug!(pool, listing = id, objects = keys.len(), "Pool scanned for listing");
        Ok((id, keys))
    }
}

#[async_trait]
impl ObjectStore for LocalFilesystemStore {
    async fn open_pool(&self, name: &str) -> Result<PoolHandle, StoreError> {
        let dir = self.path_builder.pool_dir(name);
        match fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(StoreError::NotFound(name.to_string())),
            Err(e) => return Err(map_io(e, name)),
        }
        let id = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.handles.insert(id, name.to_string());
        Ok(PoolHandle::new(id, name))
    }

    fn close_pool(&self, pool: &PoolHandle) {
        self.handles.remove(&pool.id());
    }

    async fn create_pool(&self, name: &str, owner: Option<u64>) -> Result<(), StoreError> {
        let dir = self.path_builder.pool_dir(name);
        if let Some(parent) = dir.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| map_io(e, name))?;
        }
        fs::create_dir(&dir).await.map_err(|e| map_io(e, name))?;

        let meta = PoolMeta {
            owner,
            created_at: Some(Utc::now()),
        };
        let written = match serde_json::to_vec(&meta) {
            Ok(raw) => self.replace_file(&self.path_builder.pool_meta(name), &raw).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = written {
            warn!(pool = name, error = %e, "Pool metadata write failed, removing pool");
            if let Err(cleanup) = fs::remove_dir_all(&dir).await {
                warn!(pool = name, error = %cleanup, "Failed to remove partial pool");
            }
            return Err(e);
        }
        debug!(pool = name, ?owner, "Pool created");
        Ok(())
    }

    async fn delete_pool(&self, pool: &PoolHandle) -> Result<(), StoreError> {
        let dir = self.ensure_pool(pool).await?;
        fs::remove_dir_all(&dir)
            .await
            .map_err(|e| map_io(e, pool.name()))?;
        debug!(pool = pool.name(), "Pool deleted");
        Ok(())
    }

    async fn list_pools(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        let mut pending = vec![(self.path_builder.pools_root(), String::new())];

        while let Some((dir, prefix)) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let file_name = entry.file_name();
                let Some(name) = file_name.to_str() else {
                    continue;
                };
                if let Some(segment) = name.strip_suffix(SEGMENT_DIR_SUFFIX) {
                    pending.push((entry.path(), format!("{}{}", prefix, segment)));
                } else if let Some(pool) = decode_name(&format!("{}{}", prefix, name)) {
                    names.push(pool);
                }
            }
        }

        names.sort();
        Ok(names)
    }

    async fn create(&self, pool: &PoolHandle, key: &str, exclusive: bool) -> Result<(), StoreError> {
        let path = self.prepare_object(pool, key).await?;
        let mut options = OpenOptions::new();
        options.write(true);
        if exclusive {
            options.create_new(true);
        } else {
            options.create(true);
        }
        let file = options.open(&path).await.map_err(|e| map_io(e, key))?;
        self.sync_file(&file).await;
        Ok(())
    }

    async fn write(
        &self,
        pool: &PoolHandle,
        key: &str,
        offset: u64,
        data: Bytes,
    ) -> Result<usize, StoreError> {
        let path = self.prepare_object(pool, key).await?;
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .await
            .map_err(|e| map_io(e, key))?;
        file.seek(SeekFrom::Start(offset))
            .await
            .map_err(|e| map_io(e, key))?;
        file.write_all(&data).await.map_err(|e| map_io(e, key))?;
        file.flush().await.map_err(|e| map_io(e, key))?;
        self.sync_file(&file).await;
        Ok(data.len())
    }

    async fn write_full(&self, pool: &PoolHandle, key: &str, data: Bytes) -> Result<(), StoreError> {
        let path = self.prepare_object(pool, key).await?;
        self.replace_file(&path, &data).await
    }

    async fn read(
        &self,
        pool: &PoolHandle,
        key: &str,
        offset: u64,
        len: u64,
    ) -> Result<Bytes, StoreError> {
        let path = self.existing_object(pool, key).await?;
        let mut file = File::open(&path).await.map_err(|e| map_io(e, key))?;
        file.seek(SeekFrom::Start(offset))
            .await
            .map_err(|e| map_io(e, key))?;

        let mut buffer = Vec::new();
        if len == 0 {
            file.read_to_end(&mut buffer).await?;
        } else {
            file.take(len).read_to_end(&mut buffer).await?;
        }
        Ok(Bytes::from(buffer))
    }

    async fn stat(&self, pool: &PoolHandle, key: &str) -> Result<ObjectStat, StoreError> {
        let path = self.existing_object(pool, key).await?;
        let meta = fs::metadata(&path).await.map_err(|e| map_io(e, key))?;
        Ok(ObjectStat {
            size: meta.len(),
            mtime: DateTime::<Utc>::from(meta.modified()?),
        })
    }

    async fn get_xattr(&self, pool: &PoolHandle, key: &str, name: &str) -> Result<Bytes, StoreError> {
        let mut attrs = self.get_xattrs(pool, key).await?;
        attrs
            .remove(name)
            .ok_or_else(|| StoreError::NoSuchAttribute(name.to_string()))
    }

    async fn set_xattr(
        &self,
        pool: &PoolHandle,
        key: &str,
        name: &str,
        value: Bytes,
    ) -> Result<(), StoreError> {
        let path = self.prepare_object(pool, key).await?;
        let _guard = self.attr_lock.lock().await;

        // The sidecar never exists without its object
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .await
            .map_err(|e| map_io(e, key))?;

        let mut sidecar = self.load_sidecar(&path).await?;
        sidecar.xattrs.insert(name.to_string(), hex::encode(&value));
        let raw = serde_json::to_vec(&sidecar)?;
        self.replace_file(&sidecar_of(&path), &raw).await
    }

    async fn get_xattrs(&self, pool: &PoolHandle, key: &str) -> Result<AttrMap, StoreError> {
        let path = self.existing_object(pool, key).await?;
        self.load_sidecar(&path).await?.into_attrs()
    }

    async fn list_objects(
        &self,
        pool: &PoolHandle,
        max: usize,
        cursor: ListCursor,
    ) -> Result<ListPage, StoreError> {
        let pool_dir = self.ensure_pool(pool).await?;
        let (id, keys) = match self.resume_listing(pool.name(), cursor.snapshot()) {
            Some(resumed) => resumed,
            None => self.start_listing(pool.name(), pool_dir).await?,
        };

        let start = match cursor.position() {
            Some(after) => keys.partition_point(|key| key.as_str() <= after),
            None => 0,
        };
        let end = start.saturating_add(max.max(1)).min(keys.len());
        let names = keys[start..end].to_vec();
        let more = end < keys.len();
        if !more {
            self.listings.remove(&id);
        }
        let cursor = match names.last() {
            Some(last) => ListCursor::after(last.as_str()).with_snapshot(id),
            None => cursor,
        };

        Ok(ListPage {
            names,
            cursor,
            more,
        })
    }

    async fn remove(&self, pool: &PoolHandle, key: &str) -> Result<(), StoreError> {
        let path = self.existing_object(pool, key).await?;
        let _guard = self.attr_lock.lock().await;

        fs::remove_file(&path).await.map_err(|e| map_io(e, key))?;
        match fs::remove_file(sidecar_of(&path)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}
