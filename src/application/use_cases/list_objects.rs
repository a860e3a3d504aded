use std::collections::{BTreeSet, Bound};
use std::sync::Arc;
use tracing::debug;

use crate::application::errors::GatewayError;
use crate::application::ports::{ListCursor, ObjectStore};
use crate::application::scoped_pool::ScopedPool;
use crate::domain::entities::ObjectEntry;
use crate::domain::value_objects::{etag_from_attr, ETAG_ATTR, MAX_ETAG_LEN};

/// Default batch size when draining the store's enumeration
pub const DEFAULT_LIST_BATCH: usize = 1000;

/// Object listing query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListObjectsRequest {
    pub bucket: String,
    /// Upper bound on keys consumed from the sorted stream; negative means all
    pub max: i64,
    pub prefix: String,
    pub delimiter: String,
    /// Listing starts at the first key >= marker
    pub marker: String,
}

impl ListObjectsRequest {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            max: -1,
            prefix: String::new(),
            delimiter: String::new(),
            marker: String::new(),
        }
    }

    pub fn with_max(mut self, max: i64) -> Self {
        self.max = max;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListObjectsResponse {
    pub results: Vec<ObjectEntry>,
    pub common_prefixes: BTreeSet<String>,
}

/// Use case: list objects in a bucket with prefix/delimiter/marker/max
/// semantics, emulating a hierarchy over the pool's flat namespace.
pub struct ListObjectsUseCase {
    store: Arc<dyn ObjectStore>,
    batch_size: usize,
}

impl ListObjectsUseCase {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self::with_batch_size(store, DEFAULT_LIST_BATCH)
    }

    pub fn with_batch_size(store: Arc<dyn ObjectStore>, batch_size: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
        }
    }

    pub async fn execute(
        &self,
        request: &ListObjectsRequest,
    ) -> Result<ListObjectsResponse, GatewayError> {
        let bucket = request.bucket.as_str();
        let prefix = request.prefix.as_str();
        let delimiter = request.delimiter.as_str();

        // 1. Open the bucket's pool
        let pool = ScopedPool::open(&self.store, bucket)
            .await
            .map_err(|e| GatewayError::from_pool(bucket, e))?;

        // 2. Drain the enumeration; the set dedups and sorts
        let mut keys = BTreeSet::new();
        let mut cursor = ListCursor::default();
        loop {
            let page = self
                .store
                .list_objects(&pool, self.batch_size, cursor)
                .await
                .map_err(|e| GatewayError::from_pool(bucket, e))?;

            keys.extend(page.names.into_iter().filter(|name| name.starts_with(prefix)));

            if !page.more {
                break;
            }
            cursor = page.cursor;
        }

        // 3. Start position and budget
        let start = if request.marker.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Included(request.marker.as_str())
        };
        let budget = usize::try_from(request.max).unwrap_or(usize::MAX);

        // 4. Walk; every consumed key counts against the budget, whether it
        // becomes a literal entry or folds into a common prefix
        let mut response = ListObjectsResponse::default();
        for name in keys.range::<str, _>((start, Bound::Unbounded)).take(budget) {
            if !delimiter.is_empty() {
                if let Some(pos) = name[prefix.len()..].find(delimiter) {
                    let end = prefix.len() + pos + delimiter.len();
                    response.common_prefixes.insert(name[..end].to_string());
                    continue;
                }
            }

            let stat = match self.store.stat(&pool, name).await {
                Ok(stat) => stat,
                Err(e) => {
                    debug!(bucket, key = %name, error = %e, "Skipping entry that failed to stat");
                    continue;
                }
            };

            let etag = match self.store.get_xattr(&pool, name, ETAG_ATTR).await {
                Ok(raw) => etag_from_attr(&raw, MAX_ETAG_LEN),
                Err(_) => String::new(),
            };

            response.results.push(ObjectEntry {
                name: name.clone(),
                size: stat.size,
                mtime: stat.mtime,
                etag,
            });
        }

        debug!(
            bucket,
            results = response.results.len(),
            common_prefixes = response.common_prefixes.len(),
            "Listed objects"
        );
        Ok(response)
    }
}
