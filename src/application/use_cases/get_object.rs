use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

use crate::application::conditional;
use crate::application::errors::GatewayError;
use crate::application::ports::ObjectStore;
use crate::application::scoped_pool::ScopedPool;
use crate::domain::value_objects::{AttrMap, Preconditions};

/// Requested byte range. `end` is inclusive; `end <= 0` reads from `offset`
/// to the end of the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub offset: u64,
    pub end: i64,
}

impl ByteRange {
    pub fn new(offset: u64, end: i64) -> Self {
        Self { offset, end }
    }

    pub fn full() -> Self {
        Self { offset: 0, end: -1 }
    }

    /// Length handed to the store; 0 means "to end of object"
    pub fn read_len(&self) -> u64 {
        if self.end <= 0 {
            return 0;
        }
        let len = i128::from(self.end) - i128::from(self.offset) + 1;
        u64::try_from(len.max(0)).unwrap_or(u64::MAX)
    }
}

impl Default for ByteRange {
    fn default() -> Self {
        Self::full()
    }
}

#[derive(Debug, Clone)]
pub struct GetObjectRequest {
    pub bucket: String,
    pub key: String,
    pub range: ByteRange,
    pub want_attrs: bool,
    pub preconditions: Preconditions,
    pub want_data: bool,
}

impl GetObjectRequest {
    /// Full read of data and attributes with no preconditions
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            range: ByteRange::full(),
            want_attrs: true,
            preconditions: Preconditions::default(),
            want_data: true,
        }
    }

    /// Metadata-only request
    pub fn head(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            want_data: false,
            ..Self::new(bucket, key)
        }
    }

    pub fn with_range(mut self, range: ByteRange) -> Self {
        self.range = range;
        self
    }

    pub fn with_preconditions(mut self, preconditions: Preconditions) -> Self {
        self.preconditions = preconditions;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetObjectOutput {
    /// Full object size from stat
    pub size: u64,
    pub mtime: DateTime<Utc>,
    pub attrs: Option<AttrMap>,
    /// Bytes read, present only when data was requested
    pub data: Option<Bytes>,
}

impl GetObjectOutput {
    /// Bytes read when data was requested, otherwise the object size
    pub fn len(&self) -> u64 {
        match &self.data {
            Some(data) => data.len() as u64,
            None => self.size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Use case: read an object's metadata and optionally a byte range of its data
pub struct GetObjectUseCase {
    store: Arc<dyn ObjectStore>,
}

impl GetObjectUseCase {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, request: &GetObjectRequest) -> Result<GetObjectOutput, GatewayError> {
        let bucket = request.bucket.as_str();
        let key = request.key.as_str();
        let object_err = |e| GatewayError::from_object(bucket, key, e);

        // 1. Open pool and stat
        let pool = ScopedPool::open(&self.store, bucket)
            .await
            .map_err(|e| GatewayError::from_pool(bucket, e))?;
        let stat = self.store.stat(&pool, key).await.map_err(object_err)?;

        // 2. Attributes
        let attrs = if request.want_attrs {
            Some(self.store.get_xattrs(&pool, key).await.map_err(object_err)?)
        } else {
            None
        };

        // 3. Preconditions
        conditional::evaluate(
            self.store.as_ref(),
            &pool,
            bucket,
            key,
            stat.mtime,
            &request.preconditions,
        )
        .await?;

        let mut output = GetObjectOutput {
            size: stat.size,
            mtime: stat.mtime,
            attrs,
            data: None,
        };
        if !request.want_data {
            return Ok(output);
        }

        // 4. Data
        let len = request.range.read_len();
        debug!(bucket, key, offset = request.range.offset, len, "Reading object");
        let data = self
            .store
            .read(&pool, key, request.range.offset, len)
            .await
            .map_err(object_err)?;
        output.data = Some(data);

        Ok(output)
    }
}
