use std::sync::Arc;
use tracing::debug;

use crate::application::errors::GatewayError;
use crate::application::ports::ObjectStore;
use crate::domain::entities::BucketEntry;

/// Forward-only listing over a snapshot of pool names.
///
/// The snapshot is taken when the listing is created and released as soon as
/// the last entry has been handed out (or when the listing is dropped).
#[derive(Debug)]
pub struct BucketListing {
    names: Vec<String>,
    pos: usize,
}

impl BucketListing {
    fn new(names: Vec<String>) -> Self {
        Self { names, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.names.len() - self.pos
    }
}

impl Iterator for BucketListing {
    type Item = BucketEntry;

    fn next(&mut self) -> Option<BucketEntry> {
        if self.pos == self.names.len() {
            self.names = Vec::new();
            self.pos = 0;
            return None;
        }

        let name = std::mem::take(&mut self.names[self.pos]);
        self.pos += 1;
        Some(BucketEntry::named(name))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}

impl ExactSizeIterator for BucketListing {}

/// Use case: enumerate buckets
pub struct ListBucketsUseCase {
    store: Arc<dyn ObjectStore>,
    root_pool: String,
}

impl ListBucketsUseCase {
    pub fn new(store: Arc<dyn ObjectStore>, root_pool: impl Into<String>) -> Self {
        Self {
            store,
            root_pool: root_pool.into(),
        }
    }

    /// Snapshot every pool except the root pool
    pub async fn execute(&self) -> Result<BucketListing, GatewayError> {
        let mut names = self.store.list_pools().await?;
        names.retain(|name| name != &self.root_pool);
        debug!(count = names.len(), "Bucket listing snapshot taken");
        Ok(BucketListing::new(names))
    }
}
