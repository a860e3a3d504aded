use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bucket as reported by bucket enumeration.
///
/// Only the name is filled in: the pool enumeration does not expose size or
/// modification time, so those stay `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketEntry {
    pub name: String,
    pub size: Option<u64>,
    pub mtime: Option<DateTime<Utc>>,
}

impl BucketEntry {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: None,
            mtime: None,
        }
    }
}
