use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Literal object entry produced by an object listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub name: String,
    pub size: u64,
    pub mtime: DateTime<Utc>,
    /// Empty when the object carries no etag attribute
    pub etag: String,
}
