use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Conditional-read filter evaluated before object data is returned or copied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preconditions {
    pub modified_since: Option<DateTime<Utc>>,
    pub unmodified_since: Option<DateTime<Utc>>,
    pub if_match: Option<String>,
    pub if_none_match: Option<String>,
}

impl Preconditions {
    pub fn is_empty(&self) -> bool {
        self.modified_since.is_none()
            && self.unmodified_since.is_none()
            && self.if_match.is_none()
            && self.if_none_match.is_none()
    }

    /// Whether evaluation needs the stored etag.
    pub fn needs_etag(&self) -> bool {
        self.if_match.is_some() || self.if_none_match.is_some()
    }
}
