use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Validated object key within a bucket. Keys are opaque, `/` has no meaning
/// to the store and is only interpreted by delimiter listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectKey(String);

impl ObjectKey {
    const MAX_LENGTH: usize = 1024;

    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();

        if value.is_empty() {
            return Err(DomainError::InvalidObjectKey(
                "Object key cannot be empty".to_string(),
            ));
        }

        if value.len() > Self::MAX_LENGTH {
            return Err(DomainError::InvalidObjectKey(format!(
                "Object key too long: {} > {}",
                value.len(),
                Self::MAX_LENGTH
            )));
        }

        if value.contains('\0') {
            return Err(DomainError::InvalidObjectKey(
                "Object key must not contain NUL".to_string(),
            ));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ObjectKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
