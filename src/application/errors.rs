//! Error type shared by every gateway operation
//!
//! Store failures are translated with bucket/key context at the call site so
//! a missing pool and a missing object stay distinguishable. Each variant maps
//! onto an [`ErrorDescriptor`] that the protocol layer turns into a response.

use serde::Serialize;
use thiserror::Error;

use crate::application::ports::StoreError;
use crate::domain::errors::DomainError;

/// Protocol-facing failure: numeric status plus a short symbolic code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorDescriptor {
    pub status: u16,
    pub code: &'static str,
}

impl ErrorDescriptor {
    pub const fn new(status: u16, code: &'static str) -> Self {
        Self { status, code }
    }

    /// `modified-since` rejected the object
    pub const fn not_modified() -> Self {
        Self::new(304, "PreconditionFailed")
    }

    /// `unmodified-since`, `if-match` or `if-none-match` rejected the object
    pub const fn precondition_failed() -> Self {
        Self::new(412, "PreconditionFailed")
    }
}

impl std::fmt::Display for ErrorDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status, self.code)
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Bucket not found: {0}")]
    NoSuchBucket(String),

    #[error("Object not found: {bucket}/{key}")]
    NoSuchKey { bucket: String, key: String },

    #[error("Attribute not found: {0}")]
    NoSuchAttribute(String),

    #[error("Bucket already exists: {0}")]
    BucketAlreadyExists(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Precondition failed ({0})")]
    PreconditionFailed(ErrorDescriptor),

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NoSuchAttribute(name) => GatewayError::NoSuchAttribute(name),
            StoreError::AlreadyExists(what) => GatewayError::AlreadyExists(what),
            StoreError::ResourceExhausted(msg) => GatewayError::ResourceExhausted(msg),
            StoreError::Cancelled(msg) => GatewayError::Cancelled(msg),
            other => GatewayError::Store(other),
        }
    }
}

impl GatewayError {
    /// Translate a failure to open or manipulate a bucket's pool
    pub fn from_pool(bucket: &str, err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => GatewayError::NoSuchBucket(bucket.to_string()),
            other => other.into(),
        }
    }

    /// Translate a failure on a single object in a bucket
    pub fn from_object(bucket: &str, key: &str, err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => GatewayError::NoSuchKey {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            other => other.into(),
        }
    }

    pub fn descriptor(&self) -> ErrorDescriptor {
        match self {
            GatewayError::NoSuchBucket(_) => ErrorDescriptor::new(404, "NoSuchBucket"),
            GatewayError::NoSuchKey { .. } => ErrorDescriptor::new(404, "NoSuchKey"),
            GatewayError::NoSuchAttribute(_) => ErrorDescriptor::new(404, "NoSuchAttribute"),
            GatewayError::BucketAlreadyExists(_) => {
                ErrorDescriptor::new(409, "BucketAlreadyExists")
            }
            GatewayError::AlreadyExists(_) => ErrorDescriptor::new(409, "AlreadyExists"),
            GatewayError::PreconditionFailed(descriptor) => *descriptor,
            GatewayError::ResourceExhausted(_) => ErrorDescriptor::new(503, "SlowDown"),
            GatewayError::Cancelled(_) => ErrorDescriptor::new(500, "RequestCancelled"),
            GatewayError::InvalidArgument(_) => ErrorDescriptor::new(400, "InvalidArgument"),
            GatewayError::Domain(DomainError::InvalidBucketName(_)) => {
                ErrorDescriptor::new(400, "InvalidBucketName")
            }
            GatewayError::Domain(DomainError::InvalidObjectKey(_)) => {
                ErrorDescriptor::new(400, "InvalidArgument")
            }
            GatewayError::Store(_) => ErrorDescriptor::new(500, "InternalError"),
        }
    }
}
