//! # pool-gateway - Bucket and Object Access over Pools
//!
//! The data-access layer of an object-storage gateway: buckets and objects
//! are mapped onto pools of a flat object store with extended attributes.
//!
//! ## Architecture Layers
//!
//! - **Domain**: Validated names, preconditions, listing entries
//! - **Application**: Use cases and the `ObjectStore` port
//! - **Infrastructure**: In-memory and local filesystem store adapters
//! - **API**: The `Gateway` facade consumed by a protocol layer
//!
//! ## Key Features
//!
//! - Bucket registry with one placeholder object per bucket in a root pool
//! - Hierarchical listing (prefix, delimiter, marker, max) over flat pools
//! - Time and entity-tag preconditions on reads and copies
//! - Scoped pool handles released on every exit path
//!
//! ## Example Usage
//!
//! ```no_run
//! use pool_gateway::{Config, Gateway, InMemoryObjectStore};
//! use pool_gateway::use_cases::{GetObjectRequest, PutObjectRequest};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = Gateway::initialize(&Config::default(), Arc::new(InMemoryObjectStore::new())).await?;
//! gateway.create_bucket("photos", &Default::default(), None).await?;
//! gateway
//!     .put_object(PutObjectRequest {
//!         bucket: "photos".into(),
//!         key: "cat.jpg".into(),
//!         data: "meow".into(),
//!         attrs: Default::default(),
//!         want_mtime: false,
//!     })
//!     .await?;
//! let output = gateway.get_object(&GetObjectRequest::new("photos", "cat.jpg")).await?;
//! assert_eq!(output.len(), 4);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export key types explicitly to avoid ambiguity
pub use api::Gateway;
pub use application::builder::GatewayBuilder;
pub use application::errors::{ErrorDescriptor, GatewayError};
pub use application::{ports, use_cases};
pub use config::{Config, StoreBackend};
pub use domain::errors as domain_errors;
pub use domain::{entities, value_objects};
pub use infrastructure::storage::{InMemoryObjectStore, LocalFilesystemStore};
