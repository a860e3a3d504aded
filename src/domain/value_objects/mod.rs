mod attributes;
mod bucket_name;
mod etag;
mod object_key;
mod preconditions;

pub use attributes::AttrMap;
pub use bucket_name::BucketName;
pub use etag::{etag_from_attr, ETAG_ATTR, MAX_ETAG_LEN};
pub use object_key::ObjectKey;
pub use preconditions::Preconditions;
