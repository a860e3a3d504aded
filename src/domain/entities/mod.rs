mod bucket_entry;
mod object_entry;

pub use bucket_entry::BucketEntry;
pub use object_entry::ObjectEntry;
