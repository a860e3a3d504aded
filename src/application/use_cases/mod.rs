mod bucket_registry;
mod copy_object;
mod delete_object;
mod get_object;
mod list_buckets;
mod list_objects;
mod object_attrs;
mod put_object;

pub use bucket_registry::BucketRegistry;
pub use copy_object::{CopyObjectRequest, CopyObjectUseCase};
pub use delete_object::DeleteObjectUseCase;
pub use get_object::{ByteRange, GetObjectOutput, GetObjectRequest, GetObjectUseCase};
pub use list_buckets::{BucketListing, ListBucketsUseCase};
pub use list_objects::{
    ListObjectsRequest, ListObjectsResponse, ListObjectsUseCase, DEFAULT_LIST_BATCH,
};
pub use object_attrs::ObjectAttrsUseCase;
pub use put_object::{PutObjectRequest, PutObjectUseCase};
