mod object_store;

pub use object_store::{ListCursor, ListPage, ObjectStat, ObjectStore, PoolHandle, StoreError};

#[cfg(test)]
pub use object_store::MockObjectStore;
