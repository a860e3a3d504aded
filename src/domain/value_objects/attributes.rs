use bytes::Bytes;
use std::collections::BTreeMap;

/// Extended attributes of a bucket placeholder or an object, keyed by attribute name.
pub type AttrMap = BTreeMap<String, Bytes>;
