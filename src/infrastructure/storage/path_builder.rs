use std::path::{Path, PathBuf};

/// Hex characters per path component. Long pool names and keys are split
/// into nested directories so no single file name exceeds common filesystem
/// limits.
const SEGMENT_LEN: usize = 128;

/// Suffix of the intermediate directories produced by segmenting a long name
pub const SEGMENT_DIR_SUFFIX: &str = ".d";
/// Suffix of an object's attribute sidecar
pub const SIDECAR_SUFFIX: &str = ".attrs";

/// Utility for generating storage paths
///
/// Layout under the data root:
/// `pools/{hex(pool) segments}/{hex(key) segments}` for object data,
/// the same path plus `.attrs` for the sidecar, and `temp/{uuid}` for
/// writes in flight.
#[derive(Debug, Clone)]
pub struct PathBuilder {
    root: PathBuf,
}

impl PathBuilder {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn pools_root(&self) -> PathBuf {
        self.root.join("pools")
    }

    pub fn temp_root(&self) -> PathBuf {
        self.root.join("temp")
    }

    /// Generate temp path: /root/temp/{uuid}
    pub fn temp_path(&self, id: uuid::Uuid) -> PathBuf {
        self.temp_root().join(id.to_string())
    }

    pub fn pool_dir(&self, pool: &str) -> PathBuf {
        segmented(self.pools_root(), &hex::encode(pool))
    }

    /// Pool metadata lives beside the objects under a name hex never produces
    pub fn pool_meta(&self, pool: &str) -> PathBuf {
        self.pool_dir(pool).join(".pool.json")
    }

    pub fn object_path(&self, pool: &str, key: &str) -> PathBuf {
        segmented(self.pool_dir(pool), &hex::encode(key))
    }

    pub fn sidecar_path(&self, pool: &str, key: &str) -> PathBuf {
        sidecar_of(&self.object_path(pool, key))
    }
}

/// Append `encoded` under `base`, one `.d` directory per full segment
fn segmented(mut path: PathBuf, encoded: &str) -> PathBuf {
    let mut rest = encoded;
    while rest.len() > SEGMENT_LEN {
        let (head, tail) = rest.split_at(SEGMENT_LEN);
        path.push(format!("{}{}", head, SEGMENT_DIR_SUFFIX));
        rest = tail;
    }
    path.push(rest);
    path
}

pub fn sidecar_of(object_path: &Path) -> PathBuf {
    let mut name = object_path.as_os_str().to_os_string();
    name.push(SIDECAR_SUFFIX);
    PathBuf::from(name)
}

/// Decode a pool directory name back into the pool name
pub fn decode_name(encoded: &str) -> Option<String> {
    let bytes = hex::decode(encoded).ok()?;
    String::from_utf8(bytes).ok()
}
