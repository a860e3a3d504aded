use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::application::use_cases::DEFAULT_LIST_BATCH;

/// Upper bound for `list_batch_size`
pub const MAX_LIST_BATCH: usize = 10_000;

/// Backing store the gateway runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Filesystem,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "filesystem" | "fs" => Ok(StoreBackend::Filesystem),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pool holding one placeholder object per bucket
    pub root_pool: String,
    /// Names requested per store call while draining an object listing
    pub list_batch_size: usize,
    pub store_backend: StoreBackend,
    pub data_root: PathBuf,
    pub durable_writes: bool,
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_pool: ".rgw".to_string(),
            list_batch_size: DEFAULT_LIST_BATCH,
            store_backend: StoreBackend::Filesystem,
            data_root: PathBuf::from("/var/lib/pool-gateway"),
            durable_writes: true,
            log_json: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; unset or unparsable values keep
    /// their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            root_pool: lookup("GATEWAY_ROOT_POOL").unwrap_or(defaults.root_pool),
            list_batch_size: lookup("GATEWAY_LIST_BATCH_SIZE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.list_batch_size),
            store_backend: lookup("GATEWAY_STORE_BACKEND")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.store_backend),
            data_root: lookup("GATEWAY_DATA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_root),
            durable_writes: lookup("GATEWAY_DURABLE_WRITES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.durable_writes),
            log_json: lookup("GATEWAY_LOG_JSON")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.log_json),
        }
    }

    /// Load a TOML file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, String> {
        toml::from_str(raw).map_err(|e| format!("invalid config: {}", e))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.root_pool.is_empty() {
            return Err("GATEWAY_ROOT_POOL cannot be empty".to_string());
        }

        if self.list_batch_size < 1 || self.list_batch_size > MAX_LIST_BATCH {
            return Err(format!(
                "GATEWAY_LIST_BATCH_SIZE must be between 1 and {}",
                MAX_LIST_BATCH
            ));
        }

        if self.store_backend == StoreBackend::Filesystem && self.data_root.as_os_str().is_empty()
        {
            return Err("GATEWAY_DATA_ROOT cannot be empty".to_string());
        }

        Ok(())
    }
}
