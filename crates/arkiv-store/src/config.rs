use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use arkiv_types::{StorageError, StorageResult};

use crate::disk::DiskRecordStore;
use crate::memory::InMemoryRecordStore;
use crate::traits::RecordStore;

/// Which record store implementation to start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Memory,
    Disk,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageConfig {
    pub backend: Backend,
    /// Root of record snapshots and of the `streams/` blob tree.
    pub base_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            base_path: PathBuf::from("./arkiv-data"),
        }
    }
}

impl StorageConfig {
    pub fn memory() -> Self {
        Self::default()
    }

    pub fn disk(base_path: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::Disk,
            base_path: base_path.into(),
        }
    }

    /// Parse a TOML document such as:
    ///
    /// ```toml
    /// backend = "disk"
    /// basePath = "/var/lib/arkiv"
    /// ```
    pub fn from_toml_str(s: &str) -> StorageResult<Self> {
        toml::from_str(s).map_err(|e| StorageError::Config(e.to_string()))
    }

    /// Read and parse a TOML configuration file.
    pub fn from_file(path: &Path) -> StorageResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            StorageError::io(format!("can not read config {}", path.display()), e)
        })?;
        Self::from_toml_str(&text)
    }
}

/// Start the record store selected by `config`.
pub fn open_record_store(config: &StorageConfig) -> StorageResult<Arc<dyn RecordStore>> {
    info!(backend = ?config.backend, base_path = %config.base_path.display(), "opening record store");
    let store: Arc<dyn RecordStore> = match config.backend {
        Backend::Memory => Arc::new(InMemoryRecordStore::new()),
        Backend::Disk => Arc::new(DiskRecordStore::open(&config.base_path)?),
    };
    Ok(store)
}
