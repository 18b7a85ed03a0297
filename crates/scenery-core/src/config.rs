//! Application configuration model.
//!
//! Loaded from `config.toml`; every section and field is optional so a
//! missing or partial file yields the defaults below.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default capacity of the key-value store in bytes.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Serialized size above which a scene is stored as a file reference.
pub const DEFAULT_FILE_REFERENCE_THRESHOLD_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SceneryConfig {
    pub storage: StorageConfig,
    pub party: PartyOptions,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub quota_bytes: usize,
    pub file_reference_threshold_bytes: usize,
    /// Overrides the platform data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            quota_bytes: DEFAULT_QUOTA_BYTES,
            file_reference_threshold_bytes: DEFAULT_FILE_REFERENCE_THRESHOLD_BYTES,
            data_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PartyOptions {
    /// Allows `cleanup_party_configs` without forcing it.
    pub cleanup_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}
