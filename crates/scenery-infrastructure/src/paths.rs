//! Unified path management for scenery files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/scenery/           # Config directory
//! └── config.toml              # Application configuration
//!
//! ~/.local/share/scenery/      # Data directory
//! ├── local_storage.json       # Key-value store
//! └── blobs/                   # Oversized scene payloads
//! ```

use std::path::{Path, PathBuf};

use scenery_core::error::{Result, SceneryError};

const APP_NAME: &str = "scenery";

/// Resolved locations of scenery's files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneryPaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl SceneryPaths {
    /// Resolves the platform directories (XDG on Linux).
    pub fn platform() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SceneryError::config("Cannot find config directory"))?
            .join(APP_NAME);
        let data_dir = dirs::data_dir()
            .ok_or_else(|| SceneryError::config("Cannot find data directory"))?
            .join(APP_NAME);
        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    /// Uses explicit directories. Used by tests and `--data-dir`.
    pub fn with_dirs(config_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            data_dir: data_dir.into(),
        }
    }

    /// Replaces the data directory, keeping the config directory.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn store_file(&self) -> PathBuf {
        self.data_dir.join("local_storage.json")
    }

    pub fn blob_dir(&self) -> PathBuf {
        self.data_dir.join("blobs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let paths = SceneryPaths::with_dirs("/cfg/scenery", "/data/scenery");
        assert_eq!(paths.config_file(), PathBuf::from("/cfg/scenery/config.toml"));
        assert_eq!(
            paths.store_file(),
            PathBuf::from("/data/scenery/local_storage.json")
        );
        assert_eq!(paths.blob_dir(), PathBuf::from("/data/scenery/blobs"));
    }

    #[test]
    fn test_data_dir_override() {
        let paths = SceneryPaths::with_dirs("/cfg", "/data").with_data_dir("/elsewhere");
        assert_eq!(paths.config_dir(), Path::new("/cfg"));
        assert_eq!(paths.store_file(), PathBuf::from("/elsewhere/local_storage.json"));
    }
}
