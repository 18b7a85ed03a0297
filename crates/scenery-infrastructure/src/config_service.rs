//! Configuration loading.
//!
//! Reads `config.toml` from the config directory. A missing file yields the
//! defaults; a file that fails to parse is an error so typos don't go
//! unnoticed.

use std::path::{Path, PathBuf};

use scenery_core::config::SceneryConfig;
use scenery_core::error::Result;

use crate::paths::SceneryPaths;

/// Loads and caches the application configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigService {
    config: SceneryConfig,
}

impl ConfigService {
    /// Loads the configuration file of `paths`.
    pub fn load(paths: &SceneryPaths) -> Result<Self> {
        Self::load_from(paths.config_file())
    }

    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let config = Self::read(&path.into())?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SceneryConfig {
        &self.config
    }

    fn read(path: &Path) -> Result<SceneryConfig> {
        if !path.exists() {
            tracing::debug!(
                "[ConfigService] {} not found, using defaults",
                path.display()
            );
            return Ok(SceneryConfig::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: SceneryConfig = toml::from_str(&content)?;
        Ok(config)
    }
}
