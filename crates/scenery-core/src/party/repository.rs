//! Party repository trait.

use super::model::{GlobalPartySettings, PartyConfig, PartyConfigMap};
use crate::error::Result;

/// Persistence of party templates, per-box configs and global settings.
///
/// Templates (`savedParties`) are the canonical party settings. The per-box
/// map (`partyConfigs`) is derived data kept for the conversation manager.
#[async_trait::async_trait]
pub trait PartyRepository: Send + Sync {
    /// Loads every party template. Missing storage yields an empty list.
    async fn templates(&self) -> Result<Vec<PartyConfig>>;

    /// Replaces the template list.
    async fn save_templates(&self, templates: &[PartyConfig]) -> Result<()>;

    /// Loads the box id to config map.
    async fn box_configs(&self) -> Result<PartyConfigMap>;

    /// Replaces the box id to config map.
    async fn save_box_configs(&self, configs: &PartyConfigMap) -> Result<()>;

    /// Loads the global party settings, if any were saved.
    async fn global_settings(&self) -> Result<Option<GlobalPartySettings>>;

    /// Saves the global party settings.
    async fn save_global_settings(&self, settings: &GlobalPartySettings) -> Result<()>;
}
