//! Avatar configuration repository trait.

use super::model::AvatarConfig;
use crate::error::Result;

/// Persistence of `avatar-config-<name>` entries.
#[async_trait::async_trait]
pub trait AvatarConfigRepository: Send + Sync {
    /// Finds the saved configuration of an avatar.
    async fn find(&self, avatar_name: &str) -> Result<Option<AvatarConfig>>;

    /// Saves the configuration of an avatar.
    async fn save(&self, avatar_name: &str, config: &AvatarConfig) -> Result<()>;

    /// Deletes the configuration of an avatar. Returns whether one existed.
    async fn delete(&self, avatar_name: &str) -> Result<bool>;

    /// Names of every avatar with a saved configuration.
    async fn names(&self) -> Result<Vec<String>>;
}
