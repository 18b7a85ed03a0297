//! Shared application store contract.
//!
//! The editor's views read scenes, the active scene and party data from one
//! shared store. Services receive it injected as an [`AppStore`] so tests can
//! substitute an in-memory implementation.

use async_trait::async_trait;

use crate::error::Result;
use crate::party::{GlobalPartySettings, PartyConfigMap};
use crate::scene::Scene;

/// Shared, observable application state.
#[async_trait]
pub trait AppStore: Send + Sync {
    /// Scenes of the working set, in tab order.
    async fn scenes(&self) -> Vec<Scene>;

    async fn set_scenes(&self, scenes: Vec<Scene>) -> Result<()>;

    async fn active_scene_id(&self) -> Option<String>;

    async fn set_active_scene_id(&self, scene_id: Option<String>) -> Result<()>;

    /// Names of the avatars currently speaking in the conversation.
    async fn speakers(&self) -> Vec<String>;

    async fn set_speakers(&self, speakers: Vec<String>) -> Result<()>;

    async fn party_configs(&self) -> PartyConfigMap;

    async fn set_party_configs(&self, configs: PartyConfigMap) -> Result<()>;

    async fn global_party_settings(&self) -> Option<GlobalPartySettings>;

    async fn set_global_party_settings(&self, settings: Option<GlobalPartySettings>) -> Result<()>;

    /// The active scene, if one is selected and open.
    async fn active_scene(&self) -> Option<Scene> {
        let active_id = self.active_scene_id().await?;
        self.scenes().await.into_iter().find(|s| s.id == active_id)
    }

    /// Finds an open scene by id.
    async fn scene(&self, scene_id: &str) -> Option<Scene> {
        self.scenes().await.into_iter().find(|s| s.id == scene_id)
    }
}
