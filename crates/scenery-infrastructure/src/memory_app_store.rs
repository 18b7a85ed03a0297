//! In-memory application store.

use async_trait::async_trait;
use scenery_core::error::Result;
use scenery_core::party::{GlobalPartySettings, PartyConfigMap};
use scenery_core::scene::Scene;
use scenery_core::state::AppStore;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct AppState {
    scenes: Vec<Scene>,
    active_scene_id: Option<String>,
    speakers: Vec<String>,
    party_configs: PartyConfigMap,
    global_party_settings: Option<GlobalPartySettings>,
}

/// [`AppStore`] holding everything in process memory.
#[derive(Debug, Default)]
pub struct InMemoryAppStore {
    state: RwLock<AppState>,
}

impl InMemoryAppStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AppStore for InMemoryAppStore {
    async fn scenes(&self) -> Vec<Scene> {
        self.state.read().await.scenes.clone()
    }

    async fn set_scenes(&self, scenes: Vec<Scene>) -> Result<()> {
        self.state.write().await.scenes = scenes;
        Ok(())
    }

    async fn active_scene_id(&self) -> Option<String> {
        self.state.read().await.active_scene_id.clone()
    }

    async fn set_active_scene_id(&self, scene_id: Option<String>) -> Result<()> {
        self.state.write().await.active_scene_id = scene_id;
        Ok(())
    }

    async fn speakers(&self) -> Vec<String> {
        self.state.read().await.speakers.clone()
    }

    async fn set_speakers(&self, speakers: Vec<String>) -> Result<()> {
        self.state.write().await.speakers = speakers;
        Ok(())
    }

    async fn party_configs(&self) -> PartyConfigMap {
        self.state.read().await.party_configs.clone()
    }

    async fn set_party_configs(&self, configs: PartyConfigMap) -> Result<()> {
        self.state.write().await.party_configs = configs;
        Ok(())
    }

    async fn global_party_settings(&self) -> Option<GlobalPartySettings> {
        self.state.read().await.global_party_settings.clone()
    }

    async fn set_global_party_settings(&self, settings: Option<GlobalPartySettings>) -> Result<()> {
        self.state.write().await.global_party_settings = settings;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_active_scene_lookup() {
        let store = InMemoryAppStore::new();
        let mut a = Scene::new("A");
        a.id = "a".to_string();
        let mut b = Scene::new("B");
        b.id = "b".to_string();
        store.set_scenes(vec![a, b]).await.unwrap();

        assert!(store.active_scene().await.is_none());
        store.set_active_scene_id(Some("b".to_string())).await.unwrap();
        assert_eq!(store.active_scene().await.unwrap().name, "B");
        assert_eq!(store.scene("a").await.unwrap().name, "A");
        assert!(store.scene("c").await.is_none());
    }
}
