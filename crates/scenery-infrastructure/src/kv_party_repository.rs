//! Party templates, per-box configs and global settings over a key-value store.

use std::sync::Arc;

use async_trait::async_trait;
use scenery_core::error::Result;
use scenery_core::party::{GlobalPartySettings, PartyConfig, PartyConfigMap, PartyRepository};
use scenery_core::storage::KeyValueStore;
use scenery_core::storage::keys::{GLOBAL_PARTY_SETTINGS, PARTY_CONFIGS, SAVED_PARTIES};

use crate::kv_document::KvDocument;

/// Party repository backed by a [`KeyValueStore`].
///
/// - `savedParties`: list of templates
/// - `partyConfigs`: map of box id to config
/// - `globalPartySettings`: single record
pub struct KvPartyRepository {
    templates: KvDocument<Vec<PartyConfig>>,
    box_configs: KvDocument<PartyConfigMap>,
    global_settings: KvDocument<GlobalPartySettings>,
}

impl KvPartyRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            templates: KvDocument::new(store.clone(), SAVED_PARTIES),
            box_configs: KvDocument::new(store.clone(), PARTY_CONFIGS),
            global_settings: KvDocument::new(store, GLOBAL_PARTY_SETTINGS),
        }
    }
}

#[async_trait]
impl PartyRepository for KvPartyRepository {
    async fn templates(&self) -> Result<Vec<PartyConfig>> {
        self.templates.load_or_default().await
    }

    async fn save_templates(&self, templates: &[PartyConfig]) -> Result<()> {
        self.templates.save(&templates.to_vec()).await
    }

    async fn box_configs(&self) -> Result<PartyConfigMap> {
        self.box_configs.load_or_default().await
    }

    async fn save_box_configs(&self, configs: &PartyConfigMap) -> Result<()> {
        self.box_configs.save(configs).await
    }

    async fn global_settings(&self) -> Result<Option<GlobalPartySettings>> {
        self.global_settings.load().await
    }

    async fn save_global_settings(&self, settings: &GlobalPartySettings) -> Result<()> {
        self.global_settings.save(settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKeyValueStore;
    use scenery_core::party::{PartyTurnMode, SpeakingMode};

    #[tokio::test]
    async fn test_missing_keys_yield_defaults() {
        let repo = KvPartyRepository::new(Arc::new(MemoryKeyValueStore::new()));
        assert!(repo.templates().await.unwrap().is_empty());
        assert!(repo.box_configs().await.unwrap().is_empty());
        assert!(repo.global_settings().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_wire_format() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let repo = KvPartyRepository::new(store.clone());

        let mut research = PartyConfig::new("Research");
        research.speaking_mode = SpeakingMode::Subset;
        research.subset_size = Some(2);
        repo.save_templates(&[research.clone()]).await.unwrap();

        let mut map = PartyConfigMap::new();
        map.insert("b1".to_string(), research.clone());
        repo.save_box_configs(&map).await.unwrap();

        repo.save_global_settings(&GlobalPartySettings {
            party_turn_mode: PartyTurnMode::Free,
            moderator_party: Some("Research".to_string()),
            enable_backchannel: true,
        })
        .await
        .unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&store.get("savedParties").await.unwrap().unwrap()).unwrap();
        assert_eq!(saved[0]["speakingMode"], "subset");
        assert_eq!(saved[0]["subsetSize"], 2);

        let configs: serde_json::Value =
            serde_json::from_str(&store.get("partyConfigs").await.unwrap().unwrap()).unwrap();
        assert_eq!(configs["b1"]["name"], "Research");

        let global: serde_json::Value =
            serde_json::from_str(&store.get("globalPartySettings").await.unwrap().unwrap())
                .unwrap();
        assert_eq!(global["partyTurnMode"], "free");
        assert_eq!(global["moderatorParty"], "Research");

        assert_eq!(repo.templates().await.unwrap(), vec![research]);
    }
}
