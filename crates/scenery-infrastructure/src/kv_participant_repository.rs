//! `aiPanelData` and `topicPanel-participants` over a key-value store.

use std::sync::Arc;

use async_trait::async_trait;
use scenery_core::error::Result;
use scenery_core::participant::{AiPanelData, Participant, ParticipantRepository};
use scenery_core::storage::KeyValueStore;
use scenery_core::storage::keys::{AI_PANEL_DATA, TOPIC_PANEL_PARTICIPANTS};

use crate::kv_document::KvDocument;

pub struct KvParticipantRepository {
    panel: KvDocument<AiPanelData>,
    participants: KvDocument<Vec<Participant>>,
}

impl KvParticipantRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            panel: KvDocument::new(store.clone(), AI_PANEL_DATA),
            participants: KvDocument::new(store, TOPIC_PANEL_PARTICIPANTS),
        }
    }
}

#[async_trait]
impl ParticipantRepository for KvParticipantRepository {
    async fn ai_panel_data(&self) -> Result<AiPanelData> {
        self.panel.load_or_default().await
    }

    async fn save_ai_panel_data(&self, data: &AiPanelData) -> Result<()> {
        self.panel.save(data).await
    }

    async fn participants(&self) -> Result<Vec<Participant>> {
        self.participants.load_or_default().await
    }

    async fn save_participants(&self, participants: &[Participant]) -> Result<()> {
        self.participants.save(&participants.to_vec()).await
    }
}
