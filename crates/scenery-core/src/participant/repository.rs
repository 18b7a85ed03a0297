//! Participant repository trait.

use super::model::{AiPanelData, Participant};
use crate::error::Result;

/// Persistence of the AI panel record and the participant list.
#[async_trait::async_trait]
pub trait ParticipantRepository: Send + Sync {
    /// Loads `aiPanelData`, or the default record when none is stored.
    async fn ai_panel_data(&self) -> Result<AiPanelData>;

    async fn save_ai_panel_data(&self, data: &AiPanelData) -> Result<()>;

    /// Loads `topicPanel-participants`, or an empty list.
    async fn participants(&self) -> Result<Vec<Participant>>;

    async fn save_participants(&self, participants: &[Participant]) -> Result<()>;
}
