//! AI panel and participant models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Selection and topic state of the AI panel, stored under `aiPanelData`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AiPanelData {
    #[serde(default)]
    pub selected_names: Vec<String>,
    #[serde(default)]
    pub discussion_topic: String,
    #[serde(default)]
    pub avatar_urls: BTreeMap<String, String>,
    #[serde(default)]
    pub human_participants: Vec<String>,
    #[serde(default)]
    pub thumbnails_valid: bool,
    /// Milliseconds since the epoch.
    #[serde(default)]
    pub last_updated: i64,
}

impl AiPanelData {
    pub fn is_human(&self, name: &str) -> bool {
        self.human_participants.iter().any(|n| n == name)
    }
}

/// One entry of `topicPanel-participants`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub name: String,
    #[serde(default)]
    pub is_human: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party: Option<String>,
}
