//! Party-mode configuration handed to the conversation manager, and the
//! message annotation that goes with it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::model::{GlobalPartySettings, PartyConfig, SpeakingMode};
use crate::scene::{Scene, SceneBox};

/// Settings of one party as consumed by the conversation manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartySettings {
    pub members: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub representative_name: Option<String>,
    pub speaking_mode: SpeakingMode,
    #[serde(default)]
    pub has_representative: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subset_size: Option<u32>,
    #[serde(default)]
    pub enable_backchannel: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Party-mode configuration. Serializes to `{"partyMode":false}` when off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PartyModeConfig {
    pub party_mode: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub party_settings: BTreeMap<String, PartySettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_settings: Option<GlobalPartySettings>,
}

impl PartyModeConfig {
    pub fn disabled() -> Self {
        Self::default()
    }
}

/// Builds the party-mode configuration of a scene.
///
/// `resolve` returns the effective config of a box, if any. Party mode is off
/// when no box resolves to a named config, or when none of the named parties
/// ends up with a member.
pub fn prepare_party_mode_config<F>(
    scene: &Scene,
    resolve: F,
    global_settings: Option<&GlobalPartySettings>,
) -> PartyModeConfig
where
    F: Fn(&SceneBox) -> Option<PartyConfig>,
{
    let mut parties: BTreeMap<String, (PartyConfig, Vec<&SceneBox>)> = BTreeMap::new();
    for scene_box in &scene.boxes {
        if let Some(config) = resolve(scene_box).filter(PartyConfig::is_named) {
            parties
                .entry(config.name.clone())
                .or_insert_with(|| (config, Vec::new()))
                .1
                .push(scene_box);
        }
    }

    if parties.is_empty() {
        return PartyModeConfig::disabled();
    }

    let mut party_settings = BTreeMap::new();
    for (name, (config, boxes)) in parties {
        let members: Vec<String> = boxes
            .iter()
            .flat_map(|b| b.avatar_elements())
            .map(|element| element.avatar_display_name())
            .collect();

        if members.is_empty() {
            tracing::debug!("[PartyMode] Party '{}' has no resolvable members, skipping", name);
            continue;
        }

        let representative_name = config.representative_speaker.as_deref().and_then(|id| {
            boxes
                .iter()
                .flat_map(|b| b.avatar_elements())
                .find(|element| element.id == id)
                .map(|element| element.avatar_display_name())
        });

        let subset_size = config.effective_subset_size(members.len());
        party_settings.insert(
            name,
            PartySettings {
                members,
                representative_name,
                speaking_mode: config.speaking_mode,
                has_representative: config.has_representative,
                subset_size,
                enable_backchannel: config.enable_backchannel,
                description: config.description,
            },
        );
    }

    if party_settings.is_empty() {
        return PartyModeConfig::disabled();
    }

    PartyModeConfig {
        party_mode: true,
        party_settings,
        global_settings: global_settings.cloned(),
    }
}

/// Avatar name to party name, for every avatar in a box with a named config.
pub fn party_membership<F>(scene: &Scene, resolve: F) -> BTreeMap<String, String>
where
    F: Fn(&SceneBox) -> Option<PartyConfig>,
{
    let mut membership = BTreeMap::new();
    for scene_box in &scene.boxes {
        let Some(config) = resolve(scene_box).filter(PartyConfig::is_named) else {
            continue;
        };
        for element in scene_box.avatar_elements() {
            membership
                .entry(element.avatar_display_name())
                .or_insert_with(|| config.name.clone());
        }
    }
    membership
}

/// A conversation message as exchanged with the conversation manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessage {
    pub sender: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConversationMessage {
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            party: None,
            extra: Map::new(),
        }
    }
}

/// Annotates messages with the party of their sender.
///
/// Messages whose sender has no party pass through unchanged.
pub fn map_messages_to_parties(
    messages: Vec<ConversationMessage>,
    membership: &BTreeMap<String, String>,
) -> Vec<ConversationMessage> {
    messages
        .into_iter()
        .map(|mut message| {
            if let Some(party) = membership.get(&message.sender) {
                message.party = Some(party.clone());
            }
            message
        })
        .collect()
}
