//! Grouping of avatars by party for display.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::model::{PartyConfig, SpeakingMode};
use crate::scene::Scene;

/// Avatars of one party with the party's speaking settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyBucket {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub members: Vec<String>,
    pub box_ids: Vec<String>,
    pub speaking_mode: SpeakingMode,
    pub has_representative: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub representative_speaker: Option<String>,
    /// Present only in subset mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subset_size: Option<u32>,
    pub enable_backchannel: bool,
}

/// Result of [`group_by_party`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PartyGrouping {
    pub parties: BTreeMap<String, PartyBucket>,
    pub unassigned_avatars: Vec<String>,
}

impl PartyGrouping {
    /// Party of an avatar, if it was bucketed into one.
    pub fn party_of(&self, avatar_name: &str) -> Option<&str> {
        self.parties
            .values()
            .find(|p| p.members.iter().any(|m| m == avatar_name))
            .map(|p| p.name.as_str())
    }
}

/// Buckets avatars by the party of the box they sit in.
///
/// `configs` maps party name to its config. An avatar lands in
/// `unassigned_avatars` when it is in no box of the scene, when its box has no
/// party, or when that party has no config.
pub fn group_by_party(
    avatar_names: &[String],
    scene: Option<&Scene>,
    configs: &BTreeMap<String, PartyConfig>,
) -> PartyGrouping {
    // avatar name -> box id (first box wins)
    let mut avatar_box: BTreeMap<&str, &str> = BTreeMap::new();
    // box id -> party name
    let mut box_party: BTreeMap<&str, &str> = BTreeMap::new();

    if let Some(scene) = scene {
        for scene_box in &scene.boxes {
            for avatar in scene_box.avatars() {
                avatar_box
                    .entry(avatar.name.as_str())
                    .or_insert(scene_box.id.as_str());
            }
            if let Some(party) = scene_box.party.as_deref().filter(|p| !p.is_empty()) {
                box_party.insert(scene_box.id.as_str(), party);
            }
        }
    }

    let mut grouping = PartyGrouping::default();
    let mut members: BTreeMap<&str, (Vec<String>, Vec<String>)> = BTreeMap::new();

    for name in avatar_names {
        let party = avatar_box
            .get(name.as_str())
            .and_then(|box_id| box_party.get(box_id).map(|party| (*box_id, *party)))
            .filter(|(_, party)| configs.contains_key(*party));

        match party {
            Some((box_id, party)) => {
                let (names, boxes) = members.entry(party).or_default();
                names.push(name.clone());
                if !boxes.iter().any(|b| b == box_id) {
                    boxes.push(box_id.to_string());
                }
            }
            None => grouping.unassigned_avatars.push(name.clone()),
        }
    }

    for (party, (names, box_ids)) in members {
        let Some(config) = configs.get(party) else {
            continue;
        };
        let subset_size = config.effective_subset_size(names.len());
        grouping.parties.insert(
            party.to_string(),
            PartyBucket {
                name: party.to_string(),
                description: config.description.clone(),
                members: names,
                box_ids,
                speaking_mode: config.speaking_mode,
                has_representative: config.has_representative,
                representative_speaker: config.representative_speaker.clone(),
                subset_size,
                enable_backchannel: config.enable_backchannel,
            },
        );
    }

    grouping
}
