//! Party domain model.
//!
//! A party is a named group of avatars sharing a speaking-mode policy. Party
//! templates are keyed by name; boxes refer to a party by that name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Policy governing which party members produce output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpeakingMode {
    /// One randomly chosen member speaks.
    Random,
    /// Every member speaks.
    #[default]
    All,
    /// Only the configured representative speaks.
    Representative,
    /// A subset of `subset_size` members speaks.
    Subset,
}

impl SpeakingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::All => "all",
            Self::Representative => "representative",
            Self::Subset => "subset",
        }
    }
}

impl std::str::FromStr for SpeakingMode {
    type Err = crate::SceneryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(Self::Random),
            "all" => Ok(Self::All),
            "representative" => Ok(Self::Representative),
            "subset" => Ok(Self::Subset),
            other => Err(crate::SceneryError::config(format!(
                "Unknown speaking mode '{}'",
                other
            ))),
        }
    }
}

/// Configuration of a party.
///
/// Used both as the reusable template (`savedParties`) and as the derived
/// per-box copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PartyConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub speaking_mode: SpeakingMode,
    #[serde(default)]
    pub has_representative: bool,
    /// Element id of the representative avatar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub representative_speaker: Option<String>,
    /// Number of speakers in `Subset` mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subset_size: Option<u32>,
    #[serde(default)]
    pub enable_backchannel: bool,
}

impl PartyConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Whether this config names a party.
    pub fn is_named(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// Subset size to use for `member_count` members, or `None` outside of
    /// subset mode.
    pub fn effective_subset_size(&self, member_count: usize) -> Option<u32> {
        match self.speaking_mode {
            SpeakingMode::Subset => Some(
                self.subset_size
                    .filter(|size| *size > 0)
                    .unwrap_or_else(|| default_subset_size(member_count)),
            ),
            _ => None,
        }
    }
}

/// Default subset size: half the members rounded up, at least one.
pub fn default_subset_size(member_count: usize) -> u32 {
    let half = member_count.div_ceil(2);
    u32::try_from(half).unwrap_or(u32::MAX).max(1)
}

/// Map of box id to party config, as stored under `partyConfigs`.
pub type PartyConfigMap = BTreeMap<String, PartyConfig>;

/// How turns pass between parties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PartyTurnMode {
    #[default]
    Sequential,
    Random,
    Free,
}

/// Cross-party turn-taking configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GlobalPartySettings {
    #[serde(default)]
    pub party_turn_mode: PartyTurnMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moderator_party: Option<String>,
    #[serde(default)]
    pub enable_backchannel: bool,
}
