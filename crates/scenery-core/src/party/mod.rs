//! Party assignment module.
//!
//! Parties group avatars into conversation sub-groups through the `party`
//! tag of the box they sit in.
//!
//! # Module Structure
//!
//! - `model`: party configs, speaking modes and global settings
//! - `grouping`: avatar bucketing by party for display
//! - `mode_config`: party-mode configuration and message annotation
//! - `repository`: repository trait for party persistence

pub mod grouping;
pub mod mode_config;
pub mod model;
pub mod repository;

pub use grouping::{PartyBucket, PartyGrouping, group_by_party};
pub use mode_config::{
    ConversationMessage, PartyModeConfig, PartySettings, map_messages_to_parties,
    party_membership, prepare_party_mode_config,
};
pub use model::{
    GlobalPartySettings, PartyConfig, PartyConfigMap, PartyTurnMode, SpeakingMode,
    default_subset_size,
};
pub use repository::PartyRepository;
