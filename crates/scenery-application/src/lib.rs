//! Application layer for scenery.
//!
//! Services coordinating the domain contracts of `scenery-core` with the
//! key-value backed repositories of `scenery-infrastructure`.

pub mod avatar_lifecycle;
pub mod participant_sync;
pub mod party;
pub mod scene_store;
pub mod services;

pub use avatar_lifecycle::{AvatarFailure, AvatarLifecycle, AvatarReport};
pub use participant_sync::{HumanSyncReport, ParticipantSync};
pub use party::{PartyConfigCache, PartyService};
pub use scene_store::{LoadedScene, SaveOutcome, SceneStore, SceneStoreDeps};
pub use services::{Collaborators, SceneryServices};
