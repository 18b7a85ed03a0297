//! Domain layer of Scenery.
//!
//! Models, pure derivations and the contracts (repository and collaborator
//! traits) the infrastructure and application layers implement and use.

pub mod avatar;
pub mod blob;
pub mod config;
pub mod error;
pub mod event;
pub mod interaction;
pub mod participant;
pub mod party;
pub mod scene;
pub mod state;
pub mod storage;

// Re-export common error type
pub use error::SceneryError;
