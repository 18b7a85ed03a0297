//! Human and AI participant bookkeeping.

pub mod model;
pub mod repository;

pub use model::{AiPanelData, Participant};
pub use repository::ParticipantRepository;
