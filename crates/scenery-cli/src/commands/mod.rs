pub mod participants;
pub mod party;
pub mod scenes;
