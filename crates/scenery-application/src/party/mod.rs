//! Party application services.
//!
//! - `cache`: read-through cache of party templates
//! - `service`: template management, box assignment and party-mode derivation

mod cache;
mod service;

pub use cache::PartyConfigCache;
pub use service::PartyService;
