//! Data Transfer Objects (DTOs) for persistence.
//!
//! Stored records carry no schema version; instead the DTOs accept every
//! shape the editor has ever written and convert to the domain model, which
//! is always written back in its current shape.

mod scene;

pub use scene::{parse_full_scene, parse_stored_scene, serialize_stored_scene};
