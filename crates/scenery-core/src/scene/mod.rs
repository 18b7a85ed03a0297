//! Scene module.
//!
//! # Module Structure
//!
//! - `model`: scenes, boxes, elements and avatar data
//! - `record`: what a `scene:` key stores (full scene or file reference)
//! - `catalog`: listing and duplicate detection over stored entries
//! - `repository`: repository trait for scene persistence

pub mod catalog;
pub mod model;
pub mod record;
pub mod repository;

pub use catalog::{SceneGroup, duplicate_keys, group_by_id, list_summaries};
pub use model::{
    AvatarData, Element, ElementType, Scene, SceneBox, generate_scene_id, now_millis,
};
pub use record::{BoxPreview, FileReference, SceneEntry, ScenePreview, SceneSummary, StoredScene};
pub use repository::SceneRepository;
