//! Scene repository trait.
//!
//! Defines the interface for scene record persistence operations.

use super::model::Scene;
use super::record::{SceneEntry, StoredScene};
use crate::error::Result;

/// An abstract repository for `scene:` records.
///
/// Implementations normalize legacy record shapes on read and always write
/// the canonical shape.
#[async_trait::async_trait]
pub trait SceneRepository: Send + Sync {
    /// Reads every parseable scene entry. Malformed entries are skipped and
    /// logged, never returned as errors.
    async fn entries(&self) -> Result<Vec<SceneEntry>>;

    /// Finds a scene by id: direct key lookup first, then a scan comparing ids.
    async fn find(&self, scene_id: &str) -> Result<Option<SceneEntry>>;

    /// Writes a full scene under its canonical key.
    ///
    /// Returns the number of bytes written.
    async fn save_full(&self, scene: &Scene) -> Result<usize>;

    /// Writes a record under its canonical key.
    async fn save_record(&self, record: &StoredScene) -> Result<usize>;

    /// Serialized size in bytes of a full scene record.
    fn serialized_size(&self, scene: &Scene) -> Result<usize>;

    /// Removes a raw key.
    async fn remove_key(&self, key: &str) -> Result<bool>;
}
