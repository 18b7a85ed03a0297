//! Stored scene records.
//!
//! A `scene:<id>` entry holds either the full scene or, when the payload was
//! too large for the store, a small file-reference record pointing at the
//! externally stored payload plus a preview for thumbnails.

use serde::{Deserialize, Serialize};

use super::model::{Scene, SceneBox};

/// Box-level data kept in a file-reference preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BoxPreview {
    pub id: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub avatar_names: Vec<String>,
    #[serde(default)]
    pub has_avatar: bool,
    #[serde(default)]
    pub has_content: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party: Option<String>,
}

impl From<&SceneBox> for BoxPreview {
    fn from(scene_box: &SceneBox) -> Self {
        Self {
            id: scene_box.id.clone(),
            x: scene_box.x,
            y: scene_box.y,
            width: scene_box.width,
            height: scene_box.height,
            avatar_names: scene_box.avatar_names(),
            has_avatar: scene_box.has_avatar(),
            has_content: scene_box.has_content(),
            party: scene_box.party.clone(),
        }
    }
}

/// Thumbnail-relevant data derived from a full scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScenePreview {
    #[serde(default)]
    pub boxes: Vec<BoxPreview>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
}

impl From<&Scene> for ScenePreview {
    fn from(scene: &Scene) -> Self {
        Self {
            boxes: scene.boxes.iter().map(BoxPreview::from).collect(),
            background_image: scene.background_image.clone(),
        }
    }
}

fn always_true() -> bool {
    true
}

/// Metadata record stored in place of an oversized scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReference {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub timestamp: i64,
    pub file_url: String,
    /// Serialized size of the full payload in bytes.
    #[serde(default)]
    pub size: usize,
    #[serde(default = "always_true")]
    pub is_file_reference: bool,
    #[serde(default)]
    pub preview: ScenePreview,
}

impl FileReference {
    /// Builds the reference record for a scene stored at `file_url`.
    pub fn for_scene(scene: &Scene, file_url: impl Into<String>, size: usize) -> Self {
        Self {
            id: scene.id.clone(),
            name: scene.name.clone(),
            timestamp: scene.timestamp,
            file_url: file_url.into(),
            size,
            is_file_reference: true,
            preview: ScenePreview::from(scene),
        }
    }
}

/// What a `scene:` key holds.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredScene {
    Full(Scene),
    FileReference(FileReference),
}

impl StoredScene {
    pub fn id(&self) -> &str {
        match self {
            Self::Full(scene) => &scene.id,
            Self::FileReference(reference) => &reference.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Full(scene) => &scene.name,
            Self::FileReference(reference) => &reference.name,
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            Self::Full(scene) => scene.timestamp,
            Self::FileReference(reference) => reference.timestamp,
        }
    }

    pub fn is_file_reference(&self) -> bool {
        matches!(self, Self::FileReference(_))
    }

    /// Box ids of the record, taken from the preview for file references.
    pub fn box_ids(&self) -> Vec<String> {
        match self {
            Self::Full(scene) => scene.box_ids(),
            Self::FileReference(reference) => reference
                .preview
                .boxes
                .iter()
                .map(|b| b.id.clone())
                .collect(),
        }
    }

    pub fn box_count(&self) -> usize {
        match self {
            Self::Full(scene) => scene.boxes.len(),
            Self::FileReference(reference) => reference.preview.boxes.len(),
        }
    }
}

/// A parsed record together with the key it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneEntry {
    pub key: String,
    pub record: StoredScene,
}

/// One row of the visible scene list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneSummary {
    pub key: String,
    pub id: String,
    pub name: String,
    pub timestamp: i64,
    pub is_file_reference: bool,
    pub box_count: usize,
}

impl From<&SceneEntry> for SceneSummary {
    fn from(entry: &SceneEntry) -> Self {
        Self {
            key: entry.key.clone(),
            id: entry.record.id().to_string(),
            name: entry.record.name().to_string(),
            timestamp: entry.record.timestamp(),
            is_file_reference: entry.record.is_file_reference(),
            box_count: entry.record.box_count(),
        }
    }
}
