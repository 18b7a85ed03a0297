//! Scene record DTOs and legacy shape normalization.
//!
//! Stored boxes come in three shapes that can coexist in one record:
//! - `elements`: current format, typed elements
//! - `avatarSlots`: slot records each carrying `avatarData`
//! - `avatarData`: a single avatar directly on the box
//!
//! Everything is folded into `elements` here, once, on read. Writes always
//! use the canonical domain shape.

use scenery_core::error::{Result, SceneryError};
use scenery_core::party::{GlobalPartySettings, PartyConfig};
use scenery_core::scene::{
    AvatarData, Element, ElementType, FileReference, Scene, SceneBox, StoredScene,
};
use scenery_core::storage::keys::scene_key_suffix;
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SceneDto {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    boxes: Vec<BoxDto>,
    #[serde(default)]
    background_image: Option<String>,
    #[serde(default)]
    global_party_settings: Option<GlobalPartySettings>,
    #[serde(default)]
    timestamp: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoxDto {
    #[serde(default)]
    id: String,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default)]
    width: f64,
    #[serde(default)]
    height: f64,
    #[serde(default)]
    elements: Option<Vec<ElementDto>>,
    #[serde(default)]
    avatar_slots: Option<Vec<AvatarSlotDto>>,
    #[serde(default)]
    avatar_data: Option<AvatarData>,
    #[serde(default)]
    party: Option<String>,
    #[serde(default)]
    party_config: Option<PartyConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ElementDto {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    element_type: Option<ElementType>,
    #[serde(default)]
    avatar_data: Option<AvatarData>,
    #[serde(default)]
    content: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvatarSlotDto {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    avatar_data: Option<AvatarData>,
}

/// Ids are sometimes stored as numbers.
fn id_string(id: Option<Value>) -> Option<String> {
    match id? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Timestamps are millis, or RFC 3339 strings in old records.
fn timestamp_millis(value: Option<Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => chrono::DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.timestamp_millis())
            .or_else(|_| s.parse::<i64>())
            .unwrap_or(0),
        _ => 0,
    }
}

impl ElementDto {
    fn into_domain(self, box_id: &str, index: usize) -> Element {
        let element_type = self.element_type.unwrap_or(if self.avatar_data.is_some() {
            ElementType::Avatar
        } else if self.content.is_some() {
            ElementType::Content
        } else {
            ElementType::Other
        });

        Element {
            id: id_string(self.id).unwrap_or_else(|| format!("{}-el-{}", box_id, index)),
            element_type,
            avatar_data: self.avatar_data,
            content: self.content,
            extra: self.extra,
        }
    }
}

/// Appends a legacy avatar unless an avatar of that name is already present.
fn push_legacy_avatar(elements: &mut Vec<Element>, element_id: String, avatar: AvatarData) {
    let known = elements
        .iter()
        .filter_map(Element::as_avatar)
        .any(|a| !avatar.name.is_empty() && a.name == avatar.name);
    if !known {
        elements.push(Element::avatar(element_id, avatar));
    }
}

impl BoxDto {
    fn into_domain(self, index: usize) -> SceneBox {
        let id = if self.id.is_empty() {
            format!("box-{}", index)
        } else {
            self.id
        };

        let mut elements: Vec<Element> = self
            .elements
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, e)| e.into_domain(&id, i))
            .collect();

        for (i, slot) in self.avatar_slots.unwrap_or_default().into_iter().enumerate() {
            if let Some(avatar) = slot.avatar_data {
                let element_id = id_string(slot.id).unwrap_or_else(|| format!("{}-slot-{}", id, i));
                push_legacy_avatar(&mut elements, element_id, avatar);
            }
        }

        if let Some(avatar) = self.avatar_data {
            push_legacy_avatar(&mut elements, format!("{}-avatar", id), avatar);
        }

        SceneBox {
            id,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            elements,
            party: self.party.filter(|p| !p.is_empty()),
            party_config: self.party_config,
        }
    }
}

impl SceneDto {
    fn into_domain(self, key: &str) -> Result<Scene> {
        let id = if self.id.is_empty() {
            scene_key_suffix(key).unwrap_or_default().to_string()
        } else {
            self.id
        };
        if id.is_empty() {
            return Err(SceneryError::json(format!(
                "Scene record '{}' has no id",
                key
            )));
        }

        Ok(Scene {
            id,
            name: self.name,
            boxes: self
                .boxes
                .into_iter()
                .enumerate()
                .map(|(i, b)| b.into_domain(i))
                .collect(),
            background_image: self.background_image,
            global_party_settings: self.global_party_settings,
            timestamp: timestamp_millis(self.timestamp),
            has_unsaved_changes: false,
        })
    }
}

/// Parses the raw value of a `scene:` key.
pub fn parse_stored_scene(key: &str, raw: &str) -> Result<StoredScene> {
    let value: Value = serde_json::from_str(raw)?;
    if !value.is_object() {
        return Err(SceneryError::json(format!(
            "Scene record '{}' is not an object",
            key
        )));
    }

    let is_reference = value
        .get("isFileReference")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    if is_reference {
        let reference: FileReference = serde_json::from_value(value)?;
        return Ok(StoredScene::FileReference(reference));
    }

    parse_full_scene(key, value).map(StoredScene::Full)
}

/// Parses a full scene payload (stored record or fetched file).
pub fn parse_full_scene(key: &str, value: Value) -> Result<Scene> {
    let dto: SceneDto = serde_json::from_value(value)?;
    dto.into_domain(key)
}

/// Serializes a record in the canonical shape.
pub fn serialize_stored_scene(record: &StoredScene) -> Result<String> {
    let json = match record {
        StoredScene::Full(scene) => serde_json::to_string(scene)?,
        StoredScene::FileReference(reference) => serde_json::to_string(reference)?,
    };
    Ok(json)
}
