//! Scene domain model.
//!
//! A scene is an arrangement of boxes; each box holds avatar and content
//! elements and may be tagged with the party its avatars belong to.

use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::party::{GlobalPartySettings, PartyConfig};

/// Identity and runtime flags of an avatar placed in a box.
///
/// `name` is the join key across storage keys (scene data, avatar config,
/// participant list). Fields the editor attaches that this crate does not
/// interpret (model urls, voice ids, ...) are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarData {
    /// Empty when the record has none; see `Element::avatar_display_name`.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_human: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AvatarData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_human: false,
            extra: Map::new(),
        }
    }
}

/// Kind of an element inside a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Avatar,
    Content,
    #[default]
    #[serde(other)]
    Other,
}

/// A single element of a box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: String,
    #[serde(default)]
    pub element_type: ElementType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_data: Option<AvatarData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Element {
    /// Creates an avatar element.
    pub fn avatar(id: impl Into<String>, avatar: AvatarData) -> Self {
        Self {
            id: id.into(),
            element_type: ElementType::Avatar,
            avatar_data: Some(avatar),
            content: None,
            extra: Map::new(),
        }
    }

    /// Creates a content element.
    pub fn content(id: impl Into<String>, content: Value) -> Self {
        Self {
            id: id.into(),
            element_type: ElementType::Content,
            avatar_data: None,
            content: Some(content),
            extra: Map::new(),
        }
    }

    /// Returns the avatar data when this is an avatar element.
    pub fn as_avatar(&self) -> Option<&AvatarData> {
        match self.element_type {
            ElementType::Avatar => self.avatar_data.as_ref(),
            _ => None,
        }
    }

    /// Display name of the avatar, synthesized from the element id when the
    /// stored name is missing.
    pub fn avatar_display_name(&self) -> String {
        match self.as_avatar() {
            Some(avatar) if !avatar.name.trim().is_empty() => avatar.name.clone(),
            _ => format!("Avatar{}", self.id),
        }
    }
}

/// A positioned container of elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SceneBox {
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
    pub elements: Vec<Element>,
    /// Name of the party this box belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party: Option<String>,
    /// Denormalized copy of the party's config. Derived data, rewritten by
    /// the party service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_config: Option<PartyConfig>,
}

impl SceneBox {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Iterates over avatar elements.
    pub fn avatar_elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(|e| e.as_avatar().is_some())
    }

    /// Iterates over the avatars of this box.
    pub fn avatars(&self) -> impl Iterator<Item = &AvatarData> {
        self.elements.iter().filter_map(Element::as_avatar)
    }

    pub fn avatars_mut(&mut self) -> impl Iterator<Item = &mut AvatarData> {
        self.elements
            .iter_mut()
            .filter(|e| e.element_type == ElementType::Avatar)
            .filter_map(|e| e.avatar_data.as_mut())
    }

    pub fn has_avatar(&self) -> bool {
        self.avatars().next().is_some()
    }

    pub fn has_content(&self) -> bool {
        self.elements
            .iter()
            .any(|e| e.element_type == ElementType::Content)
    }

    pub fn avatar_names(&self) -> Vec<String> {
        self.avatar_elements()
            .map(Element::avatar_display_name)
            .collect()
    }
}

/// A saved arrangement of boxes representing one conversation setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub boxes: Vec<SceneBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_party_settings: Option<GlobalPartySettings>,
    /// Milliseconds since the epoch of the last persist (0 = never).
    #[serde(default)]
    pub timestamp: i64,
    /// In-memory dirty flag.
    #[serde(skip)]
    pub has_unsaved_changes: bool,
}

impl Scene {
    /// Creates an empty scene with a freshly generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_scene_id(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Fills in a generated id when the scene has none.
    pub fn ensure_id(&mut self) {
        if self.id.trim().is_empty() {
            self.id = generate_scene_id();
        }
    }

    pub fn box_ids(&self) -> Vec<String> {
        self.boxes.iter().map(|b| b.id.clone()).collect()
    }

    pub fn find_box(&self, box_id: &str) -> Option<&SceneBox> {
        self.boxes.iter().find(|b| b.id == box_id)
    }

    pub fn find_box_mut(&mut self, box_id: &str) -> Option<&mut SceneBox> {
        self.boxes.iter_mut().find(|b| b.id == box_id)
    }

    /// Iterates over every avatar element together with its box.
    pub fn avatar_elements(&self) -> impl Iterator<Item = (&SceneBox, &Element)> {
        self.boxes
            .iter()
            .flat_map(|b| b.avatar_elements().map(move |e| (b, e)))
    }

    /// Sets `is_human` on every avatar from the given participant names.
    ///
    /// Returns the number of avatars whose flag changed.
    pub fn stamp_human_participants(&mut self, human_names: &[String]) -> usize {
        let mut changed = 0;
        for scene_box in &mut self.boxes {
            for avatar in scene_box.avatars_mut() {
                let is_human = human_names.iter().any(|n| n == &avatar.name);
                if avatar.is_human != is_human {
                    avatar.is_human = is_human;
                    changed += 1;
                }
            }
        }
        changed
    }
}

/// Generates a scene id of the form `scene-<millis>-<random>`.
pub fn generate_scene_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    format!("scene-{}-{}", chrono::Utc::now().timestamp_millis(), suffix)
}

/// Current time in milliseconds since the epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene_with_avatars() -> Scene {
        let mut scene = Scene::new("Panel");
        let mut b1 = SceneBox::new("b1");
        b1.elements
            .push(Element::avatar("e1", AvatarData::new("Alice")));
        b1.elements
            .push(Element::content("c1", serde_json::json!({"text": "hi"})));
        let mut b2 = SceneBox::new("b2");
        b2.elements.push(Element::avatar("e2", AvatarData::new("Bob")));
        scene.boxes = vec![b1, b2];
        scene
    }

    #[test]
    fn test_generate_scene_id_shape() {
        let id = generate_scene_id();
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "scene");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
        assert_ne!(id, generate_scene_id());
    }

    #[test]
    fn test_box_flags() {
        let scene = scene_with_avatars();
        assert!(scene.boxes[0].has_avatar());
        assert!(scene.boxes[0].has_content());
        assert!(!scene.boxes[1].has_content());
        assert_eq!(scene.boxes[0].avatar_names(), vec!["Alice".to_string()]);
    }

    #[test]
    fn test_stamp_human_participants() {
        let mut scene = scene_with_avatars();
        let changed = scene.stamp_human_participants(&["Bob".to_string()]);
        assert_eq!(changed, 1);
        assert!(!scene.boxes[0].avatars().next().unwrap().is_human);
        assert!(scene.boxes[1].avatars().next().unwrap().is_human);

        // Idempotent
        assert_eq!(scene.stamp_human_participants(&["Bob".to_string()]), 0);
    }

    #[test]
    fn test_avatar_display_name_fallback() {
        let element = Element::avatar("e9", AvatarData::new(""));
        assert_eq!(element.avatar_display_name(), "Avatare9");
    }

    #[test]
    fn test_unknown_element_type_and_extra_fields() {
        let json = serde_json::json!({
            "id": "x1",
            "elementType": "sticker",
            "url": "https://example.com/s.png"
        });
        let element: Element = serde_json::from_value(json).unwrap();
        assert_eq!(element.element_type, ElementType::Other);
        assert_eq!(
            element.extra.get("url").and_then(Value::as_str),
            Some("https://example.com/s.png")
        );
    }

    #[test]
    fn test_dirty_flag_not_serialized() {
        let mut scene = scene_with_avatars();
        scene.has_unsaved_changes = true;
        let value = serde_json::to_value(&scene).unwrap();
        assert!(value.get("hasUnsavedChanges").is_none());
        assert!(value.get("boxes").is_some());
    }
}
