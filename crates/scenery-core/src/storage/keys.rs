//! Key layout of the shared namespace.

/// Prefix of every scene record key.
pub const SCENE_PREFIX: &str = "scene:";

/// Map of box id to party config.
pub const PARTY_CONFIGS: &str = "partyConfigs";

/// List of reusable party templates.
pub const SAVED_PARTIES: &str = "savedParties";

/// Cross-party turn-taking configuration.
pub const GLOBAL_PARTY_SETTINGS: &str = "globalPartySettings";

/// Prefix of per-avatar configuration keys.
pub const AVATAR_CONFIG_PREFIX: &str = "avatar-config-";

/// AI panel selection and topic record.
pub const AI_PANEL_DATA: &str = "aiPanelData";

/// Participant list read by the conversation manager.
pub const TOPIC_PANEL_PARTICIPANTS: &str = "topicPanel-participants";

/// Returns the canonical key of a scene.
pub fn scene_key(scene_id: &str) -> String {
    format!("{SCENE_PREFIX}{scene_id}")
}

/// Returns the key of an avatar's saved configuration.
pub fn avatar_config_key(avatar_name: &str) -> String {
    format!("{AVATAR_CONFIG_PREFIX}{avatar_name}")
}

/// Returns the part of a scene key after the prefix.
pub fn scene_key_suffix(key: &str) -> Option<&str> {
    key.strip_prefix(SCENE_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_key_round_trip() {
        let key = scene_key("scene-1-abc");
        assert_eq!(key, "scene:scene-1-abc");
        assert_eq!(scene_key_suffix(&key), Some("scene-1-abc"));
        assert_eq!(scene_key_suffix("partyConfigs"), None);
    }

    #[test]
    fn test_avatar_config_key() {
        assert_eq!(avatar_config_key("Alice"), "avatar-config-Alice");
    }
}
