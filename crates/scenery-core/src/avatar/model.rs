//! Per-avatar saved configuration.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Configuration saved under `avatar-config-<name>`.
///
/// Keyed by avatar name: renaming an avatar leaves its old configuration
/// behind under the previous name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AvatarConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(default)]
    pub settings: Map<String, Value>,
    #[serde(default)]
    pub custom_attributes: Map<String, Value>,
}
