//! Error types for Scenery.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error shared by every scenery crate.
///
/// Variants are structured so callers can decide between skipping a record,
/// showing a message to the user, or logging and moving on.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum SceneryError {
    /// A scene, party, box or other entity does not exist
    #[error("{entity_type} '{id}' not found")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Filesystem failure
    #[error("IO error: {message}")]
    Io { message: String },

    /// A stored document or config file could not be (de)serialized
    #[error("Invalid {format}: {message}")]
    Serialization { format: String, message: String },

    /// Invalid configuration or argument
    #[error("Configuration error: {0}")]
    Config(String),

    /// The key-value store refused a write because it would exceed capacity
    #[error("Storage quota exceeded writing '{key}' ({size} bytes, quota {quota} bytes)")]
    QuotaExceeded { key: String, size: usize, quota: usize },

    /// Fetching an externally referenced payload failed
    #[error("Failed to fetch '{url}': {message}")]
    Fetch { url: String, message: String },

    /// An avatar runtime call failed
    #[error("Avatar runtime error: {0}")]
    Avatar(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SceneryError {
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn avatar(message: impl Into<String>) -> Self {
        Self::Avatar(message.into())
    }

    /// A JSON `Serialization` error.
    pub fn json(message: impl Into<String>) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: message.into(),
        }
    }

    fn toml(message: impl Into<String>) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }

    /// Whether a write was refused for lack of space. Callers surface these
    /// to the user instead of only logging them.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }

    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}

impl From<std::io::Error> for SceneryError {
    fn from(err: std::io::Error) -> Self {
        Self::io(format!("{} ({:?})", err, err.kind()))
    }
}

impl From<serde_json::Error> for SceneryError {
    fn from(err: serde_json::Error) -> Self {
        Self::json(err.to_string())
    }
}

impl From<toml::de::Error> for SceneryError {
    fn from(err: toml::de::Error) -> Self {
        Self::toml(err.to_string())
    }
}

impl From<toml::ser::Error> for SceneryError {
    fn from(err: toml::ser::Error) -> Self {
        Self::toml(err.to_string())
    }
}

impl From<anyhow::Error> for SceneryError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{:#}", err))
    }
}

pub type Result<T> = std::result::Result<T, SceneryError>;
