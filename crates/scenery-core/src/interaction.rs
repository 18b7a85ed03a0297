//! User-facing prompts and notices.

use serde::{Deserialize, Serialize};

/// Severity of a user-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// The user at the other end of the editor.
#[async_trait::async_trait]
pub trait UserPrompt: Send + Sync {
    /// Asks a yes/no question.
    async fn confirm(&self, message: &str) -> bool;

    /// Shows a notice.
    async fn notify(&self, notice: Notice);

    /// Asks the user for the payload of a scene whose stored file could not
    /// be fetched. `None` means the user gave up.
    async fn provide_scene_file(&self, scene_name: &str, file_url: &str) -> Option<Vec<u8>>;
}
