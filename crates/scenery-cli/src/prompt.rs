use std::io::Write;

use async_trait::async_trait;
use scenery_core::interaction::{Notice, NoticeLevel, UserPrompt};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Terminal prompt reading answers from stdin.
///
/// With `assume_yes` every confirmation is accepted and no file is asked for.
pub struct StdinPrompt {
    assume_yes: bool,
}

impl StdinPrompt {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }

    async fn ask(&self, question: &str) -> Option<String> {
        print!("{} ", question);
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        match BufReader::new(tokio::io::stdin()).read_line(&mut line).await {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_string()),
            Err(e) => {
                tracing::warn!("[Prompt] Failed to read stdin: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl UserPrompt for StdinPrompt {
    async fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        let answer = self.ask(&format!("{} [y/N]", message)).await;
        matches!(answer.as_deref(), Some("y" | "Y" | "yes"))
    }

    async fn notify(&self, notice: Notice) {
        let tag = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        eprintln!("{}: {}", tag, notice.message);
    }

    async fn provide_scene_file(&self, scene_name: &str, file_url: &str) -> Option<Vec<u8>> {
        if self.assume_yes {
            return None;
        }
        eprintln!("The payload of '{}' was stored at {}", scene_name, file_url);
        let path = self
            .ask("Path to an exported copy of the scene (empty to skip):")
            .await
            .filter(|p| !p.is_empty())?;

        match tokio::fs::read(&path).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!("[Prompt] Failed to read {}: {}", path, e);
                None
            }
        }
    }
}
