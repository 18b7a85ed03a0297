//! Payload fetcher for `http(s)://` and `file://` URLs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scenery_core::blob::PayloadFetcher;
use scenery_core::error::{Result, SceneryError};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches payloads over HTTP or from the local filesystem.
#[derive(Clone)]
pub struct HttpPayloadFetcher {
    client: Client,
}

impl HttpPayloadFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| SceneryError::internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn fetch_http(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SceneryError::fetch(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SceneryError::fetch(url, format!("HTTP status {}", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SceneryError::fetch(url, e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl PayloadFetcher for HttpPayloadFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!("[HttpPayloadFetcher] Fetching {}", url);

        if let Some(path) = url.strip_prefix("file://") {
            return tokio::fs::read(path)
                .await
                .map_err(|e| SceneryError::fetch(url, e.to_string()));
        }

        if url.starts_with("http://") || url.starts_with("https://") {
            return self.fetch_http(url).await;
        }

        Err(SceneryError::fetch(url, "unsupported URL scheme"))
    }
}
