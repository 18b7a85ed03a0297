//! In-process blob store.

use std::collections::HashMap;

use async_trait::async_trait;
use scenery_core::blob::{BlobStore, PayloadFetcher};
use scenery_core::error::{Result, SceneryError};
use tokio::sync::RwLock;
use uuid::Uuid;

/// URL scheme and authority of blobs created by [`MemoryBlobStore`].
pub const MEMORY_BLOB_PREFIX: &str = "blob:scenery/";

/// Blob store keeping payloads in memory for the lifetime of the process.
///
/// Like browser object URLs, the returned URLs stop resolving once the store
/// is dropped.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, scene_id: &str, payload: Vec<u8>) -> Result<String> {
        let url = format!("{}{}", MEMORY_BLOB_PREFIX, Uuid::new_v4());
        tracing::debug!(
            "[MemoryBlobStore] Stored {} bytes for scene {} at {}",
            payload.len(),
            scene_id,
            url
        );
        self.blobs.write().await.insert(url.clone(), payload);
        Ok(url)
    }

    async fn remove(&self, url: &str) -> Result<bool> {
        Ok(self.blobs.write().await.remove(url).is_some())
    }
}

#[async_trait]
impl PayloadFetcher for MemoryBlobStore {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.blobs
            .read()
            .await
            .get(url)
            .cloned()
            .ok_or_else(|| SceneryError::fetch(url, "blob URL is no longer valid"))
    }
}
