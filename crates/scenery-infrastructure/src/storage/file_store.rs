//! JSON-file backed key-value store.
//!
//! The whole namespace is one JSON object on disk, cached in memory. Each
//! write rebuilds the map, checks the quota and persists it atomically; the
//! cache only changes once the file write succeeded.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use scenery_core::error::{Result, SceneryError};
use scenery_core::storage::KeyValueStore;
use tokio::sync::Mutex;

use super::atomic_json::AtomicJsonFile;
use super::check_quota;

type Entries = BTreeMap<String, String>;

/// Key-value store persisted to a single JSON file.
pub struct FileKeyValueStore {
    path: PathBuf,
    entries: Mutex<Entries>,
    quota_bytes: usize,
}

impl FileKeyValueStore {
    /// Opens (or creates on first write) the store at `path`.
    pub async fn open(path: impl Into<PathBuf>, quota_bytes: usize) -> Result<Self> {
        let path = path.into();
        let load_path = path.clone();
        let entries = tokio::task::spawn_blocking(move || {
            AtomicJsonFile::<Entries>::new(load_path).load()
        })
        .await
        .map_err(|e| SceneryError::internal(format!("Failed to join task: {}", e)))??
        .unwrap_or_default();

        tracing::debug!(
            "[FileKeyValueStore] Opened {} ({} keys)",
            path.display(),
            entries.len()
        );

        Ok(Self {
            path,
            entries: Mutex::new(entries),
            quota_bytes,
        })
    }

    async fn persist(&self, entries: Entries) -> Result<Entries> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            AtomicJsonFile::<Entries>::new(path).save(&entries)?;
            Ok(entries)
        })
        .await
        .map_err(|e| SceneryError::internal(format!("Failed to join task: {}", e)))?
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let mut entries = self.entries.lock().await;
        check_quota(&entries, key, &value, self.quota_bytes)?;

        let mut next = entries.clone();
        next.insert(key.to_string(), value);
        *entries = self.persist(next).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.lock().await;
        if !entries.contains_key(key) {
            return Ok(false);
        }

        let mut next = entries.clone();
        next.remove(key);
        *entries = self.persist(next).await?;
        Ok(true)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.lock().await.keys().cloned().collect())
    }
}
