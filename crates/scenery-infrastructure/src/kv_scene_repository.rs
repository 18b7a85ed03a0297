//! `scene:` records over a key-value store.

use std::sync::Arc;

use async_trait::async_trait;
use scenery_core::error::Result;
use scenery_core::scene::{Scene, SceneEntry, SceneRepository, StoredScene};
use scenery_core::storage::KeyValueStore;
use scenery_core::storage::keys::{SCENE_PREFIX, scene_key};

use crate::dto::{parse_stored_scene, serialize_stored_scene};

/// Scene repository backed by a [`KeyValueStore`].
pub struct KvSceneRepository {
    store: Arc<dyn KeyValueStore>,
}

impl KvSceneRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn read_entry(&self, key: &str) -> Result<Option<SceneEntry>> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };

        match parse_stored_scene(key, &raw) {
            Ok(record) => Ok(Some(SceneEntry {
                key: key.to_string(),
                record,
            })),
            Err(e) => {
                tracing::warn!("[KvSceneRepository] Skipping malformed record {}: {}", key, e);
                Ok(None)
            }
        }
    }

    async fn write(&self, key: &str, json: String) -> Result<usize> {
        let size = json.len();
        self.store.set(key, json).await?;
        tracing::debug!("[KvSceneRepository] Wrote {} ({} bytes)", key, size);
        Ok(size)
    }
}

#[async_trait]
impl SceneRepository for KvSceneRepository {
    async fn entries(&self) -> Result<Vec<SceneEntry>> {
        let keys = self.store.keys_with_prefix(SCENE_PREFIX).await?;
        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(entry) = self.read_entry(&key).await? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    async fn find(&self, scene_id: &str) -> Result<Option<SceneEntry>> {
        if let Some(entry) = self.read_entry(&scene_key(scene_id)).await?
            && entry.record.id() == scene_id
        {
            return Ok(Some(entry));
        }

        // Legacy entries may be keyed by name; fall back to the newest match.
        let found = self
            .entries()
            .await?
            .into_iter()
            .filter(|entry| entry.record.id() == scene_id)
            .max_by_key(|entry| entry.record.timestamp());
        Ok(found)
    }

    async fn save_full(&self, scene: &Scene) -> Result<usize> {
        let json = serde_json::to_string(scene)?;
        self.write(&scene_key(&scene.id), json).await
    }

    async fn save_record(&self, record: &StoredScene) -> Result<usize> {
        let json = serialize_stored_scene(record)?;
        self.write(&scene_key(record.id()), json).await
    }

    fn serialized_size(&self, scene: &Scene) -> Result<usize> {
        Ok(serde_json::to_vec(scene)?.len())
    }

    async fn remove_key(&self, key: &str) -> Result<bool> {
        self.store.remove(key).await
    }
}
