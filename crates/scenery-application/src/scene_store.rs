//! Scene store.
//!
//! CRUD over `scene:` records plus the working set of open scenes mirrored
//! into the shared application store. Visible state (scene list, working set)
//! is updated before persistence completes; storage failures surface as a
//! user notice and an `Err`, never as a panic.

use std::sync::Arc;

use scenery_core::blob::{BlobStore, PayloadFetcher};
use scenery_core::config::StorageConfig;
use scenery_core::error::{Result, SceneryError};
use scenery_core::event::{AppEvent, EventBus};
use scenery_core::interaction::{Notice, UserPrompt};
use scenery_core::participant::ParticipantRepository;
use scenery_core::scene::{
    FileReference, Scene, SceneRepository, SceneSummary, StoredScene, duplicate_keys,
    list_summaries, now_millis,
};
use scenery_core::state::AppStore;
use scenery_core::storage::keys::scene_key;
use scenery_infrastructure::dto::parse_full_scene;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use crate::avatar_lifecycle::{AvatarLifecycle, AvatarReport};
use crate::party::PartyService;

/// A scene opened by [`SceneStore::load`].
#[derive(Debug, Clone)]
pub struct LoadedScene {
    pub scene: Scene,
    pub avatars: AvatarReport,
}

/// How a scene was persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub scene_id: String,
    /// Serialized size of the full scene in bytes.
    pub size: usize,
    /// URL of the external payload when stored as a file reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}

impl SaveOutcome {
    pub fn is_file_reference(&self) -> bool {
        self.file_url.is_some()
    }
}

/// Collaborators of a [`SceneStore`].
pub struct SceneStoreDeps {
    pub repository: Arc<dyn SceneRepository>,
    pub app_store: Arc<dyn AppStore>,
    pub party: Arc<PartyService>,
    pub avatars: AvatarLifecycle,
    pub participants: Arc<dyn ParticipantRepository>,
    pub blobs: Arc<dyn BlobStore>,
    pub fetcher: Arc<dyn PayloadFetcher>,
    pub prompt: Arc<dyn UserPrompt>,
    pub events: EventBus,
}

pub struct SceneStore {
    repository: Arc<dyn SceneRepository>,
    app_store: Arc<dyn AppStore>,
    party: Arc<PartyService>,
    avatars: AvatarLifecycle,
    participants: Arc<dyn ParticipantRepository>,
    blobs: Arc<dyn BlobStore>,
    fetcher: Arc<dyn PayloadFetcher>,
    prompt: Arc<dyn UserPrompt>,
    events: EventBus,
    file_reference_threshold: usize,
    /// Summaries produced by the last `list`.
    visible: RwLock<Vec<SceneSummary>>,
    /// Serializes read-modify-write cycles on the working set.
    working_set: Mutex<()>,
}

impl SceneStore {
    pub fn new(deps: SceneStoreDeps, storage: &StorageConfig) -> Self {
        Self {
            repository: deps.repository,
            app_store: deps.app_store,
            party: deps.party,
            avatars: deps.avatars,
            participants: deps.participants,
            blobs: deps.blobs,
            fetcher: deps.fetcher,
            prompt: deps.prompt,
            events: deps.events,
            file_reference_threshold: storage.file_reference_threshold_bytes,
            visible: RwLock::new(Vec::new()),
            working_set: Mutex::new(()),
        }
    }

    // ============================================================================
    // Listing
    // ============================================================================

    /// Lists stored scenes, newest first, one row per scene id.
    pub async fn list(&self) -> Result<Vec<SceneSummary>> {
        let entries = self.repository.entries().await?;
        let summaries = list_summaries(&entries);
        tracing::debug!(
            "[SceneStore] Listed {} scene(s) from {} record(s)",
            summaries.len(),
            entries.len()
        );
        *self.visible.write().await = summaries.clone();
        Ok(summaries)
    }

    /// Summaries produced by the last `list`, minus optimistic removals.
    pub async fn visible_scenes(&self) -> Vec<SceneSummary> {
        self.visible.read().await.clone()
    }

    /// Removes duplicate records of the same scene id, keeping the id-keyed
    /// record. Returns the removed keys.
    pub async fn cleanup_duplicates(&self) -> Result<Vec<String>> {
        let entries = self.repository.entries().await?;
        let duplicates = duplicate_keys(&entries);

        let mut removed = Vec::with_capacity(duplicates.len());
        for key in duplicates {
            if self.repository.remove_key(&key).await? {
                tracing::info!("[SceneStore] Removed duplicate scene record {}", key);
                self.events.storage_changed(key.clone());
                removed.push(key);
            }
        }

        if !removed.is_empty() {
            self.events.emit(AppEvent::ScenesListChanged);
        }
        self.list().await?;
        Ok(removed)
    }

    // ============================================================================
    // Working set
    // ============================================================================

    /// Scenes currently open, in tab order.
    pub async fn open_scenes(&self) -> Vec<Scene> {
        self.app_store.scenes().await
    }

    pub async fn active_scene(&self) -> Option<Scene> {
        self.app_store.active_scene().await
    }

    /// Creates an empty scene, opens it and makes it active.
    pub async fn create(&self, name: &str) -> Scene {
        let _guard = self.working_set.lock().await;

        let scene = Scene::new(name);
        let mut scenes = self.app_store.scenes().await;
        scenes.push(scene.clone());
        self.mirror_scenes(scenes).await;
        self.mirror_active(Some(scene.id.clone())).await;

        tracing::info!("[SceneStore] Created scene {} ('{}')", scene.id, scene.name);
        scene
    }

    /// Makes an open scene the active one.
    pub async fn activate(&self, scene_id: &str) -> Result<()> {
        if self.app_store.scene(scene_id).await.is_none() {
            return Err(SceneryError::not_found("Scene", scene_id));
        }
        self.app_store
            .set_active_scene_id(Some(scene_id.to_string()))
            .await
    }

    /// Applies `f` to an open scene and marks it as having unsaved changes.
    pub async fn update<F>(&self, scene_id: &str, f: F) -> Result<Scene>
    where
        F: FnOnce(&mut Scene),
    {
        let _guard = self.working_set.lock().await;

        let mut scenes = self.app_store.scenes().await;
        let scene = scenes
            .iter_mut()
            .find(|s| s.id == scene_id)
            .ok_or_else(|| SceneryError::not_found("Scene", scene_id))?;

        f(scene);
        scene.has_unsaved_changes = true;
        let updated = scene.clone();

        self.app_store.set_scenes(scenes).await?;
        tracing::debug!("[SceneStore] Updated scene {}", scene_id);
        Ok(updated)
    }

    // ============================================================================
    // Load
    // ============================================================================

    /// Loads a stored scene into the working set and starts its avatars.
    ///
    /// A file-reference record is resolved by fetching its payload; when that
    /// fails the user is asked for the file, and the load fails if none is
    /// supplied.
    pub async fn load(&self, scene_id: &str) -> Result<LoadedScene> {
        let entry = self
            .repository
            .find(scene_id)
            .await?
            .ok_or_else(|| SceneryError::not_found("Scene", scene_id))?;

        let mut scene = match entry.record {
            StoredScene::Full(scene) => scene,
            StoredScene::FileReference(reference) => {
                self.resolve_file_reference(&entry.key, reference).await?
            }
        };
        scene.has_unsaved_changes = false;

        {
            let _guard = self.working_set.lock().await;
            let mut scenes = self.app_store.scenes().await;
            match scenes.iter_mut().find(|s| s.id == scene.id) {
                Some(open) => *open = scene.clone(),
                None => scenes.push(scene.clone()),
            }
            self.mirror_scenes(scenes).await;
            self.mirror_active(Some(scene.id.clone())).await;
        }

        let avatars = self.avatars.initialize_scene(&scene).await;
        if !avatars.is_clean() {
            self.prompt
                .notify(Notice::warning(format!(
                    "{} avatar(s) of '{}' failed to start",
                    avatars.failures.len(),
                    scene.name
                )))
                .await;
        }

        tracing::info!(
            "[SceneStore] Loaded scene {} ('{}', {} boxes)",
            scene.id,
            scene.name,
            scene.boxes.len()
        );
        Ok(LoadedScene { scene, avatars })
    }

    async fn resolve_file_reference(&self, key: &str, reference: FileReference) -> Result<Scene> {
        let url = reference.file_url.as_str();
        let payload = match self.fetcher.fetch(url).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(
                    "[SceneStore] Failed to fetch payload of scene {} from {}: {}",
                    reference.id,
                    url,
                    e
                );
                self.prompt
                    .notify(Notice::error(format!(
                        "Could not load the file of scene '{}': {}",
                        reference.name, e
                    )))
                    .await;

                match self.prompt.provide_scene_file(&reference.name, url).await {
                    Some(payload) => payload,
                    None if e.is_fetch() => return Err(e),
                    None => return Err(SceneryError::fetch(url, e.to_string())),
                }
            }
        };

        let parsed = serde_json::from_slice::<serde_json::Value>(&payload)
            .map_err(SceneryError::from)
            .and_then(|value| parse_full_scene(key, value));
        let mut scene = match parsed {
            Ok(scene) => scene,
            Err(e) => {
                self.prompt
                    .notify(Notice::error(format!(
                        "The file of scene '{}' is not a valid scene: {}",
                        reference.name, e
                    )))
                    .await;
                return Err(e);
            }
        };

        scene.id = reference.id;
        if scene.name.is_empty() {
            scene.name = reference.name;
        }
        if scene.timestamp == 0 {
            scene.timestamp = reference.timestamp;
        }
        Ok(scene)
    }

    // ============================================================================
    // Save
    // ============================================================================

    /// Persists an open scene.
    ///
    /// Avatars are stamped with the current human participants and assigned
    /// boxes get a fresh party config copy. Scenes above the size threshold
    /// go to the blob store behind a file-reference record. On failure the
    /// user is notified and the open scene is left untouched.
    pub async fn save(&self, scene_id: &str) -> Result<SaveOutcome> {
        let _guard = self.working_set.lock().await;

        let mut scene = self
            .app_store
            .scene(scene_id)
            .await
            .ok_or_else(|| SceneryError::not_found("Scene", scene_id))?;

        let humans = self.participants.ai_panel_data().await?.human_participants;
        scene.stamp_human_participants(&humans);
        self.party.refresh_box_copies(&mut scene).await?;
        scene.timestamp = now_millis();

        let outcome = match self.persist(&scene).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("[SceneStore] Failed to save scene {}: {}", scene_id, e);
                let message = if e.is_quota_exceeded() {
                    format!("Storage is full, scene '{}' was not saved.", scene.name)
                } else {
                    format!("Failed to save scene '{}': {}", scene.name, e)
                };
                self.prompt.notify(Notice::error(message)).await;
                return Err(e);
            }
        };

        match self.remove_stale_copies(&scene.id).await {
            Ok(0) => {}
            Ok(n) => tracing::info!("[SceneStore] Removed {} stale copies of scene {}", n, scene.id),
            Err(e) => tracing::warn!(
                "[SceneStore] Failed to remove stale copies of scene {}: {}",
                scene.id,
                e
            ),
        }

        if let Err(e) = self.party.record_box_configs(&scene).await {
            tracing::warn!(
                "[SceneStore] Failed to record party configs of {}: {}",
                scene_id,
                e
            );
        }

        scene.has_unsaved_changes = false;
        let mut scenes = self.app_store.scenes().await;
        if let Some(open) = scenes.iter_mut().find(|s| s.id == scene.id) {
            *open = scene.clone();
        }
        self.mirror_scenes(scenes).await;

        self.events.storage_changed(scene_key(&scene.id));
        self.events.emit(AppEvent::ScenesListChanged);
        if let Err(e) = self.list().await {
            tracing::warn!("[SceneStore] Failed to refresh scene list: {}", e);
        }

        tracing::info!(
            "[SceneStore] Saved scene {} ({} bytes{})",
            scene.id,
            outcome.size,
            if outcome.is_file_reference() {
                ", file reference"
            } else {
                ""
            }
        );
        Ok(outcome)
    }

    async fn persist(&self, scene: &Scene) -> Result<SaveOutcome> {
        let size = self.repository.serialized_size(scene)?;

        if size <= self.file_reference_threshold {
            self.repository.save_full(scene).await?;
            return Ok(SaveOutcome {
                scene_id: scene.id.clone(),
                size,
                file_url: None,
            });
        }

        tracing::info!(
            "[SceneStore] Scene {} is {} bytes (threshold {}), storing as file reference",
            scene.id,
            size,
            self.file_reference_threshold
        );
        let payload = serde_json::to_vec(scene)?;
        let file_url = self.blobs.put(&scene.id, payload).await?;
        let reference = FileReference::for_scene(scene, file_url.clone(), size);
        if let Err(e) = self
            .repository
            .save_record(&StoredScene::FileReference(reference))
            .await
        {
            self.discard_blob(&scene.id, &file_url).await;
            return Err(e);
        }

        Ok(SaveOutcome {
            scene_id: scene.id.clone(),
            size,
            file_url: Some(file_url),
        })
    }

    /// Drops a payload whose reference record was never written, unless the
    /// stored record already points at the same URL.
    async fn discard_blob(&self, scene_id: &str, file_url: &str) {
        if let Ok(Some(entry)) = self.repository.find(scene_id).await
            && let StoredScene::FileReference(existing) = &entry.record
            && existing.file_url == file_url
        {
            return;
        }
        match self.blobs.remove(file_url).await {
            Ok(_) => tracing::debug!("[SceneStore] Discarded payload {}", file_url),
            Err(e) => tracing::warn!("[SceneStore] Failed to discard payload {}: {}", file_url, e),
        }
    }

    /// Removes copies of a scene stored under keys other than `scene:<id>`.
    async fn remove_stale_copies(&self, scene_id: &str) -> Result<usize> {
        let canonical = scene_key(scene_id);
        let mut removed = 0;
        for entry in self.repository.entries().await? {
            if entry.record.id() == scene_id && entry.key != canonical {
                self.repository.remove_key(&entry.key).await?;
                self.events.storage_changed(entry.key);
                removed += 1;
            }
        }
        Ok(removed)
    }

    // ============================================================================
    // Delete / close
    // ============================================================================

    /// Deletes a scene after user confirmation.
    ///
    /// Returns `Ok(false)` when the user declined. The scene leaves the
    /// visible list and working set first; then every stored record of it and
    /// the party configs of its boxes are removed.
    pub async fn delete(&self, scene_id: &str) -> Result<bool> {
        let name = self.display_name(scene_id).await;
        let confirmed = self
            .prompt
            .confirm(&format!("Delete scene '{}'? This cannot be undone.", name))
            .await;
        if !confirmed {
            tracing::info!("[SceneStore] Deletion of scene {} cancelled", scene_id);
            return Ok(false);
        }

        self.visible.write().await.retain(|s| s.id != scene_id);
        let open_copy = {
            let _guard = self.working_set.lock().await;
            self.remove_from_working_set(scene_id).await
        };

        let entries: Vec<_> = self
            .repository
            .entries()
            .await?
            .into_iter()
            .filter(|entry| entry.record.id() == scene_id)
            .collect();

        let mut box_ids = open_copy.map(|s| s.box_ids()).unwrap_or_default();
        if entries.is_empty() {
            tracing::info!("[SceneStore] Scene {} was not in storage", scene_id);
        }
        for entry in &entries {
            self.repository.remove_key(&entry.key).await?;
            self.events.storage_changed(entry.key.clone());
            for box_id in entry.record.box_ids() {
                if !box_ids.contains(&box_id) {
                    box_ids.push(box_id);
                }
            }
        }

        self.party.delete_configs_for_scene(&box_ids).await?;
        self.events.emit(AppEvent::ScenesListChanged);

        tracing::info!(
            "[SceneStore] Deleted scene {} ({} record(s), {} box(es))",
            scene_id,
            entries.len(),
            box_ids.len()
        );
        Ok(true)
    }

    /// Closes an open scene without deleting its stored copy.
    ///
    /// Live avatar instances are stopped. A scene that was never saved or has
    /// unsaved changes also loses its party configs.
    pub async fn close(&self, scene_id: &str) -> Result<AvatarReport> {
        let scene = {
            let _guard = self.working_set.lock().await;
            self.remove_from_working_set(scene_id)
                .await
                .ok_or_else(|| SceneryError::not_found("Scene", scene_id))?
        };

        let report = self.avatars.stop_scene(&scene).await;

        let persisted = self.repository.find(scene_id).await?.is_some();
        if !persisted || scene.has_unsaved_changes {
            self.party
                .delete_configs_for_scene(&scene.box_ids())
                .await?;
        }

        tracing::info!(
            "[SceneStore] Closed scene {} (persisted: {}, unsaved changes: {})",
            scene_id,
            persisted,
            scene.has_unsaved_changes
        );
        Ok(report)
    }

    /// Drops a scene from the working set, moving the active scene to the
    /// last remaining one if it was active. Callers hold `working_set`.
    async fn remove_from_working_set(&self, scene_id: &str) -> Option<Scene> {
        let mut scenes = self.app_store.scenes().await;
        let position = scenes.iter().position(|s| s.id == scene_id)?;
        let removed = scenes.remove(position);

        let active = self.app_store.active_scene_id().await;
        let next_active = match active {
            Some(id) if id != scene_id => Some(id),
            _ => scenes.last().map(|s| s.id.clone()),
        };

        self.mirror_scenes(scenes).await;
        self.mirror_active(next_active).await;
        Some(removed)
    }

    async fn display_name(&self, scene_id: &str) -> String {
        if let Some(summary) = self
            .visible
            .read()
            .await
            .iter()
            .find(|s| s.id == scene_id)
        {
            return summary.name.clone();
        }
        match self.app_store.scene(scene_id).await {
            Some(scene) => scene.name,
            None => scene_id.to_string(),
        }
    }

    async fn mirror_scenes(&self, scenes: Vec<Scene>) {
        if let Err(e) = self.app_store.set_scenes(scenes).await {
            tracing::warn!("[SceneStore] Failed to mirror scenes: {}", e);
        }
    }

    async fn mirror_active(&self, scene_id: Option<String>) {
        if let Err(e) = self.app_store.set_active_scene_id(scene_id).await {
            tracing::warn!("[SceneStore] Failed to mirror active scene: {}", e);
        }
    }
}
