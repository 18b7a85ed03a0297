//! Party service.
//!
//! Templates (`savedParties`, keyed by name) are the single source of truth.
//! The `partyConfigs` map and each box's `partyConfig` copy are derived from
//! them and only rewritten here.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use scenery_core::config::PartyOptions;
use scenery_core::error::{Result, SceneryError};
use scenery_core::event::{AppEvent, EventBus};
use scenery_core::party::{
    ConversationMessage, GlobalPartySettings, PartyConfig, PartyConfigMap, PartyGrouping,
    PartyModeConfig, PartyRepository, SpeakingMode, default_subset_size, group_by_party,
    map_messages_to_parties, party_membership, prepare_party_mode_config,
};
use scenery_core::scene::{Scene, SceneBox};
use scenery_core::state::AppStore;
use scenery_core::storage::keys::{GLOBAL_PARTY_SETTINGS, PARTY_CONFIGS, SAVED_PARTIES};

use super::cache::PartyConfigCache;

/// Manages party templates, per-box configs and the party-mode configuration
/// handed to the conversation manager.
pub struct PartyService {
    repository: Arc<dyn PartyRepository>,
    app_store: Arc<dyn AppStore>,
    events: EventBus,
    cache: PartyConfigCache,
    cleanup_enabled: bool,
}

impl PartyService {
    pub fn new(
        repository: Arc<dyn PartyRepository>,
        app_store: Arc<dyn AppStore>,
        events: EventBus,
        options: &PartyOptions,
    ) -> Self {
        Self {
            cache: PartyConfigCache::new(repository.clone()),
            repository,
            app_store,
            events,
            cleanup_enabled: options.cleanup_enabled,
        }
    }

    /// Loads persisted per-box configs and global settings into the
    /// application store.
    pub async fn hydrate_app_store(&self) -> Result<()> {
        let configs = self.repository.box_configs().await?;
        let global = self.repository.global_settings().await?;
        self.mirror_box_configs(configs).await;
        if let Err(e) = self.app_store.set_global_party_settings(global).await {
            tracing::warn!("[PartyService] Failed to mirror global settings: {}", e);
        }
        Ok(())
    }

    // ============================================================================
    // Templates
    // ============================================================================

    pub async fn templates(&self) -> Result<Vec<PartyConfig>> {
        self.repository.templates().await
    }

    pub async fn template(&self, party_name: &str) -> Result<Option<PartyConfig>> {
        self.cache.get(party_name).await
    }

    /// Creates or replaces the template of `config.name` and rewrites every
    /// derived copy of it.
    pub async fn save_template(&self, config: PartyConfig) -> Result<()> {
        if !config.is_named() {
            return Err(SceneryError::config("Party name must not be empty"));
        }

        let mut templates = self.repository.templates().await?;
        match templates.iter_mut().find(|t| t.name == config.name) {
            Some(existing) => *existing = config.clone(),
            None => templates.push(config.clone()),
        }
        self.repository.save_templates(&templates).await?;
        self.cache.invalidate(&config.name).await;

        tracing::info!("[PartyService] Saved party template '{}'", config.name);
        self.events.storage_changed(SAVED_PARTIES);

        self.propagate_template(&config).await?;
        Ok(())
    }

    /// Deletes a template. Boxes keep their last derived copy.
    pub async fn delete_template(&self, party_name: &str) -> Result<bool> {
        let mut templates = self.repository.templates().await?;
        let before = templates.len();
        templates.retain(|t| t.name != party_name);
        if templates.len() == before {
            return Ok(false);
        }

        self.repository.save_templates(&templates).await?;
        self.cache.invalidate(party_name).await;

        tracing::info!("[PartyService] Deleted party template '{}'", party_name);
        self.events.storage_changed(SAVED_PARTIES);
        self.events.emit(AppEvent::PartyConfigsChanged);
        Ok(true)
    }

    /// Changes the speaking mode of a party.
    ///
    /// Switching to subset mode without an explicit size fills in the default
    /// for the party's member count in the active scene.
    pub async fn set_speaking_mode(
        &self,
        party_name: &str,
        mode: SpeakingMode,
    ) -> Result<PartyConfig> {
        let mut config = self
            .template(party_name)
            .await?
            .ok_or_else(|| SceneryError::not_found("Party", party_name))?;

        config.speaking_mode = mode;
        if mode == SpeakingMode::Subset && config.subset_size.filter(|s| *s > 0).is_none() {
            let member_count = self
                .app_store
                .active_scene()
                .await
                .map(|scene| member_count(&scene, party_name))
                .unwrap_or(0);
            config.subset_size = Some(default_subset_size(member_count));
        }

        self.save_template(config.clone()).await?;
        Ok(config)
    }

    /// Rewrites the `partyConfigs` entries and open scenes' box copies of a
    /// party after its template changed.
    async fn propagate_template(&self, config: &PartyConfig) -> Result<()> {
        let mut box_configs = self.repository.box_configs().await?;
        let mut changed = false;
        for entry in box_configs.values_mut() {
            if entry.name == config.name && entry != config {
                *entry = config.clone();
                changed = true;
            }
        }
        if changed {
            self.persist_box_configs(box_configs).await?;
        }

        let mut scenes = self.app_store.scenes().await;
        let mut touched = 0;
        for scene in &mut scenes {
            for scene_box in &mut scene.boxes {
                if scene_box.party.as_deref() == Some(config.name.as_str())
                    && scene_box.party_config.as_ref() != Some(config)
                {
                    scene_box.party_config = Some(config.clone());
                    scene.has_unsaved_changes = true;
                    touched += 1;
                }
            }
        }
        if touched > 0 {
            tracing::debug!(
                "[PartyService] Refreshed {} box copies of '{}'",
                touched,
                config.name
            );
            if let Err(e) = self.app_store.set_scenes(scenes).await {
                tracing::warn!("[PartyService] Failed to mirror scenes: {}", e);
            }
        }

        self.events.emit(AppEvent::PartyConfigsChanged);
        Ok(())
    }

    // ============================================================================
    // Box assignment
    // ============================================================================

    /// Assigns a box of an open scene to a party, or unassigns it with `None`.
    pub async fn assign_box(
        &self,
        scene_id: &str,
        box_id: &str,
        party_name: Option<&str>,
    ) -> Result<()> {
        let party_name = party_name.map(str::trim).filter(|p| !p.is_empty());
        let template = match party_name {
            Some(name) => self.template(name).await?,
            None => None,
        };

        let mut scenes = self.app_store.scenes().await;
        let scene = scenes
            .iter_mut()
            .find(|s| s.id == scene_id)
            .ok_or_else(|| SceneryError::not_found("Scene", scene_id))?;
        let scene_box = scene
            .find_box_mut(box_id)
            .ok_or_else(|| SceneryError::not_found("Box", box_id))?;

        scene_box.party = party_name.map(str::to_string);
        scene_box.party_config = template.clone();
        scene.has_unsaved_changes = true;
        self.app_store.set_scenes(scenes).await?;

        let mut box_configs = self.repository.box_configs().await?;
        match template {
            Some(config) => {
                box_configs.insert(box_id.to_string(), config);
            }
            None => {
                box_configs.remove(box_id);
            }
        }
        self.persist_box_configs(box_configs).await?;

        tracing::info!(
            "[PartyService] Box {} of scene {} assigned to {:?}",
            box_id,
            scene_id,
            party_name
        );
        self.events.emit(AppEvent::PartyConfigsChanged);
        Ok(())
    }

    // ============================================================================
    // Resolution
    // ============================================================================

    /// Effective config of a box: template by party name, else the
    /// `partyConfigs` entry, else the box's own copy. Untagged boxes have none.
    pub async fn effective_config(&self, scene_box: &SceneBox) -> Result<Option<PartyConfig>> {
        let box_configs = self.repository.box_configs().await?;
        self.resolve(scene_box, &box_configs).await
    }

    async fn resolve(
        &self,
        scene_box: &SceneBox,
        box_configs: &PartyConfigMap,
    ) -> Result<Option<PartyConfig>> {
        let Some(name) = scene_box.party.as_deref().filter(|p| !p.is_empty()) else {
            return Ok(None);
        };

        if let Some(template) = self.cache.get(name).await? {
            return Ok(Some(template));
        }

        if let Some(config) = box_configs.get(&scene_box.id) {
            return Ok(Some(config.clone()));
        }

        Ok(scene_box.party_config.clone())
    }

    /// Effective configs of every box of a scene, keyed by box id.
    pub async fn resolve_scene(&self, scene: &Scene) -> Result<BTreeMap<String, PartyConfig>> {
        let box_configs = self.repository.box_configs().await?;
        let mut resolved = BTreeMap::new();
        for scene_box in &scene.boxes {
            if let Some(config) = self.resolve(scene_box, &box_configs).await? {
                resolved.insert(scene_box.id.clone(), config);
            }
        }
        Ok(resolved)
    }

    /// Rewrites the derived `partyConfig` copy of every assigned box.
    ///
    /// Returns the number of boxes whose copy changed.
    pub async fn refresh_box_copies(&self, scene: &mut Scene) -> Result<usize> {
        let resolved = self.resolve_scene(scene).await?;
        let mut changed = 0;
        for scene_box in scene.boxes.iter_mut().filter(|b| b.party.is_some()) {
            let config = resolved.get(&scene_box.id).cloned();
            if scene_box.party_config != config {
                scene_box.party_config = config;
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Records the copies of a saved scene's assigned boxes in `partyConfigs`.
    pub async fn record_box_configs(&self, scene: &Scene) -> Result<()> {
        let mut box_configs = self.repository.box_configs().await?;
        let mut changed = false;
        for scene_box in &scene.boxes {
            if scene_box.party.is_none() {
                continue;
            }
            if let Some(config) = &scene_box.party_config
                && box_configs.get(&scene_box.id) != Some(config)
            {
                box_configs.insert(scene_box.id.clone(), config.clone());
                changed = true;
            }
        }

        if changed {
            self.persist_box_configs(box_configs).await?;
            self.events.emit(AppEvent::PartyConfigsChanged);
        }
        Ok(())
    }

    // ============================================================================
    // Derivations over the active scene
    // ============================================================================

    /// Buckets avatars by party using the active scene.
    pub async fn group_avatars(&self, avatar_names: &[String]) -> Result<PartyGrouping> {
        let scene = self.app_store.active_scene().await;

        let mut configs: BTreeMap<String, PartyConfig> = self
            .templates()
            .await?
            .into_iter()
            .map(|t| (t.name.clone(), t))
            .collect();

        if let Some(scene) = &scene {
            for (box_id, config) in self.resolve_scene(scene).await? {
                let Some(party) = scene.find_box(&box_id).and_then(|b| b.party.clone()) else {
                    continue;
                };
                configs.entry(party).or_insert(config);
            }
        }

        Ok(group_by_party(avatar_names, scene.as_ref(), &configs))
    }

    /// Party-mode configuration of the active scene.
    pub async fn prepare_config(&self) -> Result<PartyModeConfig> {
        let Some(scene) = self.app_store.active_scene().await else {
            return Ok(PartyModeConfig::disabled());
        };
        self.prepare_config_for(&scene).await
    }

    /// Party-mode configuration of a scene.
    pub async fn prepare_config_for(&self, scene: &Scene) -> Result<PartyModeConfig> {
        let resolved = self.resolve_scene(scene).await?;
        let global = match &scene.global_party_settings {
            Some(settings) => Some(settings.clone()),
            None => self.global_settings().await?,
        };

        let config = prepare_party_mode_config(
            scene,
            |scene_box| resolved.get(&scene_box.id).cloned(),
            global.as_ref(),
        );
        tracing::debug!(
            "[PartyService] Party mode {} for scene {} ({} parties)",
            config.party_mode,
            scene.id,
            config.party_settings.len()
        );
        Ok(config)
    }

    /// Avatar name to party name over a scene.
    pub async fn membership(&self, scene: &Scene) -> Result<BTreeMap<String, String>> {
        let resolved = self.resolve_scene(scene).await?;
        Ok(party_membership(scene, |scene_box| {
            resolved.get(&scene_box.id).cloned()
        }))
    }

    /// Annotates messages with the party of their sender in the active scene.
    pub async fn map_messages(
        &self,
        messages: Vec<ConversationMessage>,
    ) -> Result<Vec<ConversationMessage>> {
        let membership = match self.app_store.active_scene().await {
            Some(scene) => self.membership(&scene).await?,
            None => BTreeMap::new(),
        };
        Ok(map_messages_to_parties(messages, &membership))
    }

    // ============================================================================
    // Per-box config cleanup
    // ============================================================================

    /// Removes the `partyConfigs` entries of the given boxes.
    ///
    /// Returns `false` without touching storage when there are no boxes.
    pub async fn delete_configs_for_scene(&self, box_ids: &[String]) -> Result<bool> {
        if box_ids.is_empty() {
            return Ok(false);
        }

        let mut box_configs = self.repository.box_configs().await?;
        let before = box_configs.len();
        box_configs.retain(|box_id, _| !box_ids.contains(box_id));
        let removed = before - box_configs.len();

        self.persist_box_configs(box_configs).await?;
        tracing::info!(
            "[PartyService] Removed {} party config(s) for {} box(es)",
            removed,
            box_ids.len()
        );
        self.events.emit(AppEvent::PartyConfigsChanged);
        Ok(true)
    }

    /// Clears `partyConfigs`, or with `active_scenes` prunes the entries of
    /// boxes absent from all of them.
    ///
    /// Does nothing unless cleanup is enabled in the configuration or
    /// `force` is set.
    pub async fn cleanup_party_configs(
        &self,
        force: bool,
        active_scenes: Option<&[Scene]>,
    ) -> Result<bool> {
        if !self.cleanup_enabled && !force {
            tracing::info!("[PartyService] Party config cleanup is disabled");
            return Ok(false);
        }

        let box_configs = match active_scenes {
            None => PartyConfigMap::new(),
            Some(scenes) => {
                let live: BTreeSet<&str> = scenes
                    .iter()
                    .flat_map(|s| s.boxes.iter().map(|b| b.id.as_str()))
                    .collect();
                let mut configs = self.repository.box_configs().await?;
                configs.retain(|box_id, _| live.contains(box_id.as_str()));
                configs
            }
        };

        tracing::info!(
            "[PartyService] Party config cleanup kept {} entries",
            box_configs.len()
        );
        self.persist_box_configs(box_configs).await?;
        self.events.emit(AppEvent::PartyConfigsChanged);
        Ok(true)
    }

    // ============================================================================
    // Global settings
    // ============================================================================

    pub async fn global_settings(&self) -> Result<Option<GlobalPartySettings>> {
        self.repository.global_settings().await
    }

    pub async fn save_global_settings(&self, settings: GlobalPartySettings) -> Result<()> {
        self.repository.save_global_settings(&settings).await?;
        if let Err(e) = self
            .app_store
            .set_global_party_settings(Some(settings))
            .await
        {
            tracing::warn!("[PartyService] Failed to mirror global settings: {}", e);
        }
        self.events.storage_changed(GLOBAL_PARTY_SETTINGS);
        Ok(())
    }

    async fn persist_box_configs(&self, configs: PartyConfigMap) -> Result<()> {
        self.repository.save_box_configs(&configs).await?;
        self.mirror_box_configs(configs).await;
        self.events.storage_changed(PARTY_CONFIGS);
        Ok(())
    }

    async fn mirror_box_configs(&self, configs: PartyConfigMap) {
        if let Err(e) = self.app_store.set_party_configs(configs).await {
            tracing::warn!("[PartyService] Failed to mirror party configs: {}", e);
        }
    }
}

/// Avatars of a scene sitting in boxes tagged with `party_name`.
fn member_count(scene: &Scene, party_name: &str) -> usize {
    scene
        .boxes
        .iter()
        .filter(|b| b.party.as_deref() == Some(party_name))
        .map(|b| b.avatar_elements().count())
        .sum()
}
