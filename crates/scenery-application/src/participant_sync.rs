//! Human participant and AI panel synchronization.
//!
//! Keeps `aiPanelData`, `topicPanel-participants`, the `isHuman` flags of
//! every stored and open scene, and the avatar configs consistent.

use std::collections::BTreeMap;
use std::sync::Arc;

use scenery_core::avatar::{AvatarConfig, AvatarConfigRepository};
use scenery_core::error::Result;
use scenery_core::event::{AppEvent, EventBus};
use scenery_core::participant::{AiPanelData, Participant, ParticipantRepository};
use scenery_core::scene::{SceneRepository, StoredScene, group_by_id, now_millis};
use scenery_core::state::AppStore;
use scenery_core::storage::keys::{
    AI_PANEL_DATA, TOPIC_PANEL_PARTICIPANTS, avatar_config_key, scene_key,
};
use serde::Serialize;

use crate::party::PartyService;

/// Outcome of [`ParticipantSync::set_human_participants`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanSyncReport {
    /// Ids of stored scenes that were rewritten.
    pub updated_scenes: Vec<String>,
    /// File-reference records left as they are.
    pub skipped_file_references: usize,
    /// Ids of stored scenes that could not be rewritten.
    pub failed_scenes: Vec<String>,
    /// Open scenes whose flags changed.
    pub updated_open_scenes: usize,
}

pub struct ParticipantSync {
    participants: Arc<dyn ParticipantRepository>,
    scenes: Arc<dyn SceneRepository>,
    avatar_configs: Arc<dyn AvatarConfigRepository>,
    party: Arc<PartyService>,
    app_store: Arc<dyn AppStore>,
    events: EventBus,
}

impl ParticipantSync {
    pub fn new(
        participants: Arc<dyn ParticipantRepository>,
        scenes: Arc<dyn SceneRepository>,
        avatar_configs: Arc<dyn AvatarConfigRepository>,
        party: Arc<PartyService>,
        app_store: Arc<dyn AppStore>,
        events: EventBus,
    ) -> Self {
        Self {
            participants,
            scenes,
            avatar_configs,
            party,
            app_store,
            events,
        }
    }

    pub async fn ai_panel_data(&self) -> Result<AiPanelData> {
        self.participants.ai_panel_data().await
    }

    pub async fn participants(&self) -> Result<Vec<Participant>> {
        self.participants.participants().await
    }

    /// Replaces the human participant list and propagates it to every
    /// stored and open scene.
    pub async fn set_human_participants(&self, names: Vec<String>) -> Result<HumanSyncReport> {
        let mut humans: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            let name = name.trim().to_string();
            if !name.is_empty() && !humans.contains(&name) {
                humans.push(name);
            }
        }

        let mut data = self.participants.ai_panel_data().await?;
        data.human_participants = humans.clone();
        data.last_updated = now_millis();
        self.save_panel(&data).await?;
        self.rebuild_participants(&data).await?;

        let mut report = HumanSyncReport::default();

        for group in group_by_id(self.scenes.entries().await?) {
            let mut scene = match group.newest.record {
                StoredScene::Full(scene) => scene,
                StoredScene::FileReference(reference) => {
                    tracing::debug!(
                        "[ParticipantSync] Skipping file-reference scene {}",
                        reference.id
                    );
                    report.skipped_file_references += 1;
                    continue;
                }
            };

            if scene.stamp_human_participants(&humans) == 0 {
                continue;
            }

            match self.scenes.save_full(&scene).await {
                Ok(_) => {
                    // Only the canonical key survives
                    let canonical = scene_key(&scene.id);
                    for key in group
                        .stale_keys
                        .iter()
                        .chain(std::iter::once(&group.newest.key))
                        .filter(|key| **key != canonical)
                    {
                        self.scenes.remove_key(key).await?;
                    }
                    self.events.storage_changed(canonical);
                    report.updated_scenes.push(scene.id);
                }
                Err(e) => {
                    tracing::warn!(
                        "[ParticipantSync] Failed to update human flags of scene {}: {}",
                        scene.id,
                        e
                    );
                    report.failed_scenes.push(scene.id);
                }
            }
        }

        let mut open = self.app_store.scenes().await;
        for scene in &mut open {
            if scene.stamp_human_participants(&humans) > 0 {
                report.updated_open_scenes += 1;
            }
        }
        if report.updated_open_scenes > 0
            && let Err(e) = self.app_store.set_scenes(open).await
        {
            tracing::warn!("[ParticipantSync] Failed to mirror scenes: {}", e);
        }

        tracing::info!(
            "[ParticipantSync] {} human participant(s); updated {} stored and {} open scene(s), skipped {} file reference(s)",
            humans.len(),
            report.updated_scenes.len(),
            report.updated_open_scenes,
            report.skipped_file_references
        );

        self.events.emit(AppEvent::ScenesUpdatedWithHumanParticipants);
        self.events.emit(AppEvent::ParticipantsChanged);
        Ok(report)
    }

    /// Sets the avatars selected for the conversation.
    pub async fn select_participants(&self, names: Vec<String>) -> Result<Vec<Participant>> {
        let mut data = self.participants.ai_panel_data().await?;
        data.selected_names = names;
        data.last_updated = now_millis();
        self.save_panel(&data).await?;

        let participants = self.rebuild_participants(&data).await?;
        self.events.emit(AppEvent::ParticipantsChanged);
        Ok(participants)
    }

    pub async fn set_topic(&self, topic: impl Into<String>) -> Result<()> {
        let mut data = self.participants.ai_panel_data().await?;
        data.discussion_topic = topic.into();
        data.last_updated = now_millis();
        self.save_panel(&data).await?;

        self.events.emit(AppEvent::TopicChanged);
        Ok(())
    }

    /// Rewrites `topicPanel-participants` from the panel record: selected
    /// avatars first, then human participants that aren't selected.
    async fn rebuild_participants(&self, data: &AiPanelData) -> Result<Vec<Participant>> {
        let membership = match self.app_store.active_scene().await {
            Some(scene) => self.party.membership(&scene).await?,
            None => BTreeMap::new(),
        };

        let mut names: Vec<&String> = data.selected_names.iter().collect();
        for human in &data.human_participants {
            if !names.contains(&human) {
                names.push(human);
            }
        }

        let participants: Vec<Participant> = names
            .into_iter()
            .map(|name| Participant {
                name: name.clone(),
                is_human: data.is_human(name),
                avatar_url: data.avatar_urls.get(name).cloned(),
                party: membership.get(name).cloned(),
            })
            .collect();

        self.participants.save_participants(&participants).await?;
        self.events.storage_changed(TOPIC_PANEL_PARTICIPANTS);
        Ok(participants)
    }

    async fn save_panel(&self, data: &AiPanelData) -> Result<()> {
        self.participants.save_ai_panel_data(data).await?;
        self.events.storage_changed(AI_PANEL_DATA);
        Ok(())
    }

    // ============================================================================
    // Avatar configs
    // ============================================================================

    pub async fn avatar_config(&self, avatar_name: &str) -> Result<Option<AvatarConfig>> {
        self.avatar_configs.find(avatar_name).await
    }

    pub async fn save_avatar_config(&self, avatar_name: &str, config: &AvatarConfig) -> Result<()> {
        self.avatar_configs.save(avatar_name, config).await?;
        self.avatar_config_changed(avatar_name);
        Ok(())
    }

    pub async fn delete_avatar_config(&self, avatar_name: &str) -> Result<bool> {
        let deleted = self.avatar_configs.delete(avatar_name).await?;
        if deleted {
            self.avatar_config_changed(avatar_name);
        }
        Ok(deleted)
    }

    fn avatar_config_changed(&self, avatar_name: &str) {
        self.events.storage_changed(avatar_config_key(avatar_name));
        self.events.emit(AppEvent::AvatarConfigChanged {
            name: avatar_name.to_string(),
        });
    }
}
