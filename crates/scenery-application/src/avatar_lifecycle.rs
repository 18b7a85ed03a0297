//! Avatar instance lifecycle on scene load and close.
//!
//! Every avatar is handled independently: a failing avatar is logged and
//! recorded in the report while the rest carry on.

use std::sync::Arc;

use scenery_core::avatar::{AvatarConfig, AvatarConfigRepository, AvatarInstance, AvatarRuntime};
use scenery_core::error::Result;
use scenery_core::scene::Scene;
use serde::Serialize;

/// One avatar that could not be initialized, configured or stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarFailure {
    pub box_id: String,
    pub element_id: String,
    pub avatar_name: String,
    pub message: String,
}

/// Outcome of initializing or stopping a scene's avatars.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarReport {
    /// Names of the avatars handled successfully.
    pub succeeded: Vec<String>,
    pub failures: Vec<AvatarFailure>,
}

impl AvatarReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct AvatarLifecycle {
    runtime: Arc<dyn AvatarRuntime>,
    configs: Arc<dyn AvatarConfigRepository>,
}

impl AvatarLifecycle {
    pub fn new(runtime: Arc<dyn AvatarRuntime>, configs: Arc<dyn AvatarConfigRepository>) -> Self {
        Self { runtime, configs }
    }

    /// Starts every avatar of a scene and applies its saved configuration.
    pub async fn initialize_scene(&self, scene: &Scene) -> AvatarReport {
        let mut report = AvatarReport::default();

        for (scene_box, element) in scene.avatar_elements() {
            let Some(avatar) = element.as_avatar() else {
                continue;
            };
            let name = element.avatar_display_name();

            let result = match self.runtime.initialize(&scene_box.id, &element.id, avatar).await {
                Ok(instance) => self.configure(&name, instance.as_ref()).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => report.succeeded.push(name),
                Err(e) => {
                    tracing::warn!(
                        "[AvatarLifecycle] Failed to initialize avatar '{}' in box {}: {}",
                        name,
                        scene_box.id,
                        e
                    );
                    report.failures.push(AvatarFailure {
                        box_id: scene_box.id.clone(),
                        element_id: element.id.clone(),
                        avatar_name: name,
                        message: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "[AvatarLifecycle] Initialized {} avatar(s) of scene {} ({} failed)",
            report.succeeded.len(),
            scene.id,
            report.failures.len()
        );
        report
    }

    /// Stops every live avatar instance of a scene.
    pub async fn stop_scene(&self, scene: &Scene) -> AvatarReport {
        let mut report = AvatarReport::default();

        for (scene_box, element) in scene.avatar_elements() {
            let Some(instance) = self.runtime.instance(&scene_box.id, &element.id).await else {
                continue;
            };
            let name = element.avatar_display_name();

            match instance.stop().await {
                Ok(()) => report.succeeded.push(name),
                Err(e) => {
                    tracing::warn!(
                        "[AvatarLifecycle] Failed to stop avatar '{}' in box {}: {}",
                        name,
                        scene_box.id,
                        e
                    );
                    report.failures.push(AvatarFailure {
                        box_id: scene_box.id.clone(),
                        element_id: element.id.clone(),
                        avatar_name: name,
                        message: e.to_string(),
                    });
                }
            }
            self.runtime.release(&scene_box.id, &element.id).await;
        }

        report
    }

    async fn configure(&self, avatar_name: &str, instance: &dyn AvatarInstance) -> Result<()> {
        match self.configs.find(avatar_name).await? {
            Some(config) => apply_config(instance, &config).await,
            None => Ok(()),
        }
    }
}

/// Pushes the set fields of a saved configuration to an instance.
pub async fn apply_config(instance: &dyn AvatarInstance, config: &AvatarConfig) -> Result<()> {
    if let Some(voice) = &config.voice {
        instance.set_voice(voice).await?;
    }
    if let Some(personality) = &config.personality {
        instance.set_personality(personality).await?;
    }
    if let Some(mood) = &config.mood {
        instance.set_mood(mood).await?;
    }
    if let Some(view) = &config.view {
        instance.set_view(view).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenery_core::SceneryError;
    use scenery_core::scene::{AvatarData, Element, SceneBox};
    use scenery_infrastructure::{KvAvatarConfigRepository, MemoryKeyValueStore};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    struct RecordingInstance {
        name: String,
        recorder: Arc<Recorder>,
    }

    #[async_trait::async_trait]
    impl AvatarInstance for RecordingInstance {
        async fn stop(&self) -> Result<()> {
            self.recorder
                .calls
                .lock()
                .unwrap()
                .push(format!("stop:{}", self.name));
            Ok(())
        }

        async fn set_voice(&self, voice: &str) -> Result<()> {
            self.recorder
                .calls
                .lock()
                .unwrap()
                .push(format!("voice:{}:{}", self.name, voice));
            Ok(())
        }
    }

    #[derive(Default)]
    struct FlakyRuntime {
        recorder: Arc<Recorder>,
        instances: Mutex<HashMap<String, Arc<RecordingInstance>>>,
    }

    #[async_trait::async_trait]
    impl AvatarRuntime for FlakyRuntime {
        async fn initialize(
            &self,
            _box_id: &str,
            element_id: &str,
            avatar: &AvatarData,
        ) -> Result<Arc<dyn AvatarInstance>> {
            if avatar.name == "Broken" {
                return Err(SceneryError::avatar("model failed to load"));
            }
            let instance = Arc::new(RecordingInstance {
                name: avatar.name.clone(),
                recorder: self.recorder.clone(),
            });
            self.instances
                .lock()
                .unwrap()
                .insert(element_id.to_string(), instance.clone());
            Ok(instance as Arc<dyn AvatarInstance>)
        }

        async fn instance(&self, _box_id: &str, element_id: &str) -> Option<Arc<dyn AvatarInstance>> {
            let instance = self.instances.lock().unwrap().get(element_id).cloned()?;
            Some(instance as Arc<dyn AvatarInstance>)
        }
    }

    fn scene() -> Scene {
        let mut b1 = SceneBox::new("b1");
        b1.elements.push(Element::avatar("e1", AvatarData::new("Alice")));
        b1.elements.push(Element::avatar("e2", AvatarData::new("Broken")));
        let mut b2 = SceneBox::new("b2");
        b2.elements.push(Element::avatar("e3", AvatarData::new("Bob")));
        Scene {
            id: "s1".to_string(),
            name: "S".to_string(),
            boxes: vec![b1, b2],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_failures_do_not_abort_remaining_avatars() {
        let runtime = Arc::new(FlakyRuntime::default());
        let configs = Arc::new(KvAvatarConfigRepository::new(Arc::new(
            MemoryKeyValueStore::new(),
        )));
        configs
            .save(
                "Bob",
                &AvatarConfig {
                    voice: Some("baritone".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let lifecycle = AvatarLifecycle::new(runtime.clone(), configs);
        let report = lifecycle.initialize_scene(&scene()).await;

        assert_eq!(report.succeeded, vec!["Alice".to_string(), "Bob".to_string()]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].avatar_name, "Broken");
        assert_eq!(report.failures[0].element_id, "e2");
        assert_eq!(
            runtime.recorder.calls.lock().unwrap().clone(),
            vec!["voice:Bob:baritone".to_string()]
        );

        let stopped = lifecycle.stop_scene(&scene()).await;
        assert!(stopped.is_clean());
        assert_eq!(stopped.succeeded, vec!["Alice".to_string(), "Bob".to_string()]);
    }
}
