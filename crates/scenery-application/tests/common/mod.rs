#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use scenery_application::{Collaborators, SceneryServices};
use scenery_core::SceneryError;
use scenery_core::avatar::{AvatarInstance, AvatarRuntime};
use scenery_core::blob::PayloadFetcher;
use scenery_core::config::SceneryConfig;
use scenery_core::error::Result;
use scenery_core::event::AppEvent;
use scenery_core::interaction::{Notice, NoticeLevel, UserPrompt};
use scenery_core::scene::{AvatarData, Element, Scene, SceneBox};
use scenery_core::storage::KeyValueStore;
use scenery_infrastructure::{InMemoryAppStore, MemoryBlobStore, MemoryKeyValueStore};
use tokio::sync::broadcast;

// ============================================================================
// Avatar runtime fake
// ============================================================================

/// Log of avatar runtime calls, e.g. `init:Alice`, `voice:Alice:alto`.
#[derive(Default)]
pub struct CallLog {
    calls: Mutex<Vec<String>>,
}

impl CallLog {
    fn push(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

pub struct RecordingInstance {
    name: String,
    log: Arc<CallLog>,
}

#[async_trait]
impl AvatarInstance for RecordingInstance {
    async fn stop(&self) -> Result<()> {
        self.log.push(format!("stop:{}", self.name));
        Ok(())
    }

    async fn set_voice(&self, voice: &str) -> Result<()> {
        self.log.push(format!("voice:{}:{}", self.name, voice));
        Ok(())
    }

    async fn set_mood(&self, mood: &str) -> Result<()> {
        self.log.push(format!("mood:{}:{}", self.name, mood));
        Ok(())
    }
}

/// Runtime that records every call and fails for configured avatar names.
#[derive(Default)]
pub struct RecordingRuntime {
    pub log: Arc<CallLog>,
    failing: Mutex<HashSet<String>>,
    instances: Mutex<HashMap<(String, String), Arc<RecordingInstance>>>,
}

impl RecordingRuntime {
    pub fn fail_for(&self, avatar_name: &str) {
        self.failing.lock().unwrap().insert(avatar_name.to_string());
    }

    pub fn live_instances(&self) -> usize {
        self.instances.lock().unwrap().len()
    }
}

#[async_trait]
impl AvatarRuntime for RecordingRuntime {
    async fn initialize(
        &self,
        box_id: &str,
        element_id: &str,
        avatar: &AvatarData,
    ) -> Result<Arc<dyn AvatarInstance>> {
        if self.failing.lock().unwrap().contains(&avatar.name) {
            return Err(SceneryError::avatar(format!("{} failed to load", avatar.name)));
        }
        self.log.push(format!("init:{}", avatar.name));
        let instance = Arc::new(RecordingInstance {
            name: avatar.name.clone(),
            log: self.log.clone(),
        });
        self.instances
            .lock()
            .unwrap()
            .insert((box_id.to_string(), element_id.to_string()), instance.clone());
        Ok(instance as Arc<dyn AvatarInstance>)
    }

    async fn instance(&self, box_id: &str, element_id: &str) -> Option<Arc<dyn AvatarInstance>> {
        let key = (box_id.to_string(), element_id.to_string());
        let instance = self.instances.lock().unwrap().get(&key).cloned()?;
        Some(instance as Arc<dyn AvatarInstance>)
    }

    async fn release(&self, box_id: &str, element_id: &str) {
        let key = (box_id.to_string(), element_id.to_string());
        self.instances.lock().unwrap().remove(&key);
    }
}

// ============================================================================
// User prompt fake
// ============================================================================

/// Prompt answering from a script and recording what it was asked.
pub struct ScriptedPrompt {
    confirm_answer: Mutex<bool>,
    scene_file: Mutex<Option<Vec<u8>>>,
    pub confirmations: Mutex<Vec<String>>,
    pub notices: Mutex<Vec<Notice>>,
    pub file_requests: Mutex<Vec<String>>,
}

impl Default for ScriptedPrompt {
    fn default() -> Self {
        Self {
            confirm_answer: Mutex::new(true),
            scene_file: Mutex::new(None),
            confirmations: Mutex::new(Vec::new()),
            notices: Mutex::new(Vec::new()),
            file_requests: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedPrompt {
    pub fn answer_confirm(&self, answer: bool) {
        *self.confirm_answer.lock().unwrap() = answer;
    }

    pub fn supply_scene_file(&self, payload: Vec<u8>) {
        *self.scene_file.lock().unwrap() = Some(payload);
    }

    pub fn notices_of(&self, level: NoticeLevel) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.level == level)
            .map(|n| n.message.clone())
            .collect()
    }
}

#[async_trait]
impl UserPrompt for ScriptedPrompt {
    async fn confirm(&self, message: &str) -> bool {
        self.confirmations.lock().unwrap().push(message.to_string());
        *self.confirm_answer.lock().unwrap()
    }

    async fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }

    async fn provide_scene_file(&self, scene_name: &str, _file_url: &str) -> Option<Vec<u8>> {
        self.file_requests
            .lock()
            .unwrap()
            .push(scene_name.to_string());
        self.scene_file.lock().unwrap().clone()
    }
}

// ============================================================================
// Payload fetcher spy
// ============================================================================

/// Fetcher delegating to a memory blob store and recording requested URLs.
pub struct SpyFetcher {
    inner: Arc<MemoryBlobStore>,
    pub urls: Mutex<Vec<String>>,
}

#[async_trait]
impl PayloadFetcher for SpyFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.urls.lock().unwrap().push(url.to_string());
        self.inner.fetch(url).await
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub kv: Arc<MemoryKeyValueStore>,
    pub app_store: Arc<InMemoryAppStore>,
    pub runtime: Arc<RecordingRuntime>,
    pub blobs: Arc<MemoryBlobStore>,
    pub fetcher: Arc<SpyFetcher>,
    pub prompt: Arc<ScriptedPrompt>,
    pub services: SceneryServices,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(SceneryConfig::default(), MemoryKeyValueStore::new())
    }

    pub fn with(config: SceneryConfig, kv: MemoryKeyValueStore) -> Self {
        let kv = Arc::new(kv);
        let app_store = Arc::new(InMemoryAppStore::new());
        let runtime = Arc::new(RecordingRuntime::default());
        let blobs = Arc::new(MemoryBlobStore::new());
        let fetcher = Arc::new(SpyFetcher {
            inner: blobs.clone(),
            urls: Mutex::new(Vec::new()),
        });
        let prompt = Arc::new(ScriptedPrompt::default());

        let services = SceneryServices::new(
            Collaborators {
                store: kv.clone(),
                app_store: app_store.clone(),
                runtime: runtime.clone(),
                blobs: blobs.clone(),
                fetcher: fetcher.clone(),
                prompt: prompt.clone(),
            },
            &config,
        );

        Self {
            kv,
            app_store,
            runtime,
            blobs,
            fetcher,
            prompt,
            services,
        }
    }

    pub async fn put_raw(&self, key: &str, value: serde_json::Value) {
        self.kv.set(key, value.to_string()).await.unwrap();
    }

    pub async fn raw(&self, key: &str) -> Option<serde_json::Value> {
        self.kv
            .get(key)
            .await
            .unwrap()
            .map(|raw| serde_json::from_str(&raw).unwrap())
    }

    pub async fn kv_raw_string(&self, key: &str) -> Option<String> {
        self.kv.get(key).await.unwrap()
    }

    pub async fn scene_keys(&self) -> Vec<String> {
        self.kv.keys_with_prefix("scene:").await.unwrap()
    }
}

// ============================================================================
// Builders
// ============================================================================

/// A box holding avatar elements given as `(element_id, name)`.
pub fn avatar_box(box_id: &str, party: Option<&str>, avatars: &[(&str, &str)]) -> SceneBox {
    let mut scene_box = SceneBox::new(box_id);
    scene_box.party = party.map(str::to_string);
    for (element_id, name) in avatars {
        scene_box
            .elements
            .push(Element::avatar(*element_id, AvatarData::new(*name)));
    }
    scene_box
}

pub fn scene(id: &str, name: &str, boxes: Vec<SceneBox>) -> Scene {
    Scene {
        id: id.to_string(),
        name: name.to_string(),
        boxes,
        ..Default::default()
    }
}

/// Collects the events received so far.
pub fn drain(rx: &mut broadcast::Receiver<AppEvent>) -> Vec<AppEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
