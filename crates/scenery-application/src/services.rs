//! Wiring of the application services over one key-value store.

use std::sync::Arc;

use scenery_core::avatar::AvatarRuntime;
use scenery_core::blob::{BlobStore, PayloadFetcher};
use scenery_core::config::SceneryConfig;
use scenery_core::event::EventBus;
use scenery_core::interaction::UserPrompt;
use scenery_core::state::AppStore;
use scenery_core::storage::KeyValueStore;
use scenery_infrastructure::{
    KvAvatarConfigRepository, KvParticipantRepository, KvPartyRepository, KvSceneRepository,
};

use crate::avatar_lifecycle::AvatarLifecycle;
use crate::participant_sync::ParticipantSync;
use crate::party::PartyService;
use crate::scene_store::{SceneStore, SceneStoreDeps};

/// External collaborators the services are built on.
pub struct Collaborators {
    pub store: Arc<dyn KeyValueStore>,
    pub app_store: Arc<dyn AppStore>,
    pub runtime: Arc<dyn AvatarRuntime>,
    pub blobs: Arc<dyn BlobStore>,
    pub fetcher: Arc<dyn PayloadFetcher>,
    pub prompt: Arc<dyn UserPrompt>,
}

/// The scene store, party service and participant sync sharing one store
/// and one event bus.
#[derive(Clone)]
pub struct SceneryServices {
    pub scenes: Arc<SceneStore>,
    pub party: Arc<PartyService>,
    pub participants: Arc<ParticipantSync>,
    pub events: EventBus,
}

impl SceneryServices {
    pub fn new(collaborators: Collaborators, config: &SceneryConfig) -> Self {
        let Collaborators {
            store,
            app_store,
            runtime,
            blobs,
            fetcher,
            prompt,
        } = collaborators;

        let events = EventBus::new();
        let scene_repository = Arc::new(KvSceneRepository::new(store.clone()));
        let party_repository = Arc::new(KvPartyRepository::new(store.clone()));
        let avatar_configs = Arc::new(KvAvatarConfigRepository::new(store.clone()));
        let participant_repository = Arc::new(KvParticipantRepository::new(store));

        let party = Arc::new(PartyService::new(
            party_repository,
            app_store.clone(),
            events.clone(),
            &config.party,
        ));

        let scenes = Arc::new(SceneStore::new(
            SceneStoreDeps {
                repository: scene_repository.clone(),
                app_store: app_store.clone(),
                party: party.clone(),
                avatars: AvatarLifecycle::new(runtime, avatar_configs.clone()),
                participants: participant_repository.clone(),
                blobs,
                fetcher,
                prompt,
                events: events.clone(),
            },
            &config.storage,
        ));

        let participants = Arc::new(ParticipantSync::new(
            participant_repository,
            scene_repository,
            avatar_configs,
            party.clone(),
            app_store,
            events.clone(),
        ));

        Self {
            scenes,
            party,
            participants,
            events,
        }
    }
}
