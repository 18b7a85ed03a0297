//! Change notifications.
//!
//! Other open views subscribe and re-read the keys they care about. Payloads
//! are hints only; consumers must re-read the store.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Events emitted after writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AppEvent {
    /// A storage key changed.
    StorageChanged { key: Option<String> },
    /// Stored scenes were rewritten with new human participant flags.
    ScenesUpdatedWithHumanParticipants,
    ParticipantsChanged,
    TopicChanged,
    AvatarConfigChanged { name: String },
    PartyConfigsChanged,
    ScenesListChanged,
}

/// Broadcast channel for [`AppEvent`]s.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
}

impl EventBus {
    const CAPACITY: usize = 256;

    pub fn new() -> Self {
        let (sender, _rx) = broadcast::channel(Self::CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// Emits an event. Having no subscriber is not an error.
    pub fn emit(&self, event: AppEvent) {
        tracing::debug!("[EventBus] emit {:?}", event);
        let _ = self.sender.send(event);
    }

    /// Emits `StorageChanged` for a key.
    pub fn storage_changed(&self, key: impl Into<String>) {
        self.emit(AppEvent::StorageChanged {
            key: Some(key.into()),
        });
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
