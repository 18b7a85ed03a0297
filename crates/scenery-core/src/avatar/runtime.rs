//! Contracts of the avatar runtime.
//!
//! The runtime renders and voices avatars; this crate only starts, configures
//! and stops instances. Every instance method defaults to a no-op so a
//! runtime only implements the capabilities it has, and every call may fail.

use std::sync::Arc;

use crate::error::Result;
use crate::scene::AvatarData;

/// A live avatar instance.
#[async_trait::async_trait]
pub trait AvatarInstance: Send + Sync {
    async fn stop(&self) -> Result<()> {
        Ok(())
    }

    async fn set_voice(&self, _voice: &str) -> Result<()> {
        Ok(())
    }

    async fn set_personality(&self, _personality: &str) -> Result<()> {
        Ok(())
    }

    async fn set_mood(&self, _mood: &str) -> Result<()> {
        Ok(())
    }

    async fn set_view(&self, _view: &str) -> Result<()> {
        Ok(())
    }

    async fn say(&self, _text: &str) -> Result<()> {
        Ok(())
    }
}

/// Creates and looks up avatar instances, addressed by box and element id.
#[async_trait::async_trait]
pub trait AvatarRuntime: Send + Sync {
    /// Starts an instance for the avatar element.
    async fn initialize(
        &self,
        box_id: &str,
        element_id: &str,
        avatar: &AvatarData,
    ) -> Result<Arc<dyn AvatarInstance>>;

    /// Returns the running instance of an avatar element, if any.
    async fn instance(&self, box_id: &str, element_id: &str) -> Option<Arc<dyn AvatarInstance>>;

    /// Forgets an instance after it was stopped.
    async fn release(&self, _box_id: &str, _element_id: &str) {}
}

/// Instance with no capabilities.
pub struct DetachedInstance;

#[async_trait::async_trait]
impl AvatarInstance for DetachedInstance {}

/// Runtime used when no renderer is attached (CLI, batch tooling).
#[derive(Default)]
pub struct DetachedAvatarRuntime;

#[async_trait::async_trait]
impl AvatarRuntime for DetachedAvatarRuntime {
    async fn initialize(
        &self,
        _box_id: &str,
        _element_id: &str,
        _avatar: &AvatarData,
    ) -> Result<Arc<dyn AvatarInstance>> {
        Ok(Arc::new(DetachedInstance))
    }

    async fn instance(&self, _box_id: &str, _element_id: &str) -> Option<Arc<dyn AvatarInstance>> {
        None
    }
}
