//! Avatar configuration and runtime contracts.

pub mod model;
pub mod repository;
pub mod runtime;

pub use model::AvatarConfig;
pub use repository::AvatarConfigRepository;
pub use runtime::{AvatarInstance, AvatarRuntime, DetachedAvatarRuntime, DetachedInstance};
