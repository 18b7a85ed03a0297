//! Infrastructure layer: key-value store backends and everything built on them.

pub mod blob;
pub mod config_service;
pub mod dto;
pub mod kv_avatar_config_repository;
pub mod kv_document;
pub mod kv_participant_repository;
pub mod kv_party_repository;
pub mod kv_scene_repository;
pub mod memory_app_store;
pub mod paths;
pub mod storage;

pub use crate::blob::{FileBlobStore, HttpPayloadFetcher, MemoryBlobStore};
pub use crate::config_service::ConfigService;
pub use crate::kv_avatar_config_repository::KvAvatarConfigRepository;
pub use crate::kv_participant_repository::KvParticipantRepository;
pub use crate::kv_party_repository::KvPartyRepository;
pub use crate::kv_scene_repository::KvSceneRepository;
pub use crate::memory_app_store::InMemoryAppStore;
pub use crate::paths::SceneryPaths;
pub use crate::storage::{FileKeyValueStore, MemoryKeyValueStore};
