//! `avatar-config-<name>` entries over a key-value store.

use std::sync::Arc;

use async_trait::async_trait;
use scenery_core::avatar::{AvatarConfig, AvatarConfigRepository};
use scenery_core::error::Result;
use scenery_core::storage::KeyValueStore;
use scenery_core::storage::keys::{AVATAR_CONFIG_PREFIX, avatar_config_key};

use crate::kv_document::KvDocument;

pub struct KvAvatarConfigRepository {
    store: Arc<dyn KeyValueStore>,
}

impl KvAvatarConfigRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn document(&self, avatar_name: &str) -> KvDocument<AvatarConfig> {
        KvDocument::new(self.store.clone(), avatar_config_key(avatar_name))
    }
}

#[async_trait]
impl AvatarConfigRepository for KvAvatarConfigRepository {
    async fn find(&self, avatar_name: &str) -> Result<Option<AvatarConfig>> {
        self.document(avatar_name).load().await
    }

    async fn save(&self, avatar_name: &str, config: &AvatarConfig) -> Result<()> {
        self.document(avatar_name).save(config).await
    }

    async fn delete(&self, avatar_name: &str) -> Result<bool> {
        self.document(avatar_name).remove().await
    }

    async fn names(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .keys_with_prefix(AVATAR_CONFIG_PREFIX)
            .await?
            .into_iter()
            .filter_map(|key| key.strip_prefix(AVATAR_CONFIG_PREFIX).map(str::to_string))
            .collect())
    }
}
