use std::collections::HashMap;
use std::sync::Arc;

use scenery_core::error::Result;
use scenery_core::party::{PartyConfig, PartyRepository};
use tokio::sync::RwLock;

/// Read-through cache of party templates by name.
///
/// A cached `None` records that no template of that name exists, so repeated
/// lookups of unconfigured parties don't hit storage either.
pub struct PartyConfigCache {
    repository: Arc<dyn PartyRepository>,
    templates: Arc<RwLock<HashMap<String, Option<PartyConfig>>>>,
}

impl PartyConfigCache {
    pub fn new(repository: Arc<dyn PartyRepository>) -> Self {
        Self {
            repository,
            templates: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Gets the template of a party, loading it on a miss.
    pub async fn get(&self, party_name: &str) -> Result<Option<PartyConfig>> {
        {
            let templates = self.templates.read().await;
            if let Some(cached) = templates.get(party_name) {
                return Ok(cached.clone());
            }
        }

        let loaded = self
            .repository
            .templates()
            .await?
            .into_iter()
            .find(|t| t.name == party_name);

        let mut templates = self.templates.write().await;
        templates.insert(party_name.to_string(), loaded.clone());
        Ok(loaded)
    }

    /// Drops the cached entry of a party.
    pub async fn invalidate(&self, party_name: &str) {
        let mut templates = self.templates.write().await;
        templates.remove(party_name);
    }
}
