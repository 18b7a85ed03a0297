use std::sync::Arc;

use anyhow::{Context, Result};
use scenery_application::{Collaborators, SceneryServices};
use scenery_core::avatar::DetachedAvatarRuntime;
use scenery_core::config::SceneryConfig;
use scenery_infrastructure::{
    FileBlobStore, FileKeyValueStore, HttpPayloadFetcher, InMemoryAppStore, SceneryPaths,
};

use crate::prompt::StdinPrompt;

/// Services wired over the on-disk store.
pub struct App {
    pub services: SceneryServices,
}

impl App {
    pub async fn open(paths: &SceneryPaths, config: &SceneryConfig, assume_yes: bool) -> Result<Self> {
        let store_file = paths.store_file();
        let store = FileKeyValueStore::open(&store_file, config.storage.quota_bytes)
            .await
            .with_context(|| format!("Failed to open store {}", store_file.display()))?;
        let fetcher = HttpPayloadFetcher::new().context("Failed to build HTTP client")?;

        let services = SceneryServices::new(
            Collaborators {
                store: Arc::new(store),
                app_store: Arc::new(InMemoryAppStore::new()),
                runtime: Arc::new(DetachedAvatarRuntime),
                blobs: Arc::new(FileBlobStore::new(paths.blob_dir())),
                fetcher: Arc::new(fetcher),
                prompt: Arc::new(StdinPrompt::new(assume_yes)),
            },
            config,
        );
        services.party.hydrate_app_store().await?;

        tracing::debug!("[App] Opened store {}", store_file.display());
        Ok(Self { services })
    }
}
