//! Typed JSON documents stored under a single key.

use std::marker::PhantomData;
use std::sync::Arc;

use scenery_core::error::Result;
use scenery_core::storage::KeyValueStore;
use serde::{Serialize, de::DeserializeOwned};

/// A JSON document of type `T` stored under one key.
///
/// A missing key loads as `None`; a value that fails to parse is logged and
/// also loads as `None`, so a corrupted entry degrades to the default
/// instead of blocking the caller.
pub struct KvDocument<T> {
    store: Arc<dyn KeyValueStore>,
    key: String,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> KvDocument<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            _phantom: PhantomData,
        }
    }

    pub async fn load(&self) -> Result<Option<T>> {
        let Some(raw) = self.store.get(&self.key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(
                    "[KvDocument] Ignoring malformed value under '{}': {}",
                    self.key,
                    e
                );
                Ok(None)
            }
        }
    }

    pub async fn load_or_default(&self) -> Result<T>
    where
        T: Default,
    {
        Ok(self.load().await?.unwrap_or_default())
    }

    pub async fn save(&self, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.store.set(&self.key, json).await
    }

    pub async fn remove(&self) -> Result<bool> {
        self.store.remove(&self.key).await
    }
}
