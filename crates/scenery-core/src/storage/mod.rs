//! Key-value storage contract.
//!
//! Everything the editor persists lives in one flat, string-keyed namespace
//! whose values are JSON documents. This module defines the store trait and
//! the key layout shared by every repository.

pub mod keys;

use crate::error::Result;

/// A flat, size-constrained string key-value store.
///
/// Implementations may reject writes that would exceed their capacity with
/// [`SceneryError::QuotaExceeded`](crate::SceneryError::QuotaExceeded); the
/// previous value of the key must then be left intact.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the raw value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Removes `key`. Returns whether a value was present.
    async fn remove(&self, key: &str) -> Result<bool>;

    /// Returns every key currently in the store.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Returns the keys starting with `prefix`, in store order.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .keys()
            .await?
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect())
    }
}
