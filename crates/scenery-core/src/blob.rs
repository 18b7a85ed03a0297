//! External payload storage for scenes too large for the key-value store.

use crate::error::Result;

/// Produces a fetchable URL for a payload.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `payload` for `scene_id` and returns a URL it can be fetched from.
    async fn put(&self, scene_id: &str, payload: Vec<u8>) -> Result<String>;

    /// Drops the payload behind a URL returned by `put`. Returns whether it
    /// existed.
    async fn remove(&self, url: &str) -> Result<bool>;
}

/// Fetches the bytes behind a URL.
#[async_trait::async_trait]
pub trait PayloadFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}
