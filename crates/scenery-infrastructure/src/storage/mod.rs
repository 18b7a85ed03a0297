//! Key-value store backends.

pub mod atomic_json;
pub mod file_store;
pub mod memory_store;

pub use file_store::FileKeyValueStore;
pub use memory_store::MemoryKeyValueStore;

use std::collections::BTreeMap;

use scenery_core::error::{Result, SceneryError};

/// Bytes used by keys plus values.
pub(crate) fn used_bytes(entries: &BTreeMap<String, String>) -> usize {
    entries.iter().map(|(k, v)| k.len() + v.len()).sum()
}

/// Fails with `QuotaExceeded` if storing `value` under `key` would push the
/// store past `quota` bytes.
pub(crate) fn check_quota(
    entries: &BTreeMap<String, String>,
    key: &str,
    value: &str,
    quota: usize,
) -> Result<()> {
    let current = used_bytes(entries);
    let replaced = entries.get(key).map(|old| key.len() + old.len()).unwrap_or(0);
    let size = key.len() + value.len();
    if current - replaced + size > quota {
        return Err(SceneryError::QuotaExceeded {
            key: key.to_string(),
            size,
            quota,
        });
    }
    Ok(())
}
