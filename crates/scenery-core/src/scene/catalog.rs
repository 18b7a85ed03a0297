//! Listing and duplicate detection over stored scene entries.
//!
//! Historically a scene could end up stored twice: once under its id and
//! once under its display name. Both functions here work on already parsed
//! entries so they can be exercised without a store.

use std::collections::BTreeMap;

use super::record::{SceneEntry, SceneSummary};
use crate::storage::keys::scene_key;

/// Deduplicates entries by scene id and orders them newest first.
///
/// For each id the entry with the greatest timestamp wins; on equal
/// timestamps the canonical `scene:<id>` key is preferred. The result is
/// sorted by timestamp descending, then by id, so repeated calls over the
/// same entries produce the same sequence.
pub fn list_summaries(entries: &[SceneEntry]) -> Vec<SceneSummary> {
    let mut newest: BTreeMap<&str, &SceneEntry> = BTreeMap::new();

    for entry in entries {
        let id = entry.record.id();
        match newest.get(id) {
            Some(current) if !supersedes(entry, current) => {}
            _ => {
                newest.insert(id, entry);
            }
        }
    }

    let mut summaries: Vec<SceneSummary> =
        newest.values().map(|entry| SceneSummary::from(*entry)).collect();
    summaries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
    summaries
}

/// The entry that stands for one scene id, plus the keys of its other copies.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneGroup {
    pub newest: SceneEntry,
    pub stale_keys: Vec<String>,
}

/// Groups entries by scene id, picking the winner the same way
/// [`list_summaries`] does. Groups come back ordered by id.
pub fn group_by_id(entries: Vec<SceneEntry>) -> Vec<SceneGroup> {
    let mut groups: BTreeMap<String, SceneGroup> = BTreeMap::new();

    for entry in entries {
        let id = entry.record.id().to_string();
        match groups.get_mut(&id) {
            None => {
                groups.insert(
                    id,
                    SceneGroup {
                        newest: entry,
                        stale_keys: Vec::new(),
                    },
                );
            }
            Some(group) if supersedes(&entry, &group.newest) => {
                let previous = std::mem::replace(&mut group.newest, entry);
                group.stale_keys.push(previous.key);
            }
            Some(group) => group.stale_keys.push(entry.key),
        }
    }

    groups.into_values().collect()
}

fn supersedes(candidate: &SceneEntry, current: &SceneEntry) -> bool {
    let candidate_ts = candidate.record.timestamp();
    let current_ts = current.record.timestamp();
    if candidate_ts != current_ts {
        return candidate_ts > current_ts;
    }
    is_canonical(candidate) && !is_canonical(current)
}

fn is_canonical(entry: &SceneEntry) -> bool {
    entry.key == scene_key(entry.record.id())
}

/// Returns the keys to remove so that every scene id is stored once.
///
/// Within a group of entries sharing an id, the id-keyed entry is kept.
/// When none of them is id-keyed the newest one is kept instead.
pub fn duplicate_keys(entries: &[SceneEntry]) -> Vec<String> {
    let mut groups: BTreeMap<&str, Vec<&SceneEntry>> = BTreeMap::new();
    for entry in entries {
        groups.entry(entry.record.id()).or_default().push(entry);
    }

    let mut doomed = Vec::new();
    for group in groups.values().filter(|g| g.len() > 1) {
        let keep = group
            .iter()
            .find(|e| is_canonical(e))
            .or_else(|| group.iter().max_by_key(|e| e.record.timestamp()))
            .map(|e| e.key.as_str());

        doomed.extend(
            group
                .iter()
                .filter(|e| Some(e.key.as_str()) != keep)
                .map(|e| e.key.clone()),
        );
    }
    doomed
}
