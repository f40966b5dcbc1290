//! Buffer of unsaved edits.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Pending overlay edits keyed by `(key, overlay)`.
///
/// Serialized as `{key: {overlay: value}}` so the durable mirror stays
/// readable. Only natural keys should be written here; the write path skips
/// anything it cannot resolve against the visible rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditBuffer {
    changes: BTreeMap<String, BTreeMap<String, String>>,
}

impl EditBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pending value, replacing any earlier one.
    pub fn set(&mut self, key: impl Into<String>, overlay: impl Into<String>, value: impl Into<String>) {
        self.changes
            .entry(key.into())
            .or_default()
            .insert(overlay.into(), value.into());
    }

    /// Pending value for `(key, overlay)`.
    pub fn get(&self, key: &str, overlay: &str) -> Option<&str> {
        self.changes
            .get(key)
            .and_then(|edits| edits.get(overlay))
            .map(String::as_str)
    }

    /// Drop a single pending value.
    pub fn remove(&mut self, key: &str, overlay: &str) -> Option<String> {
        let edits = self.changes.get_mut(key)?;
        let removed = edits.remove(overlay);
        if edits.is_empty() {
            self.changes.remove(key);
        }
        removed
    }

    /// All pending values for `key`.
    pub fn edits_for(&self, key: &str) -> Option<&BTreeMap<String, String>> {
        self.changes.get(key)
    }

    /// Keys with at least one pending edit, in sorted order.
    pub fn dirty_keys(&self) -> impl Iterator<Item = &str> {
        self.changes.keys().map(String::as_str)
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of pending `(key, overlay)` values.
    pub fn len(&self) -> usize {
        self.changes.values().map(BTreeMap::len).sum()
    }
}
