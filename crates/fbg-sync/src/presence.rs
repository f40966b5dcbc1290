//! Advisory "who is editing what" registry.
//!
//! Entries live in process memory only and are never sent anywhere. Each
//! entry expires after a TTL, so an editor that never called
//! [`EditPresenceTracker::track_end`] stops showing up on its own.

use std::collections::HashMap;
use std::time::Duration;

use fbg_model::Identity;
use tokio::time::Instant;

/// Default lifetime of a presence entry.
pub const DEFAULT_PRESENCE_TTL: Duration = Duration::from_secs(5 * 60);

/// One tracked editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditPresence {
    /// Row key.
    pub key: String,
    /// Overlay being edited.
    pub overlay: String,
    /// Editor.
    pub editor: Identity,
    /// When editing started (or was last refreshed).
    pub started_at: Instant,
}

/// In-memory presence map keyed by `(key, overlay)`.
#[derive(Debug)]
pub struct EditPresenceTracker {
    ttl: Duration,
    entries: HashMap<(String, String), EditPresence>,
}

impl EditPresenceTracker {
    /// Create a tracker with the given entry lifetime.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Record that `editor` started editing `(key, overlay)`.
    pub fn track_start(&mut self, key: &str, overlay: &str, editor: &Identity) {
        self.entries.insert(
            (key.to_string(), overlay.to_string()),
            EditPresence {
                key: key.to_string(),
                overlay: overlay.to_string(),
                editor: editor.clone(),
                started_at: Instant::now(),
            },
        );
    }

    /// Stop tracking `(key, overlay)`.
    pub fn track_end(&mut self, key: &str, overlay: &str) {
        self.entries.remove(&(key.to_string(), overlay.to_string()));
    }

    /// Live editors of any overlay of `key`.
    pub fn editors_for(&self, key: &str) -> Vec<&EditPresence> {
        let now = Instant::now();
        let mut editors: Vec<_> = self
            .entries
            .values()
            .filter(|entry| entry.key == key && self.is_live(entry, now))
            .collect();
        editors.sort_by(|a, b| a.overlay.cmp(&b.overlay));
        editors
    }

    /// Whether a live editor of `key` differs from `me` in user or session.
    pub fn is_edited_by_others(&self, key: &str, me: &Identity) -> bool {
        self.editors_for(key).iter().any(|entry| entry.editor != *me)
    }

    /// Drop expired entries; returns how many were removed.
    pub fn prune(&mut self) -> usize {
        let now = Instant::now();
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.duration_since(entry.started_at) < ttl);
        let removed = before - self.entries.len();
        if removed > 0 {
            tracing::debug!("Pruned {} expired presence entries", removed);
        }
        removed
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_live(&self, entry: &EditPresence, now: Instant) -> bool {
        now.duration_since(entry.started_at) < self.ttl
    }
}

impl Default for EditPresenceTracker {
    fn default() -> Self {
        Self::new(DEFAULT_PRESENCE_TTL)
    }
}
