//! Mirror snapshot type.

use chrono::{DateTime, Utc};
use fbg_model::EditBuffer;
use serde::{Deserialize, Serialize};

/// Unsaved edits as written to disk.
///
/// ```json
/// {"changes": {"Acme": {"status": "Done"}}, "timestamp": "...", "user": "ann"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorSnapshot {
    /// Pending edits, `key -> overlay -> value`.
    pub changes: EditBuffer,
    /// When the snapshot was written.
    pub timestamp: DateTime<Utc>,
    /// User who made the edits.
    pub user: String,
}

impl MirrorSnapshot {
    /// Snapshot `changes` for `user`, stamped now.
    pub fn new(changes: EditBuffer, user: impl Into<String>) -> Self {
        Self {
            changes,
            timestamp: Utc::now(),
            user: user.into(),
        }
    }
}
