//! Save batch results.

use serde::{Deserialize, Serialize};

/// Message of the result returned when there is nothing to save.
pub const NO_CHANGES_MESSAGE: &str = "no changes";

/// Why a single write failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteErrorKind {
    /// The key history could not be read, so no version was computed.
    HistoryUnavailable,
    /// The store rejected the append.
    AppendFailed,
    /// Another writer took the computed version and retries ran out.
    VersionConflict,
    /// The key already holds the highest representable version.
    VersionExhausted,
}

/// Per-item failure of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    /// Natural key of the failed item.
    pub key: String,
    /// Failure category.
    pub kind: WriteErrorKind,
    /// Human-readable detail.
    pub message: String,
}

/// Outcome of one save.
///
/// `success` is true only when every item was written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Every item succeeded.
    pub success: bool,
    /// Number of items written.
    pub success_count: usize,
    /// Number of items attempted.
    pub total_count: usize,
    /// Failed items.
    pub errors: Vec<ItemError>,
    /// Summary message, set when nothing was attempted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Keys written successfully.
    pub saved_keys: Vec<String>,
    /// Keys with edits that did not resolve against the visible rows.
    pub skipped_keys: Vec<String>,
}

impl BatchResult {
    /// Result for a save with nothing to write.
    pub fn nothing_to_save(skipped_keys: Vec<String>) -> Self {
        Self {
            success: false,
            message: Some(NO_CHANGES_MESSAGE.to_string()),
            skipped_keys,
            ..Default::default()
        }
    }

    /// Whether nothing was attempted.
    pub fn is_noop(&self) -> bool {
        self.total_count == 0
    }

    /// Whether some but not all items failed.
    pub fn is_partial(&self) -> bool {
        !self.errors.is_empty() && self.success_count > 0
    }

    /// One-line summary for display.
    pub fn summary(&self) -> String {
        if let Some(message) = &self.message {
            return message.clone();
        }
        if self.success {
            format!("saved {} of {}", self.success_count, self.total_count)
        } else {
            format!(
                "saved {} of {}, {} failed",
                self.success_count,
                self.total_count,
                self.errors.len()
            )
        }
    }
}
