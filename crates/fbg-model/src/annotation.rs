//! Records of the remote annotation log.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of the append-only annotation log.
///
/// For a given `(dataset_id, key)` the current annotation is the record with
/// the highest `version`. The log is never edited in place; a save always
/// appends a new version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    /// Dataset the annotation belongs to.
    pub dataset_id: String,
    /// Natural key of the annotated row.
    pub key: String,
    /// Version number, starting at 1.
    pub version: u32,
    /// Annotated values (overlay fields plus a read-only snapshot).
    pub fields: BTreeMap<String, String>,
    /// Author of version 1.
    pub created_by: String,
    /// Creation time of version 1.
    pub created_at: DateTime<Utc>,
    /// Author of this version.
    pub modified_by: String,
    /// Time this version was written.
    pub modified_at: DateTime<Utc>,
    /// Session that wrote this version.
    pub session_id: String,
}

impl AnnotationRecord {
    /// Value of an annotated field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Total precedence order used to pick the current record of a key.
    ///
    /// Higher version wins, then later `modified_at`. The remaining
    /// comparisons only matter for malformed logs holding duplicate versions.
    /// Every field takes part, so `Equal` means the records are identical and
    /// the choice never depends on input order.
    pub fn precedence(&self, other: &Self) -> Ordering {
        self.version
            .cmp(&other.version)
            .then_with(|| self.modified_at.cmp(&other.modified_at))
            .then_with(|| self.session_id.cmp(&other.session_id))
            .then_with(|| self.created_at.cmp(&other.created_at))
            .then_with(|| self.modified_by.cmp(&other.modified_by))
            .then_with(|| self.created_by.cmp(&other.created_by))
            .then_with(|| self.dataset_id.cmp(&other.dataset_id))
            .then_with(|| self.key.cmp(&other.key))
            .then_with(|| self.fields.cmp(&other.fields))
    }
}
