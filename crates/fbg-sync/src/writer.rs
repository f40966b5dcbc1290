//! Versioned batch writes.
//!
//! A save appends one new record per dirty key. Each key is handled on its
//! own: read the key's history, take `max(version) + 1`, append. The store
//! rejects a version that another writer took in the meantime and the key is
//! retried with a fresh read.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use fbg_model::{
    AnnotationRecord, BatchResult, EditBuffer, Identity, ItemError, NoticeKind, Notices, Row,
    WriteErrorKind,
};
use fbg_store::{AnnotationStore, StoreError};

/// Default delay between consecutive appends.
pub const DEFAULT_PACING: Duration = Duration::from_millis(150);

/// Default number of re-reads after a version conflict.
pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 3;

/// Write tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteConfig {
    /// Delay between consecutive store requests of one batch.
    pub pacing: Duration,
    /// Re-reads allowed per key after a version conflict.
    pub max_conflict_retries: u32,
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self {
            pacing: DEFAULT_PACING,
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }
}

/// A dirty key resolved against the visible rows.
struct PendingWrite<'a> {
    key: &'a str,
    row: &'a Row,
    edits: &'a BTreeMap<String, String>,
}

/// Computes and appends new annotation versions.
pub struct WriteCoordinator {
    store: Arc<dyn AnnotationStore>,
    dataset_id: String,
    config: WriteConfig,
    notices: Notices,
}

impl WriteCoordinator {
    /// Create a coordinator writing to `dataset_id`.
    pub fn new(
        store: Arc<dyn AnnotationStore>,
        dataset_id: impl Into<String>,
        config: WriteConfig,
        notices: Notices,
    ) -> Self {
        Self {
            store,
            dataset_id: dataset_id.into(),
            config,
            notices,
        }
    }

    /// Dataset written to.
    pub fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    /// Save every pending edit whose key resolves to a natural-keyed row.
    ///
    /// Returns without touching the store when nothing resolves. The edit
    /// buffer is only read; clearing it is up to the caller.
    pub async fn save(&self, edits: &EditBuffer, rows: &[Row], identity: &Identity) -> BatchResult {
        let (pending, skipped_keys) = resolve(edits, rows);
        if !skipped_keys.is_empty() {
            tracing::debug!(
                "Skipping {} edited keys without a visible row",
                skipped_keys.len()
            );
        }
        if pending.is_empty() {
            return BatchResult::nothing_to_save(skipped_keys);
        }

        tracing::info!(
            "Saving {} annotations to {} as {}",
            pending.len(),
            self.dataset_id,
            identity.user
        );

        let total_count = pending.len();
        let mut saved_keys = Vec::with_capacity(total_count);
        let mut errors = Vec::new();
        for (i, write) in pending.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.pacing).await;
            }
            match self.write_key(write, identity).await {
                Ok(version) => {
                    tracing::debug!("Saved {} v{}", write.key, version);
                    saved_keys.push(write.key.to_string());
                }
                Err(error) => {
                    tracing::warn!("Failed to save {}: {}", write.key, error.message);
                    errors.push(error);
                }
            }
        }

        let result = BatchResult {
            success: errors.is_empty(),
            success_count: saved_keys.len(),
            total_count,
            errors,
            message: None,
            saved_keys,
            skipped_keys,
        };
        if !result.success {
            self.notices
                .report(NoticeKind::PartialBatchFailure, result.summary());
        }
        result
    }

    /// Append the next version of one key, retrying on conflicts.
    async fn write_key(&self, write: &PendingWrite<'_>, identity: &Identity) -> Result<u32, ItemError> {
        let mut conflicts = 0;
        loop {
            let history = self
                .store
                .fetch_history(&self.dataset_id, write.key)
                .await
                .map_err(|e| item_error(write.key, WriteErrorKind::HistoryUnavailable, &e))?;

            let Some(record) = next_record(&self.dataset_id, write, &history, identity, Utc::now())
            else {
                return Err(ItemError {
                    key: write.key.to_string(),
                    kind: WriteErrorKind::VersionExhausted,
                    message: format!("version {} cannot be followed", u32::MAX),
                });
            };
            let version = record.version;
            match self.store.append(&record).await {
                Ok(()) => return Ok(version),
                Err(e @ StoreError::VersionConflict { .. }) => {
                    if conflicts >= self.config.max_conflict_retries {
                        self.notices.report(
                            NoticeKind::VersionConflict,
                            format!("{} after {} retries", e, conflicts),
                        );
                        return Err(item_error(write.key, WriteErrorKind::VersionConflict, &e));
                    }
                    conflicts += 1;
                    tracing::debug!("{}; re-reading history (retry {})", e, conflicts);
                    tokio::time::sleep(self.config.pacing).await;
                }
                Err(e) => return Err(item_error(write.key, WriteErrorKind::AppendFailed, &e)),
            }
        }
    }
}

fn item_error(key: &str, kind: WriteErrorKind, error: &StoreError) -> ItemError {
    ItemError {
        key: key.to_string(),
        kind,
        message: error.to_string(),
    }
}

/// Split dirty keys into writable ones and ones without a natural-keyed row.
fn resolve<'a>(edits: &'a EditBuffer, rows: &'a [Row]) -> (Vec<PendingWrite<'a>>, Vec<String>) {
    let mut pending = Vec::new();
    let mut skipped = Vec::new();
    for key in edits.dirty_keys() {
        let row = rows.iter().find(|row| row.natural_key() == Some(key));
        match (row, edits.edits_for(key)) {
            (Some(row), Some(changes)) if !changes.is_empty() => pending.push(PendingWrite {
                key,
                row,
                edits: changes,
            }),
            _ => skipped.push(key.to_string()),
        }
    }
    (pending, skipped)
}

/// Build the record that follows `history`.
///
/// Fields are layered: read-only snapshot, then the row's last known overlay
/// values, then the edits. Authorship of version 1 carries forward. `None`
/// when the latest version is `u32::MAX`.
fn next_record(
    dataset_id: &str,
    write: &PendingWrite<'_>,
    history: &[AnnotationRecord],
    identity: &Identity,
    now: DateTime<Utc>,
) -> Option<AnnotationRecord> {
    let version = history
        .iter()
        .map(|r| r.version)
        .max()
        .unwrap_or(0)
        .checked_add(1)?;
    let (created_by, created_at) = history
        .iter()
        .min_by_key(|r| r.version)
        .map(|first| (first.created_by.clone(), first.created_at))
        .unwrap_or_else(|| (identity.user.clone(), now));

    let mut fields = BTreeMap::new();
    for field in &write.row.readonly {
        fields.insert(field.column.clone(), field.cell.text.clone());
    }
    for field in &write.row.overlay {
        fields.insert(field.overlay.clone(), field.cell.text.clone());
    }
    for (overlay, value) in write.edits {
        fields.insert(overlay.clone(), value.clone());
    }

    Some(AnnotationRecord {
        dataset_id: dataset_id.to_string(),
        key: write.key.to_string(),
        version,
        fields,
        created_by,
        created_at,
        modified_by: identity.user.clone(),
        modified_at: now,
        session_id: identity.session_id.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fbg_model::{OverlayCell, OverlayField, ReadonlyCell, ReadonlyField, RowKey};

    fn row(key: &str) -> Row {
        Row {
            key: RowKey::Natural(key.to_string()),
            index: 0,
            readonly: vec![ReadonlyField {
                column: "customer".to_string(),
                cell: ReadonlyCell {
                    text: key.to_string(),
                    selectable: true,
                    ..Default::default()
                },
            }],
            overlay: vec![
                OverlayField {
                    overlay: "status".to_string(),
                    cell: OverlayCell::with_text("Open"),
                },
                OverlayField {
                    overlay: "comments".to_string(),
                    cell: OverlayCell::with_text("old note"),
                },
            ],
        }
    }

    fn history(key: &str, version: u32, created_by: &str) -> AnnotationRecord {
        let at = Utc.with_ymd_and_hms(2026, 1, version, 9, 0, 0).unwrap();
        AnnotationRecord {
            dataset_id: "sales".to_string(),
            key: key.to_string(),
            version,
            fields: BTreeMap::new(),
            created_by: created_by.to_string(),
            created_at: at,
            modified_by: created_by.to_string(),
            modified_at: at,
            session_id: "old".to_string(),
        }
    }

    #[test]
    fn test_resolve_skips_synthetic_and_missing_rows() {
        let mut edits = EditBuffer::new();
        edits.set("Acme", "status", "Done");
        edits.set("row-3-page-1", "status", "Done");
        edits.set("Gone", "status", "Done");
        let rows = vec![
            row("Acme"),
            Row {
                key: RowKey::Synthetic { index: 3, page: 1 },
                ..row("x")
            },
        ];

        let (pending, skipped) = resolve(&edits, &rows);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].key, "Acme");
        assert_eq!(skipped, vec!["Gone".to_string(), "row-3-page-1".to_string()]);
    }

    #[test]
    fn test_next_record_layers_fields_and_carries_authorship() {
        let mut edits = EditBuffer::new();
        edits.set("Acme", "status", "Done");
        let rows = vec![row("Acme")];
        let (pending, _) = resolve(&edits, &rows);
        let identity = Identity::new("carol", "s-9");
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap();
        let history = vec![history("Acme", 2, "bob"), history("Acme", 1, "ann")];

        let record = next_record("sales", &pending[0], &history, &identity, now).unwrap();

        assert_eq!(record.version, 3);
        assert_eq!(record.created_by, "ann");
        assert_eq!(record.created_at, history[1].created_at);
        assert_eq!(record.modified_by, "carol");
        assert_eq!(record.modified_at, now);
        assert_eq!(record.session_id, "s-9");
        assert_eq!(record.field("customer"), Some("Acme"));
        assert_eq!(record.field("status"), Some("Done"));
        assert_eq!(record.field("comments"), Some("old note"));
    }

    #[test]
    fn test_first_version_is_stamped_fresh() {
        let mut edits = EditBuffer::new();
        edits.set("Acme", "comments", "new");
        let rows = vec![row("Acme")];
        let (pending, _) = resolve(&edits, &rows);
        let identity = Identity::new("carol", "s-9");
        let now = Utc::now();

        let record = next_record("sales", &pending[0], &[], &identity, now).unwrap();
        assert_eq!(record.version, 1);
        assert_eq!(record.created_by, "carol");
        assert_eq!(record.created_at, now);
    }

    #[test]
    fn test_next_record_stops_at_highest_version() {
        let mut edits = EditBuffer::new();
        edits.set("Acme", "status", "Done");
        let rows = vec![row("Acme")];
        let (pending, _) = resolve(&edits, &rows);
        let identity = Identity::new("carol", "s-9");
        let mut latest = history("Acme", 1, "bob");
        latest.version = u32::MAX;

        assert!(next_record("sales", &pending[0], &[latest], &identity, Utc::now()).is_none());
    }
}
