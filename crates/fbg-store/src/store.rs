//! The annotation store seam.

use async_trait::async_trait;
use fbg_model::{AnnotationRecord, NoticeKind, Notices};

use crate::error::{Result, StoreError};

/// Append-only log of annotation records.
///
/// Implementations must reject an append whose `(dataset_id, key, version)`
/// already exists with [`StoreError::VersionConflict`].
#[async_trait]
pub trait AnnotationStore: Send + Sync {
    /// Every record of `dataset_id`, all versions, in no particular order.
    async fn fetch_all(&self, dataset_id: &str) -> Result<Vec<AnnotationRecord>>;

    /// Append one record.
    async fn append(&self, record: &AnnotationRecord) -> Result<()>;

    /// Every version of one key.
    async fn fetch_history(&self, dataset_id: &str, key: &str) -> Result<Vec<AnnotationRecord>> {
        let mut records = self.fetch_all(dataset_id).await?;
        records.retain(|record| record.key == key);
        Ok(records)
    }
}

/// Fetch for display: failures degrade to an empty list and are reported.
pub async fn fetch_all_or_empty(
    store: &dyn AnnotationStore,
    dataset_id: &str,
    notices: &Notices,
) -> Vec<AnnotationRecord> {
    match store.fetch_all(dataset_id).await {
        Ok(records) => {
            tracing::debug!(
                "Fetched {} annotation records for {}",
                records.len(),
                dataset_id
            );
            records
        }
        Err(e) => {
            report_fetch_error(notices, dataset_id, &e);
            Vec::new()
        }
    }
}

/// Report a failed annotation fetch under the matching notice kind.
pub fn report_fetch_error(notices: &Notices, dataset_id: &str, error: &StoreError) {
    let kind = match error {
        StoreError::MalformedResponse(_) => NoticeKind::MalformedResponse,
        _ => NoticeKind::FetchFailure,
    };
    notices.report(kind, format!("annotations for {dataset_id}: {error}"));
}
