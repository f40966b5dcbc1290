//! In-process annotation store.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use fbg_model::AnnotationRecord;
use parking_lot::Mutex;

use crate::error::{Result, StoreError};
use crate::store::AnnotationStore;

/// Annotation log held in memory.
///
/// Enforces `(dataset_id, key, version)` uniqueness like the remote store.
/// Used by the CLI's offline mode and as the reference store in tests.
#[derive(Debug, Default)]
pub struct InMemoryAnnotationStore {
    records: Mutex<Vec<AnnotationRecord>>,
    fetches: AtomicUsize,
    appends: AtomicUsize,
}

impl InMemoryAnnotationStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `records`, without uniqueness checks.
    pub fn with_records(records: Vec<AnnotationRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    /// Copy of every stored record, in append order.
    pub fn records(&self) -> Vec<AnnotationRecord> {
        self.records.lock().clone()
    }

    /// Number of `fetch_all` calls served.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of `append` calls received, including rejected ones.
    pub fn append_count(&self) -> usize {
        self.appends.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnnotationStore for InMemoryAnnotationStore {
    async fn fetch_all(&self, dataset_id: &str) -> Result<Vec<AnnotationRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .records
            .lock()
            .iter()
            .filter(|record| record.dataset_id == dataset_id)
            .cloned()
            .collect())
    }

    async fn append(&self, record: &AnnotationRecord) -> Result<()> {
        self.appends.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records.lock();
        let taken = records.iter().any(|existing| {
            existing.dataset_id == record.dataset_id
                && existing.key == record.key
                && existing.version == record.version
        });
        if taken {
            return Err(StoreError::VersionConflict {
                key: record.key.clone(),
                version: record.version,
            });
        }
        records.push(record.clone());
        Ok(())
    }
}
