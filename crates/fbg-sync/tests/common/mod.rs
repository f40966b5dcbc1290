//! Scripted engine and store shared by the session tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use fbg_model::{
    AnnotationRecord, ColumnDef, EngineCell, GridLayout, Identity, Notices, PageMatrix,
    PageRequest,
};
use fbg_paging::{DataEngine, EngineError};
use fbg_persistence::EditMirror;
use fbg_store::{AnnotationStore, InMemoryAnnotationStore, StoreError};
use fbg_sync::{GridSession, SessionConfig, WriteConfig};
use parking_lot::Mutex;
use tokio::sync::Notify;

pub const DATASET: &str = "sales";

/// Engine serving `customer, revenue` rows from memory.
pub struct VecEngine {
    dataset: String,
    rows: Vec<(String, f64)>,
}

impl VecEngine {
    /// 250 rows; the first two are Acme and Beta.
    pub fn sample() -> Self {
        let rows = (0..250)
            .map(|i| {
                let name = match i {
                    0 => "Acme".to_string(),
                    1 => "Beta".to_string(),
                    _ => format!("customer-{i}"),
                };
                (name, f64::from(i) * 10.0)
            })
            .collect();
        Self {
            dataset: DATASET.to_string(),
            rows,
        }
    }
}

#[async_trait]
impl DataEngine for VecEngine {
    async fn fetch_page(&self, request: PageRequest) -> Result<PageMatrix, EngineError> {
        let end = (request.offset + request.limit).min(self.rows.len());
        let rows = self.rows[request.offset.min(end)..end]
            .iter()
            .map(|(name, revenue)| {
                vec![
                    EngineCell::text(name.clone()),
                    EngineCell::number(revenue.to_string(), *revenue),
                ]
            })
            .collect();
        Ok(PageMatrix::new(0, rows))
    }

    fn total_rows(&self) -> usize {
        self.rows.len()
    }

    fn dataset_id(&self) -> String {
        self.dataset.clone()
    }
}

/// Store wrapper with failure, race and gating hooks.
#[derive(Default)]
pub struct ScriptedStore {
    pub inner: InMemoryAnnotationStore,
    calls: AtomicUsize,
    fail_fetches: AtomicBool,
    fail_appends: Mutex<HashSet<String>>,
    always_conflict: Mutex<HashSet<String>>,
    race_once: Mutex<Option<String>>,
    fetch_gate: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedStore {
    pub fn with_records(records: Vec<AnnotationRecord>) -> Self {
        Self {
            inner: InMemoryAnnotationStore::with_records(records),
            ..Self::default()
        }
    }

    /// Total fetch and append calls received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_fetches_failing(&self, failing: bool) {
        self.fail_fetches.store(failing, Ordering::SeqCst);
    }

    pub fn fail_appends_for(&self, key: &str) {
        self.fail_appends.lock().insert(key.to_string());
    }

    pub fn always_conflict_for(&self, key: &str) {
        self.always_conflict.lock().insert(key.to_string());
    }

    /// A rival writer takes the next version of `key` right before our append.
    pub fn race_once_for(&self, key: &str) {
        *self.race_once.lock() = Some(key.to_string());
    }

    /// Hold every fetch until the returned gate is notified.
    pub fn gate_fetches(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.fetch_gate.lock() = Some(gate.clone());
        gate
    }

    pub fn records_for(&self, key: &str) -> Vec<AnnotationRecord> {
        let mut records: Vec<_> = self
            .inner
            .records()
            .into_iter()
            .filter(|record| record.key == key)
            .collect();
        records.sort_by_key(|record| record.version);
        records
    }
}

#[async_trait]
impl AnnotationStore for ScriptedStore {
    async fn fetch_all(&self, dataset_id: &str) -> fbg_store::Result<Vec<AnnotationRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.fetch_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(StoreError::Network("connection reset".to_string()));
        }
        self.inner.fetch_all(dataset_id).await
    }

    async fn append(&self, record: &AnnotationRecord) -> fbg_store::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_appends.lock().contains(&record.key) {
            return Err(StoreError::Status {
                status: 500,
                body: "internal error".to_string(),
            });
        }
        if self.always_conflict.lock().contains(&record.key) {
            return Err(StoreError::VersionConflict {
                key: record.key.clone(),
                version: record.version,
            });
        }
        let race = {
            let mut race = self.race_once.lock();
            if race.as_deref() == Some(record.key.as_str()) {
                race.take()
            } else {
                None
            }
        };
        if race.is_some() {
            let mut rival = record.clone();
            rival.modified_by = "rival".to_string();
            rival.session_id = "rival-session".to_string();
            self.inner.append(&rival).await?;
        }
        self.inner.append(record).await
    }
}

pub fn layout() -> GridLayout {
    GridLayout::new(
        vec![ColumnDef::labelled("customer", "Customer")],
        vec![ColumnDef::labelled("revenue", "Revenue")],
        vec![ColumnDef::new("status"), ColumnDef::new("comments")],
        "customer",
    )
    .unwrap()
}

pub fn annotation(key: &str, version: u32, user: &str, fields: &[(&str, &str)]) -> AnnotationRecord {
    let at = Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, version).unwrap();
    AnnotationRecord {
        dataset_id: DATASET.to_string(),
        key: key.to_string(),
        version,
        fields: fields
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect::<BTreeMap<_, _>>(),
        created_by: user.to_string(),
        created_at: at,
        modified_by: user.to_string(),
        modified_at: at,
        session_id: format!("{user}-session"),
    }
}

pub fn test_config() -> SessionConfig {
    SessionConfig {
        refresh_interval: None,
        post_save_refresh: Duration::from_millis(50),
        write: WriteConfig {
            pacing: Duration::from_millis(10),
            max_conflict_retries: 2,
        },
        ..SessionConfig::default()
    }
}

pub fn session(
    store: Arc<ScriptedStore>,
    notices: Notices,
    mirror: Option<EditMirror>,
) -> Arc<GridSession> {
    let builder = GridSession::builder(
        Arc::new(VecEngine::sample()),
        store,
        layout(),
        Identity::new("carol", "carol-session"),
    )
    .config(test_config())
    .notices(notices);
    match mirror {
        Some(mirror) => builder.mirror(mirror).build(),
        None => builder.build(),
    }
}
