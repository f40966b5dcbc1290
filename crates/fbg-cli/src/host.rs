//! Command implementations shared by the `fbg` binary and its tests.
//!
//! A [`GridHost`] owns the settings, the annotation store and the editing
//! identity. Every command opens a fresh [`GridSession`] over a
//! [`CsvEngine`]; nothing runs in the background once a command returns.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use fbg_model::{AnnotationRecord, BatchResult, EditBuffer, Identity, Notices};
use fbg_paging::PageError;
use fbg_persistence::{EditMirror, PersistenceError};
use fbg_store::{AnnotationStore, HttpAnnotationStore, StoreError};
use fbg_sync::{GridSession, GridView};
use thiserror::Error;

use crate::config::{ConfigError, Settings};
use crate::engine::{CsvEngine, CsvEngineError};

/// Command failure.
#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] CsvEngineError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Mirror(#[from] PersistenceError),

    #[error(transparent)]
    Page(#[from] PageError),

    /// The overlay is not part of the layout.
    #[error("'{0}' is not an annotation column")]
    UnknownOverlay(String),
}

/// A page as shown by `fbg page`.
#[derive(Debug, Clone)]
pub struct PageReport {
    /// Merged rows with pending edits on top.
    pub view: GridView,
    /// Pending edits at the time of rendering.
    pub edits: EditBuffer,
}

/// Outcome of `fbg edit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditReceipt {
    /// Page holding the key, `None` when the CSV has no such key.
    pub page: Option<usize>,
    /// Pending edits after this one.
    pub pending: usize,
}

/// Settings, store and identity of one CLI invocation.
pub struct GridHost {
    settings: Settings,
    store: Arc<dyn AnnotationStore>,
    identity: Identity,
    notices: Notices,
}

impl GridHost {
    /// Host talking to the configured HTTP store.
    pub fn connect(settings: Settings, notices: Notices) -> Result<Self, HostError> {
        settings.validate()?;
        let store = HttpAnnotationStore::new(settings.store.clone())?.with_notices(notices.clone());
        Ok(Self::with_store(settings, Arc::new(store), notices))
    }

    /// Host over any store. A new session id is drawn for every host.
    pub fn with_store(
        settings: Settings,
        store: Arc<dyn AnnotationStore>,
        notices: Notices,
    ) -> Self {
        let identity = Identity::new(settings.user(), uuid::Uuid::new_v4().to_string());
        tracing::debug!(
            "Editing as {} (session {})",
            identity.user,
            identity.session_id
        );
        Self {
            settings,
            store,
            identity,
            notices,
        }
    }

    /// Editing identity.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Render page `page` of `csv` with annotations and pending edits.
    pub async fn page(&self, csv: &Path, page: usize) -> Result<PageReport, HostError> {
        let (session, _) = self.open(csv)?;
        session.open().await;
        if page != 1 {
            session.go_to_page(page).await?;
        }
        let report = PageReport {
            view: session.view(),
            edits: session.pending_edits(),
        };
        session.shutdown();
        Ok(report)
    }

    /// Record an edit in the mirror without touching the store.
    pub fn edit(
        &self,
        csv: &Path,
        key: &str,
        overlay: &str,
        value: &str,
    ) -> Result<EditReceipt, HostError> {
        let layout = self.settings.layout()?;
        if !layout.is_overlay(overlay) {
            return Err(HostError::UnknownOverlay(overlay.to_string()));
        }
        let engine = self.engine(csv)?;
        let page = engine.page_of(key, self.settings.grid.page_size);
        if page.is_none() {
            tracing::warn!("Key '{}' is not in {}; it will not be saved", key, csv.display());
        }

        let mirror = self.mirror();
        let mut edits = mirror
            .load()?
            .map(|snapshot| snapshot.changes)
            .unwrap_or_default();
        edits.set(key, overlay, value);
        mirror.store(&edits, &self.identity.user)?;

        Ok(EditReceipt {
            page,
            pending: edits.len(),
        })
    }

    /// Save every mirrored edit whose key is in `csv`.
    ///
    /// Pages are visited in order and saved one at a time. Keys that are not
    /// in the file stay pending and are listed as skipped.
    pub async fn save(&self, csv: &Path) -> Result<BatchResult, HostError> {
        let (session, engine) = self.open(csv)?;
        let edits = session.pending_edits();
        if edits.is_empty() {
            return Ok(BatchResult::nothing_to_save(Vec::new()));
        }

        let page_size = self.settings.grid.page_size;
        let mut pages = BTreeSet::new();
        let mut skipped = Vec::new();
        for key in edits.dirty_keys() {
            match engine.page_of(key, page_size) {
                Some(page) => {
                    pages.insert(page);
                }
                None => skipped.push(key.to_string()),
            }
        }
        if pages.is_empty() {
            return Ok(BatchResult::nothing_to_save(skipped));
        }

        session.open().await;
        let mut combined = BatchResult {
            success: true,
            skipped_keys: skipped,
            ..Default::default()
        };
        for page in pages {
            session.go_to_page(page).await?;
            let result = session.save().await;
            tracing::info!("Page {}: {}", page, result.summary());
            combined.success &= result.success;
            combined.success_count += result.success_count;
            combined.total_count += result.total_count;
            combined.errors.extend(result.errors);
            combined.saved_keys.extend(result.saved_keys);
        }
        session.shutdown();
        Ok(combined)
    }

    /// Every version of `key` in `dataset_id`.
    pub async fn history(
        &self,
        dataset_id: &str,
        key: &str,
    ) -> Result<Vec<AnnotationRecord>, HostError> {
        Ok(self.store.fetch_history(dataset_id, key).await?)
    }

    /// Dataset id of `csv` under the current settings.
    pub fn dataset_id(&self, csv: Option<&Path>) -> Result<String, HostError> {
        Ok(self.settings.dataset_id(csv)?)
    }

    fn engine(&self, csv: &Path) -> Result<CsvEngine, HostError> {
        let layout = self.settings.layout()?;
        let dataset_id = self.settings.dataset_id(Some(csv))?;
        Ok(CsvEngine::load(csv, &layout, dataset_id)?)
    }

    fn mirror(&self) -> EditMirror {
        EditMirror::new(self.settings.mirror_path())
    }

    fn open(&self, csv: &Path) -> Result<(Arc<GridSession>, Arc<CsvEngine>), HostError> {
        let engine = Arc::new(self.engine(csv)?);
        let mut config = self.settings.session_config();
        config.refresh_interval = None;

        let session = GridSession::builder(
            engine.clone(),
            self.store.clone(),
            self.settings.layout()?,
            self.identity.clone(),
        )
        .config(config)
        .notices(self.notices.clone())
        .mirror(self.mirror())
        .build();
        Ok((session, engine))
    }
}
