//! The grid session pipeline.
//!
//! Navigation shows engine rows right away, merged with the last known
//! annotations. Refreshing annotations is a separate step fenced by the
//! identity of the page it started on: if the user has moved on by the time
//! the store answers, the merge is dropped.
//!
//! All state sits behind one short-lived lock that is never held across an
//! await.

use std::sync::{Arc, Weak};
use std::time::Duration;

use fbg_grid::{CurrentAnnotations, apply, headers, overlay_pending, project, select_current_for};
use fbg_model::{
    BatchResult, EditBuffer, GridLayout, Header, Identity, NoticeKind, Notices, PageInfo, Row,
};
use fbg_paging::{
    DEFAULT_GUARD_DELAY, DataEngine, DatasetFingerprint, PageError, PageOutcome, PageState,
    PageStatus, PageTicket, fetch_ticket,
};
use fbg_persistence::EditMirror;
use fbg_store::{AnnotationStore, report_fetch_error};
use parking_lot::Mutex;

use crate::presence::{DEFAULT_PRESENCE_TTL, EditPresence, EditPresenceTracker};
use crate::refresh::RefreshScheduler;
use crate::writer::{WriteConfig, WriteCoordinator};

/// Session tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Rows per page.
    pub page_size: usize,
    /// How long an explicit page change suppresses resets.
    pub guard_delay: Duration,
    /// Annotation poll interval; `None` disables polling.
    pub refresh_interval: Option<Duration>,
    /// Delay of the extra refresh after a successful save.
    pub post_save_refresh: Duration,
    /// Write tuning.
    pub write: WriteConfig,
    /// Lifetime of presence entries.
    pub presence_ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            guard_delay: DEFAULT_GUARD_DELAY,
            refresh_interval: Some(Duration::from_secs(30)),
            post_save_refresh: Duration::from_millis(1500),
            write: WriteConfig::default(),
            presence_ttl: DEFAULT_PRESENCE_TTL,
        }
    }
}

/// Result of a page load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// The page is on screen.
    Shown(PageInfo),
    /// A newer request took over; nothing changed.
    Superseded,
    /// The fetch failed and the previous page stays on screen.
    RolledBack(PageInfo),
}

/// Result of an annotation refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Annotations were merged into the visible rows.
    Merged {
        /// Keys with a current annotation.
        keys: usize,
    },
    /// The page changed while the store was answering.
    Discarded,
    /// The store could not be read; the previous merge stays.
    Unavailable,
}

/// Everything a renderer needs.
#[derive(Debug, Clone, PartialEq)]
pub struct GridView {
    /// Column headers.
    pub headers: Vec<Header>,
    /// Merged rows with unsaved edits shown on top.
    pub rows: Vec<Row>,
    /// Page bounds.
    pub page: PageInfo,
    /// Fetch status.
    pub status: PageStatus,
    /// Number of unsaved edits.
    pub pending_edits: usize,
}

struct SessionState {
    page: PageState,
    base_rows: Vec<Row>,
    merged_rows: Vec<Row>,
    current: CurrentAnnotations,
    edits: EditBuffer,
    presence: EditPresenceTracker,
}

/// Builder for [`GridSession`].
pub struct GridSessionBuilder {
    engine: Arc<dyn DataEngine>,
    store: Arc<dyn AnnotationStore>,
    layout: GridLayout,
    identity: Identity,
    config: SessionConfig,
    notices: Notices,
    mirror: Option<EditMirror>,
}

impl GridSessionBuilder {
    /// Session tuning.
    #[must_use]
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Where non-fatal problems are reported.
    #[must_use]
    pub fn notices(mut self, notices: Notices) -> Self {
        self.notices = notices;
        self
    }

    /// Mirror unsaved edits to disk, restoring any that are there.
    #[must_use]
    pub fn mirror(mut self, mirror: EditMirror) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// Build the session. Nothing is fetched until [`GridSession::open`].
    pub fn build(self) -> Arc<GridSession> {
        let edits = self
            .mirror
            .as_ref()
            .and_then(|mirror| match mirror.load() {
                Ok(snapshot) => snapshot.map(|snapshot| snapshot.changes),
                Err(e) => {
                    tracing::warn!("{}: {}", e.user_message(), e);
                    None
                }
            })
            .unwrap_or_default();

        let mut page = PageState::with_guard_delay(
            self.engine.total_rows(),
            self.config.page_size,
            self.config.guard_delay,
        );
        page.observe_dataset(self.engine.fingerprint());

        let state = SessionState {
            page,
            base_rows: Vec::new(),
            merged_rows: Vec::new(),
            current: CurrentAnnotations::new(),
            edits,
            presence: EditPresenceTracker::new(self.config.presence_ttl),
        };

        Arc::new_cyclic(|this| GridSession {
            engine: self.engine,
            store: self.store,
            layout: self.layout,
            identity: self.identity,
            config: self.config,
            notices: self.notices,
            mirror: self.mirror,
            state: Mutex::new(state),
            refresh: Mutex::new(RefreshScheduler::new()),
            this: this.clone(),
        })
    }
}

/// One grid instance: the visible page, its annotations and unsaved edits.
pub struct GridSession {
    engine: Arc<dyn DataEngine>,
    store: Arc<dyn AnnotationStore>,
    layout: GridLayout,
    identity: Identity,
    config: SessionConfig,
    notices: Notices,
    mirror: Option<EditMirror>,
    state: Mutex<SessionState>,
    refresh: Mutex<RefreshScheduler>,
    this: Weak<GridSession>,
}

impl GridSession {
    /// Start building a session.
    pub fn builder(
        engine: Arc<dyn DataEngine>,
        store: Arc<dyn AnnotationStore>,
        layout: GridLayout,
        identity: Identity,
    ) -> GridSessionBuilder {
        GridSessionBuilder {
            engine,
            store,
            layout,
            identity,
            config: SessionConfig::default(),
            notices: Notices::log_only(),
            mirror: None,
        }
    }

    /// Load the current page, merge annotations and start polling.
    pub async fn open(&self) -> Navigation {
        let ticket = self.state.lock().page.request_reload();
        let navigation = self.load(ticket).await;
        self.refresh_annotations().await;
        if let Some(interval) = self.config.refresh_interval {
            self.start_polling(interval);
        }
        navigation
    }

    /// Navigate to `page` (1-based).
    ///
    /// Out-of-range pages are rejected and reported without any state change.
    pub async fn go_to_page(&self, page: usize) -> Result<Navigation, PageError> {
        let request = self.state.lock().page.request_page(page);
        match request {
            Ok(ticket) => Ok(self.load(ticket).await),
            Err(e) => {
                self.notices
                    .report(NoticeKind::InvalidPageRequest, e.to_string());
                Err(e)
            }
        }
    }

    async fn load(&self, ticket: PageTicket) -> Navigation {
        let result = fetch_ticket(self.engine.as_ref(), &ticket).await;

        let failure = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            match state.page.complete(&ticket, result) {
                PageOutcome::Applied { matrix, .. } => {
                    state.base_rows = project(&matrix, &self.layout);
                    state.merged_rows = apply(&state.base_rows, &state.current);
                    return Navigation::Shown(state.page.info());
                }
                PageOutcome::Stale => return Navigation::Superseded,
                PageOutcome::Failed { error, .. } => (error, state.page.info()),
            }
        };

        let (error, info) = failure;
        self.notices.report(
            NoticeKind::FetchFailure,
            format!("page {}: {}", ticket.page, error),
        );
        Navigation::RolledBack(info)
    }

    /// Fetch the annotation log and merge it into the visible rows.
    pub async fn refresh_annotations(&self) -> MergeOutcome {
        let fence = self.state.lock().page.applied();
        let dataset_id = self.engine.dataset_id();

        let records = match self.store.fetch_all(&dataset_id).await {
            Ok(records) => records,
            Err(e) => {
                report_fetch_error(&self.notices, &dataset_id, &e);
                return MergeOutcome::Unavailable;
            }
        };
        let current = select_current_for(&records, &dataset_id);

        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.page.applied() != fence {
            tracing::debug!("Discarding annotation merge for a page no longer shown");
            return MergeOutcome::Discarded;
        }
        state.merged_rows = apply(&state.base_rows, &current);
        state.current = current;
        MergeOutcome::Merged {
            keys: state.current.len(),
        }
    }

    /// The engine's data changed.
    ///
    /// Goes back to page 1 when the dataset differs, the user has not just
    /// navigated and no selection is in progress; otherwise the current page
    /// is reloaded. Returns `None` when nothing changed.
    pub async fn data_changed(
        &self,
        fingerprint: DatasetFingerprint,
        selection_in_progress: bool,
    ) -> Option<Navigation> {
        let ticket = {
            let mut state = self.state.lock();
            if !state.page.observe_dataset(fingerprint.clone()) {
                return None;
            }
            state
                .current
                .retain(|_, record| record.dataset_id == fingerprint.dataset_id);
            let page_size = state.page.page_size();
            state.page.initialize(fingerprint.total_rows, page_size);
            if state
                .page
                .should_reset_to_page_one(true, selection_in_progress)
            {
                tracing::info!("Dataset changed; returning to page 1");
                state.page.request_reset()
            } else {
                state.page.request_reload()
            }
        };

        let navigation = self.load(ticket).await;
        self.refresh_annotations().await;
        Some(navigation)
    }

    /// The host cancelled an interactive selection.
    pub fn selection_cancelled(&self) {
        self.state.lock().page.selection_cancelled();
    }

    /// Record an edit and mark the cell as being edited by this session.
    ///
    /// Returns `false` for an unknown overlay.
    pub fn edit(&self, key: &str, overlay: &str, value: &str) -> bool {
        if !self.layout.is_overlay(overlay) {
            tracing::warn!("Ignoring edit of unknown overlay '{}'", overlay);
            return false;
        }
        let snapshot = {
            let mut state = self.state.lock();
            state.edits.set(key, overlay, value);
            state.presence.track_start(key, overlay, &self.identity);
            state.edits.clone()
        };
        self.mirror_edits(&snapshot);
        true
    }

    /// Drop a pending edit.
    pub fn discard_edit(&self, key: &str, overlay: &str) {
        let snapshot = {
            let mut state = self.state.lock();
            state.edits.remove(key, overlay);
            state.presence.track_end(key, overlay);
            state.edits.clone()
        };
        self.mirror_edits(&snapshot);
    }

    /// The user stopped editing a cell.
    pub fn end_edit(&self, key: &str, overlay: &str) {
        self.state.lock().presence.track_end(key, overlay);
    }

    /// Save pending edits of the visible rows.
    ///
    /// Only a fully successful save clears anything: the saved values leave
    /// the edit buffer and the mirror, then annotations are refreshed now and
    /// once more after a short delay. Edits made while the save was running
    /// are kept.
    pub async fn save(&self) -> BatchResult {
        let (edits, rows) = {
            let state = self.state.lock();
            (state.edits.clone(), state.merged_rows.clone())
        };

        let writer = WriteCoordinator::new(
            self.store.clone(),
            self.engine.dataset_id(),
            self.config.write,
            self.notices.clone(),
        );
        let result = writer.save(&edits, &rows, &self.identity).await;
        if !result.success {
            return result;
        }

        let remaining = {
            let mut state = self.state.lock();
            for key in &result.saved_keys {
                let Some(saved) = edits.edits_for(key) else {
                    continue;
                };
                for (overlay, value) in saved {
                    if state.edits.get(key, overlay) == Some(value.as_str()) {
                        state.edits.remove(key, overlay);
                        state.presence.track_end(key, overlay);
                    }
                }
            }
            state.edits.clone()
        };
        self.mirror_edits(&remaining);

        self.refresh_annotations().await;
        self.schedule_post_save_refresh();
        result
    }

    /// Snapshot for rendering.
    pub fn view(&self) -> GridView {
        let state = self.state.lock();
        GridView {
            headers: headers(&self.layout),
            rows: overlay_pending(&state.merged_rows, &state.edits),
            page: state.page.info(),
            status: state.page.status().clone(),
            pending_edits: state.edits.len(),
        }
    }

    /// Copy of the unsaved edits.
    pub fn pending_edits(&self) -> EditBuffer {
        self.state.lock().edits.clone()
    }

    /// Live editors of `key`.
    pub fn editors_for(&self, key: &str) -> Vec<EditPresence> {
        self.state
            .lock()
            .presence
            .editors_for(key)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Whether someone other than this session is editing `key`.
    pub fn is_edited_by_others(&self, key: &str) -> bool {
        self.state
            .lock()
            .presence
            .is_edited_by_others(key, &self.identity)
    }

    /// Register another editor seen by the host (e.g. a second tab).
    pub fn track_editor(&self, key: &str, overlay: &str, editor: &Identity) {
        self.state.lock().presence.track_start(key, overlay, editor);
    }

    /// Drop expired presence entries.
    pub fn prune_presence(&self) -> usize {
        self.state.lock().presence.prune()
    }

    /// Editing identity.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Column layout.
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Whether the annotation poll is running.
    pub fn is_polling(&self) -> bool {
        self.refresh.lock().is_polling()
    }

    /// Stop background refreshes. Also happens when the session is dropped.
    pub fn shutdown(&self) {
        self.refresh.lock().shutdown();
    }

    fn start_polling(&self, interval: Duration) {
        let this = self.this.clone();
        self.refresh.lock().start_polling(interval, move || {
            let this = this.clone();
            async move {
                let Some(session) = this.upgrade() else {
                    return false;
                };
                session.refresh_annotations().await;
                session.prune_presence();
                true
            }
        });
    }

    fn schedule_post_save_refresh(&self) {
        let this = self.this.clone();
        self.refresh
            .lock()
            .schedule_once(self.config.post_save_refresh, async move {
                if let Some(session) = this.upgrade() {
                    session.refresh_annotations().await;
                }
            });
    }

    fn mirror_edits(&self, edits: &EditBuffer) {
        let Some(mirror) = &self.mirror else {
            return;
        };
        if let Err(e) = mirror.store(edits, &self.identity.user) {
            tracing::warn!("Could not mirror pending edits: {}", e);
        }
    }
}
