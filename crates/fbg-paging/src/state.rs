//! The page state machine.

use std::time::Duration;

use fbg_model::{PageInfo, PageMatrix, PageRequest};

use crate::engine::DatasetFingerprint;
use crate::error::{EngineError, PageError};
use crate::guard::NavigationGuard;

/// Fetch status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStatus {
    /// Nothing in flight.
    Idle,
    /// A page fetch is in flight.
    Fetching,
    /// The last fetch failed; the page pointer was rolled back.
    Error(String),
}

/// One issued fetch.
///
/// Only the ticket with the latest sequence number can change the state;
/// completions of superseded tickets are discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTicket {
    /// Sequence number, strictly increasing per [`PageState`].
    pub seq: u64,
    /// Requested page (1-based).
    pub page: usize,
    /// Engine window for the page.
    pub request: PageRequest,
}

/// Identity of an applied page, captured by deferred work such as an
/// annotation merge so it can tell whether the page is still on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageIdentity {
    /// Page number.
    pub page: usize,
    /// Sequence of the fetch that produced it.
    pub seq: u64,
}

/// Result of completing a ticket.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    /// The page is now current.
    Applied {
        /// Identity of the applied page.
        identity: PageIdentity,
        /// Page data.
        matrix: PageMatrix,
    },
    /// A newer request superseded this one; nothing changed.
    Stale,
    /// The fetch failed and the pointer went back to the last good page.
    Failed {
        /// Engine failure.
        error: EngineError,
        /// Page the pointer was rolled back to.
        rolled_back_to: usize,
    },
}

/// Current page, page size, row count and the navigation guard.
#[derive(Debug, Clone)]
pub struct PageState {
    status: PageStatus,
    page_size: usize,
    total_rows: usize,
    current_page: usize,
    last_good_page: usize,
    latest_seq: u64,
    applied: Option<PageIdentity>,
    guard: NavigationGuard,
    fingerprint: Option<DatasetFingerprint>,
}

impl PageState {
    /// Create a state on page 1 with the default guard delay.
    pub fn new(total_rows: usize, page_size: usize) -> Self {
        Self::with_guard(total_rows, page_size, NavigationGuard::default())
    }

    /// Create a state with a custom guard delay.
    pub fn with_guard_delay(total_rows: usize, page_size: usize, delay: Duration) -> Self {
        Self::with_guard(total_rows, page_size, NavigationGuard::new(delay))
    }

    fn with_guard(total_rows: usize, page_size: usize, guard: NavigationGuard) -> Self {
        Self {
            status: PageStatus::Idle,
            page_size: page_size.max(1),
            total_rows,
            current_page: 1,
            last_good_page: 1,
            latest_seq: 0,
            applied: None,
            guard,
            fingerprint: None,
        }
    }

    /// Recompute page bounds for new totals.
    ///
    /// The current page is kept when still valid and clamped otherwise.
    /// Calling this again with the same inputs changes nothing.
    pub fn initialize(&mut self, total_rows: usize, page_size: usize) -> PageInfo {
        self.total_rows = total_rows;
        self.page_size = page_size.max(1);
        let total_pages = self.total_pages();
        self.current_page = self.current_page.clamp(1, total_pages);
        self.last_good_page = self.last_good_page.clamp(1, total_pages);
        self.info()
    }

    /// Start navigating to `page`.
    ///
    /// Out-of-range pages are rejected without touching any state. A valid
    /// request arms the navigation guard, moves to `Fetching` and supersedes
    /// whatever fetch was in flight.
    pub fn request_page(&mut self, page: usize) -> Result<PageTicket, PageError> {
        let total_pages = self.total_pages();
        if page < 1 || page > total_pages {
            tracing::debug!("Rejected page {} (total pages {})", page, total_pages);
            return Err(PageError::InvalidPage {
                requested: page,
                total_pages,
            });
        }

        self.guard.arm();
        self.latest_seq += 1;
        self.current_page = page;
        self.status = PageStatus::Fetching;

        Ok(PageTicket {
            seq: self.latest_seq,
            page,
            request: PageRequest::for_page(page, self.page_size),
        })
    }

    /// Re-fetch the current page after the data underneath it changed.
    ///
    /// Unlike [`PageState::request_page`] this is not a user navigation and
    /// leaves the guard alone.
    pub fn request_reload(&mut self) -> PageTicket {
        self.refetch(self.current_page)
    }

    /// Go back to page 1 after a dataset change. Leaves the guard alone.
    pub fn request_reset(&mut self) -> PageTicket {
        self.refetch(1)
    }

    fn refetch(&mut self, page: usize) -> PageTicket {
        self.latest_seq += 1;
        self.current_page = page;
        self.status = PageStatus::Fetching;
        PageTicket {
            seq: self.latest_seq,
            page,
            request: PageRequest::for_page(page, self.page_size),
        }
    }

    /// Complete a fetch.
    pub fn complete(
        &mut self,
        ticket: &PageTicket,
        result: Result<PageMatrix, EngineError>,
    ) -> PageOutcome {
        if ticket.seq != self.latest_seq {
            tracing::debug!(
                "Discarding stale page {} response (seq {}, latest {})",
                ticket.page,
                ticket.seq,
                self.latest_seq
            );
            return PageOutcome::Stale;
        }

        match result {
            Ok(mut matrix) => {
                matrix.page = ticket.page;
                let identity = PageIdentity {
                    page: ticket.page,
                    seq: ticket.seq,
                };
                self.status = PageStatus::Idle;
                self.current_page = ticket.page;
                self.last_good_page = ticket.page;
                self.applied = Some(identity);
                PageOutcome::Applied { identity, matrix }
            }
            Err(error) => {
                tracing::warn!("Page {} failed to load: {}", ticket.page, error);
                self.status = PageStatus::Error(error.to_string());
                self.current_page = self.last_good_page;
                PageOutcome::Failed {
                    error,
                    rolled_back_to: self.last_good_page,
                }
            }
        }
    }

    /// Whether a data change should send the user back to page 1.
    ///
    /// True only when the user has not just navigated, the dataset changed
    /// and no interactive selection is in progress.
    pub fn should_reset_to_page_one(
        &self,
        dataset_changed: bool,
        selection_in_progress: bool,
    ) -> bool {
        !self.guard.is_set() && dataset_changed && !selection_in_progress
    }

    /// Record the dataset fingerprint and report whether it changed.
    ///
    /// The first observation is not a change.
    pub fn observe_dataset(&mut self, fingerprint: DatasetFingerprint) -> bool {
        let changed = self
            .fingerprint
            .as_ref()
            .is_some_and(|previous| previous != &fingerprint);
        self.fingerprint = Some(fingerprint);
        changed
    }

    /// The host cancelled an interactive selection; re-arm the guard so the
    /// re-render that follows does not reset the page.
    pub fn selection_cancelled(&mut self) {
        self.guard.arm();
    }

    /// Derived page info.
    pub fn info(&self) -> PageInfo {
        PageInfo::compute(self.total_rows, self.page_size, self.current_page)
    }

    /// Number of pages, at least 1.
    pub fn total_pages(&self) -> usize {
        PageInfo::pages_for(self.total_rows, self.page_size)
    }

    /// Current page pointer.
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Rows per page.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Rows in the dataset.
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// Fetch status.
    pub fn status(&self) -> &PageStatus {
        &self.status
    }

    /// Identity of the page currently on screen.
    pub fn applied(&self) -> Option<PageIdentity> {
        self.applied
    }

    /// Whether the "user navigated" guard is set.
    pub fn navigation_guard_set(&self) -> bool {
        self.guard.is_set()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_page() -> Result<PageMatrix, EngineError> {
        Ok(PageMatrix::default())
    }

    #[test]
    fn test_out_of_range_requests_change_nothing() {
        let mut state = PageState::new(250, 100);
        let before = state.info();

        assert!(state.request_page(0).is_err());
        assert_eq!(
            state.request_page(4),
            Err(PageError::InvalidPage {
                requested: 4,
                total_pages: 3
            })
        );

        assert_eq!(state.info(), before);
        assert_eq!(state.status(), &PageStatus::Idle);
        assert!(!state.navigation_guard_set());
    }

    #[test]
    fn test_request_then_complete() {
        let mut state = PageState::new(250, 100);
        let ticket = state.request_page(3).unwrap();
        assert_eq!(ticket.request, PageRequest { offset: 200, limit: 100 });
        assert_eq!(state.status(), &PageStatus::Fetching);

        let outcome = state.complete(&ticket, ok_page());
        let PageOutcome::Applied { identity, matrix } = outcome else {
            panic!("expected applied page");
        };
        assert_eq!(identity.page, 3);
        assert_eq!(matrix.page, 3);
        assert_eq!(state.status(), &PageStatus::Idle);
        assert_eq!(state.info().first_row, 201);
        assert_eq!(state.info().last_row, 250);
    }

    #[test]
    fn test_superseded_response_is_discarded() {
        let mut state = PageState::new(500, 100);
        let slow = state.request_page(2).unwrap();
        let fast = state.request_page(4).unwrap();

        assert!(matches!(
            state.complete(&fast, ok_page()),
            PageOutcome::Applied { .. }
        ));
        assert_eq!(state.complete(&slow, ok_page()), PageOutcome::Stale);
        assert_eq!(state.current_page(), 4);
        assert_eq!(state.applied().unwrap().seq, fast.seq);
    }

    #[test]
    fn test_failure_rolls_back_to_last_good_page() {
        let mut state = PageState::new(500, 100);
        let first = state.request_page(2).unwrap();
        state.complete(&first, ok_page());

        let failing = state.request_page(5).unwrap();
        assert_eq!(state.current_page(), 5);

        let outcome = state.complete(
            &failing,
            Err(EngineError::Unavailable("timeout".to_string())),
        );
        assert!(matches!(
            outcome,
            PageOutcome::Failed {
                rolled_back_to: 2,
                ..
            }
        ));
        assert_eq!(state.current_page(), 2);
        assert!(matches!(state.status(), PageStatus::Error(_)));
    }

    #[test]
    fn test_stale_failure_does_not_roll_back() {
        let mut state = PageState::new(500, 100);
        let old = state.request_page(2).unwrap();
        let new = state.request_page(3).unwrap();
        state.complete(&new, ok_page());

        let outcome = state.complete(&old, Err(EngineError::Unavailable("late".to_string())));
        assert_eq!(outcome, PageOutcome::Stale);
        assert_eq!(state.current_page(), 3);
        assert_eq!(state.status(), &PageStatus::Idle);
    }

    #[test]
    fn test_initialize_is_idempotent_and_clamps() {
        let mut state = PageState::new(500, 100);
        let ticket = state.request_page(5).unwrap();
        state.complete(&ticket, ok_page());

        let first = state.initialize(250, 100);
        let second = state.initialize(250, 100);
        assert_eq!(first, second);
        assert_eq!(first.current_page, 3);
        assert_eq!(first.total_pages, 3);
    }

    #[test]
    fn test_reload_does_not_arm_guard() {
        let mut state = PageState::new(250, 100);
        let ticket = state.request_reload();
        assert_eq!(ticket.page, 1);
        assert!(!state.navigation_guard_set());
        assert!(matches!(
            state.complete(&ticket, ok_page()),
            PageOutcome::Applied { .. }
        ));
    }

    #[test]
    fn test_observe_dataset() {
        let mut state = PageState::new(10, 5);
        assert!(!state.observe_dataset(DatasetFingerprint::new("app", 10)));
        assert!(!state.observe_dataset(DatasetFingerprint::new("app", 10)));
        assert!(state.observe_dataset(DatasetFingerprint::new("app", 12)));
        assert!(state.observe_dataset(DatasetFingerprint::new("other", 12)));
    }
}
