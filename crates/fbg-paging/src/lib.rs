//! Pagination for the feedback grid.
//!
//! [`PageState`] tracks which page of the engine's result set is visible,
//! issues sequence-tagged fetch tickets, and decides when a data change should
//! send the user back to page 1. The [`NavigationGuard`] keeps a background
//! re-render from undoing an explicit page change.
//!
//! Fetches are modelled as tickets rather than futures so the state never has
//! to be borrowed across an await:
//!
//! ```
//! use fbg_model::PageMatrix;
//! use fbg_paging::{PageOutcome, PageState};
//!
//! let mut state = PageState::new(250, 100);
//! let ticket = state.request_page(2).unwrap();
//! // ... fetch ticket.request from the engine ...
//! let outcome = state.complete(&ticket, Ok(PageMatrix::default()));
//! assert!(matches!(outcome, PageOutcome::Applied { .. }));
//! assert_eq!(state.info().first_row, 101);
//! ```

pub mod engine;
pub mod error;
pub mod guard;
pub mod state;

pub use engine::{DataEngine, DatasetFingerprint, fetch_ticket};
pub use error::{EngineError, PageError};
pub use guard::{DEFAULT_GUARD_DELAY, NavigationGuard};
pub use state::{PageIdentity, PageOutcome, PageState, PageStatus, PageTicket};
