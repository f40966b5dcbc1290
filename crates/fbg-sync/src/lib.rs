//! Grid session for the feedback grid.
//!
//! Ties the page state, the annotation store and the edit buffer together:
//!
//! - [`GridSession`] drives navigation, annotation refresh and saving
//! - [`WriteCoordinator`] computes and appends new annotation versions
//! - [`EditPresenceTracker`] keeps the advisory "who is editing" map
//! - [`RefreshScheduler`] owns the background refresh tasks

pub mod presence;
pub mod refresh;
pub mod session;
pub mod writer;

pub use presence::{DEFAULT_PRESENCE_TTL, EditPresence, EditPresenceTracker};
pub use refresh::RefreshScheduler;
pub use session::{
    GridSession, GridSessionBuilder, GridView, MergeOutcome, Navigation, SessionConfig,
};
pub use writer::{
    DEFAULT_MAX_CONFLICT_RETRIES, DEFAULT_PACING, WriteConfig, WriteCoordinator,
};
