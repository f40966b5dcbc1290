//! Pure grid transforms.
//!
//! - [`projector`]: turns one engine page into ordered rows with overlay slots
//! - [`merge`]: reduces the annotation log to one record per key and overlays
//!   it onto projected rows
//!
//! Both are deterministic functions of their inputs; they own no state and do
//! no I/O, so the session layer can re-run them freely on every page turn and
//! refresh.

pub mod merge;
pub mod projector;

pub use merge::{CurrentAnnotations, apply, overlay_pending, select_current, select_current_for};
pub use projector::{headers, project};
