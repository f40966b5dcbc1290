//! Durable local mirror of unsaved grid edits.
//!
//! Pending edits are written to a small JSON file after every change so they
//! survive a restart before being saved to the annotation store.
//!
//! # File Format
//!
//! ```text
//! {
//!   "changes":   { "<key>": { "<overlay>": "<value>" } },
//!   "timestamp": "<RFC 3339>",
//!   "user":      "<user>"
//! }
//! ```
//!
//! Writes are atomic (temp file + rename). A missing file loads as "no
//! snapshot"; a corrupt one is [`PersistenceError::Corrupt`].

mod error;
mod io;
mod mirror;
mod snapshot;

pub use error::{PersistenceError, Result};
pub use io::{load_snapshot, remove_snapshot, save_snapshot};
pub use mirror::{EditMirror, MIRROR_FILE_NAME};
pub use snapshot::MirrorSnapshot;
