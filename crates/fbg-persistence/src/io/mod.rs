//! File I/O operations.

mod load;
mod save;

pub use load::load_snapshot;
pub use save::{remove_snapshot, save_snapshot};
