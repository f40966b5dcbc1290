//! Mirror reading.

use std::fs;
use std::path::Path;

use crate::error::{PersistenceError, Result};
use crate::snapshot::MirrorSnapshot;

/// Read the snapshot at `path`.
///
/// A missing file is `Ok(None)`; an unreadable or corrupt one is an error.
pub fn load_snapshot(path: &Path) -> Result<Option<MirrorSnapshot>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(PersistenceError::Io {
                operation: "read",
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let snapshot: MirrorSnapshot =
        serde_json::from_slice(&bytes).map_err(|e| PersistenceError::Corrupt {
            path: path.to_path_buf(),
            source: e,
        })?;

    tracing::info!(
        "Restored {} pending edits by {} from {}",
        snapshot.changes.len(),
        snapshot.user,
        path.display()
    );
    Ok(Some(snapshot))
}
