//! Mirror writing.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::error::{PersistenceError, Result};
use crate::snapshot::MirrorSnapshot;

/// Write a snapshot to `path`.
///
/// Uses atomic write (temp file + rename) so a crash mid-write leaves the
/// previous snapshot intact.
pub fn save_snapshot(snapshot: &MirrorSnapshot, path: &Path) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(snapshot)
        .map_err(|e| PersistenceError::Serialization { source: e })?;

    let temp_path = path.with_extension("json.tmp");

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PersistenceError::Io {
            operation: "create directory",
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let mut file = File::create(&temp_path).map_err(|e| PersistenceError::Io {
        operation: "create",
        path: temp_path.clone(),
        source: e,
    })?;

    file.write_all(&bytes).map_err(|e| PersistenceError::Io {
        operation: "write",
        path: temp_path.clone(),
        source: e,
    })?;

    file.sync_all().map_err(|e| PersistenceError::Io {
        operation: "sync",
        path: temp_path.clone(),
        source: e,
    })?;

    fs::rename(&temp_path, path).map_err(|e| PersistenceError::AtomicWriteFailed {
        temp_path: temp_path.clone(),
        target_path: path.to_path_buf(),
        source: e,
    })?;

    tracing::debug!(
        "Mirrored {} pending edits to {}",
        snapshot.changes.len(),
        path.display()
    );
    Ok(())
}

/// Remove the snapshot at `path`; a missing file is not an error.
pub fn remove_snapshot(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!("Removed edit mirror {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PersistenceError::Io {
            operation: "remove",
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
