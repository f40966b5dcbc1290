//! The edit mirror handle.

use std::path::{Path, PathBuf};

use fbg_model::EditBuffer;

use crate::error::Result;
use crate::io::{load_snapshot, remove_snapshot, save_snapshot};
use crate::snapshot::MirrorSnapshot;

/// Default file name of the mirror inside the data directory.
pub const MIRROR_FILE_NAME: &str = "pending-edits.json";

/// Edit buffer mirror at a fixed path.
///
/// Read once at startup, rewritten on every edit, removed once the edits are
/// saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditMirror {
    path: PathBuf,
}

impl EditMirror {
    /// Mirror stored at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Mirror stored as [`MIRROR_FILE_NAME`] inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(MIRROR_FILE_NAME))
    }

    /// Mirror file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored snapshot, if any.
    pub fn load(&self) -> Result<Option<MirrorSnapshot>> {
        load_snapshot(&self.path)
    }

    /// Store `changes` for `user`; an empty buffer removes the file.
    pub fn store(&self, changes: &EditBuffer, user: &str) -> Result<()> {
        if changes.is_empty() {
            return self.clear();
        }
        save_snapshot(&MirrorSnapshot::new(changes.clone(), user), &self.path)
    }

    /// Remove the stored snapshot.
    pub fn clear(&self) -> Result<()> {
        remove_snapshot(&self.path)
    }
}
