//! Downloaded archive cleanup
//!
//! This module provides RAII-based handling of files that only live for the
//! duration of a single download, such as the archive a subtitle ships in.

use std::fs;
use std::ops::Deref;
use std::path::{Path, PathBuf};

/// Guard for temporary resources that automatically cleans up on drop
#[derive(Debug)]
pub(crate) enum TempGuard {
    /// File that will be deleted when dropped, whether or not it was ever created
    File(PathBuf),
}

impl TempGuard {
    /// Takes ownership of the file at `path` for cleanup purposes
    ///
    /// The file does not need to exist yet. Download code creates the guard
    /// before writing so that a partially written file is removed as well.
    pub(crate) fn track(path: impl Into<PathBuf>) -> Self {
        TempGuard::File(path.into())
    }

    /// Get the path to the temporary resource
    pub(crate) fn path(&self) -> &Path {
        match self {
            TempGuard::File(path) => path,
        }
    }
}

impl Drop for TempGuard {
    fn drop(&mut self) {
        match self {
            TempGuard::File(path) => {
                if let Err(e) = fs::remove_file(&*path) {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!("Failed to remove {}: {}", path.display(), e);
                    }
                }
            }
        }
    }
}

impl Deref for TempGuard {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        self.path()
    }
}
