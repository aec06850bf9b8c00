//! Native zip support

use super::{ArchiveBackend, ArchiveError, flattened_name};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// Archive backend reading zip files with the `zip` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipArchiveBackend;

impl ZipArchiveBackend {
    fn open(archive: &Path) -> Result<::zip::ZipArchive<File>, ArchiveError> {
        let file = File::open(archive).map_err(|e| unreadable(archive, e))?;
        ::zip::ZipArchive::new(file).map_err(|e| unreadable(archive, e))
    }
}

impl ArchiveBackend for ZipArchiveBackend {
    fn list_entries(&self, archive: &Path) -> Result<Vec<String>, ArchiveError> {
        let mut zip = Self::open(archive)?;
        let mut entries = Vec::with_capacity(zip.len());

        for index in 0..zip.len() {
            let entry = zip.by_index(index).map_err(|e| unreadable(archive, e))?;
            if !entry.is_dir() {
                entries.push(entry.name().to_string());
            }
        }

        Ok(entries)
    }

    fn extract_entry(
        &self,
        archive: &Path,
        entry: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, ArchiveError> {
        let mut zip = Self::open(archive)?;
        let mut source = zip.by_name(entry).map_err(|e| unreadable(archive, e))?;

        // Like `unrar e`, directories inside the archive are dropped
        let name = flattened_name(entry).ok_or_else(|| ArchiveError::Unreadable {
            path: archive.to_path_buf(),
            reason: format!("entry '{}' has no file name", entry),
        })?;
        let target = dest_dir.join(name);

        let mut out = File::create(&target).map_err(|e| ArchiveError::WriteFailed {
            path: target.clone(),
            source: e,
        })?;
        io::copy(&mut source, &mut out).map_err(|e| ArchiveError::WriteFailed {
            path: target.clone(),
            source: e,
        })?;

        Ok(target)
    }
}

fn unreadable(archive: &Path, error: impl std::fmt::Display) -> ArchiveError {
    ArchiveError::Unreadable {
        path: archive.to_path_buf(),
        reason: error.to_string(),
    }
}
