//! Subtitle archive extraction
//!
//! Subtitles are shipped inside zip or rar archives. Both formats are read
//! through the `ArchiveBackend` trait and share one extraction policy: the
//! first listed entry with a subtitle extension wins and is renamed after
//! the video it belongs to.

mod unrar;
mod zip_file;

pub use unrar::UnrarCli;
pub use zip_file::ZipArchiveBackend;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// File extensions accepted as subtitles, without the dot
pub const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "sub", "txt"];

/// Errors that can occur while reading an archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The external archive tool could not be launched
    #[error("Failed to launch '{tool}': {source}")]
    ToolUnavailable { tool: String, source: io::Error },

    /// The archive could not be opened or decoded
    #[error("Failed to read archive {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    /// Failed to write or rename an extracted file
    #[error("Failed to write {path}: {source}")]
    WriteFailed { path: PathBuf, source: io::Error },
}

/// Archive formats subtitles are distributed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    Rar,
}

impl ArchiveKind {
    /// Detects the archive kind from the extension of a URL path
    ///
    /// Query string and fragment are ignored.
    pub fn from_url(url: &str) -> Option<Self> {
        let path = url.split(['?', '#']).next().unwrap_or_default().to_ascii_lowercase();

        if path.ends_with(".zip") {
            Some(ArchiveKind::Zip)
        } else if path.ends_with(".rar") {
            Some(ArchiveKind::Rar)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveKind::Zip => "zip",
            ArchiveKind::Rar => "rar",
        }
    }

    /// Checks the magic bytes of a downloaded file against this kind
    ///
    /// Returns `None` when the content type cannot be determined.
    pub fn matches_content(&self, path: &Path) -> Option<bool> {
        let kind = infer::get_from_path(path).ok().flatten()?;
        Some(kind.extension() == self.extension())
    }
}

/// Read access to the entries of an archive
pub trait ArchiveBackend {
    /// Lists the entry names of the archive, in archive order
    fn list_entries(&self, archive: &Path) -> Result<Vec<String>, ArchiveError>;

    /// Extracts a single entry into `dest_dir`, without its directory part
    ///
    /// Returns the path the entry is expected at. Callers must check that
    /// the file exists, since some tools exit successfully without writing.
    fn extract_entry(
        &self,
        archive: &Path,
        entry: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, ArchiveError>;
}

/// Returns the lowercase subtitle extension of an entry name, if it has one
pub fn subtitle_extension(entry: &str) -> Option<String> {
    let extension = Path::new(entry).extension()?.to_str()?.to_ascii_lowercase();
    SUBTITLE_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

/// Extracts the first subtitle entry of an archive
///
/// Entries are visited in listing order. The first one with a subtitle
/// extension that actually lands in `dest_dir` is renamed to
/// `{base_name}.{ext}` and its path returned; later entries are left alone.
/// Returns `Ok(None)` when no entry qualifies.
pub fn extract_first_subtitle(
    backend: &dyn ArchiveBackend,
    archive: &Path,
    dest_dir: &Path,
    base_name: &str,
) -> Result<Option<PathBuf>, ArchiveError> {
    for entry in backend.list_entries(archive)? {
        let Some(extension) = subtitle_extension(&entry) else {
            debug!("Ignoring archive entry {}", entry);
            continue;
        };

        let extracted = backend.extract_entry(archive, &entry, dest_dir)?;
        if !extracted.exists() {
            debug!("Entry {} was not extracted to {}", entry, extracted.display());
            continue;
        }

        let final_path = dest_dir.join(format!("{}.{}", base_name, extension));
        fs::rename(&extracted, &final_path).map_err(|e| ArchiveError::WriteFailed {
            path: final_path.clone(),
            source: e,
        })?;

        debug!("Extracted {} as {}", entry, final_path.display());
        return Ok(Some(final_path));
    }

    Ok(None)
}

/// File name an entry gets when extracted without its directory part
fn flattened_name(entry: &str) -> Option<&std::ffi::OsStr> {
    Path::new(entry).file_name()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Backend writing placeholder files, recording every extraction
    struct FakeBackend {
        entries: Vec<String>,
        /// Entries that "extract" without producing a file
        silent: Vec<String>,
        extracted: RefCell<Vec<String>>,
    }

    impl FakeBackend {
        fn new(entries: &[&str]) -> Self {
            Self {
                entries: entries.iter().map(|e| e.to_string()).collect(),
                silent: Vec::new(),
                extracted: RefCell::new(Vec::new()),
            }
        }
    }

    impl ArchiveBackend for FakeBackend {
        fn list_entries(&self, _archive: &Path) -> Result<Vec<String>, ArchiveError> {
            Ok(self.entries.clone())
        }

        fn extract_entry(
            &self,
            _archive: &Path,
            entry: &str,
            dest_dir: &Path,
        ) -> Result<PathBuf, ArchiveError> {
            self.extracted.borrow_mut().push(entry.to_string());
            let path = dest_dir.join(flattened_name(entry).unwrap());
            if !self.silent.iter().any(|s| s == entry) {
                fs::write(&path, "1\n00:00:01,000 --> 00:00:02,000\nHola\n").unwrap();
            }
            Ok(path)
        }
    }

    #[test]
    fn test_subtitle_extension() {
        assert_eq!(subtitle_extension("movie.srt"), Some("srt".to_string()));
        assert_eq!(subtitle_extension("Subs/Movie.SUB"), Some("sub".to_string()));
        assert_eq!(subtitle_extension("readme.txt"), Some("txt".to_string()));
        assert_eq!(subtitle_extension("movie.nfo"), None);
        assert_eq!(subtitle_extension("srt"), None);
    }

    #[test]
    fn test_archive_kind_from_url() {
        assert_eq!(
            ArchiveKind::from_url("https://www.sous-titres.eu/series/show/s2e5.zip"),
            Some(ArchiveKind::Zip)
        );
        assert_eq!(
            ArchiveKind::from_url("https://cdn.example.org/files/Show.RAR?token=abc"),
            Some(ArchiveKind::Rar)
        );
        assert_eq!(ArchiveKind::from_url("https://www.sous-titres.eu/series/show.html"), None);
    }

    #[test]
    fn test_first_subtitle_wins() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FakeBackend::new(&["movie.nfo", "movie.srt", "movie.sub"]);

        let path = extract_first_subtitle(&backend, Path::new("x.rar"), dir.path(), "show.s02e05")
            .unwrap()
            .unwrap();

        assert_eq!(path, dir.path().join("show.s02e05.srt"));
        assert!(path.exists());
        assert!(!dir.path().join("movie.srt").exists());
        assert_eq!(*backend.extracted.borrow(), vec!["movie.srt".to_string()]);
    }

    #[test]
    fn test_missing_extraction_tries_next_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = FakeBackend::new(&["a.srt", "b.txt"]);
        backend.silent.push("a.srt".to_string());

        let path = extract_first_subtitle(&backend, Path::new("x.rar"), dir.path(), "video")
            .unwrap()
            .unwrap();

        assert_eq!(path, dir.path().join("video.txt"));
    }

    #[test]
    fn test_no_subtitle_entries() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FakeBackend::new(&["movie.nfo", "cover.jpg"]);

        let result =
            extract_first_subtitle(&backend, Path::new("x.rar"), dir.path(), "video").unwrap();

        assert!(result.is_none());
        assert!(backend.extracted.borrow().is_empty());
    }
}
