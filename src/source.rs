//! Common interface of subtitle sources
//!
//! Every site adapter answers two questions: which subtitles exist for a
//! video file, and how to turn one of them into a subtitle file next to the
//! video.

use crate::archive::ArchiveError;
use crate::http::HttpError;
use crate::search::{SearchError, SearchResult};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while searching or downloading subtitles
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network request failed or timed out
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// The search page could not be interpreted
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// Reading the downloaded archive failed, including a missing archive tool
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// The resolved subtitle URL is neither a zip nor a rar archive
    #[error("Unexpected file type (not zip or rar) for {url}")]
    UnsupportedArchive { url: String },

    /// The archive holds no file with a subtitle extension
    #[error("No subtitle file found in {url}")]
    NoSubtitleInArchive { url: String },

    /// A request URL could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The video path has no file name to derive names from
    #[error("Invalid video path: {0}")]
    InvalidVideoPath(PathBuf),
}

impl SourceError {
    /// True when the failure was a request running out of time
    pub fn is_timeout(&self) -> bool {
        matches!(self, SourceError::Http(HttpError::Timeout { .. }))
    }

    /// True when the external archive tool could not be launched
    pub fn is_tool_unavailable(&self) -> bool {
        matches!(self, SourceError::Archive(ArchiveError::ToolUnavailable { .. }))
    }
}

/// A chosen subtitle together with the video it is meant for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleRequest {
    /// Subtitle URL; replaced with the final URL once resolved
    pub link: String,
    /// Path of the video file the subtitle belongs to
    pub filename: PathBuf,
}

impl SubtitleRequest {
    pub fn new(result: &SearchResult, video_path: &Path) -> Self {
        Self {
            link: result.link.clone(),
            filename: video_path.to_path_buf(),
        }
    }
}

/// Trait implemented by every subtitle site adapter
pub trait SubtitleSource {
    /// Host name of the site
    fn site_name(&self) -> &str;

    /// Language codes and names the site serves
    fn languages(&self) -> &[(&'static str, &'static str)];

    /// Searches subtitles for a video file
    ///
    /// # Arguments
    ///
    /// * `video_path` - Path of the video; only its file name is used
    /// * `languages` - Wished language codes
    fn process(
        &self,
        video_path: &Path,
        languages: &[String],
    ) -> Result<Vec<SearchResult>, SourceError>;

    /// Downloads a subtitle and writes it next to the video
    ///
    /// Returns the path of the created subtitle file.
    fn create_file(&self, request: &mut SubtitleRequest) -> Result<PathBuf, SourceError>;
}
