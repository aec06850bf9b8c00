//! sous_titres - Spanish subtitles from www.sous-titres.eu
//!
//! This library guesses the show or movie behind a video file name, searches
//! www.sous-titres.eu for it and extracts the chosen subtitle from the zip
//! or rar archive the site serves, right next to the video.

mod archive;
mod config;
mod guess;
mod http;
mod search;
mod source;
mod sous_titres_eu;
mod temp;

// Re-export error types
pub use archive::ArchiveError;
pub use config::ConfigError;
pub use http::HttpError;
pub use search::SearchError;
pub use source::SourceError;

// Re-export the source interface and its building blocks
pub use archive::{
    ArchiveBackend, ArchiveKind, SUBTITLE_EXTENSIONS, UnrarCli, ZipArchiveBackend,
    extract_first_subtitle, subtitle_extension,
};
pub use config::{Config, DEFAULT_BASE_URL, default_config_path};
pub use guess::{BasicGuesser, FileGuesser, GuessedMetadata, MediaKind};
pub use http::{HttpClient, ReqwestHttpClient};
pub use search::{SearchQuery, SearchResult, parse_results, sort_by_rating};
pub use source::{SubtitleRequest, SubtitleSource};
pub use sous_titres_eu::SousTitresEu;

use std::path::{Path, PathBuf};

/// Progress event emitted while fetching a subtitle
///
/// These events allow library users to report what is going on without the
/// library printing anything itself.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Searching the source for a video file
    Searching {
        site_name: String,
        video_path: PathBuf,
    },

    /// Search finished
    ResultsFound { count: usize },

    /// Downloading the chosen subtitle
    Downloading { release: String, link: String },

    /// Subtitle file written
    Complete { subtitle_path: PathBuf },
}

/// Searches a source for a video file and downloads the chosen subtitle
///
/// The `choose` closure receives all search results and returns the index of
/// the one to download, or `None` to stop without downloading. Progress
/// events are emitted through `progress_callback`.
///
/// # Returns
///
/// The path of the created subtitle file, or `None` when nothing was found
/// or nothing was chosen.
///
/// # Examples
///
/// ```no_run
/// use sous_titres::{Config, SousTitresEu, fetch_subtitle};
/// use std::path::Path;
///
/// let source = SousTitresEu::new(Config::default()).unwrap();
/// let subtitle = fetch_subtitle(
///     &source,
///     Path::new("/videos/Show.Name.S02E05.HDTV-LOL.avi"),
///     |results| if results.is_empty() { None } else { Some(0) },
///     |_| {}, // Ignore all progress events
/// )
/// .unwrap();
/// ```
pub fn fetch_subtitle<S, C, F>(
    source: &S,
    video_path: &Path,
    mut choose: C,
    mut progress_callback: F,
) -> Result<Option<PathBuf>, SourceError>
where
    S: SubtitleSource + ?Sized,
    C: FnMut(&[SearchResult]) -> Option<usize>,
    F: FnMut(ProgressEvent),
{
    progress_callback(ProgressEvent::Searching {
        site_name: source.site_name().to_string(),
        video_path: video_path.to_path_buf(),
    });

    let languages: Vec<String> = source
        .languages()
        .iter()
        .map(|(code, _)| code.to_string())
        .collect();
    let results = source.process(video_path, &languages)?;

    progress_callback(ProgressEvent::ResultsFound {
        count: results.len(),
    });

    let Some(chosen) = choose(&results).and_then(|index| results.get(index)) else {
        return Ok(None);
    };

    progress_callback(ProgressEvent::Downloading {
        release: chosen.release.clone(),
        link: chosen.link.clone(),
    });

    let mut request = SubtitleRequest::new(chosen, video_path);
    let subtitle_path = source.create_file(&mut request)?;

    progress_callback(ProgressEvent::Complete {
        subtitle_path: subtitle_path.clone(),
    });

    Ok(Some(subtitle_path))
}
