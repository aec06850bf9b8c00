//! www.sous-titres.eu subtitle source
//!
//! Searches the site's HTML search page for the title guessed from a video
//! file name and downloads the chosen subtitle, which the site serves as a
//! zip or rar archive. Only Spanish subtitles are available.

use crate::archive::{
    ArchiveBackend, ArchiveError, ArchiveKind, UnrarCli, ZipArchiveBackend, extract_first_subtitle,
};
use crate::config::Config;
use crate::guess::{BasicGuesser, FileGuesser, MediaKind};
use crate::http::{HttpClient, ReqwestHttpClient};
use crate::search::{SearchQuery, SearchResult, parse_results};
use crate::source::{SourceError, SubtitleRequest, SubtitleSource};
use crate::temp::TempGuard;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Languages served by the site
const LANGUAGES: &[(&str, &str)] = &[("es", "Spanish")];

const SITE_NAME: &str = "www.sous-titres.eu";

/// Subtitle source for www.sous-titres.eu
///
/// The source holds no per-search state, so one instance can serve several
/// files, also from several threads when `H` and `G` allow it.
pub struct SousTitresEu<H = ReqwestHttpClient, G = BasicGuesser>
where
    H: HttpClient,
    G: FileGuesser,
{
    config: Config,
    http: H,
    guesser: G,
    /// Backend for rar archives
    rar: Box<dyn ArchiveBackend + Send + Sync>,
    zip: ZipArchiveBackend,
}

impl SousTitresEu {
    /// Creates the source with a reqwest client and the `unrar` tool
    pub fn new(config: Config) -> Result<Self, SourceError> {
        let http = ReqwestHttpClient::new(&config.user_agent)?;
        let rar = Box::new(UnrarCli::new(config.unrar_binary.clone()));
        Ok(Self::with_parts(config, http, BasicGuesser, rar))
    }
}

impl<H, G> SousTitresEu<H, G>
where
    H: HttpClient,
    G: FileGuesser,
{
    /// Creates the source from explicit collaborators
    pub fn with_parts(
        config: Config,
        http: H,
        guesser: G,
        rar: Box<dyn ArchiveBackend + Send + Sync>,
    ) -> Self {
        Self {
            config,
            http,
            guesser,
            rar,
            zip: ZipArchiveBackend,
        }
    }

    /// Searches the site and returns the results matching the query
    ///
    /// `extra` carries release group tags; the site has no use for them.
    pub fn query(
        &self,
        name: &str,
        season: Option<u32>,
        episode: Option<u32>,
        extra: &[String],
    ) -> Result<Vec<SearchResult>, SourceError> {
        let query = SearchQuery::new(name, season, episode);
        let page_url = self.search_url(&query)?;

        debug!("SousTitresEu query: {} (teams: {:?})", page_url, extra);

        let html = self
            .http
            .fetch_text(&page_url, self.config.search_timeout())
            .inspect_err(|e| warn!("Search request failed: {}", e))?;

        let results = parse_results(&html, &query, &self.config.base_url, &page_url)?;
        debug!("{} result(s) for {}", results.len(), query.text());

        Ok(results)
    }

    /// URL of the search page for a query, with the text in `q`
    fn search_url(&self, query: &SearchQuery) -> Result<String, SourceError> {
        let endpoint = format!("{}/search.html", self.config.base_url);
        reqwest::Url::parse_with_params(&endpoint, &[("q", query.text())])
            .map(|url| url.to_string())
            .map_err(|e| SourceError::InvalidUrl(format!("{}: {}", endpoint, e)))
    }

    /// Direct link of a subtitle; result links already point at the file
    fn download_link(&self, result_url: &str) -> String {
        result_url.to_string()
    }

    /// Downloads an archive next to the video and extracts its subtitle
    ///
    /// The archive is named after the video with the archive extension and
    /// removed again whatever the outcome.
    fn extract_archive(
        &self,
        kind: ArchiveKind,
        backend: &dyn ArchiveBackend,
        url: &str,
        video_path: &Path,
    ) -> Result<PathBuf, SourceError> {
        let base_name = video_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| SourceError::InvalidVideoPath(video_path.to_path_buf()))?;

        let archive = TempGuard::track(video_path.with_extension(kind.extension()));
        let dest_dir = archive
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();

        self.http
            .download(url, &archive, self.config.download_timeout())?;

        if kind.matches_content(&archive) == Some(false) {
            warn!(
                "{} does not look like a {} archive",
                archive.display(),
                kind.extension()
            );
        }

        match extract_first_subtitle(backend, &archive, &dest_dir, &base_name) {
            Ok(Some(path)) => Ok(path),
            Ok(None) => {
                info!("No subtitle file in {}", url);
                Err(SourceError::NoSubtitleInArchive {
                    url: url.to_string(),
                })
            }
            Err(e @ ArchiveError::ToolUnavailable { .. }) => {
                error!("Execution failed: unrar not available? {}", e);
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl<H, G> SubtitleSource for SousTitresEu<H, G>
where
    H: HttpClient,
    G: FileGuesser,
{
    fn site_name(&self) -> &str {
        SITE_NAME
    }

    fn languages(&self) -> &[(&'static str, &'static str)] {
        LANGUAGES
    }

    fn process(
        &self,
        video_path: &Path,
        languages: &[String],
    ) -> Result<Vec<SearchResult>, SourceError> {
        let file_name = video_path
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .ok_or_else(|| SourceError::InvalidVideoPath(video_path.to_path_buf()))?;

        let served = |code: &String| LANGUAGES.iter().any(|(c, _)| *c == code.as_str());
        if !languages.is_empty() && !languages.iter().any(served) {
            debug!("{} only serves Spanish, asked for {:?}", SITE_NAME, languages);
        }

        let guessed = self.guesser.guess(&file_name);

        match guessed.kind {
            MediaKind::TvShow => self.query(
                &guessed.name,
                guessed.season,
                guessed.episode,
                &guessed.teams,
            ),
            MediaKind::Movie => self.query(&guessed.name, None, None, &guessed.teams),
            MediaKind::Unknown => Ok(Vec::new()),
        }
    }

    fn create_file(&self, request: &mut SubtitleRequest) -> Result<PathBuf, SourceError> {
        let download_url = self.download_link(&request.link);

        let resolved = self
            .http
            .resolve(&download_url, self.config.head_timeout())?;
        request.link = resolved.clone();

        match ArchiveKind::from_url(&resolved) {
            Some(ArchiveKind::Zip) => {
                self.extract_archive(ArchiveKind::Zip, &self.zip, &resolved, &request.filename)
            }
            Some(ArchiveKind::Rar) => {
                warn!("Rar is not really supported yet. Trying to call unrar");
                self.extract_archive(
                    ArchiveKind::Rar,
                    self.rar.as_ref(),
                    &resolved,
                    &request.filename,
                )
            }
            None => {
                info!("Unexpected file type (not zip or rar) for {}", resolved);
                Err(SourceError::UnsupportedArchive { url: resolved })
            }
        }
    }
}
