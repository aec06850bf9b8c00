//! Search query building and result matching
//!
//! Turns guessed metadata into the query text sent to the site and filters
//! the parsed candidates down to the ones that really belong to the
//! requested show, season and episode.

mod parser;

use parser::{ResultSelectors, candidates, result_containers, result_language, result_link, result_title};
use scraper::Html;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while reading a search results page
#[derive(Debug, Error)]
pub enum SearchError {
    /// The page has no `h3` headings, so its layout is not a results page
    #[error("Search page has no result headings, the page layout may have changed")]
    UnexpectedLayout,

    /// A matched candidate lacks an element every result must have
    #[error("Result '{release}' has no {element}")]
    MissingElement {
        release: String,
        element: &'static str,
    },

    /// A CSS selector failed to compile
    #[error("Invalid selector {0}")]
    Selector(String),
}

/// What to look for on the site, built once per search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub title: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

/// One matched subtitle entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Release name as shown on the site
    pub release: String,
    /// Language code of the subtitle
    pub language: String,
    /// Absolute URL of the subtitle
    pub link: String,
    /// Search page the result was found on
    pub page: String,
    /// Always `None` for this site
    pub rating: Option<f32>,
}

impl SearchQuery {
    pub fn new(title: impl Into<String>, season: Option<u32>, episode: Option<u32>) -> Self {
        Self {
            title: title.into(),
            season,
            episode,
        }
    }

    /// Season and episode, only when both are known and non-zero
    fn season_episode(&self) -> Option<(u32, u32)> {
        match (self.season, self.episode) {
            (Some(season), Some(episode)) if season > 0 && episode > 0 => Some((season, episode)),
            _ => None,
        }
    }

    /// Text sent as the `q` parameter
    ///
    /// `"{title} sNNeNN"` for episodes, the bare title otherwise.
    pub fn text(&self) -> String {
        match self.season_episode() {
            Some((season, episode)) => format!("{} s{:02}e{:02}", self.title, season, episode),
            None => self.title.clone(),
        }
    }

    /// Decides whether a release title belongs to this query
    ///
    /// The lowercase title must contain the lowercase query title once
    /// periods are read as spaces. For episodes, the season and episode
    /// numbers must also both appear somewhere in the raw release title.
    pub fn matches(&self, release: &str) -> bool {
        let normalized = release.replace('.', " ").to_lowercase();
        let name_found = normalized.contains(&self.title.to_lowercase());

        match self.season_episode() {
            Some((season, episode)) => {
                release.contains(&season.to_string())
                    && release.contains(&episode.to_string())
                    && name_found
            }
            None => name_found,
        }
    }
}

/// Extracts the results matching `query` from a search results page
///
/// `base_url` prefixes every result link, `page_url` is recorded on each
/// result. Zero matches is `Ok` with an empty list; a page without any
/// result headings is `SearchError::UnexpectedLayout`.
pub fn parse_results(
    html: &str,
    query: &SearchQuery,
    base_url: &str,
    page_url: &str,
) -> Result<Vec<SearchResult>, SearchError> {
    let selectors = ResultSelectors::new()?;
    let document = Html::parse_document(html);

    let Some(containers) = result_containers(&document, &selectors, &query.title) else {
        warn!("No result containers on {}", page_url);
        return Err(SearchError::UnexpectedLayout);
    };

    let mut results = Vec::new();

    for container in containers {
        for candidate in candidates(container, &selectors) {
            let Some(release) = result_title(&candidate, &selectors) else {
                debug!("Skipping entry without a title: {}", candidate.html());
                continue;
            };

            debug!("Candidate {}", release.replace('.', " "));
            if !query.matches(&release) {
                continue;
            }

            let language = result_language(&candidate, &selectors).ok_or_else(|| {
                SearchError::MissingElement {
                    release: release.clone(),
                    element: "language image",
                }
            })?;

            debug!("Matched {}", release);
            results.push(SearchResult {
                link: result_link(&candidate, base_url),
                page: page_url.to_string(),
                rating: None,
                release,
                language,
            });
        }
    }

    sort_by_rating(&mut results);
    Ok(results)
}

/// Orders results best-rated first, keeping discovery order among equals
pub fn sort_by_rating(results: &mut [SearchResult]) {
    results.sort_by(|a, b| b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BASE_URL: &str = "https://www.sous-titres.eu";
    const PAGE_URL: &str = "https://www.sous-titres.eu/search.html?q=show+name+s02e05";

    const RESULTS_PAGE: &str = r#"
        <html><body>
          <div class="serie">
            <h3>Show Name</h3>
            <a class="subList" href="series/show_name.html#s2e5">
              <img src="/images/flags/es.png" alt="es">
              <span class="smallFilenameSerie">Show.Name.S02E05.HDTV</span>
            </a>
            <a class="subList" href="series/show_name.html#s2e6">
              <img src="/images/flags/es.png" alt="es">
              <span class="smallFilenameSerie">Show.Name.S02E06.HDTV</span>
            </a>
            <a class="subList" href="series/show_name.html#s3e2">
              <img src="/images/flags/es.png" alt="es">
              <span class="smallFilenameSerie">Show.Name.S03E02.720p</span>
            </a>
          </div>
          <div class="serie">
            <h3>Another Show</h3>
            <a class="subList" href="series/another.html">
              <img src="/images/flags/es.png" alt="es">
              <span class="smallFilenameSerie">Another.Show.S02E05</span>
            </a>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_query_text() {
        assert_eq!(SearchQuery::new("show name", Some(2), Some(5)).text(), "show name s02e05");
        assert_eq!(SearchQuery::new("show name", Some(12), Some(105)).text(), "show name s12e105");
        assert_eq!(SearchQuery::new("movie", None, None).text(), "movie");
        assert_eq!(SearchQuery::new("movie", Some(2), None).text(), "movie");
        assert_eq!(SearchQuery::new("special", Some(0), Some(3)).text(), "special");
    }

    #[test]
    fn test_matches_episode() {
        let query = SearchQuery::new("Show Name", Some(2), Some(5));
        assert!(query.matches("Show.Name.S02E05.HDTV"));
        assert!(!query.matches("Show.Name.S02E06.HDTV"));
        assert!(!query.matches("Other.Show.S02E05.HDTV"));
        // Digits only need to appear somewhere in the title
        assert!(query.matches("Show.Name.S05E12.HDTV"));
    }

    #[test]
    fn test_matches_without_episode() {
        let query = SearchQuery::new("el laberinto", None, None);
        assert!(query.matches("El.Laberinto.Del.Fauno.2006.DVDRip"));
        assert!(!query.matches("ElLaberinto.2006"));
    }

    #[test]
    fn test_parse_single_match() {
        let query = SearchQuery::new("Show Name", Some(2), Some(5));
        let results = parse_results(RESULTS_PAGE, &query, BASE_URL, PAGE_URL).unwrap();

        assert_eq!(
            results,
            vec![SearchResult {
                release: "Show.Name.S02E05.HDTV".to_string(),
                language: "es".to_string(),
                link: "https://www.sous-titres.eu/series/show_name.html#s2e5".to_string(),
                page: PAGE_URL.to_string(),
                rating: None,
            }]
        );
    }

    #[test]
    fn test_parse_properties_hold_for_every_result() {
        let query = SearchQuery::new("show name", None, None);
        let results = parse_results(RESULTS_PAGE, &query, BASE_URL, PAGE_URL).unwrap();

        assert_eq!(results.len(), 3);
        for result in &results {
            assert!(result.release.replace('.', " ").to_lowercase().contains("show name"));
            assert!(result.link.starts_with("https://www.sous-titres.eu/series/"));
        }

        // Discovery order is preserved since no result carries a rating
        let releases: Vec<&str> = results.iter().map(|r| r.release.as_str()).collect();
        assert_eq!(
            releases,
            vec![
                "Show.Name.S02E05.HDTV",
                "Show.Name.S02E06.HDTV",
                "Show.Name.S03E02.720p"
            ]
        );
    }

    #[test]
    fn test_parse_no_headings() {
        let query = SearchQuery::new("show name", None, None);
        let result = parse_results("<html><body><p>Aucun</p></body></html>", &query, BASE_URL, PAGE_URL);

        assert!(matches!(result, Err(SearchError::UnexpectedLayout)));
    }

    #[test]
    fn test_parse_no_matching_heading_is_empty() {
        let query = SearchQuery::new("unrelated", None, None);
        let results = parse_results(RESULTS_PAGE, &query, BASE_URL, PAGE_URL).unwrap();

        assert!(results.is_empty());
    }

    #[test]
    fn test_parse_missing_language_is_an_error() {
        let page = r#"
            <div><h3>Movie</h3>
              <a class="subList" href="films/movie.html">
                <span class="smallFilenameFilm">Movie.2010.DVDRip</span>
              </a>
            </div>
        "#;
        let query = SearchQuery::new("movie", None, None);
        let result = parse_results(page, &query, BASE_URL, PAGE_URL);

        assert!(matches!(
            result,
            Err(SearchError::MissingElement { element: "language image", .. })
        ));
    }

    #[test]
    fn test_sort_by_rating_is_stable() {
        let result = |release: &str, rating: Option<f32>| SearchResult {
            release: release.to_string(),
            language: "es".to_string(),
            link: String::new(),
            page: String::new(),
            rating,
        };
        let mut results = vec![
            result("a", None),
            result("b", Some(1.0)),
            result("c", None),
            result("d", Some(3.0)),
        ];

        sort_by_rating(&mut results);

        let order: Vec<&str> = results.iter().map(|r| r.release.as_str()).collect();
        assert_eq!(order, vec!["d", "b", "a", "c"]);
    }
}
