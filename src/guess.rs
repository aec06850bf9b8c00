//! File name guessing
//!
//! Derives a probable title, season and episode from a video file name.
//! Sources only depend on the `FileGuesser` trait; `BasicGuesser` covers the
//! common scene naming patterns and nothing more.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Extensions stripped from a file name before guessing
const VIDEO_EXTENSIONS: &[&str] = &[
    "avi", "divx", "flv", "m4v", "mkv", "mov", "mp4", "mpeg", "mpg", "ogm", "ts", "webm", "wmv",
];

static SEASON_EPISODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bs(\d{1,2})\s?e(\d{1,3})\b").expect("season/episode pattern is valid")
});

static CROSS_EPISODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})x(\d{2,3})\b").expect("NxNN pattern is valid")
});

static MOVIE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b((19|20)\d{2}|480p|720p|1080p|2160p|dvdrip|bdrip|brrip|bluray|hdtv|webrip|web|xvid|x264|h264)\b",
    )
    .expect("movie marker pattern is valid")
});

/// What kind of media a file name most likely refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    TvShow,
    Movie,
    Unknown,
}

/// Structured metadata inferred from a file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessedMetadata {
    pub kind: MediaKind,
    /// Show or movie title, lowercase words separated by single spaces
    pub name: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    /// Release group tags
    pub teams: Vec<String>,
}

impl GuessedMetadata {
    fn unknown() -> Self {
        Self {
            kind: MediaKind::Unknown,
            name: String::new(),
            season: None,
            episode: None,
            teams: Vec::new(),
        }
    }
}

/// Trait for turning a video file name into searchable metadata
pub trait FileGuesser {
    /// Guesses metadata from a bare file name (no directory components)
    fn guess(&self, file_name: &str) -> GuessedMetadata;
}

/// Pattern-based guesser for scene-style file names
///
/// Recognizes `SxxEyy` and `NxNN` episode markers. Anything else with a
/// usable title is treated as a movie, cut at the first year or quality tag.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicGuesser;

impl FileGuesser for BasicGuesser {
    fn guess(&self, file_name: &str) -> GuessedMetadata {
        let stem = strip_video_extension(file_name);

        let (body, teams) = match stem.rsplit_once('-') {
            Some((body, team)) if is_team_tag(team) => (body, vec![team.trim().to_string()]),
            _ => (stem, Vec::new()),
        };

        let normalized = body.replace(['.', '_'], " ");

        let episode_marker = SEASON_EPISODE
            .captures(&normalized)
            .or_else(|| CROSS_EPISODE.captures(&normalized));

        let guessed = if let Some(caps) = episode_marker {
            let start = caps.get(0).map_or(0, |m| m.start());
            GuessedMetadata {
                kind: MediaKind::TvShow,
                name: clean_title(&normalized[..start]),
                season: caps.get(1).and_then(|m| m.as_str().parse().ok()),
                episode: caps.get(2).and_then(|m| m.as_str().parse().ok()),
                teams,
            }
        } else {
            let end = MOVIE_MARKER
                .find(&normalized)
                .map_or(normalized.len(), |m| m.start());
            GuessedMetadata {
                kind: MediaKind::Movie,
                name: clean_title(&normalized[..end]),
                season: None,
                episode: None,
                teams,
            }
        };

        if guessed.name.is_empty() {
            debug!("Could not guess a title from {}", file_name);
            return GuessedMetadata::unknown();
        }

        debug!("Guessed {:?} from {}", guessed, file_name);
        guessed
    }
}

fn strip_video_extension(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if VIDEO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) => stem,
        _ => file_name,
    }
}

/// Release groups are a single token without separators
fn is_team_tag(candidate: &str) -> bool {
    let candidate = candidate.trim();
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_')
        && !candidate.chars().all(|c| c.is_ascii_digit())
}

/// Collapses whitespace and trims separators left over around the title
fn clean_title(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == '-' || c == '[' || c == ']' || c.is_whitespace())
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_guess_tv_show() {
        let guessed = BasicGuesser.guess("show.name.s02e05.hdtv.xvid-lol.avi");
        assert_eq!(
            guessed,
            GuessedMetadata {
                kind: MediaKind::TvShow,
                name: "show name".to_string(),
                season: Some(2),
                episode: Some(5),
                teams: vec!["lol".to_string()],
            }
        );
    }

    #[test]
    fn test_guess_tv_show_cross_notation() {
        let guessed = BasicGuesser.guess("the_office_3x07.mkv");
        assert_eq!(guessed.kind, MediaKind::TvShow);
        assert_eq!(guessed.name, "the office");
        assert_eq!(guessed.season, Some(3));
        assert_eq!(guessed.episode, Some(7));
        assert!(guessed.teams.is_empty());
    }

    #[test]
    fn test_guess_movie() {
        let guessed = BasicGuesser.guess("el.laberinto.del.fauno.2006.dvdrip-fxg.avi");
        assert_eq!(guessed.kind, MediaKind::Movie);
        assert_eq!(guessed.name, "el laberinto del fauno");
        assert_eq!(guessed.season, None);
        assert_eq!(guessed.teams, vec!["fxg".to_string()]);
    }

    #[test]
    fn test_guess_movie_without_markers() {
        let guessed = BasicGuesser.guess("amelie.mp4");
        assert_eq!(guessed.kind, MediaKind::Movie);
        assert_eq!(guessed.name, "amelie");
    }

    #[test]
    fn test_guess_unknown() {
        let guessed = BasicGuesser.guess("s01e02.mkv");
        assert_eq!(guessed.kind, MediaKind::Unknown);
    }

    #[test]
    fn test_strip_video_extension() {
        assert_eq!(strip_video_extension("a.b.mkv"), "a.b");
        assert_eq!(strip_video_extension("show.s01e01"), "show.s01e01");
    }
}
