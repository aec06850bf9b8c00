//! Configuration loading
//!
//! Settings are read from a TOML file in the system's standard config
//! directory. Every field has a default, so a missing file or a partial file
//! is fine.

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default address of the subtitle site
pub const DEFAULT_BASE_URL: &str = "https://www.sous-titres.eu";

/// Environment variable overriding the configured base URL
pub const BASE_URL_ENV: &str = "SOUS_TITRES_BASE_URL";

/// Errors that can occur while loading the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or has wrong field types
    #[error("Failed to parse config file {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Runtime settings for the sous-titres.eu source
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site base URL, without trailing slash
    pub base_url: String,
    /// Timeout for the search page request
    pub search_timeout_secs: u64,
    /// Timeout for the HEAD request resolving the archive URL
    pub head_timeout_secs: u64,
    /// Timeout for downloading the archive
    pub download_timeout_secs: u64,
    /// User agent sent with every request
    pub user_agent: String,
    /// Name or path of the unrar executable
    pub unrar_binary: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            search_timeout_secs: 5,
            head_timeout_secs: 10,
            download_timeout_secs: 60,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            unrar_binary: "unrar".to_string(),
        }
    }
}

impl Config {
    /// Loads the configuration
    ///
    /// Uses `path` when given, otherwise `config.toml` in the platform config
    /// directory. A missing file yields the defaults. The base URL can be
    /// overridden through `SOUS_TITRES_BASE_URL` in both cases.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = path.map(Path::to_path_buf).or_else(default_config_path);

        let mut config = match config_path {
            Some(ref p) if p.exists() => Self::from_file(p)?,
            _ => Self::default(),
        };

        if let Ok(base_url) = env::var(BASE_URL_ENV) {
            config.base_url = base_url;
        }
        config.base_url = config.base_url.trim_end_matches('/').to_string();

        Ok(config)
    }

    /// Reads and parses a configuration file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn head_timeout(&self) -> Duration {
        Duration::from_secs(self.head_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

/// Returns the platform-specific config file location
///
/// - Linux: ~/.config/sous-titres/config.toml
/// - macOS: ~/Library/Application Support/sous-titres/config.toml
/// - Windows: %APPDATA%\sous-titres\config\config.toml
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "sous-titres")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}
