//! HTTP access for subtitle sources
//!
//! The source adapter only ever needs three things from the network: the
//! text of a page, the final URL of a resource after redirects, and a file
//! download. They sit behind the `HttpClient` trait so the adapter can be
//! exercised without a network.

use humansize::{DECIMAL, format_size};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during HTTP operations
#[derive(Debug, Error)]
pub enum HttpError {
    /// The request did not complete within its time budget
    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    /// The request failed before a response was received
    #[error("Request to {url} failed: {source}")]
    RequestFailed {
        url: String,
        source: reqwest::Error,
    },

    /// The server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// Failed to write the downloaded body to disk
    #[error("Failed to write {path}: {source}")]
    WriteFailed { path: PathBuf, source: io::Error },

    /// Failed to build the HTTP client
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(reqwest::Error),
}

/// Blocking HTTP operations used by subtitle sources
pub trait HttpClient {
    /// Fetches a page and returns its body as text
    fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String, HttpError>;

    /// Issues a HEAD request and returns the final URL after redirects
    fn resolve(&self, url: &str, timeout: Duration) -> Result<String, HttpError>;

    /// Downloads `url` into `target`, returning the number of bytes written
    fn download(&self, url: &str, target: &Path, timeout: Duration) -> Result<u64, HttpError>;
}

/// `HttpClient` backed by `reqwest::blocking`
pub struct ReqwestHttpClient {
    client: reqwest::blocking::Client,
}

impl ReqwestHttpClient {
    /// Creates a client sending the given user agent
    pub fn new(user_agent: &str) -> Result<Self, HttpError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(HttpError::ClientBuild)?;

        Ok(Self { client })
    }

    /// Sends a prepared request, mapping transport and status failures
    fn send(
        &self,
        request: reqwest::blocking::RequestBuilder,
        url: &str,
        timeout: Duration,
    ) -> Result<reqwest::blocking::Response, HttpError> {
        let response = request
            .timeout(timeout)
            .send()
            .map_err(|e| request_error(url, timeout, e))?;

        if !response.status().is_success() {
            return Err(HttpError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response)
    }
}

impl HttpClient for ReqwestHttpClient {
    fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String, HttpError> {
        let response = self.send(self.client.get(url), url, timeout)?;
        response.text().map_err(|e| request_error(url, timeout, e))
    }

    fn resolve(&self, url: &str, timeout: Duration) -> Result<String, HttpError> {
        let response = self.send(self.client.head(url), url, timeout)?;
        let resolved = response.url().to_string();
        debug!("Resolved {} to {}", url, resolved);
        Ok(resolved)
    }

    fn download(&self, url: &str, target: &Path, timeout: Duration) -> Result<u64, HttpError> {
        let mut response = self.send(self.client.get(url), url, timeout)?;

        let mut file = File::create(target).map_err(|e| HttpError::WriteFailed {
            path: target.to_path_buf(),
            source: e,
        })?;

        let written = io::copy(&mut response, &mut file).map_err(|e| HttpError::WriteFailed {
            path: target.to_path_buf(),
            source: e,
        })?;

        debug!(
            "Downloaded {} to {} ({})",
            url,
            target.display(),
            format_size(written, DECIMAL)
        );

        Ok(written)
    }
}

/// Distinguishes timeouts from other transport failures
fn request_error(url: &str, timeout: Duration, error: reqwest::Error) -> HttpError {
    if error.is_timeout() {
        HttpError::Timeout {
            url: url.to_string(),
            timeout,
        }
    } else {
        HttpError::RequestFailed {
            url: url.to_string(),
            source: error,
        }
    }
}
