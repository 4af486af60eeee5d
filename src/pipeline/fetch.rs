//! Outbound HTTP: fetch chapter pages and image bytes.
//!
//! The runner and the image store only talk to the [`Fetcher`] trait, so a
//! run can be driven from memory in tests (or through a caching proxy) by
//! passing a custom implementation via
//! [`crate::config::ScrapeConfigBuilder::fetcher`]. [`HttpFetcher`] is the
//! reqwest-backed default.

use crate::error::Web2MdError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Source of page markup and image bytes.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` and decode the body as text.
    async fn fetch_text(&self, url: &str) -> Result<String, Web2MdError>;

    /// Fetch `url` and return the raw body.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, Web2MdError>;
}

/// Check if the input string looks like an HTTP(S) URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// reqwest-backed [`Fetcher`] with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpFetcher {
    /// Build a client with the given timeout and `User-Agent`.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, Web2MdError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(|e| Web2MdError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            timeout_secs,
        })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, Web2MdError> {
        if !is_url(url) {
            return Err(Web2MdError::InvalidUrl {
                input: url.to_string(),
                reason: "not an HTTP/HTTPS URL".to_string(),
            });
        }

        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_send_error(url, e))?;

        if !response.status().is_success() {
            return Err(Web2MdError::DownloadFailed {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }
        Ok(response)
    }

    fn map_send_error(&self, url: &str, e: reqwest::Error) -> Web2MdError {
        if e.is_timeout() {
            Web2MdError::DownloadTimeout {
                url: url.to_string(),
                secs: self.timeout_secs,
            }
        } else {
            Web2MdError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, Web2MdError> {
        let response = self.get(url).await?;
        response
            .text()
            .await
            .map_err(|e| self.map_send_error(url, e))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, Web2MdError> {
        let response = self.get(url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_send_error(url, e))?;
        Ok(bytes.to_vec())
    }
}
