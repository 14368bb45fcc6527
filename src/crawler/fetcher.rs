//! HTTP fetcher implementation
//!
//! This module defines the [`Fetcher`] capability the pipeline uses to load
//! pages, and [`HttpFetcher`], its reqwest-backed implementation:
//! - Building HTTP clients with the configured user agent and timeouts
//! - GET requests returning the page body
//! - Error classification (status, timeout, transport, body read)
//!
//! There are no retries: a failed fetch is reported once and the URL dropped.

use crate::config::HttpConfig;
use crate::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Loads the body of a URL
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url`, returning the body of a 2xx response
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The HTTP configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use hostcrawl::config::HttpConfig;
/// use hostcrawl::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`Fetcher`] backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        build_http_client(config).map(Self::new)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    /// Fetches a URL with a single GET request
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | 2xx | `Ok(body)` |
    /// | Any other status | `FetchError::Status` |
    /// | Timeout | `FetchError::Timeout` |
    /// | Connection or request error | `FetchError::Transport` |
    /// | Body could not be read | `FetchError::Read` |
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| FetchError::Read {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
