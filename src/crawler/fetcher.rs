//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the crawler's identity
//! - A hard per-request timeout that abandons the in-flight request
//! - Optional static consent cookies
//! - Classifying responses into found / not found / transient
//!
//! The fetcher never retries; the crawl controller decides what a failure means.

use crate::config::FetcherConfig;
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use std::time::Duration;

/// A successfully fetched response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Raw body bytes, decoded later by the encoding resolver
    pub bytes: Vec<u8>,
    /// Content-Type header value, if any
    pub content_type: Option<String>,
    /// Final URL after redirects
    pub final_url: String,
    /// HTTP status code
    pub status: u16,
}

/// Result of a fetch operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Fetched(FetchedPage),

    /// HTTP 404 or 410: the identifier does not exist
    NotFound,

    /// Any other failure: non-2xx status, timeout, connection or body error
    Transient(String),
}

impl FetchOutcome {
    pub fn is_fetched(&self) -> bool {
        matches!(self, Self::Fetched(_))
    }
}

/// Fetches single URLs
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Performs one GET request
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to fetch
    /// * `cookie` - A static `Cookie` header value to send, if any
    async fn fetch(&self, url: &str, cookie: Option<&str>) -> FetchOutcome;
}

/// Builds an HTTP client with the crawler's identity
///
/// # Arguments
///
/// * `config` - The fetcher configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Creates a fetcher from configuration
    pub fn new(config: &FetcherConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn fetch_inner(&self, url: &str, cookie: Option<&str>) -> FetchOutcome {
        let mut request = self.client.get(url);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::Transient(classify_error(&e)),
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return FetchOutcome::NotFound;
        }
        if !status.is_success() {
            return FetchOutcome::Transient(format!("HTTP {}", status.as_u16()));
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        match response.bytes().await {
            Ok(bytes) => FetchOutcome::Fetched(FetchedPage {
                bytes: bytes.to_vec(),
                content_type,
                final_url,
                status: status.as_u16(),
            }),
            Err(e) => FetchOutcome::Transient(format!("body read failed: {}", classify_error(&e))),
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, cookie: Option<&str>) -> FetchOutcome {
        // The client timeout covers the request; this bound also covers a stalled body
        match tokio::time::timeout(self.timeout, self.fetch_inner(url, cookie)).await {
            Ok(outcome) => {
                tracing::trace!("GET {} -> {:?}", url, outcome_label(&outcome));
                outcome
            }
            Err(_) => FetchOutcome::Transient(format!("timed out after {:?}", self.timeout)),
        }
    }
}

fn outcome_label(outcome: &FetchOutcome) -> String {
    match outcome {
        FetchOutcome::Fetched(page) => format!("{} ({} bytes)", page.status, page.bytes.len()),
        FetchOutcome::NotFound => "not found".to_string(),
        FetchOutcome::Transient(reason) => reason.clone(),
    }
}

/// Describes a reqwest error for logs and summaries
fn classify_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("timeout: {}", error)
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else if error.is_redirect() {
        format!("redirect error: {}", error)
    } else {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FetcherConfig {
        FetcherConfig {
            crawler_name: "Harvest".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/bot".to_string(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&config()).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transient() {
        let fetcher = HttpFetcher::new(&config()).unwrap();
        // Port 9 on localhost is the discard port and is normally closed
        let outcome = fetcher.fetch("http://127.0.0.1:9/", None).await;
        assert!(matches!(outcome, FetchOutcome::Transient(_)));
    }
}
