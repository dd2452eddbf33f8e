//! HTTP-based page fetcher using reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL};
use reqwest::Client;

use crate::fetcher::PageFetcher;
use crate::{Result, ScoutError};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// A page fetcher that uses plain HTTP requests via reqwest.
///
/// Sends browser-like headers; listing sites tend to serve a stripped page
/// to obvious bots.
pub struct HttpFetcher {
    client: Client,
    service: String,
}

impl HttpFetcher {
    /// Creates a new `HttpFetcher` with default settings.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(15))
    }

    /// Creates a fetcher whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(browser_headers())
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            service: "listing".to_string(),
        }
    }

    /// Creates an `HttpFetcher` with a custom reqwest client.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            service: "listing".to_string(),
        }
    }

    /// Sets the service name used in status errors.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScoutError::UpstreamStatus {
                service: self.service.clone(),
                status: status.as_u16(),
            });
        }
        let html = response.text().await?;
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_fetcher_new() {
        let fetcher = HttpFetcher::new();
        assert_eq!(fetcher.service, "listing");
    }

    #[test]
    fn test_http_fetcher_default() {
        let _fetcher = HttpFetcher::default();
    }

    #[test]
    fn test_http_fetcher_with_client() {
        let client = Client::builder()
            .user_agent("test-agent")
            .build()
            .unwrap();
        let fetcher = HttpFetcher::with_client(client).with_service("UIndex");
        assert_eq!(fetcher.service, "UIndex");
    }

    #[test]
    fn test_browser_headers() {
        let headers = browser_headers();
        assert!(headers.get(ACCEPT).is_some());
        assert_eq!(headers.get(CACHE_CONTROL).unwrap(), "no-cache");
    }
}
