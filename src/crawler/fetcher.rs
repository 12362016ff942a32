//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler:
//! - Building the HTTP client with the configured identity headers
//! - GET requests returning the status code and page body
//! - Error classification (HTTP status, content type, network)

use crate::config::CrawlerConfig;
use crate::{ConfigError, LexiError, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, REFERER};
use reqwest::Client;
use std::time::Duration;

/// A successfully fetched HTML page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Page body
    pub body: String,
}

/// Builds an HTTP client with the crawler's identity
///
/// Every request carries the configured User-Agent and Referer headers and is
/// bounded by the configured timeout.
///
/// # Example
///
/// ```no_run
/// use lexicrawl::config::CrawlerConfig;
/// use lexicrawl::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client> {
    let referrer = HeaderValue::from_str(&config.referrer).map_err(|e| {
        ConfigError::Validation(format!("invalid referrer '{}': {}", config.referrer, e))
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(REFERER, referrer);

    let timeout = Duration::from_secs(config.request_timeout_secs);

    let client = Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Fetches a URL and returns its HTML body
///
/// # Errors
///
/// | Condition | Error |
/// |-----------|-------|
/// | Non-2xx response | `LexiError::HttpStatus` |
/// | Content-Type present and not HTML | `LexiError::UnsupportedContent` |
/// | Timeout, connection or body read failure | `LexiError::Http` |
pub async fn fetch_page(client: &Client, url: &str) -> Result<FetchedPage> {
    let response = client.get(url).send().await.map_err(|source| LexiError::Http {
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    let final_url = response.url().to_string();

    if !status.is_success() {
        return Err(LexiError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase());

    if let Some(content_type) = content_type {
        if !is_html(&content_type) {
            return Err(LexiError::UnsupportedContent {
                url: url.to_string(),
                content_type,
            });
        }
    }

    let body = response.text().await.map_err(|source| LexiError::Http {
        url: url.to_string(),
        source,
    })?;

    Ok(FetchedPage {
        url: final_url,
        status: status.as_u16(),
        body,
    })
}

fn is_html(content_type: &str) -> bool {
    content_type.contains("text/html") || content_type.contains("application/xhtml+xml")
}
