//! URL handling module for Lexicrawl
//!
//! This module provides link normalization, the crawl filter that decides which
//! links to follow, and page path extraction.

mod filter;
mod normalize;

use crate::{UrlError, UrlResult};
use url::Url;

// Re-export main functions
pub use filter::{is_crawlable, is_within_site};
pub use normalize::{normalize_link, normalize_site_url};

/// Extracts the path component of a page URL
///
/// The path is what identifies a page within its site. An empty path becomes `/`.
///
/// # Examples
///
/// ```
/// use lexicrawl::url::page_path;
///
/// assert_eq!(page_path("https://example.com").unwrap(), "/");
/// assert_eq!(page_path("https://example.com/news/1").unwrap(), "/news/1");
/// ```
pub fn page_path(url_str: &str) -> UrlResult<String> {
    let url = parse_http_url(url_str)?;
    let path = url.path();
    if path.is_empty() {
        Ok("/".to_string())
    } else {
        Ok(path.to_string())
    }
}

/// Parses a URL and checks it uses an HTTP(S) scheme and has a host
pub fn parse_http_url(url_str: &str) -> UrlResult<Url> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_path() {
        assert_eq!(page_path("https://example.com").unwrap(), "/");
        assert_eq!(page_path("https://example.com/").unwrap(), "/");
    }

    #[test]
    fn test_nested_path() {
        assert_eq!(page_path("https://example.com/a/b").unwrap(), "/a/b");
    }

    #[test]
    fn test_path_keeps_encoding() {
        assert_eq!(
            page_path("https://example.com/a%20b").unwrap(),
            "/a%20b"
        );
    }

    #[test]
    fn test_invalid_scheme() {
        let result = page_path("ftp://example.com/file");
        assert!(matches!(result.unwrap_err(), UrlError::InvalidScheme(_)));
    }

    #[test]
    fn test_malformed_url() {
        assert!(matches!(page_path("not a url").unwrap_err(), UrlError::Parse(_)));
    }
}
