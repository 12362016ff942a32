//! Crawler module for web page fetching and processing
//!
//! This module contains the crawling logic, including:
//! - HTTP fetching with the configured identity headers
//! - HTML link extraction
//! - Crawl sessions with cooperative cancellation and bounded concurrency
//! - Site crawl coordination and single-page re-indexing

mod coordinator;
mod fetcher;
mod parser;
mod session;

pub use coordinator::{CrawlHandle, IndexingService, INTERRUPTED, STOPPED_BY_USER};
pub use fetcher::{build_http_client, fetch_page, FetchedPage};
pub use parser::extract_links;
pub use session::CrawlSession;
