//! Full-text search over the lemma index
//!
//! A query is lemmatized, matched against the site-scoped lemma table and
//! ranked by summed occurrence counts. The ranked list is cached per
//! (query, site) and results are paginated and decorated with a title and a
//! highlighted snippet.

mod cache;
mod engine;
mod snippet;

pub use cache::{CachedResults, SearchCache};
pub use engine::{select_candidates, SearchEngine, CANDIDATE_INTERSECTION_THRESHOLD};
pub use snippet::{build_snippet, cut_snippet, highlight};

use serde::Serialize;

/// Default number of results per page
pub const DEFAULT_LIMIT: usize = 20;

/// A search query with its scope and page window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    /// Site URL to search in, or None for every indexed site
    pub site: Option<String>,
    pub offset: usize,
    pub limit: usize,
}

impl SearchRequest {
    /// A request for the first page of results over all indexed sites
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            site: None,
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = Some(site.into());
        self
    }

    pub fn with_page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }
}

/// One ranked page before pagination
#[derive(Debug, Clone, PartialEq)]
pub struct RankedPage {
    pub site_id: i64,
    pub site_url: String,
    pub site_name: String,
    pub page_id: i64,
    pub path: String,
    /// Summed ranking, normalized to 0..=1 once all sites are collected
    pub relevance: f64,
}

/// A page of search results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    /// Total number of ranked pages, regardless of the page window
    pub count: usize,
    pub data: Vec<SearchHit>,
}

impl SearchResults {
    pub fn empty() -> Self {
        Self {
            count: 0,
            data: Vec::new(),
        }
    }
}

/// A single search result as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub site: String,
    pub site_name: String,
    pub uri: String,
    pub title: String,
    pub snippet: String,
    pub relevance: f64,
}
