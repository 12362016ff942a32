//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::state::SiteStatus;
use crate::storage::{
    IndexRecord, IndexWrite, LemmaRecord, LemmaUpsert, NewPage, PageRecord, Posting, SiteRecord,
};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Site not found: {0}")]
    SiteNotFound(String),

    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed by the crawler, the
/// indexer and the search engine. Inserts that may race between crawl tasks
/// are conflict-ignoring: the first writer wins and later writers observe the
/// existing row.
pub trait Storage {
    // ===== Site Management =====

    /// Inserts a new site with the given status
    fn insert_site(&mut self, url: &str, name: &str, status: SiteStatus)
        -> StorageResult<SiteRecord>;

    /// Finds a site by its normalized URL
    fn find_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>>;

    /// Gets a site by ID
    fn get_site(&self, site_id: i64) -> StorageResult<SiteRecord>;

    /// Lists all sites ordered by ID
    fn list_sites(&self) -> StorageResult<Vec<SiteRecord>>;

    /// Sets the status and last error of a site and refreshes its status time
    fn update_site_status(
        &mut self,
        site_id: i64,
        status: SiteStatus,
        last_error: Option<&str>,
    ) -> StorageResult<()>;

    /// Refreshes the status time of a site without changing its status
    fn touch_site(&mut self, site_id: i64) -> StorageResult<()>;

    /// Deletes a site and, by cascade, all of its pages, lemmas and index entries
    ///
    /// Returns true if a site was deleted.
    fn delete_site_by_url(&mut self, url: &str) -> StorageResult<bool>;

    // ===== Page Management =====

    /// Inserts a page unless one already exists for its (site, path)
    ///
    /// # Returns
    ///
    /// * `Some(PageRecord)` - The page was inserted by this call
    /// * `None` - A page with the same path already existed
    fn insert_page_if_absent(&mut self, page: &NewPage) -> StorageResult<Option<PageRecord>>;

    /// Finds a page by site and path
    fn find_page(&self, site_id: i64, path: &str) -> StorageResult<Option<PageRecord>>;

    /// Gets a page by ID
    fn get_page(&self, page_id: i64) -> StorageResult<PageRecord>;

    /// Replaces the status code and content of an existing page
    fn update_page(&mut self, page_id: i64, code: u16, content: &str) -> StorageResult<()>;

    /// Counts pages, for one site or for all sites
    fn count_pages(&self, site_id: Option<i64>) -> StorageResult<u64>;

    // ===== Lemma Management =====

    /// Creates a lemma with frequency 1 if it does not exist for the site
    ///
    /// When the lemma already exists its frequency is incremented only if
    /// `bump_existing` is true.
    fn upsert_lemma(
        &mut self,
        site_id: i64,
        lemma: &str,
        bump_existing: bool,
    ) -> StorageResult<LemmaUpsert>;

    /// Finds a lemma within a site
    fn find_lemma(&self, site_id: i64, lemma: &str) -> StorageResult<Option<LemmaRecord>>;

    /// Counts lemmas, for one site or for all sites
    fn count_lemmas(&self, site_id: Option<i64>) -> StorageResult<u64>;

    // ===== Index Management =====

    /// Records the ranking of a lemma within a page
    ///
    /// Creates the entry if absent, updates it if the ranking differs, and
    /// otherwise leaves it untouched.
    fn upsert_index(&mut self, page_id: i64, lemma_id: i64, ranking: u32)
        -> StorageResult<IndexWrite>;

    /// Finds the index entry for a (page, lemma) pair
    fn find_index(&self, page_id: i64, lemma_id: i64) -> StorageResult<Option<IndexRecord>>;

    /// Lists all index entries of a page
    fn indexes_for_page(&self, page_id: i64) -> StorageResult<Vec<IndexRecord>>;

    /// Lists every page containing the lemma with its ranking there
    fn postings(&self, lemma_id: i64) -> StorageResult<Vec<Posting>>;
}
