//! Storage module for persisting the search index
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Site status persistence
//! - Page storage with first-writer-wins inserts
//! - Lemma frequency and page-lemma ranking upserts
//! - Posting lookups for search

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::SiteStatus;
use crate::LexiError;

use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Storage shared between the crawler, indexer and search tasks
///
/// The lock is never held across an `.await`.
pub type SharedStorage = Arc<Mutex<SqliteStorage>>;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(LexiError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, LexiError> {
    Ok(SqliteStorage::new(path)?)
}

/// Wraps a storage backend for sharing between tasks
pub fn into_shared(storage: SqliteStorage) -> SharedStorage {
    Arc::new(Mutex::new(storage))
}

/// Locks shared storage, turning a poisoned lock into a storage error
pub fn lock(storage: &SharedStorage) -> StorageResult<MutexGuard<'_, SqliteStorage>> {
    storage
        .lock()
        .map_err(|e| StorageError::Database(format!("storage lock poisoned: {}", e)))
}

/// Represents a site in the database
#[derive(Debug, Clone, PartialEq)]
pub struct SiteRecord {
    pub id: i64,
    pub url: String,
    pub name: String,
    pub status: SiteStatus,
    pub status_time: DateTime<Utc>,
    pub last_error: Option<String>,
}

/// Represents a stored page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub id: i64,
    pub site_id: i64,
    pub path: String,
    pub code: u16,
    pub content: String,
}

/// A page that has been fetched but not stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPage {
    pub site_id: i64,
    pub path: String,
    pub code: u16,
    pub content: String,
}

/// Represents a site-scoped lemma
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LemmaRecord {
    pub id: i64,
    pub site_id: i64,
    pub lemma: String,
    pub frequency: u32,
}

/// Represents the ranking of one lemma within one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    pub id: i64,
    pub page_id: i64,
    pub lemma_id: i64,
    pub ranking: u32,
}

/// A page containing a lemma, with the lemma's ranking on that page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub page_id: i64,
    pub ranking: u32,
}

/// Outcome of a lemma upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LemmaUpsert {
    pub record: LemmaRecord,
    /// The row did not exist and was created with frequency 1
    pub created: bool,
    /// An existing row had its frequency incremented
    pub bumped: bool,
}

/// Outcome of an index upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexWrite {
    Created,
    Updated,
    Unchanged,
}
