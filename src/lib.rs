//! Lexicrawl: a per-site lemma search engine
//!
//! This crate crawls a configured set of web sites, builds a per-site inverted
//! index over normalized word forms (lemmas), and serves ranked full-text search
//! with highlighted snippets.

pub mod api;
pub mod config;
pub mod crawler;
pub mod indexer;
pub mod lemmatizer;
pub mod morphology;
pub mod search;
pub mod state;
pub mod statistics;
pub mod storage;
pub mod text;
pub mod url;

use thiserror::Error;

/// Main error type for Lexicrawl operations
#[derive(Debug, Error)]
pub enum LexiError {
    /// A user-facing error: bad input or an operation called in the wrong state
    #[error("{0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Unsupported content type '{content_type}' for {url}")]
    UnsupportedContent { url: String, content_type: String },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Morphology error: {0}")]
    Morphology(#[from] MorphologyError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LexiError {
    /// Returns true for errors that should be reported back to the caller as-is
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Errors raised while loading or querying morphology dictionaries
#[derive(Debug, Error)]
pub enum MorphologyError {
    #[error("Failed to read dictionary {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Malformed dictionary entry at {source_name}:{line}: {message}")]
    Malformed {
        source_name: String,
        line: usize,
        message: String,
    },

    #[error("Dictionary {0} contains no entries")]
    Empty(String),

    #[error("Morphology dictionary directory not found: {0}")]
    MissingDictionary(String),
}

/// Result type alias for Lexicrawl operations
pub type Result<T> = std::result::Result<T, LexiError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlSession, IndexingService};
pub use indexer::Indexer;
pub use lemmatizer::Lemmatizer;
pub use search::{SearchEngine, SearchRequest, SearchResults};
pub use state::SiteStatus;
pub use storage::{SharedStorage, SqliteStorage, Storage};
