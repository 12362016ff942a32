//! HTTP API
//!
//! JSON endpoints under `/api` for statistics, crawl control, single-page
//! indexing and search. Every response carries a boolean `result`; failures
//! add an `error` message.

mod error;
mod handlers;

pub use error::{ApiError, ErrorResponse};
pub use handlers::{
    handle_index_page, handle_search, handle_start_indexing, handle_statistics,
    handle_stop_indexing, IndexPageParams, ResultResponse, SearchParams, SearchResponse,
    StatisticsResponse,
};

use crate::config::Config;
use crate::crawler::IndexingService;
use crate::search::SearchEngine;
use crate::storage::SharedStorage;
use axum::routing::{get, post};
use axum::{Extension, Router};
use std::sync::Arc;

/// Services shared by all handlers
pub struct AppState {
    pub config: Arc<Config>,
    pub storage: SharedStorage,
    pub indexing: Arc<IndexingService>,
    pub search: Arc<SearchEngine>,
}

/// Builds the API router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/statistics", get(handle_statistics))
        .route("/api/startIndexing", get(handle_start_indexing))
        .route("/api/stopIndexing", get(handle_stop_indexing))
        .route("/api/indexPage", post(handle_index_page))
        .route("/api/search", get(handle_search))
        .layer(Extension(state))
}
