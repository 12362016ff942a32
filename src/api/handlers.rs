use super::{ApiError, AppState};
use crate::search::{SearchHit, SearchRequest, DEFAULT_LIMIT};
use crate::statistics::{load_statistics, Statistics};
use crate::storage;
use crate::LexiError;
use axum::extract::Query;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub result: bool,
}

impl ResultResponse {
    fn ok() -> Json<Self> {
        Json(Self { result: true })
    }
}

#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub result: bool,
    pub statistics: Statistics,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub result: bool,
    pub count: usize,
    pub data: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub site: Option<String>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct IndexPageParams {
    pub url: Option<String>,
}

pub async fn handle_statistics(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<StatisticsResponse>, ApiError> {
    let indexing = state.indexing.is_running();

    let statistics = tokio::task::spawn_blocking(move || {
        let storage = storage::lock(&state.storage)?;
        load_statistics(&*storage, &state.config.sites, indexing)
    })
    .await
    .map_err(|e| LexiError::Task(e.to_string()))??;

    Ok(Json(StatisticsResponse {
        result: true,
        statistics,
    }))
}

pub async fn handle_start_indexing(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<ResultResponse>, ApiError> {
    // The crawl runs on in the background once the handle is dropped
    let handle = state.indexing.start_indexing()?;
    info!(
        "Indexing started at {}",
        handle.session().started_at().to_rfc3339()
    );

    Ok(ResultResponse::ok())
}

pub async fn handle_stop_indexing(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<ResultResponse>, ApiError> {
    state.indexing.stop_indexing()?;
    Ok(ResultResponse::ok())
}

pub async fn handle_index_page(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<IndexPageParams>,
) -> Result<Json<ResultResponse>, ApiError> {
    let url = params
        .url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| LexiError::Validation("Parameter 'url' is required".to_string()))?;

    state.indexing.index_page(&url)?;
    Ok(ResultResponse::ok())
}

pub async fn handle_search(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let request = SearchRequest {
        query: params.query.unwrap_or_default(),
        site: params.site.filter(|site| !site.trim().is_empty()),
        offset: params.offset.unwrap_or(0),
        limit: params.limit.unwrap_or(DEFAULT_LIMIT),
    };

    let results = tokio::task::spawn_blocking(move || state.search.search(&request))
        .await
        .map_err(|e| LexiError::Task(e.to_string()))??;

    Ok(Json(SearchResponse {
        result: true,
        count: results.count,
        data: results.data,
    }))
}
