use crate::LexiError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{debug, error};

/// Body of every failed request
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub result: bool,
    pub error: String,
}

/// A handler failure; validation errors map to 400, everything else to 500
#[derive(Debug)]
pub struct ApiError(pub LexiError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        if self.0.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<LexiError> for ApiError {
    fn from(error: LexiError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            debug!("Request rejected: {}", self.0);
        }

        let body = ErrorResponse {
            result: false,
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
