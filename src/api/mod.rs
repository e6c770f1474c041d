//! API route definitions
//!
//! REST endpoints for folder management, conflict resolution, scan control,
//! and catalog browsing, plus health probes.

pub mod conflicts;
pub mod folders;
pub mod health;
pub mod media;
pub mod scan;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;

use crate::error::{ConflictError, ScanError};
use crate::AppState;

/// Assemble the full application router
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/api/folders", folders::router())
        .nest("/api/conflicts", conflicts::router())
        .nest("/api/scan", scan::router())
        .merge(media::router())
}

/// API error with an HTTP status, rendered as `{"error": "..."}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "Request failed");
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

impl From<ConflictError> for ApiError {
    fn from(e: ConflictError) -> Self {
        let status = match &e {
            ConflictError::NotFound(_) => StatusCode::NOT_FOUND,
            ConflictError::InvalidCandidate { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ConflictError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

impl From<ScanError> for ApiError {
    fn from(e: ScanError) -> Self {
        let status = match &e {
            ScanError::AlreadyRunning => StatusCode::CONFLICT,
            ScanError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}
