//! Scanning conflict endpoints

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ApiError;
use crate::db::ScanningConflictRecord;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveConflictRequest {
    pub tmdb_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedCountResponse {
    pub deleted: u64,
}

async fn list_conflicts(
    State(state): State<AppState>,
) -> Result<Json<Vec<ScanningConflictRecord>>, ApiError> {
    Ok(Json(state.conflicts.list_unresolved().await?))
}

async fn resolve_conflict(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ResolveConflictRequest>,
) -> Result<StatusCode, ApiError> {
    state.conflicts.resolve(id, req.tmdb_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_conflict(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.conflicts.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_all_unresolved(
    State(state): State<AppState>,
) -> Result<Json<DeletedCountResponse>, ApiError> {
    let deleted = state.conflicts.delete_all_unresolved().await?;
    Ok(Json(DeletedCountResponse { deleted }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_conflicts).delete(delete_all_unresolved))
        .route("/{id}", delete(delete_conflict))
        .route("/{id}/resolve", post(resolve_conflict))
}
