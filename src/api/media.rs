//! Catalog browsing endpoints

use axum::extract::{Path, State};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use super::ApiError;
use crate::db::{EpisodeRecord, MovieRecord, SeriesRecord};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetMonitoredRequest {
    pub monitored: bool,
}

async fn list_movies(State(state): State<AppState>) -> Result<Json<Vec<MovieRecord>>, ApiError> {
    Ok(Json(state.db.movies().list().await?))
}

async fn list_series(State(state): State<AppState>) -> Result<Json<Vec<SeriesRecord>>, ApiError> {
    Ok(Json(state.db.series().list().await?))
}

async fn list_episodes(State(state): State<AppState>) -> Result<Json<Vec<EpisodeRecord>>, ApiError> {
    Ok(Json(state.db.episodes().list().await?))
}

/// Flip monitoring for a series and all of its episodes in one transaction
async fn set_series_monitored(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetMonitoredRequest>,
) -> Result<Json<SeriesRecord>, ApiError> {
    if !state.db.series().set_monitored(id, req.monitored).await? {
        return Err(ApiError::not_found(format!("series {id} not found")));
    }

    let series = state
        .db
        .series()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("series {id} not found")))?;

    Ok(Json(series))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/movies", get(list_movies))
        .route("/api/series", get(list_series))
        .route("/api/series/{id}/monitored", patch(set_series_monitored))
        .route("/api/episodes", get(list_episodes))
}
