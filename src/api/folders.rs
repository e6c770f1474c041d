//! Media folder management endpoints

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use super::ApiError;
use crate::db::{CreateMediaFolder, MediaFolderRecord, UpdateMediaFolder};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    pub path: String,
    /// "movie" or "series"
    pub media_kind: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFolderRequest {
    pub path: Option<String>,
    pub media_kind: Option<String>,
    pub active: Option<bool>,
}

fn validate_media_kind(kind: &str) -> Result<(), ApiError> {
    if kind != "movie" && kind != "series" {
        return Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("mediaKind must be 'movie' or 'series', got '{kind}'"),
        ));
    }
    Ok(())
}

async fn list_folders(State(state): State<AppState>) -> Result<Json<Vec<MediaFolderRecord>>, ApiError> {
    Ok(Json(state.db.folders().list().await?))
}

async fn get_folder(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MediaFolderRecord>, ApiError> {
    let folder = state
        .db
        .folders()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("folder {id} not found")))?;
    Ok(Json(folder))
}

async fn create_folder(
    State(state): State<AppState>,
    Json(req): Json<CreateFolderRequest>,
) -> Result<(StatusCode, Json<MediaFolderRecord>), ApiError> {
    validate_media_kind(&req.media_kind)?;

    let folder = state
        .db
        .folders()
        .create(CreateMediaFolder {
            path: req.path,
            media_kind: req.media_kind,
            active: req.active,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(folder)))
}

async fn update_folder(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateFolderRequest>,
) -> Result<Json<MediaFolderRecord>, ApiError> {
    if let Some(ref kind) = req.media_kind {
        validate_media_kind(kind)?;
    }

    let folder = state
        .db
        .folders()
        .update(
            id,
            UpdateMediaFolder {
                path: req.path,
                media_kind: req.media_kind,
                active: req.active,
            },
        )
        .await?
        .ok_or_else(|| ApiError::not_found(format!("folder {id} not found")))?;

    Ok(Json(folder))
}

async fn delete_folder(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !state.db.folders().delete(id).await? {
        return Err(ApiError::not_found(format!("folder {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_folders).post(create_folder))
        .route(
            "/{id}",
            get(get_folder).put(update_folder).delete(delete_folder),
        )
}
