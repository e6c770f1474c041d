//! Scan control endpoints
//!
//! A scan is triggered asynchronously; callers follow along on the SSE
//! progress stream. Triggering while a scan is running returns 409.

use std::convert::Infallible;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::Stream;
use serde::Serialize;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::error;

use super::ApiError;
use crate::error::ScanError;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStatusResponse {
    pub scanning: bool,
}

async fn scan_status(State(state): State<AppState>) -> Json<ScanStatusResponse> {
    Json(ScanStatusResponse {
        scanning: state.scanner.is_scanning(),
    })
}

async fn trigger_scan(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    if state.scanner.is_scanning() {
        return Err(ScanError::AlreadyRunning.into());
    }

    let scanner = state.scanner.clone();
    tokio::spawn(async move {
        match scanner.run_scan().await {
            Ok(_) => {}
            Err(ScanError::AlreadyRunning) => {
                // Lost the race against another trigger; that scan reports.
            }
            Err(ScanError::Other(e)) => {
                error!(error = %e, "Triggered scan failed");
            }
        }
    });

    Ok(StatusCode::ACCEPTED)
}

/// Server-sent events stream of scan progress
async fn progress_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.progress.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|event| match event {
        Ok(progress) => Event::default().json_data(&progress).ok().map(Ok),
        // A lagged subscriber just misses some intermediate events.
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(trigger_scan).get(scan_status))
        .route("/progress", get(progress_stream))
}
