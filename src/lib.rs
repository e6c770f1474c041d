//! Reelvault - self-hosted media library backend
//!
//! Scans configured media folders, identifies movies and TV episodes by
//! filename, resolves metadata from TMDB, and keeps the catalog reconciled
//! with what actually exists on disk.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod jobs;
pub mod services;

use std::sync::Arc;

use crate::db::Database;
use crate::services::{BroadcastSink, ConflictService, ScannerService};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub scanner: Arc<ScannerService>,
    pub conflicts: Arc<ConflictService>,
    pub progress: Arc<BroadcastSink>,
}
