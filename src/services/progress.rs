//! Scan progress reporting
//!
//! Progress events fan out through a tokio broadcast channel so any number
//! of subscribers (SSE streams, loggers) can watch a running scan. Emission
//! is fire-and-forget: a send with no receivers is not an error.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Lifecycle state of a scan, carried on every progress event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Running,
    Completed,
    Failed,
}

/// Counters accumulated over a scan, attached to the terminal event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub new_movies: u32,
    pub updated_movies: u32,
    pub new_series: u32,
    pub new_episodes: u32,
    pub updated_episodes: u32,
    pub conflicts: u32,
    pub removed_movies: u32,
    pub removed_episodes: u32,
    pub removed_series: u32,
}

/// A single progress event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanProgress {
    pub status: ScanStatus,
    /// 0..=100, monotonically non-decreasing within one scan
    pub percent: u8,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ScanSummary>,
}

impl ScanProgress {
    pub fn running(percent: u8, details: impl Into<String>) -> Self {
        Self {
            status: ScanStatus::Running,
            percent,
            details: details.into(),
            error: None,
            summary: None,
        }
    }

    pub fn completed(summary: ScanSummary) -> Self {
        Self {
            status: ScanStatus::Completed,
            percent: 100,
            details: "Scan complete".to_string(),
            error: None,
            summary: Some(summary),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: ScanStatus::Failed,
            percent: 100,
            details: "Scan failed".to_string(),
            error: Some(error.into()),
            summary: None,
        }
    }
}

/// Consumer-agnostic sink for progress events
pub trait ProgressSink: Send + Sync {
    fn emit(&self, progress: ScanProgress);
}

/// Broadcast-backed sink; subscribers attach via [`subscribe`](Self::subscribe)
pub struct BroadcastSink {
    tx: broadcast::Sender<ScanProgress>,
}

impl BroadcastSink {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(100);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for BroadcastSink {
    fn emit(&self, progress: ScanProgress) {
        // No subscribers is fine; the scan does not care who is watching.
        let _ = self.tx.send(progress);
    }
}

/// Sink that drops every event
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _progress: ScanProgress) {}
}
