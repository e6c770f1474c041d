//! Typed errors surfaced across service boundaries
//!
//! Most plumbing propagates `anyhow::Error`; these enums exist for the
//! outcomes callers need to distinguish: a scan already in flight, and
//! operations against a conflict id that no longer exists.

use thiserror::Error;
use uuid::Uuid;

/// Errors returned by the scan entry points
#[derive(Debug, Error)]
pub enum ScanError {
    /// A full scan is already running; scans are single-flight
    #[error("a scan is already in progress")]
    AlreadyRunning,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors returned by conflict operations
#[derive(Debug, Error)]
pub enum ConflictError {
    /// Resolving or deleting a conflict id that does not exist
    #[error("conflict {0} not found")]
    NotFound(Uuid),

    /// The selected candidate id is not among the conflict's possible matches
    #[error("candidate {candidate_id} is not a possible match for conflict {conflict_id}")]
    InvalidCandidate { conflict_id: Uuid, candidate_id: i64 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
