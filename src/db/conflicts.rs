//! Scanning conflict database repository
//!
//! Conflicts are deferred decision points: a file the scanner could not
//! confidently match. They are keyed by file_path so re-encountering the
//! same file refreshes the existing row instead of duplicating it.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// A raw metadata candidate attached to a conflict for later disambiguation
///
/// Stored as JSONB but always typed at the edges; kind-specific fields are
/// optional (runtime/rating for movies, air dates/status for series).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchCandidate {
    pub tmdb_id: i64,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub genres: Vec<String>,
    pub year: Option<i32>,
    pub rating: Option<f64>,
    pub runtime: Option<i32>,
    pub first_air_date: Option<String>,
    pub last_air_date: Option<String>,
    pub status: Option<String>,
}

/// Scanning conflict record from database
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ScanningConflictRecord {
    pub id: Uuid,
    pub file_name: String,
    pub file_path: String,
    /// "movie" or "series"
    pub media_kind: String,
    pub possible_matches: Json<Vec<MatchCandidate>>,
    pub resolved: bool,
    pub selected_tmdb_id: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Input for recording a conflict
#[derive(Debug, Clone)]
pub struct UpsertConflict {
    pub file_name: String,
    pub file_path: String,
    pub media_kind: String,
    pub possible_matches: Vec<MatchCandidate>,
}

const CONFLICT_COLUMNS: &str = r#"id, file_name, file_path, media_kind, possible_matches,
       resolved, selected_tmdb_id, created_at, updated_at"#;

pub struct ConflictRepository {
    pool: PgPool,
}

impl ConflictRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List all conflicts
    pub async fn list(&self) -> Result<Vec<ScanningConflictRecord>> {
        let records = sqlx::query_as::<_, ScanningConflictRecord>(&format!(
            "SELECT {CONFLICT_COLUMNS} FROM scanning_conflicts ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// List unresolved conflicts (the set awaiting a decision)
    pub async fn list_unresolved(&self) -> Result<Vec<ScanningConflictRecord>> {
        let records = sqlx::query_as::<_, ScanningConflictRecord>(&format!(
            r#"
            SELECT {CONFLICT_COLUMNS} FROM scanning_conflicts
            WHERE resolved = false
            ORDER BY created_at DESC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Get a conflict by ID
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<ScanningConflictRecord>> {
        let record = sqlx::query_as::<_, ScanningConflictRecord>(&format!(
            "SELECT {CONFLICT_COLUMNS} FROM scanning_conflicts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Create or refresh a conflict, keyed by file_path
    ///
    /// A resurfacing path re-opens the conflict: resolved drops back to
    /// false, the previous selection is cleared, and the candidate list is
    /// replaced by the latest set.
    pub async fn upsert_by_path(&self, input: UpsertConflict) -> Result<ScanningConflictRecord> {
        let record = sqlx::query_as::<_, ScanningConflictRecord>(&format!(
            r#"
            INSERT INTO scanning_conflicts (file_name, file_path, media_kind, possible_matches)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (file_path) DO UPDATE SET
                file_name = EXCLUDED.file_name,
                media_kind = EXCLUDED.media_kind,
                possible_matches = EXCLUDED.possible_matches,
                resolved = false,
                selected_tmdb_id = NULL,
                updated_at = NOW()
            RETURNING {CONFLICT_COLUMNS}
            "#
        ))
        .bind(&input.file_name)
        .bind(&input.file_path)
        .bind(&input.media_kind)
        .bind(Json(&input.possible_matches))
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    /// Mark a conflict resolved with the chosen candidate
    pub async fn mark_resolved(&self, id: Uuid, selected_tmdb_id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE scanning_conflicts
            SET resolved = true, selected_tmdb_id = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(selected_tmdb_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a conflict
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM scanning_conflicts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete all resolved conflicts (post-scan cleanup)
    pub async fn delete_resolved(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM scanning_conflicts WHERE resolved = true")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Delete all unresolved conflicts
    pub async fn delete_unresolved(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM scanning_conflicts WHERE resolved = false")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
