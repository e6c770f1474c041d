//! Media folder database repository
//!
//! Folders are the configured scan roots. Deactivating a folder excludes it
//! from scans without deleting anything the folder already contributed.

use anyhow::Result;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Media folder record from database
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MediaFolderRecord {
    pub id: Uuid,
    pub path: String,
    /// "movie" or "series"
    pub media_kind: String,
    pub active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Input for creating a media folder
#[derive(Debug)]
pub struct CreateMediaFolder {
    pub path: String,
    pub media_kind: String,
    pub active: bool,
}

/// Input for updating a media folder
#[derive(Debug, Default)]
pub struct UpdateMediaFolder {
    pub path: Option<String>,
    pub media_kind: Option<String>,
    pub active: Option<bool>,
}

pub struct FolderRepository {
    pool: PgPool,
}

impl FolderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List all folders
    pub async fn list(&self) -> Result<Vec<MediaFolderRecord>> {
        let records = sqlx::query_as::<_, MediaFolderRecord>(
            "SELECT id, path, media_kind, active, created_at, updated_at FROM media_folders ORDER BY path",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// List active folders only (the set every scan reads)
    pub async fn list_active(&self) -> Result<Vec<MediaFolderRecord>> {
        let records = sqlx::query_as::<_, MediaFolderRecord>(
            r#"
            SELECT id, path, media_kind, active, created_at, updated_at
            FROM media_folders
            WHERE active = true
            ORDER BY path
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Get a folder by ID
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<MediaFolderRecord>> {
        let record = sqlx::query_as::<_, MediaFolderRecord>(
            "SELECT id, path, media_kind, active, created_at, updated_at FROM media_folders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Create a new folder
    pub async fn create(&self, input: CreateMediaFolder) -> Result<MediaFolderRecord> {
        let record = sqlx::query_as::<_, MediaFolderRecord>(
            r#"
            INSERT INTO media_folders (path, media_kind, active)
            VALUES ($1, $2, $3)
            RETURNING id, path, media_kind, active, created_at, updated_at
            "#,
        )
        .bind(&input.path)
        .bind(&input.media_kind)
        .bind(input.active)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    /// Update a folder
    pub async fn update(&self, id: Uuid, input: UpdateMediaFolder) -> Result<Option<MediaFolderRecord>> {
        let record = sqlx::query_as::<_, MediaFolderRecord>(
            r#"
            UPDATE media_folders SET
                path = COALESCE($2, path),
                media_kind = COALESCE($3, media_kind),
                active = COALESCE($4, active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, path, media_kind, active, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&input.path)
        .bind(&input.media_kind)
        .bind(input.active)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Delete a folder
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM media_folders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
