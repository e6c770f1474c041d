//! Episode database repository
//!
//! Episodes are unique on (tmdb_id, season_number, episode_number). The
//! episode's own TMDB id is distinct from the parent series' id; the triple
//! is the de-duplication key used by the scanner's create-or-update path.

use anyhow::Result;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::movies::{normalize_title, normalized_title_sql, FileBinding};

/// Episode record from database
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct EpisodeRecord {
    pub id: Uuid,
    pub series_id: Uuid,
    pub tmdb_id: i64,
    pub season_number: i32,
    pub episode_number: i32,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub air_date: Option<chrono::NaiveDate>,
    pub monitored: bool,
    // File binding
    pub file_path: String,
    pub file_name: String,
    pub resolution: Option<String>,
    pub quality: Option<String>,
    pub rip: Option<String>,
    pub sound: Option<String>,
    pub provider: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Input for creating an episode
#[derive(Debug, Clone)]
pub struct CreateEpisode {
    pub series_id: Uuid,
    pub tmdb_id: i64,
    pub season_number: i32,
    pub episode_number: i32,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub air_date: Option<chrono::NaiveDate>,
    pub binding: FileBinding,
}

const EPISODE_COLUMNS: &str = r#"id, series_id, tmdb_id, season_number, episode_number,
       title, overview, air_date, monitored,
       file_path, file_name, resolution, quality, rip, sound, provider,
       created_at, updated_at"#;

pub struct EpisodeRepository {
    pool: PgPool,
}

impl EpisodeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List all episodes
    pub async fn list(&self) -> Result<Vec<EpisodeRecord>> {
        let records = sqlx::query_as::<_, EpisodeRecord>(&format!(
            "SELECT {EPISODE_COLUMNS} FROM episodes ORDER BY series_id, season_number, episode_number"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Find an episode by the absolute path of its bound file
    pub async fn find_by_path(&self, file_path: &str) -> Result<Option<EpisodeRecord>> {
        let record = sqlx::query_as::<_, EpisodeRecord>(&format!(
            "SELECT {EPISODE_COLUMNS} FROM episodes WHERE file_path = $1"
        ))
        .bind(file_path)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Find an episode by bound file name
    pub async fn find_by_file_name(&self, file_name: &str) -> Result<Option<EpisodeRecord>> {
        let record = sqlx::query_as::<_, EpisodeRecord>(&format!(
            "SELECT {EPISODE_COLUMNS} FROM episodes WHERE file_name = $1 LIMIT 1"
        ))
        .bind(file_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Find an episode by parent series title plus season/episode numbers
    pub async fn find_by_series_title(
        &self,
        series_title: &str,
        season: i32,
        episode: i32,
    ) -> Result<Option<EpisodeRecord>> {
        let normalized = normalize_title(series_title);
        let norm = normalized_title_sql("s.title");
        let record = sqlx::query_as::<_, EpisodeRecord>(&format!(
            r#"
            SELECT e.id, e.series_id, e.tmdb_id, e.season_number, e.episode_number,
                   e.title, e.overview, e.air_date, e.monitored,
                   e.file_path, e.file_name, e.resolution, e.quality, e.rip, e.sound, e.provider,
                   e.created_at, e.updated_at
            FROM episodes e
            JOIN series s ON s.id = e.series_id
            WHERE {norm} = $1
              AND e.season_number = $2 AND e.episode_number = $3
            LIMIT 1
            "#
        ))
        .bind(&normalized)
        .bind(season)
        .bind(episode)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Get an episode by its de-duplication key
    pub async fn get_by_key(
        &self,
        tmdb_id: i64,
        season: i32,
        episode: i32,
    ) -> Result<Option<EpisodeRecord>> {
        let record = sqlx::query_as::<_, EpisodeRecord>(&format!(
            r#"
            SELECT {EPISODE_COLUMNS} FROM episodes
            WHERE tmdb_id = $1 AND season_number = $2 AND episode_number = $3
            "#
        ))
        .bind(tmdb_id)
        .bind(season)
        .bind(episode)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Create a new episode
    pub async fn create(&self, input: CreateEpisode) -> Result<EpisodeRecord> {
        let record = sqlx::query_as::<_, EpisodeRecord>(&format!(
            r#"
            INSERT INTO episodes (
                series_id, tmdb_id, season_number, episode_number,
                title, overview, air_date,
                file_path, file_name, resolution, quality, rip, sound, provider
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {EPISODE_COLUMNS}
            "#
        ))
        .bind(input.series_id)
        .bind(input.tmdb_id)
        .bind(input.season_number)
        .bind(input.episode_number)
        .bind(&input.title)
        .bind(&input.overview)
        .bind(input.air_date)
        .bind(&input.binding.file_path)
        .bind(&input.binding.file_name)
        .bind(&input.binding.resolution)
        .bind(&input.binding.quality)
        .bind(&input.binding.rip)
        .bind(&input.binding.sound)
        .bind(&input.binding.provider)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    /// Refresh only the file-binding fields of an existing episode
    pub async fn update_binding(&self, id: Uuid, binding: &FileBinding) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE episodes SET
                file_path = $2, file_name = $3, resolution = $4,
                quality = $5, rip = $6, sound = $7, provider = $8,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&binding.file_path)
        .bind(&binding.file_name)
        .bind(&binding.resolution)
        .bind(&binding.quality)
        .bind(&binding.rip)
        .bind(&binding.sound)
        .bind(&binding.provider)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete an episode
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM episodes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
