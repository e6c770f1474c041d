//! Series database repository

use anyhow::Result;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::movies::{normalize_title, normalized_title_sql};

/// Series record from database
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SeriesRecord {
    pub id: Uuid,
    pub tmdb_id: i64,
    pub title: String,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub genres: Vec<String>,
    pub first_air_date: Option<chrono::NaiveDate>,
    pub last_air_date: Option<chrono::NaiveDate>,
    pub status: Option<String>,
    pub monitored: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Input for creating a series
#[derive(Debug, Clone)]
pub struct CreateSeries {
    pub tmdb_id: i64,
    pub title: String,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub genres: Vec<String>,
    pub first_air_date: Option<chrono::NaiveDate>,
    pub last_air_date: Option<chrono::NaiveDate>,
    pub status: Option<String>,
}

const SERIES_COLUMNS: &str = r#"id, tmdb_id, title, overview, poster_url, backdrop_url,
       genres, first_air_date, last_air_date, status, monitored,
       created_at, updated_at"#;

pub struct SeriesRepository {
    pool: PgPool,
}

impl SeriesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List all series
    pub async fn list(&self) -> Result<Vec<SeriesRecord>> {
        let records = sqlx::query_as::<_, SeriesRecord>(&format!(
            "SELECT {SERIES_COLUMNS} FROM series ORDER BY title"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Get a series by ID
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<SeriesRecord>> {
        let record = sqlx::query_as::<_, SeriesRecord>(&format!(
            "SELECT {SERIES_COLUMNS} FROM series WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Get a series by its TMDB id (the de-duplication key)
    pub async fn get_by_tmdb_id(&self, tmdb_id: i64) -> Result<Option<SeriesRecord>> {
        let record = sqlx::query_as::<_, SeriesRecord>(&format!(
            "SELECT {SERIES_COLUMNS} FROM series WHERE tmdb_id = $1"
        ))
        .bind(tmdb_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Find a series by normalized title
    pub async fn find_by_title(&self, title: &str) -> Result<Option<SeriesRecord>> {
        let normalized = normalize_title(title);
        let norm = normalized_title_sql("title");
        let record = sqlx::query_as::<_, SeriesRecord>(&format!(
            r#"
            SELECT {SERIES_COLUMNS} FROM series
            WHERE {norm} = $1
            LIMIT 1
            "#
        ))
        .bind(&normalized)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Create a new series
    pub async fn create(&self, input: CreateSeries) -> Result<SeriesRecord> {
        let record = sqlx::query_as::<_, SeriesRecord>(&format!(
            r#"
            INSERT INTO series (
                tmdb_id, title, overview, poster_url, backdrop_url,
                genres, first_air_date, last_air_date, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {SERIES_COLUMNS}
            "#
        ))
        .bind(input.tmdb_id)
        .bind(&input.title)
        .bind(&input.overview)
        .bind(&input.poster_url)
        .bind(&input.backdrop_url)
        .bind(&input.genres)
        .bind(input.first_air_date)
        .bind(input.last_air_date)
        .bind(&input.status)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    /// List series that no longer have any episodes (cascade candidates)
    pub async fn list_without_episodes(&self) -> Result<Vec<SeriesRecord>> {
        let records = sqlx::query_as::<_, SeriesRecord>(&format!(
            r#"
            SELECT {SERIES_COLUMNS} FROM series s
            WHERE NOT EXISTS (SELECT 1 FROM episodes e WHERE e.series_id = s.id)
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Flip the monitored flag on a series and all of its episodes
    ///
    /// Runs in a single transaction: either both tables update or neither.
    pub async fn set_monitored(&self, id: Uuid, monitored: bool) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE series SET monitored = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(monitored)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("UPDATE episodes SET monitored = $2, updated_at = NOW() WHERE series_id = $1")
            .bind(id)
            .bind(monitored)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Delete a series
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM series WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
