//! Movie database repository

use anyhow::Result;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// File-binding fields shared by movie and episode records
///
/// These are the attributes sourced from the physical file, as opposed to
/// the descriptive metadata sourced from TMDB. Re-scans refresh only these.
#[derive(Debug, Clone, Default)]
pub struct FileBinding {
    pub file_path: String,
    pub file_name: String,
    pub resolution: Option<String>,
    pub quality: Option<String>,
    pub rip: Option<String>,
    pub sound: Option<String>,
    pub provider: Option<String>,
}

/// Movie record from database
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MovieRecord {
    pub id: Uuid,
    pub tmdb_id: i64,
    pub title: String,
    pub year: Option<i32>,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub genres: Vec<String>,
    pub runtime: Option<i32>,
    pub rating: Option<f64>,
    pub release_date: Option<chrono::NaiveDate>,
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

/// Input for creating a movie
#[derive(Debug, Clone)]
pub struct CreateMovie {
    pub tmdb_id: i64,
    pub title: String,
    pub year: Option<i32>,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub genres: Vec<String>,
    pub runtime: Option<i32>,
    pub rating: Option<f64>,
    pub release_date: Option<chrono::NaiveDate>,
    pub binding: FileBinding,
}

const MOVIE_COLUMNS: &str = r#"id, tmdb_id, title, year, overview, poster_url, backdrop_url,
       genres, runtime, rating, release_date,
       file_path, file_name, resolution, quality, rip, sound, provider,
       created_at, updated_at"#;

pub struct MovieRepository {
    pool: PgPool,
}

impl MovieRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List all movies
    pub async fn list(&self) -> Result<Vec<MovieRecord>> {
        let records = sqlx::query_as::<_, MovieRecord>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies ORDER BY title"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Get a movie by ID
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<MovieRecord>> {
        let record = sqlx::query_as::<_, MovieRecord>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Get a movie by its TMDB id (the de-duplication key)
    pub async fn get_by_tmdb_id(&self, tmdb_id: i64) -> Result<Option<MovieRecord>> {
        let record = sqlx::query_as::<_, MovieRecord>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies WHERE tmdb_id = $1"
        ))
        .bind(tmdb_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Find a movie by the absolute path of its bound file
    pub async fn find_by_path(&self, file_path: &str) -> Result<Option<MovieRecord>> {
        let record = sqlx::query_as::<_, MovieRecord>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies WHERE file_path = $1"
        ))
        .bind(file_path)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Find a movie by bound file name
    pub async fn find_by_file_name(&self, file_name: &str) -> Result<Option<MovieRecord>> {
        let record = sqlx::query_as::<_, MovieRecord>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies WHERE file_name = $1 LIMIT 1"
        ))
        .bind(file_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Find a movie by title and optional year
    ///
    /// Matching logic:
    /// 1. If year is provided, prefer an exact year match, then widen to ±1
    ///    (metadata years sometimes differ from release-name years)
    /// 2. Fall back to normalized-title-only matching
    pub async fn find_by_title_year(
        &self,
        title: &str,
        year: Option<i32>,
    ) -> Result<Option<MovieRecord>> {
        let normalized = normalize_title(title);

        let norm = normalized_title_sql("title");

        if let Some(y) = year {
            let record = sqlx::query_as::<_, MovieRecord>(&format!(
                r#"
                SELECT {MOVIE_COLUMNS} FROM movies
                WHERE year BETWEEN $1 AND $2
                  AND {norm} = $3
                ORDER BY ABS(year - $4)
                LIMIT 1
                "#
            ))
            .bind(y - 1)
            .bind(y + 1)
            .bind(&normalized)
            .bind(y)
            .fetch_optional(&self.pool)
            .await?;

            if record.is_some() {
                return Ok(record);
            }
        }

        let record = sqlx::query_as::<_, MovieRecord>(&format!(
            r#"
            SELECT {MOVIE_COLUMNS} FROM movies
            WHERE {norm} = $1
            LIMIT 1
            "#
        ))
        .bind(&normalized)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Create a new movie
    pub async fn create(&self, input: CreateMovie) -> Result<MovieRecord> {
        let record = sqlx::query_as::<_, MovieRecord>(&format!(
            r#"
            INSERT INTO movies (
                tmdb_id, title, year, overview, poster_url, backdrop_url,
                genres, runtime, rating, release_date,
                file_path, file_name, resolution, quality, rip, sound, provider
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {MOVIE_COLUMNS}
            "#
        ))
        .bind(input.tmdb_id)
        .bind(&input.title)
        .bind(input.year)
        .bind(&input.overview)
        .bind(&input.poster_url)
        .bind(&input.backdrop_url)
        .bind(&input.genres)
        .bind(input.runtime)
        .bind(input.rating)
        .bind(input.release_date)
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

    /// Refresh only the file-binding fields of an existing movie
    ///
    /// Descriptive metadata is canonical once created and is not touched.
    pub async fn update_binding(&self, id: Uuid, binding: &FileBinding) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE movies SET
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

    /// Delete a movie
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Normalize a title for comparison
/// - Lowercase
/// - Remove apostrophes (straight and curly) and colons
/// - Collapse whitespace
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .replace(['\'', '\u{2019}', ':'], "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// SQL expression that normalizes `column` the same way `normalize_title`
/// normalizes its Rust-side argument. The two must stay in lockstep or
/// fuzzy title lookups silently stop matching.
pub(crate) fn normalized_title_sql(column: &str) -> String {
    format!(
        r#"LOWER(TRIM(REGEXP_REPLACE(TRANSLATE({column}, '''{curly}:', ''), '\s+', ' ', 'g')))"#,
        curly = '\u{2019}',
    )
}
