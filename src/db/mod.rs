//! Database connection and operations

pub mod conflicts;
pub mod episodes;
pub mod folders;
pub mod movies;
pub mod series;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

pub use conflicts::{ConflictRepository, MatchCandidate, ScanningConflictRecord, UpsertConflict};
pub use episodes::{CreateEpisode, EpisodeRecord, EpisodeRepository};
pub use folders::{CreateMediaFolder, FolderRepository, MediaFolderRecord, UpdateMediaFolder};
pub use movies::{CreateMovie, FileBinding, MovieRecord, MovieRepository};
pub use series::{CreateSeries, SeriesRecord, SeriesRepository};

use crate::services::scanner::CatalogStore;

/// Database wrapper providing connection pool access
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database wrapper from an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new database connection pool
    pub async fn connect(url: &str) -> Result<Self> {
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        Ok(Self { pool })
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get a folder repository
    pub fn folders(&self) -> FolderRepository {
        FolderRepository::new(self.pool.clone())
    }

    /// Get a movie repository
    pub fn movies(&self) -> MovieRepository {
        MovieRepository::new(self.pool.clone())
    }

    /// Get a series repository
    pub fn series(&self) -> SeriesRepository {
        SeriesRepository::new(self.pool.clone())
    }

    /// Get an episode repository
    pub fn episodes(&self) -> EpisodeRepository {
        EpisodeRepository::new(self.pool.clone())
    }

    /// Get a conflict repository
    pub fn conflicts(&self) -> ConflictRepository {
        ConflictRepository::new(self.pool.clone())
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// The scanner's catalog contract, backed by the real database
#[async_trait]
impl CatalogStore for Database {
    async fn list_active_folders(&self) -> Result<Vec<MediaFolderRecord>> {
        self.folders().list_active().await
    }

    async fn find_movie_by_path(&self, file_path: &str) -> Result<Option<MovieRecord>> {
        self.movies().find_by_path(file_path).await
    }

    async fn find_movie_by_file_name(&self, file_name: &str) -> Result<Option<MovieRecord>> {
        self.movies().find_by_file_name(file_name).await
    }

    async fn find_movie_by_title_year(
        &self,
        title: &str,
        year: Option<i32>,
    ) -> Result<Option<MovieRecord>> {
        self.movies().find_by_title_year(title, year).await
    }

    async fn get_movie_by_tmdb_id(&self, tmdb_id: i64) -> Result<Option<MovieRecord>> {
        self.movies().get_by_tmdb_id(tmdb_id).await
    }

    async fn create_movie(&self, input: CreateMovie) -> Result<MovieRecord> {
        self.movies().create(input).await
    }

    async fn update_movie_binding(&self, id: Uuid, binding: &FileBinding) -> Result<()> {
        self.movies().update_binding(id, binding).await
    }

    async fn list_movies(&self) -> Result<Vec<MovieRecord>> {
        self.movies().list().await
    }

    async fn delete_movie(&self, id: Uuid) -> Result<bool> {
        self.movies().delete(id).await
    }

    async fn get_series_by_tmdb_id(&self, tmdb_id: i64) -> Result<Option<SeriesRecord>> {
        self.series().get_by_tmdb_id(tmdb_id).await
    }

    async fn find_series_by_title(&self, title: &str) -> Result<Option<SeriesRecord>> {
        self.series().find_by_title(title).await
    }

    async fn create_series(&self, input: CreateSeries) -> Result<SeriesRecord> {
        self.series().create(input).await
    }

    async fn list_series_without_episodes(&self) -> Result<Vec<SeriesRecord>> {
        self.series().list_without_episodes().await
    }

    async fn delete_series(&self, id: Uuid) -> Result<bool> {
        self.series().delete(id).await
    }

    async fn find_episode_by_path(&self, file_path: &str) -> Result<Option<EpisodeRecord>> {
        self.episodes().find_by_path(file_path).await
    }

    async fn find_episode_by_file_name(&self, file_name: &str) -> Result<Option<EpisodeRecord>> {
        self.episodes().find_by_file_name(file_name).await
    }

    async fn find_episode_by_series_title(
        &self,
        series_title: &str,
        season: i32,
        episode: i32,
    ) -> Result<Option<EpisodeRecord>> {
        self.episodes()
            .find_by_series_title(series_title, season, episode)
            .await
    }

    async fn get_episode_by_key(
        &self,
        tmdb_id: i64,
        season: i32,
        episode: i32,
    ) -> Result<Option<EpisodeRecord>> {
        self.episodes().get_by_key(tmdb_id, season, episode).await
    }

    async fn create_episode(&self, input: CreateEpisode) -> Result<EpisodeRecord> {
        self.episodes().create(input).await
    }

    async fn update_episode_binding(&self, id: Uuid, binding: &FileBinding) -> Result<()> {
        self.episodes().update_binding(id, binding).await
    }

    async fn list_episodes(&self) -> Result<Vec<EpisodeRecord>> {
        self.episodes().list().await
    }

    async fn delete_episode(&self, id: Uuid) -> Result<bool> {
        self.episodes().delete(id).await
    }

    async fn upsert_conflict(&self, input: UpsertConflict) -> Result<ScanningConflictRecord> {
        self.conflicts().upsert_by_path(input).await
    }

    async fn get_conflict(&self, id: Uuid) -> Result<Option<ScanningConflictRecord>> {
        self.conflicts().get_by_id(id).await
    }

    async fn list_unresolved_conflicts(&self) -> Result<Vec<ScanningConflictRecord>> {
        self.conflicts().list_unresolved().await
    }

    async fn mark_conflict_resolved(&self, id: Uuid, selected_tmdb_id: i64) -> Result<bool> {
        self.conflicts().mark_resolved(id, selected_tmdb_id).await
    }

    async fn delete_conflict(&self, id: Uuid) -> Result<bool> {
        self.conflicts().delete(id).await
    }

    async fn delete_resolved_conflicts(&self) -> Result<u64> {
        self.conflicts().delete_resolved().await
    }

    async fn delete_unresolved_conflicts(&self) -> Result<u64> {
        self.conflicts().delete_unresolved().await
    }
}
