//! End-to-end scan pipeline tests
//!
//! Drive the scanner and conflict services against an in-memory catalog, a
//! canned metadata resolver, and real temp directories, covering the
//! create/rebind/conflict/remove reconciliation paths.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use assert_matches::assert_matches;
use async_trait::async_trait;
use sqlx::types::Json;
use uuid::Uuid;

use reelvault::db::movies::normalize_title;
use reelvault::db::{
    CreateEpisode, CreateMovie, CreateSeries, EpisodeRecord, FileBinding, MatchCandidate,
    MediaFolderRecord, MovieRecord, ScanningConflictRecord, SeriesRecord, UpsertConflict,
};
use reelvault::error::ConflictError;
use reelvault::services::scanner::{
    CatalogStore, EpisodeDetails, MetadataResolver, MovieDetails, SeriesDetails,
};
use reelvault::services::{
    ConflictService, NullSink, ProgressSink, ScanProgress, ScanStatus, ScannerService,
};

// ---------------------------------------------------------------------------
// In-memory catalog
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeStore {
    folders: Mutex<Vec<MediaFolderRecord>>,
    movies: Mutex<Vec<MovieRecord>>,
    series: Mutex<Vec<SeriesRecord>>,
    episodes: Mutex<Vec<EpisodeRecord>>,
    conflicts: Mutex<Vec<ScanningConflictRecord>>,
    /// Mutating calls that changed something
    writes: AtomicU32,
}

impl FakeStore {
    fn wrote(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    fn write_count(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }

    fn add_folder(&self, path: &str, media_kind: &str) {
        self.folders.lock().unwrap().push(MediaFolderRecord {
            id: Uuid::new_v4(),
            path: path.to_string(),
            media_kind: media_kind.to_string(),
            active: true,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        });
    }

    fn add_movie(&self, tmdb_id: i64, title: &str, file_path: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.movies.lock().unwrap().push(MovieRecord {
            id,
            tmdb_id,
            title: title.to_string(),
            year: None,
            overview: None,
            poster_url: None,
            backdrop_url: None,
            genres: Vec::new(),
            runtime: None,
            rating: None,
            release_date: None,
            file_path: file_path.to_string(),
            file_name: Path::new(file_path)
                .file_name()
                .unwrap()
                .to_string_lossy()
                .to_string(),
            resolution: None,
            quality: None,
            rip: None,
            sound: None,
            provider: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        });
        id
    }

    fn add_series(&self, tmdb_id: i64, title: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.series.lock().unwrap().push(SeriesRecord {
            id,
            tmdb_id,
            title: title.to_string(),
            overview: None,
            poster_url: None,
            backdrop_url: None,
            genres: Vec::new(),
            first_air_date: None,
            last_air_date: None,
            status: None,
            monitored: true,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        });
        id
    }

    fn add_episode(&self, series_id: Uuid, tmdb_id: i64, season: i32, episode: i32, file_path: &str) {
        self.episodes.lock().unwrap().push(EpisodeRecord {
            id: Uuid::new_v4(),
            series_id,
            tmdb_id,
            season_number: season,
            episode_number: episode,
            title: None,
            overview: None,
            air_date: None,
            monitored: true,
            file_path: file_path.to_string(),
            file_name: Path::new(file_path)
                .file_name()
                .unwrap()
                .to_string_lossy()
                .to_string(),
            resolution: None,
            quality: None,
            rip: None,
            sound: None,
            provider: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        });
    }
}

fn apply_binding_movie(movie: &mut MovieRecord, binding: &FileBinding) {
    movie.file_path = binding.file_path.clone();
    movie.file_name = binding.file_name.clone();
    movie.resolution = binding.resolution.clone();
    movie.quality = binding.quality.clone();
    movie.rip = binding.rip.clone();
    movie.sound = binding.sound.clone();
    movie.provider = binding.provider.clone();
}

fn apply_binding_episode(episode: &mut EpisodeRecord, binding: &FileBinding) {
    episode.file_path = binding.file_path.clone();
    episode.file_name = binding.file_name.clone();
    episode.resolution = binding.resolution.clone();
    episode.quality = binding.quality.clone();
    episode.rip = binding.rip.clone();
    episode.sound = binding.sound.clone();
    episode.provider = binding.provider.clone();
}

#[async_trait]
impl CatalogStore for FakeStore {
    async fn list_active_folders(&self) -> Result<Vec<MediaFolderRecord>> {
        Ok(self
            .folders
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.active)
            .cloned()
            .collect())
    }

    async fn find_movie_by_path(&self, file_path: &str) -> Result<Option<MovieRecord>> {
        Ok(self
            .movies
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.file_path == file_path)
            .cloned())
    }

    async fn find_movie_by_file_name(&self, file_name: &str) -> Result<Option<MovieRecord>> {
        Ok(self
            .movies
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.file_name == file_name)
            .cloned())
    }

    async fn find_movie_by_title_year(
        &self,
        title: &str,
        year: Option<i32>,
    ) -> Result<Option<MovieRecord>> {
        let normalized = normalize_title(title);
        Ok(self
            .movies
            .lock()
            .unwrap()
            .iter()
            .find(|m| {
                normalize_title(&m.title) == normalized
                    && match (m.year, year) {
                        (Some(a), Some(b)) => (a - b).abs() <= 1,
                        _ => true,
                    }
            })
            .cloned())
    }

    async fn get_movie_by_tmdb_id(&self, tmdb_id: i64) -> Result<Option<MovieRecord>> {
        Ok(self
            .movies
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.tmdb_id == tmdb_id)
            .cloned())
    }

    async fn create_movie(&self, input: CreateMovie) -> Result<MovieRecord> {
        let record = MovieRecord {
            id: Uuid::new_v4(),
            tmdb_id: input.tmdb_id,
            title: input.title,
            year: input.year,
            overview: input.overview,
            poster_url: input.poster_url,
            backdrop_url: input.backdrop_url,
            genres: input.genres,
            runtime: input.runtime,
            rating: input.rating,
            release_date: input.release_date,
            file_path: input.binding.file_path,
            file_name: input.binding.file_name,
            resolution: input.binding.resolution,
            quality: input.binding.quality,
            rip: input.binding.rip,
            sound: input.binding.sound,
            provider: input.binding.provider,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        self.movies.lock().unwrap().push(record.clone());
        self.wrote();
        Ok(record)
    }

    async fn update_movie_binding(&self, id: Uuid, binding: &FileBinding) -> Result<()> {
        let mut movies = self.movies.lock().unwrap();
        if let Some(movie) = movies.iter_mut().find(|m| m.id == id) {
            apply_binding_movie(movie, binding);
            self.wrote();
        }
        Ok(())
    }

    async fn list_movies(&self) -> Result<Vec<MovieRecord>> {
        Ok(self.movies.lock().unwrap().clone())
    }

    async fn delete_movie(&self, id: Uuid) -> Result<bool> {
        let mut movies = self.movies.lock().unwrap();
        let before = movies.len();
        movies.retain(|m| m.id != id);
        let deleted = movies.len() < before;
        if deleted {
            self.wrote();
        }
        Ok(deleted)
    }

    async fn get_series_by_tmdb_id(&self, tmdb_id: i64) -> Result<Option<SeriesRecord>> {
        Ok(self
            .series
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.tmdb_id == tmdb_id)
            .cloned())
    }

    async fn find_series_by_title(&self, title: &str) -> Result<Option<SeriesRecord>> {
        let normalized = normalize_title(title);
        Ok(self
            .series
            .lock()
            .unwrap()
            .iter()
            .find(|s| normalize_title(&s.title) == normalized)
            .cloned())
    }

    async fn create_series(&self, input: CreateSeries) -> Result<SeriesRecord> {
        let record = SeriesRecord {
            id: Uuid::new_v4(),
            tmdb_id: input.tmdb_id,
            title: input.title,
            overview: input.overview,
            poster_url: input.poster_url,
            backdrop_url: input.backdrop_url,
            genres: input.genres,
            first_air_date: input.first_air_date,
            last_air_date: input.last_air_date,
            status: input.status,
            monitored: true,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        self.series.lock().unwrap().push(record.clone());
        self.wrote();
        Ok(record)
    }

    async fn list_series_without_episodes(&self) -> Result<Vec<SeriesRecord>> {
        let episodes = self.episodes.lock().unwrap();
        Ok(self
            .series
            .lock()
            .unwrap()
            .iter()
            .filter(|s| !episodes.iter().any(|e| e.series_id == s.id))
            .cloned()
            .collect())
    }

    async fn delete_series(&self, id: Uuid) -> Result<bool> {
        let mut series = self.series.lock().unwrap();
        let before = series.len();
        series.retain(|s| s.id != id);
        let deleted = series.len() < before;
        if deleted {
            self.wrote();
        }
        Ok(deleted)
    }

    async fn find_episode_by_path(&self, file_path: &str) -> Result<Option<EpisodeRecord>> {
        Ok(self
            .episodes
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.file_path == file_path)
            .cloned())
    }

    async fn find_episode_by_file_name(&self, file_name: &str) -> Result<Option<EpisodeRecord>> {
        Ok(self
            .episodes
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.file_name == file_name)
            .cloned())
    }

    async fn find_episode_by_series_title(
        &self,
        series_title: &str,
        season: i32,
        episode: i32,
    ) -> Result<Option<EpisodeRecord>> {
        let normalized = normalize_title(series_title);
        let series = self.series.lock().unwrap();
        let matching: Vec<Uuid> = series
            .iter()
            .filter(|s| normalize_title(&s.title) == normalized)
            .map(|s| s.id)
            .collect();
        Ok(self
            .episodes
            .lock()
            .unwrap()
            .iter()
            .find(|e| {
                matching.contains(&e.series_id)
                    && e.season_number == season
                    && e.episode_number == episode
            })
            .cloned())
    }

    async fn get_episode_by_key(
        &self,
        tmdb_id: i64,
        season: i32,
        episode: i32,
    ) -> Result<Option<EpisodeRecord>> {
        Ok(self
            .episodes
            .lock()
            .unwrap()
            .iter()
            .find(|e| {
                e.tmdb_id == tmdb_id && e.season_number == season && e.episode_number == episode
            })
            .cloned())
    }

    async fn create_episode(&self, input: CreateEpisode) -> Result<EpisodeRecord> {
        let record = EpisodeRecord {
            id: Uuid::new_v4(),
            series_id: input.series_id,
            tmdb_id: input.tmdb_id,
            season_number: input.season_number,
            episode_number: input.episode_number,
            title: input.title,
            overview: input.overview,
            air_date: input.air_date,
            monitored: true,
            file_path: input.binding.file_path,
            file_name: input.binding.file_name,
            resolution: input.binding.resolution,
            quality: input.binding.quality,
            rip: input.binding.rip,
            sound: input.binding.sound,
            provider: input.binding.provider,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        self.episodes.lock().unwrap().push(record.clone());
        self.wrote();
        Ok(record)
    }

    async fn update_episode_binding(&self, id: Uuid, binding: &FileBinding) -> Result<()> {
        let mut episodes = self.episodes.lock().unwrap();
        if let Some(episode) = episodes.iter_mut().find(|e| e.id == id) {
            apply_binding_episode(episode, binding);
            self.wrote();
        }
        Ok(())
    }

    async fn list_episodes(&self) -> Result<Vec<EpisodeRecord>> {
        Ok(self.episodes.lock().unwrap().clone())
    }

    async fn delete_episode(&self, id: Uuid) -> Result<bool> {
        let mut episodes = self.episodes.lock().unwrap();
        let before = episodes.len();
        episodes.retain(|e| e.id != id);
        let deleted = episodes.len() < before;
        if deleted {
            self.wrote();
        }
        Ok(deleted)
    }

    async fn upsert_conflict(&self, input: UpsertConflict) -> Result<ScanningConflictRecord> {
        let mut conflicts = self.conflicts.lock().unwrap();
        self.wrote();

        if let Some(existing) = conflicts.iter_mut().find(|c| c.file_path == input.file_path) {
            existing.file_name = input.file_name;
            existing.media_kind = input.media_kind;
            existing.possible_matches = Json(input.possible_matches);
            existing.resolved = false;
            existing.selected_tmdb_id = None;
            existing.updated_at = chrono::Utc::now();
            return Ok(existing.clone());
        }

        let record = ScanningConflictRecord {
            id: Uuid::new_v4(),
            file_name: input.file_name,
            file_path: input.file_path,
            media_kind: input.media_kind,
            possible_matches: Json(input.possible_matches),
            resolved: false,
            selected_tmdb_id: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        conflicts.push(record.clone());
        Ok(record)
    }

    async fn get_conflict(&self, id: Uuid) -> Result<Option<ScanningConflictRecord>> {
        Ok(self
            .conflicts
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn list_unresolved_conflicts(&self) -> Result<Vec<ScanningConflictRecord>> {
        Ok(self
            .conflicts
            .lock()
            .unwrap()
            .iter()
            .filter(|c| !c.resolved)
            .cloned()
            .collect())
    }

    async fn mark_conflict_resolved(&self, id: Uuid, selected_tmdb_id: i64) -> Result<bool> {
        let mut conflicts = self.conflicts.lock().unwrap();
        if let Some(conflict) = conflicts.iter_mut().find(|c| c.id == id) {
            conflict.resolved = true;
            conflict.selected_tmdb_id = Some(selected_tmdb_id);
            self.wrote();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn delete_conflict(&self, id: Uuid) -> Result<bool> {
        let mut conflicts = self.conflicts.lock().unwrap();
        let before = conflicts.len();
        conflicts.retain(|c| c.id != id);
        let deleted = conflicts.len() < before;
        if deleted {
            self.wrote();
        }
        Ok(deleted)
    }

    async fn delete_resolved_conflicts(&self) -> Result<u64> {
        let mut conflicts = self.conflicts.lock().unwrap();
        let before = conflicts.len();
        conflicts.retain(|c| !c.resolved);
        let removed = (before - conflicts.len()) as u64;
        if removed > 0 {
            self.wrote();
        }
        Ok(removed)
    }

    async fn delete_unresolved_conflicts(&self) -> Result<u64> {
        let mut conflicts = self.conflicts.lock().unwrap();
        let before = conflicts.len();
        conflicts.retain(|c| c.resolved);
        let removed = (before - conflicts.len()) as u64;
        if removed > 0 {
            self.wrote();
        }
        Ok(removed)
    }
}

// ---------------------------------------------------------------------------
// Canned metadata resolver
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeResolver {
    movie_search: HashMap<String, Vec<MatchCandidate>>,
    movie_details: HashMap<i64, MovieDetails>,
    series_search: HashMap<String, Vec<MatchCandidate>>,
    series_details: HashMap<i64, SeriesDetails>,
    episodes: HashMap<(i64, i32, i32), EpisodeDetails>,
}

impl FakeResolver {
    fn with_movie(mut self, title: &str, tmdb_id: i64, year: i32) -> Self {
        self.movie_search
            .entry(title.to_lowercase())
            .or_default()
            .push(candidate(tmdb_id, title, Some(year)));
        self.movie_details.insert(
            tmdb_id,
            MovieDetails {
                tmdb_id,
                title: title.to_string(),
                year: Some(year),
                overview: Some("overview".to_string()),
                poster_url: None,
                backdrop_url: None,
                genres: vec!["Drama".to_string()],
                runtime: Some(120),
                rating: Some(8.0),
                release_date: None,
            },
        );
        self
    }

    fn with_series(mut self, name: &str, tmdb_id: i64) -> Self {
        self.series_search
            .entry(name.to_lowercase())
            .or_default()
            .push(candidate(tmdb_id, name, None));
        self.series_details.insert(
            tmdb_id,
            SeriesDetails {
                tmdb_id,
                title: name.to_string(),
                overview: None,
                poster_url: None,
                backdrop_url: None,
                genres: Vec::new(),
                first_air_date: None,
                last_air_date: None,
                status: Some("Returning Series".to_string()),
            },
        );
        self
    }

    fn with_ambiguous_series(mut self, name: &str, tmdb_ids: &[i64]) -> Self {
        let entry = self.series_search.entry(name.to_lowercase()).or_default();
        for id in tmdb_ids {
            entry.push(candidate(*id, name, None));
        }
        self
    }

    fn with_episode(mut self, series_tmdb_id: i64, season: i32, episode: i32, tmdb_id: i64) -> Self {
        self.episodes.insert(
            (series_tmdb_id, season, episode),
            EpisodeDetails {
                tmdb_id,
                title: Some(format!("Episode {episode}")),
                overview: None,
                air_date: None,
            },
        );
        self
    }
}

fn candidate(tmdb_id: i64, title: &str, year: Option<i32>) -> MatchCandidate {
    MatchCandidate {
        tmdb_id,
        title: title.to_string(),
        overview: None,
        poster_path: None,
        backdrop_path: None,
        genres: Vec::new(),
        year,
        rating: None,
        runtime: None,
        first_air_date: None,
        last_air_date: None,
        status: None,
    }
}

#[async_trait]
impl MetadataResolver for FakeResolver {
    async fn search_movies(&self, title: &str, year: Option<i32>) -> Result<Vec<MatchCandidate>> {
        let mut results = self
            .movie_search
            .get(&title.to_lowercase())
            .cloned()
            .unwrap_or_default();
        if let Some(y) = year {
            results.retain(|c| c.year == Some(y));
        }
        Ok(results)
    }

    async fn movie_details(&self, tmdb_id: i64) -> Result<Option<MovieDetails>> {
        Ok(self.movie_details.get(&tmdb_id).cloned())
    }

    async fn search_series(&self, name: &str) -> Result<Vec<MatchCandidate>> {
        Ok(self
            .series_search
            .get(&name.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }

    async fn series_details(&self, tmdb_id: i64) -> Result<Option<SeriesDetails>> {
        Ok(self.series_details.get(&tmdb_id).cloned())
    }

    async fn episode_details(
        &self,
        series_tmdb_id: i64,
        season: i32,
        episode: i32,
    ) -> Result<Option<EpisodeDetails>> {
        Ok(self.episodes.get(&(series_tmdb_id, season, episode)).cloned())
    }
}

// ---------------------------------------------------------------------------
// Progress capture
// ---------------------------------------------------------------------------

#[derive(Default)]
struct CaptureSink {
    events: Mutex<Vec<ScanProgress>>,
}

impl ProgressSink for CaptureSink {
    fn emit(&self, progress: ScanProgress) {
        self.events.lock().unwrap().push(progress);
    }
}

fn scanner_with(
    store: &Arc<FakeStore>,
    resolver: FakeResolver,
    sink: Arc<dyn ProgressSink>,
) -> ScannerService {
    ScannerService::new(store.clone(), Arc::new(resolver), sink)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn single_match_movie_is_created() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Inception (2010) [1080p].mkv"), b"").unwrap();

    let store = Arc::new(FakeStore::default());
    store.add_folder(dir.path().to_str().unwrap(), "movie");

    let resolver = FakeResolver::default().with_movie("Inception", 27205, 2010);
    let scanner = scanner_with(&store, resolver, Arc::new(NullSink));

    let summary = scanner.run_scan().await.unwrap();

    assert_eq!(summary.new_movies, 1);
    assert_eq!(summary.conflicts, 0);
    assert_eq!(summary.removed_movies, 0);

    let movies = store.movies.lock().unwrap();
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0].tmdb_id, 27205);
    assert_eq!(movies[0].title, "Inception");
    assert_eq!(movies[0].resolution.as_deref(), Some("1080p"));
}

#[tokio::test]
async fn single_match_series_creates_series_and_episode() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Severance S01E01.mkv"), b"").unwrap();

    let store = Arc::new(FakeStore::default());
    store.add_folder(dir.path().to_str().unwrap(), "series");

    let resolver = FakeResolver::default()
        .with_series("Severance", 95396)
        .with_episode(95396, 1, 1, 1001);
    let scanner = scanner_with(&store, resolver, Arc::new(NullSink));

    let summary = scanner.run_scan().await.unwrap();

    assert_eq!(summary.new_series, 1);
    assert_eq!(summary.new_episodes, 1);
    assert_eq!(store.series.lock().unwrap().len(), 1);
    assert_eq!(store.episodes.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn missing_episode_records_conflict_with_empty_candidates() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Severance S01E09.mkv"), b"").unwrap();

    let store = Arc::new(FakeStore::default());
    store.add_folder(dir.path().to_str().unwrap(), "series");

    // The series resolves but the resolver knows no S01E09.
    let resolver = FakeResolver::default().with_series("Severance", 95396);
    let scanner = scanner_with(&store, resolver, Arc::new(NullSink));

    let summary = scanner.run_scan().await.unwrap();

    assert_eq!(summary.conflicts, 1);
    let conflicts = store.conflicts.lock().unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].media_kind, "series");
    assert!(conflicts[0].possible_matches.0.is_empty());
    assert!(conflicts[0].file_path.ends_with("Severance S01E09.mkv"));

    // No episode row; the episode-less series is swept by the cascade.
    assert!(store.episodes.lock().unwrap().is_empty());
    assert!(store.series.lock().unwrap().is_empty());
}

#[tokio::test]
async fn ambiguous_series_records_conflict_per_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Shadows S01E01.mkv"), b"").unwrap();
    fs::write(dir.path().join("Shadows S01E02.mkv"), b"").unwrap();

    let store = Arc::new(FakeStore::default());
    store.add_folder(dir.path().to_str().unwrap(), "series");

    let resolver = FakeResolver::default().with_ambiguous_series("Shadows", &[101, 102]);
    let scanner = scanner_with(&store, resolver, Arc::new(NullSink));

    let summary = scanner.run_scan().await.unwrap();

    // Two files of the same unknown series each get their own conflict row,
    // both carrying the cached candidate list.
    assert_eq!(summary.conflicts, 2);
    let conflicts = store.conflicts.lock().unwrap();
    assert_eq!(conflicts.len(), 2);
    for conflict in conflicts.iter() {
        assert_eq!(conflict.media_kind, "series");
        assert_eq!(conflict.possible_matches.0.len(), 2);
    }
    let mut paths: Vec<&str> = conflicts.iter().map(|c| c.file_path.as_str()).collect();
    paths.sort();
    assert!(paths[0].ends_with("Shadows S01E01.mkv"));
    assert!(paths[1].ends_with("Shadows S01E02.mkv"));

    assert!(store.series.lock().unwrap().is_empty());
    assert!(store.episodes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn movie_with_far_off_year_is_conflicted_not_adopted() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Heat (1995).mkv"), b"").unwrap();

    let store = Arc::new(FakeStore::default());
    store.add_folder(dir.path().to_str().unwrap(), "movie");

    // The only candidate surfaces on the year-less retry and is a decade off.
    let resolver = FakeResolver::default().with_movie("Heat", 9035, 2005);
    let scanner = scanner_with(&store, resolver, Arc::new(NullSink));

    let summary = scanner.run_scan().await.unwrap();

    assert_eq!(summary.new_movies, 0);
    assert_eq!(summary.conflicts, 1);
    assert!(store.movies.lock().unwrap().is_empty());

    let conflicts = store.conflicts.lock().unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].media_kind, "movie");
    assert_eq!(conflicts[0].possible_matches.0.len(), 1);
    assert_eq!(conflicts[0].possible_matches.0[0].tmdb_id, 9035);
}

#[tokio::test]
async fn movie_year_off_by_one_still_adopts() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Heat (1995).mkv"), b"").unwrap();

    let store = Arc::new(FakeStore::default());
    store.add_folder(dir.path().to_str().unwrap(), "movie");

    let resolver = FakeResolver::default().with_movie("Heat", 949, 1996);
    let scanner = scanner_with(&store, resolver, Arc::new(NullSink));

    let summary = scanner.run_scan().await.unwrap();

    assert_eq!(summary.new_movies, 1);
    assert_eq!(summary.conflicts, 0);

    let movies = store.movies.lock().unwrap();
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0].tmdb_id, 949);
}

#[tokio::test]
async fn unmatched_movie_records_conflict_with_no_candidates() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Totally Unknown Film (1987).mkv"), b"").unwrap();

    let store = Arc::new(FakeStore::default());
    store.add_folder(dir.path().to_str().unwrap(), "movie");

    let scanner = scanner_with(&store, FakeResolver::default(), Arc::new(NullSink));
    let summary = scanner.run_scan().await.unwrap();

    assert_eq!(summary.conflicts, 1);
    let conflicts = store.conflicts.lock().unwrap();
    assert_eq!(conflicts.len(), 1);
    assert!(conflicts[0].possible_matches.0.is_empty());
    assert_eq!(conflicts[0].media_kind, "movie");
}

#[tokio::test]
async fn unparseable_episode_folder_raises_grouped_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let season_dir = dir.path().join("Breaking.Bad.S05.1080p");
    fs::create_dir(&season_dir).unwrap();
    fs::write(season_dir.join("garbage.mkv"), b"").unwrap();
    fs::write(season_dir.join("alsojunk.mkv"), b"").unwrap();

    let store = Arc::new(FakeStore::default());
    store.add_folder(dir.path().to_str().unwrap(), "series");

    let resolver = FakeResolver::default().with_series("Breaking Bad", 1396);
    let scanner = scanner_with(&store, resolver, Arc::new(NullSink));

    let summary = scanner.run_scan().await.unwrap();

    assert_eq!(summary.conflicts, 1);
    let conflicts = store.conflicts.lock().unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(
        conflicts[0].file_name,
        "Breaking.Bad.S05.1080p (2 episodes)"
    );
    assert_eq!(conflicts[0].possible_matches.0.len(), 1);
    assert_eq!(conflicts[0].possible_matches.0[0].tmdb_id, 1396);
}

#[tokio::test]
async fn orphaned_movie_is_removed_even_without_configured_folder() {
    let store = Arc::new(FakeStore::default());
    store.add_movie(603, "The Matrix", "/nonexistent/The.Matrix.1999.mkv");

    let scanner = scanner_with(&store, FakeResolver::default(), Arc::new(NullSink));
    let summary = scanner.run_scan().await.unwrap();

    assert_eq!(summary.removed_movies, 1);
    assert!(store.movies.lock().unwrap().is_empty());
}

#[tokio::test]
async fn series_with_no_remaining_episodes_is_removed() {
    let store = Arc::new(FakeStore::default());
    let series_id = store.add_series(1396, "Breaking Bad");
    store.add_episode(series_id, 9001, 1, 1, "/nonexistent/Breaking Bad S01E01.mkv");

    let scanner = scanner_with(&store, FakeResolver::default(), Arc::new(NullSink));
    let summary = scanner.run_scan().await.unwrap();

    assert_eq!(summary.removed_episodes, 1);
    assert_eq!(summary.removed_series, 1);
    assert!(store.episodes.lock().unwrap().is_empty());
    assert!(store.series.lock().unwrap().is_empty());
}

#[tokio::test]
async fn second_scan_performs_no_writes() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Inception (2010).mkv"), b"").unwrap();
    fs::write(dir.path().join("Heat (1995).mkv"), b"").unwrap();

    let store = Arc::new(FakeStore::default());
    store.add_folder(dir.path().to_str().unwrap(), "movie");

    let resolver = FakeResolver::default()
        .with_movie("Inception", 27205, 2010)
        .with_movie("Heat", 949, 1995);
    let scanner = scanner_with(&store, resolver, Arc::new(NullSink));

    let first = scanner.run_scan().await.unwrap();
    assert_eq!(first.new_movies, 2);
    let writes_after_first = store.write_count();

    let second = scanner.run_scan().await.unwrap();
    assert_eq!(second.new_movies, 0);
    assert_eq!(second.updated_movies, 0);
    assert_eq!(second.removed_movies, 0);
    assert_eq!(store.write_count(), writes_after_first);
}

#[tokio::test]
async fn moved_movie_file_is_rebound_not_duplicated() {
    let dir = tempfile::tempdir().unwrap();
    let new_path = dir.path().join("Inception (2010).mkv");
    fs::write(&new_path, b"").unwrap();

    let store = Arc::new(FakeStore::default());
    store.add_folder(dir.path().to_str().unwrap(), "movie");
    // Same file name, stale path.
    store.add_movie(27205, "Inception", "/old/location/Inception (2010).mkv");

    let scanner = scanner_with(&store, FakeResolver::default(), Arc::new(NullSink));
    let summary = scanner.run_scan().await.unwrap();

    assert_eq!(summary.new_movies, 0);
    assert_eq!(summary.updated_movies, 1);
    // The rebound record is not an orphan, so nothing is removed.
    assert_eq!(summary.removed_movies, 0);

    let movies = store.movies.lock().unwrap();
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0].file_path, new_path.to_string_lossy());
}

#[tokio::test]
async fn resurfacing_path_reopens_resolved_conflict() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Shadows S01E01.mkv"), b"").unwrap();

    let store = Arc::new(FakeStore::default());
    store.add_folder(dir.path().to_str().unwrap(), "series");

    let resolver = FakeResolver::default().with_ambiguous_series("Shadows", &[101, 102]);
    let scanner = scanner_with(&store, resolver, Arc::new(NullSink));

    scanner.run_scan().await.unwrap();
    let conflict_id = store.conflicts.lock().unwrap()[0].id;

    // Simulate a selection that never got acted on disk-side.
    store.mark_conflict_resolved(conflict_id, 101).await.unwrap();

    scanner.run_scan().await.unwrap();

    let conflicts = store.conflicts.lock().unwrap();
    assert_eq!(conflicts.len(), 1);
    assert!(!conflicts[0].resolved);
    assert_eq!(conflicts[0].selected_tmdb_id, None);
}

#[tokio::test]
async fn progress_is_monotonic_and_ends_with_summary() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Inception (2010).mkv"), b"").unwrap();

    let store = Arc::new(FakeStore::default());
    store.add_folder(dir.path().to_str().unwrap(), "movie");

    let sink = Arc::new(CaptureSink::default());
    let resolver = FakeResolver::default().with_movie("Inception", 27205, 2010);
    let scanner = scanner_with(&store, resolver, sink.clone());

    scanner.run_scan().await.unwrap();

    let events = sink.events.lock().unwrap();
    assert!(events.len() >= 3);

    let mut last = 0u8;
    for event in events.iter() {
        assert!(event.percent >= last, "progress went backwards");
        last = event.percent;
    }

    let terminal = events.last().unwrap();
    assert_eq!(terminal.status, ScanStatus::Completed);
    assert_eq!(terminal.percent, 100);
    let summary = terminal.summary.as_ref().expect("terminal event carries summary");
    assert_eq!(summary.new_movies, 1);
    assert_eq!(summary.removed_movies, 0);
}

#[tokio::test]
async fn resolving_unknown_conflict_is_not_found() {
    let store = Arc::new(FakeStore::default());
    let service = ConflictService::new(store, Arc::new(FakeResolver::default()));

    let missing = Uuid::new_v4();
    let err = service.resolve(missing, 42).await.unwrap_err();
    assert_matches!(err, ConflictError::NotFound(id) if id == missing);
}

#[tokio::test]
async fn resolving_with_foreign_candidate_is_rejected() {
    let store = Arc::new(FakeStore::default());
    let conflict = store
        .upsert_conflict(UpsertConflict {
            file_name: "Shadows S01E01.mkv".to_string(),
            file_path: "/tv/Shadows S01E01.mkv".to_string(),
            media_kind: "series".to_string(),
            possible_matches: vec![candidate(101, "Shadows", None), candidate(102, "Shadows", None)],
        })
        .await
        .unwrap();

    let service = ConflictService::new(store.clone(), Arc::new(FakeResolver::default()));

    let err = service.resolve(conflict.id, 999).await.unwrap_err();
    assert_matches!(
        err,
        ConflictError::InvalidCandidate { candidate_id: 999, .. }
    );
    assert!(!store.conflicts.lock().unwrap()[0].resolved);
}

#[tokio::test]
async fn resolving_movie_conflict_creates_record_and_marks_resolved() {
    let store = Arc::new(FakeStore::default());
    let conflict = store
        .upsert_conflict(UpsertConflict {
            file_name: "Totally Unknown Film (1987).mkv".to_string(),
            file_path: "/movies/Totally Unknown Film (1987).mkv".to_string(),
            media_kind: "movie".to_string(),
            // No candidates: the user supplies a TMDB id directly.
            possible_matches: Vec::new(),
        })
        .await
        .unwrap();

    let resolver = FakeResolver::default().with_movie("Totally Unknown Film", 777, 1987);
    let service = ConflictService::new(store.clone(), Arc::new(resolver));

    service.resolve(conflict.id, 777).await.unwrap();

    let movies = store.movies.lock().unwrap();
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0].tmdb_id, 777);
    assert_eq!(movies[0].year, Some(1987));

    let conflicts = store.conflicts.lock().unwrap();
    assert!(conflicts[0].resolved);
    assert_eq!(conflicts[0].selected_tmdb_id, Some(777));
}

#[tokio::test]
async fn resolving_series_conflict_creates_series_and_episode() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("Shadows S01E01.mkv");
    fs::write(&file, b"").unwrap();

    let store = Arc::new(FakeStore::default());
    let conflict = store
        .upsert_conflict(UpsertConflict {
            file_name: "Shadows S01E01.mkv".to_string(),
            file_path: file.to_string_lossy().to_string(),
            media_kind: "series".to_string(),
            possible_matches: vec![candidate(101, "Shadows", None), candidate(102, "Shadows", None)],
        })
        .await
        .unwrap();

    let resolver = FakeResolver::default()
        .with_series("Shadows", 101)
        .with_episode(101, 1, 1, 5001);
    let service = ConflictService::new(store.clone(), Arc::new(resolver));

    service.resolve(conflict.id, 101).await.unwrap();

    assert_eq!(store.series.lock().unwrap().len(), 1);
    let episodes = store.episodes.lock().unwrap();
    assert_eq!(episodes.len(), 1);
    assert_eq!(episodes[0].tmdb_id, 5001);
    assert_eq!(episodes[0].season_number, 1);
    assert_eq!(episodes[0].episode_number, 1);
}

#[tokio::test]
async fn resolving_series_conflict_with_missing_episode_keeps_conflict_open() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("Shadows S01E01.mkv");
    fs::write(&file, b"").unwrap();

    let store = Arc::new(FakeStore::default());
    let conflict = store
        .upsert_conflict(UpsertConflict {
            file_name: "Shadows S01E01.mkv".to_string(),
            file_path: file.to_string_lossy().to_string(),
            media_kind: "series".to_string(),
            possible_matches: vec![candidate(101, "Shadows", None)],
        })
        .await
        .unwrap();

    // The chosen series exists but has no S01E01 upstream.
    let resolver = FakeResolver::default().with_series("Shadows", 101);
    let service = ConflictService::new(store.clone(), Arc::new(resolver));

    service.resolve(conflict.id, 101).await.unwrap();

    // The series is catalogued, but with no episode to bind the conflict
    // stays open, now with its candidates cleared.
    assert_eq!(store.series.lock().unwrap().len(), 1);
    assert!(store.episodes.lock().unwrap().is_empty());

    let conflicts = store.conflicts.lock().unwrap();
    assert_eq!(conflicts.len(), 1);
    assert!(!conflicts[0].resolved);
    assert_eq!(conflicts[0].selected_tmdb_id, None);
    assert!(conflicts[0].possible_matches.0.is_empty());
}

#[tokio::test]
async fn resolved_conflicts_are_purged_after_scan() {
    let store = Arc::new(FakeStore::default());
    let conflict = store
        .upsert_conflict(UpsertConflict {
            file_name: "gone.mkv".to_string(),
            file_path: "/tv/gone.mkv".to_string(),
            media_kind: "series".to_string(),
            possible_matches: Vec::new(),
        })
        .await
        .unwrap();
    store.mark_conflict_resolved(conflict.id, 101).await.unwrap();

    let scanner = scanner_with(&store, FakeResolver::default(), Arc::new(NullSink));
    scanner.run_scan().await.unwrap();

    assert!(store.conflicts.lock().unwrap().is_empty());
}
