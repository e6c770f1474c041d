//! Library scanner and reconciliation engine
//!
//! Walks configured media folders, parses filenames, resolves metadata, and
//! reconciles the catalog against what is actually on disk: new files become
//! records, moved files are rebound, ambiguous files become conflicts, and
//! records whose files vanished are removed.
//!
//! The engine talks to the catalog and the metadata provider through the
//! [`CatalogStore`] and [`MetadataResolver`] traits, so tests can drive a
//! full scan against in-memory fakes and a temp directory.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::filename_parser::{self, ParsedEpisodeFile, ParsedMovieFile};
use super::progress::{ProgressSink, ScanProgress, ScanSummary};
use super::walker;
use crate::db::{
    CreateEpisode, CreateMovie, CreateSeries, EpisodeRecord, FileBinding, MatchCandidate,
    MediaFolderRecord, MovieRecord, ScanningConflictRecord, SeriesRecord, UpsertConflict,
};
use crate::error::ScanError;

/// Maximum candidates attached to a single conflict
const MAX_CANDIDATES: usize = 5;

/// Full movie metadata from the resolver's details endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct MovieDetails {
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
}

/// Full series metadata from the resolver's details endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesDetails {
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

/// Metadata for a single episode of a series
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeDetails {
    pub tmdb_id: i64,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub air_date: Option<chrono::NaiveDate>,
}

/// Catalog persistence as seen by the scanner
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_active_folders(&self) -> Result<Vec<MediaFolderRecord>>;

    async fn find_movie_by_path(&self, file_path: &str) -> Result<Option<MovieRecord>>;
    async fn find_movie_by_file_name(&self, file_name: &str) -> Result<Option<MovieRecord>>;
    async fn find_movie_by_title_year(
        &self,
        title: &str,
        year: Option<i32>,
    ) -> Result<Option<MovieRecord>>;
    async fn get_movie_by_tmdb_id(&self, tmdb_id: i64) -> Result<Option<MovieRecord>>;
    async fn create_movie(&self, input: CreateMovie) -> Result<MovieRecord>;
    async fn update_movie_binding(&self, id: Uuid, binding: &FileBinding) -> Result<()>;
    async fn list_movies(&self) -> Result<Vec<MovieRecord>>;
    async fn delete_movie(&self, id: Uuid) -> Result<bool>;

    async fn get_series_by_tmdb_id(&self, tmdb_id: i64) -> Result<Option<SeriesRecord>>;
    async fn find_series_by_title(&self, title: &str) -> Result<Option<SeriesRecord>>;
    async fn create_series(&self, input: CreateSeries) -> Result<SeriesRecord>;
    async fn list_series_without_episodes(&self) -> Result<Vec<SeriesRecord>>;
    async fn delete_series(&self, id: Uuid) -> Result<bool>;

    async fn find_episode_by_path(&self, file_path: &str) -> Result<Option<EpisodeRecord>>;
    async fn find_episode_by_file_name(&self, file_name: &str) -> Result<Option<EpisodeRecord>>;
    async fn find_episode_by_series_title(
        &self,
        series_title: &str,
        season: i32,
        episode: i32,
    ) -> Result<Option<EpisodeRecord>>;
    async fn get_episode_by_key(
        &self,
        tmdb_id: i64,
        season: i32,
        episode: i32,
    ) -> Result<Option<EpisodeRecord>>;
    async fn create_episode(&self, input: CreateEpisode) -> Result<EpisodeRecord>;
    async fn update_episode_binding(&self, id: Uuid, binding: &FileBinding) -> Result<()>;
    async fn list_episodes(&self) -> Result<Vec<EpisodeRecord>>;
    async fn delete_episode(&self, id: Uuid) -> Result<bool>;

    async fn upsert_conflict(&self, input: UpsertConflict) -> Result<ScanningConflictRecord>;
    async fn get_conflict(&self, id: Uuid) -> Result<Option<ScanningConflictRecord>>;
    async fn list_unresolved_conflicts(&self) -> Result<Vec<ScanningConflictRecord>>;
    async fn mark_conflict_resolved(&self, id: Uuid, selected_tmdb_id: i64) -> Result<bool>;
    async fn delete_conflict(&self, id: Uuid) -> Result<bool>;
    async fn delete_resolved_conflicts(&self) -> Result<u64>;
    async fn delete_unresolved_conflicts(&self) -> Result<u64>;
}

/// External metadata lookup as seen by the scanner
///
/// A record missing upstream is `Ok(None)`; errors are reserved for
/// transport and auth failures.
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    async fn search_movies(&self, title: &str, year: Option<i32>) -> Result<Vec<MatchCandidate>>;
    async fn movie_details(&self, tmdb_id: i64) -> Result<Option<MovieDetails>>;
    async fn search_series(&self, name: &str) -> Result<Vec<MatchCandidate>>;
    async fn series_details(&self, tmdb_id: i64) -> Result<Option<SeriesDetails>>;
    async fn episode_details(
        &self,
        series_tmdb_id: i64,
        season: i32,
        episode: i32,
    ) -> Result<Option<EpisodeDetails>>;
}

/// Cached outcome of resolving one series name during a scan
///
/// An unmatched name keeps its candidate list so every file of that series
/// still gets its own conflict row without re-querying the resolver.
enum SeriesResolution {
    Found(SeriesRecord),
    Unmatched(Vec<MatchCandidate>),
}

/// Per-scan working state threaded through the folder passes
struct ScanContext {
    summary: ScanSummary,
    /// Series resolutions keyed by the lowercased parsed series name
    series_cache: HashMap<String, SeriesResolution>,
}

/// Scanner service driving the reconciliation pipeline
pub struct ScannerService {
    store: Arc<dyn CatalogStore>,
    resolver: Arc<dyn MetadataResolver>,
    progress: Arc<dyn ProgressSink>,
    scanning: AtomicBool,
}

impl ScannerService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        resolver: Arc<dyn MetadataResolver>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            store,
            resolver,
            progress,
            scanning: AtomicBool::new(false),
        }
    }

    /// Whether a scan is currently in flight
    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::SeqCst)
    }

    /// Run a full library scan
    ///
    /// At most one scan runs at a time; a second call while one is in
    /// flight fails fast with [`ScanError::AlreadyRunning`].
    pub async fn run_scan(&self) -> Result<ScanSummary, ScanError> {
        if self
            .scanning
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ScanError::AlreadyRunning);
        }

        let result = self.run_scan_inner().await;
        self.scanning.store(false, Ordering::SeqCst);

        match result {
            Ok(summary) => {
                info!(
                    new_movies = summary.new_movies,
                    new_series = summary.new_series,
                    new_episodes = summary.new_episodes,
                    conflicts = summary.conflicts,
                    removed_movies = summary.removed_movies,
                    removed_episodes = summary.removed_episodes,
                    removed_series = summary.removed_series,
                    "Scan completed"
                );
                self.progress.emit(ScanProgress::completed(summary.clone()));
                Ok(summary)
            }
            Err(e) => {
                error!(error = %e, "Scan failed");
                self.progress.emit(ScanProgress::failed(e.to_string()));
                Err(ScanError::Other(e))
            }
        }
    }

    async fn run_scan_inner(&self) -> Result<ScanSummary> {
        self.progress.emit(ScanProgress::running(0, "Starting scan"));

        let folders = self.store.list_active_folders().await?;
        info!(folders = folders.len(), "Starting library scan");

        let mut ctx = ScanContext {
            summary: ScanSummary::default(),
            series_cache: HashMap::new(),
        };

        // Folder passes occupy 0-70 percent, split evenly.
        let total = folders.len().max(1) as u32;
        for (i, folder) in folders.iter().enumerate() {
            let percent = (70 * (i as u32 + 1) / total) as u8;
            self.progress
                .emit(ScanProgress::running(percent, format!("Scanning {}", folder.path)));

            let outcome = match folder.media_kind.as_str() {
                "movie" => self.scan_movie_folder(folder, &mut ctx).await,
                "series" => self.scan_series_folder(folder, &mut ctx).await,
                other => {
                    warn!(path = %folder.path, media_kind = %other, "Skipping folder with unknown media kind");
                    Ok(())
                }
            };
            if let Err(e) = outcome {
                // One broken folder must not sink the whole scan.
                error!(path = %folder.path, error = %e, "Folder scan failed");
            }
        }

        self.progress
            .emit(ScanProgress::running(75, "Checking for removed files"));
        self.remove_missing_movies(&mut ctx.summary).await?;
        self.progress
            .emit(ScanProgress::running(85, "Removing stale episodes"));
        self.remove_missing_episodes(&mut ctx.summary).await?;
        self.remove_empty_series(&mut ctx.summary).await?;

        self.progress
            .emit(ScanProgress::running(95, "Cleaning up resolved conflicts"));
        let purged = self.store.delete_resolved_conflicts().await?;
        if purged > 0 {
            debug!(purged, "Removed resolved conflicts");
        }

        Ok(ctx.summary)
    }

    async fn scan_movie_folder(
        &self,
        folder: &MediaFolderRecord,
        ctx: &mut ScanContext,
    ) -> Result<()> {
        let root = Path::new(&folder.path);
        if !root.exists() {
            warn!(path = %folder.path, "Movie folder does not exist, skipping");
            return Ok(());
        }

        let files = walker::enumerate_video_files(root);
        info!(path = %folder.path, files = files.len(), "Scanning movie folder");

        for file in files {
            let file_path = file.to_string_lossy().to_string();
            if let Err(e) = self.process_movie_file(&file_path, ctx).await {
                warn!(path = %file_path, error = %e, "Failed to process movie file");
            }
        }

        Ok(())
    }

    async fn process_movie_file(&self, file_path: &str, ctx: &mut ScanContext) -> Result<()> {
        // Known path: nothing to do.
        if self.store.find_movie_by_path(file_path).await?.is_some() {
            debug!(path = %file_path, "Movie file already in catalog");
            return Ok(());
        }

        let Some(parsed) = filename_parser::parse_movie(file_path) else {
            debug!(path = %file_path, "Movie filename did not parse, recording conflict");
            self.record_conflict(file_path, "movie", Vec::new(), ctx).await?;
            return Ok(());
        };

        // Same file name at a new path means the file moved; rebind.
        if let Some(existing) = self.store.find_movie_by_file_name(&parsed.file_name).await? {
            info!(path = %file_path, title = %existing.title, "Rebinding moved movie file");
            self.store
                .update_movie_binding(existing.id, &movie_binding(&parsed))
                .await?;
            ctx.summary.updated_movies += 1;
            return Ok(());
        }

        // Fuzzy title match against the catalog before going to the resolver.
        if let Some(existing) = self
            .store
            .find_movie_by_title_year(&parsed.title, parsed.year)
            .await?
        {
            info!(path = %file_path, title = %existing.title, "Rebinding movie by title match");
            self.store
                .update_movie_binding(existing.id, &movie_binding(&parsed))
                .await?;
            ctx.summary.updated_movies += 1;
            return Ok(());
        }

        let mut candidates = self.resolver.search_movies(&parsed.title, parsed.year).await?;
        let mut year_dropped = false;
        if candidates.is_empty() && parsed.year.is_some() {
            candidates = self.resolver.search_movies(&parsed.title, None).await?;
            year_dropped = true;
        }

        match candidates.len() {
            0 => {
                info!(title = %parsed.title, "No metadata match for movie, recording conflict");
                self.record_conflict(file_path, "movie", Vec::new(), ctx).await?;
            }
            1 if year_dropped && !years_agree(candidates[0].year, parsed.year) => {
                info!(
                    title = %parsed.title,
                    candidate_year = ?candidates[0].year,
                    parsed_year = ?parsed.year,
                    "Year-less match disagrees on year, recording conflict"
                );
                self.record_conflict(file_path, "movie", candidates, ctx).await?;
            }
            1 => {
                self.adopt_movie(candidates[0].tmdb_id, &parsed, ctx).await?;
            }
            _ => {
                info!(title = %parsed.title, candidates = candidates.len(), "Ambiguous movie match, recording conflict");
                candidates.truncate(MAX_CANDIDATES);
                self.record_conflict(file_path, "movie", candidates, ctx).await?;
            }
        }

        Ok(())
    }

    /// Create or rebind a movie record for a confirmed TMDB id
    async fn adopt_movie(
        &self,
        tmdb_id: i64,
        parsed: &ParsedMovieFile,
        ctx: &mut ScanContext,
    ) -> Result<()> {
        let binding = movie_binding(parsed);

        if let Some(existing) = self.store.get_movie_by_tmdb_id(tmdb_id).await? {
            self.store.update_movie_binding(existing.id, &binding).await?;
            ctx.summary.updated_movies += 1;
            return Ok(());
        }

        let Some(details) = self.resolver.movie_details(tmdb_id).await? else {
            warn!(tmdb_id, title = %parsed.title, "Movie vanished from resolver, recording conflict");
            self.record_conflict(&parsed.file_path, "movie", Vec::new(), ctx).await?;
            return Ok(());
        };

        info!(tmdb_id, title = %details.title, "Adding movie to catalog");
        self.store
            .create_movie(CreateMovie {
                tmdb_id: details.tmdb_id,
                title: details.title,
                year: details.year,
                overview: details.overview,
                poster_url: details.poster_url,
                backdrop_url: details.backdrop_url,
                genres: details.genres,
                runtime: details.runtime,
                rating: details.rating,
                release_date: details.release_date,
                binding,
            })
            .await?;
        ctx.summary.new_movies += 1;

        Ok(())
    }

    async fn scan_series_folder(
        &self,
        folder: &MediaFolderRecord,
        ctx: &mut ScanContext,
    ) -> Result<()> {
        let root = Path::new(&folder.path);
        if !root.exists() {
            warn!(path = %folder.path, "Series folder does not exist, skipping");
            return Ok(());
        }

        let files = walker::enumerate_video_files(root);
        info!(path = %folder.path, files = files.len(), "Scanning series folder");

        // Files whose names did not parse at all, grouped by parent dir so
        // a whole unparseable season folder raises one conflict, not one
        // per file.
        let mut unparsed: HashMap<String, u32> = HashMap::new();

        for file in files {
            let file_path = file.to_string_lossy().to_string();

            let Some(parsed) = filename_parser::parse_episode(&file_path) else {
                let parent = file
                    .parent()
                    .map(|p| p.to_string_lossy().to_string())
                    .unwrap_or_else(|| folder.path.clone());
                *unparsed.entry(parent).or_default() += 1;
                continue;
            };

            if let Err(e) = self.process_episode_file(&parsed, ctx).await {
                warn!(path = %file_path, error = %e, "Failed to process episode file");
            }
        }

        for (parent_dir, count) in unparsed {
            if let Err(e) = self.record_folder_conflict(&parent_dir, count, ctx).await {
                warn!(path = %parent_dir, error = %e, "Failed to record folder conflict");
            }
        }

        Ok(())
    }

    async fn process_episode_file(
        &self,
        parsed: &ParsedEpisodeFile,
        ctx: &mut ScanContext,
    ) -> Result<()> {
        if self.store.find_episode_by_path(&parsed.file_path).await?.is_some() {
            debug!(path = %parsed.file_path, "Episode file already in catalog");
            return Ok(());
        }

        let binding = episode_binding(parsed);

        if let Some(existing) = self
            .store
            .find_episode_by_file_name(&parsed.file_name)
            .await?
        {
            info!(path = %parsed.file_path, "Rebinding moved episode file");
            self.store.update_episode_binding(existing.id, &binding).await?;
            ctx.summary.updated_episodes += 1;
            return Ok(());
        }

        if let Some(existing) = self
            .store
            .find_episode_by_series_title(
                &parsed.series_name,
                parsed.season_number,
                parsed.episode_number,
            )
            .await?
        {
            info!(path = %parsed.file_path, "Rebinding episode by series title match");
            self.store.update_episode_binding(existing.id, &binding).await?;
            ctx.summary.updated_episodes += 1;
            return Ok(());
        }

        let Some(series) = self.resolve_series(parsed, ctx).await? else {
            // Unknown or ambiguous series; a conflict row was recorded for
            // this file.
            return Ok(());
        };

        let Some(details) = self
            .resolver
            .episode_details(series.tmdb_id, parsed.season_number, parsed.episode_number)
            .await?
        else {
            // The series exists but this specific episode does not; the
            // user decides what the file actually is.
            warn!(
                series = %series.title,
                season = parsed.season_number,
                episode = parsed.episode_number,
                "Resolver has no such episode, recording conflict"
            );
            self.record_conflict(&parsed.file_path, "series", Vec::new(), ctx).await?;
            return Ok(());
        };

        if let Some(existing) = self
            .store
            .get_episode_by_key(details.tmdb_id, parsed.season_number, parsed.episode_number)
            .await?
        {
            self.store.update_episode_binding(existing.id, &binding).await?;
            ctx.summary.updated_episodes += 1;
            return Ok(());
        }

        debug!(
            series = %series.title,
            season = parsed.season_number,
            episode = parsed.episode_number,
            "Adding episode to catalog"
        );
        self.store
            .create_episode(CreateEpisode {
                series_id: series.id,
                tmdb_id: details.tmdb_id,
                season_number: parsed.season_number,
                episode_number: parsed.episode_number,
                title: details.title,
                overview: details.overview,
                air_date: details.air_date,
                binding,
            })
            .await?;
        ctx.summary.new_episodes += 1;

        Ok(())
    }

    /// Resolve the parsed series name to a catalog series, creating one on
    /// an unambiguous resolver match. `Ok(None)` means the name did not
    /// resolve and a conflict row was recorded for this file; the resolver
    /// is queried at most once per name per scan.
    async fn resolve_series(
        &self,
        parsed: &ParsedEpisodeFile,
        ctx: &mut ScanContext,
    ) -> Result<Option<SeriesRecord>> {
        let cache_key = parsed.series_name.to_lowercase();
        let cached = match ctx.series_cache.get(&cache_key) {
            Some(SeriesResolution::Found(series)) => return Ok(Some(series.clone())),
            Some(SeriesResolution::Unmatched(candidates)) => Some(candidates.clone()),
            None => None,
        };
        if let Some(candidates) = cached {
            self.record_conflict(&parsed.file_path, "series", candidates, ctx).await?;
            return Ok(None);
        }

        if let Some(existing) = self.store.find_series_by_title(&parsed.series_name).await? {
            ctx.series_cache
                .insert(cache_key, SeriesResolution::Found(existing.clone()));
            return Ok(Some(existing));
        }

        let mut candidates = self.resolver.search_series(&parsed.series_name).await?;
        candidates.truncate(MAX_CANDIDATES);

        if candidates.len() == 1 {
            if let Some(series) = self.adopt_series(candidates[0].tmdb_id, ctx).await? {
                ctx.series_cache
                    .insert(cache_key, SeriesResolution::Found(series.clone()));
                return Ok(Some(series));
            }
            // Vanished between search and details; nothing left to offer.
            candidates.clear();
        }

        info!(
            series = %parsed.series_name,
            candidates = candidates.len(),
            "Series did not resolve, recording conflict"
        );
        self.record_conflict(&parsed.file_path, "series", candidates.clone(), ctx)
            .await?;
        ctx.series_cache
            .insert(cache_key, SeriesResolution::Unmatched(candidates));
        Ok(None)
    }

    /// Create a series record for a confirmed TMDB id, or reuse an existing one
    async fn adopt_series(
        &self,
        tmdb_id: i64,
        ctx: &mut ScanContext,
    ) -> Result<Option<SeriesRecord>> {
        if let Some(existing) = self.store.get_series_by_tmdb_id(tmdb_id).await? {
            return Ok(Some(existing));
        }

        let Some(details) = self.resolver.series_details(tmdb_id).await? else {
            warn!(tmdb_id, "Series vanished from resolver");
            return Ok(None);
        };

        info!(tmdb_id, title = %details.title, "Adding series to catalog");
        let series = self
            .store
            .create_series(CreateSeries {
                tmdb_id: details.tmdb_id,
                title: details.title,
                overview: details.overview,
                poster_url: details.poster_url,
                backdrop_url: details.backdrop_url,
                genres: details.genres,
                first_air_date: details.first_air_date,
                last_air_date: details.last_air_date,
                status: details.status,
            })
            .await?;
        ctx.summary.new_series += 1;

        Ok(Some(series))
    }

    /// Raise a single grouped conflict for a folder of unparseable episodes
    ///
    /// The series name is guessed from the folder name; if the first guess
    /// finds nothing, a more aggressive cleanup pass is tried.
    async fn record_folder_conflict(
        &self,
        parent_dir: &str,
        file_count: u32,
        ctx: &mut ScanContext,
    ) -> Result<()> {
        let folder_name = Path::new(parent_dir)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(parent_dir);

        let guessed = filename_parser::series_name_from_folder(folder_name);
        let mut candidates = if guessed.is_empty() {
            Vec::new()
        } else {
            self.resolver.search_series(&guessed).await?
        };

        if candidates.is_empty() {
            let simplified = filename_parser::simplify_series_name(&guessed);
            if !simplified.is_empty() && simplified != guessed {
                candidates = self.resolver.search_series(&simplified).await?;
            }
        }
        candidates.truncate(MAX_CANDIDATES);

        info!(
            folder = %folder_name,
            files = file_count,
            candidates = candidates.len(),
            "Recording grouped conflict for unparseable episode folder"
        );

        let input = UpsertConflict {
            file_name: format!("{} ({} episodes)", folder_name, file_count),
            file_path: parent_dir.to_string(),
            media_kind: "series".to_string(),
            possible_matches: candidates,
        };
        self.store.upsert_conflict(input).await?;
        ctx.summary.conflicts += 1;

        Ok(())
    }

    async fn record_conflict(
        &self,
        file_path: &str,
        media_kind: &str,
        candidates: Vec<MatchCandidate>,
        ctx: &mut ScanContext,
    ) -> Result<()> {
        let file_name = Path::new(file_path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(file_path)
            .to_string();

        self.store
            .upsert_conflict(UpsertConflict {
                file_name,
                file_path: file_path.to_string(),
                media_kind: media_kind.to_string(),
                possible_matches: candidates,
            })
            .await?;
        ctx.summary.conflicts += 1;

        Ok(())
    }

    /// Remove movie records whose bound file no longer exists on disk
    async fn remove_missing_movies(&self, summary: &mut ScanSummary) -> Result<()> {
        for movie in self.store.list_movies().await? {
            if Path::new(&movie.file_path).exists() {
                continue;
            }
            info!(title = %movie.title, path = %movie.file_path, "Removing movie with missing file");
            if self.store.delete_movie(movie.id).await? {
                summary.removed_movies += 1;
            }
        }
        Ok(())
    }

    async fn remove_missing_episodes(&self, summary: &mut ScanSummary) -> Result<()> {
        for episode in self.store.list_episodes().await? {
            if Path::new(&episode.file_path).exists() {
                continue;
            }
            info!(
                season = episode.season_number,
                episode = episode.episode_number,
                path = %episode.file_path,
                "Removing episode with missing file"
            );
            if self.store.delete_episode(episode.id).await? {
                summary.removed_episodes += 1;
            }
        }
        Ok(())
    }

    /// Cascade: a series with no remaining episodes leaves the catalog
    async fn remove_empty_series(&self, summary: &mut ScanSummary) -> Result<()> {
        for series in self.store.list_series_without_episodes().await? {
            info!(title = %series.title, "Removing series with no episodes");
            if self.store.delete_series(series.id).await? {
                summary.removed_series += 1;
            }
        }
        Ok(())
    }
}

fn movie_binding(parsed: &ParsedMovieFile) -> FileBinding {
    FileBinding {
        file_path: parsed.file_path.clone(),
        file_name: parsed.file_name.clone(),
        resolution: parsed.resolution.clone(),
        quality: parsed.quality.clone(),
        rip: parsed.rip.clone(),
        sound: parsed.sound.clone(),
        provider: parsed.provider.clone(),
    }
}

/// Whether a candidate found by a year-less retry agrees with the filename
/// year closely enough to adopt without asking
fn years_agree(candidate: Option<i32>, parsed: Option<i32>) -> bool {
    match (candidate, parsed) {
        (Some(a), Some(b)) => (a - b).abs() <= 1,
        _ => false,
    }
}

fn episode_binding(parsed: &ParsedEpisodeFile) -> FileBinding {
    FileBinding {
        file_path: parsed.file_path.clone(),
        file_name: parsed.file_name.clone(),
        resolution: parsed.resolution.clone(),
        quality: parsed.quality.clone(),
        rip: parsed.rip.clone(),
        sound: parsed.sound.clone(),
        provider: parsed.provider.clone(),
    }
}
