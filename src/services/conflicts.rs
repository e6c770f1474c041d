//! Conflict resolution service
//!
//! Conflicts recorded by the scanner sit until a user picks a candidate (or
//! supplies a TMDB id outright, for conflicts that had no candidates).
//! Resolving replays the scanner's adoption path for the chosen id, so a
//! resolved conflict ends in exactly the catalog state a clean scan match
//! would have produced.

use std::path::Path;
use std::sync::Arc;

use anyhow::anyhow;
use tracing::{info, warn};
use uuid::Uuid;

use super::filename_parser;
use super::scanner::{CatalogStore, MetadataResolver};
use crate::db::{
    CreateEpisode, CreateMovie, CreateSeries, FileBinding, ScanningConflictRecord, UpsertConflict,
};
use crate::error::ConflictError;

pub struct ConflictService {
    store: Arc<dyn CatalogStore>,
    resolver: Arc<dyn MetadataResolver>,
}

impl ConflictService {
    pub fn new(store: Arc<dyn CatalogStore>, resolver: Arc<dyn MetadataResolver>) -> Self {
        Self { store, resolver }
    }

    /// List conflicts still awaiting a decision
    pub async fn list_unresolved(&self) -> Result<Vec<ScanningConflictRecord>, ConflictError> {
        Ok(self.store.list_unresolved_conflicts().await?)
    }

    /// Resolve a conflict by choosing a TMDB id
    ///
    /// The chosen id must be one of the stored candidates, except for
    /// conflicts recorded with no candidates at all, where any id is
    /// accepted. A series choice whose episode is missing upstream leaves
    /// the conflict open with an empty candidate list.
    pub async fn resolve(
        &self,
        conflict_id: Uuid,
        selected_tmdb_id: i64,
    ) -> Result<(), ConflictError> {
        let conflict = self
            .store
            .get_conflict(conflict_id)
            .await?
            .ok_or(ConflictError::NotFound(conflict_id))?;

        let candidates = &conflict.possible_matches.0;
        if !candidates.is_empty() && !candidates.iter().any(|c| c.tmdb_id == selected_tmdb_id) {
            return Err(ConflictError::InvalidCandidate {
                conflict_id,
                candidate_id: selected_tmdb_id,
            });
        }

        info!(
            conflict_id = %conflict_id,
            tmdb_id = selected_tmdb_id,
            media_kind = %conflict.media_kind,
            "Resolving conflict"
        );

        let completed = match conflict.media_kind.as_str() {
            "movie" => {
                self.apply_movie_choice(&conflict, selected_tmdb_id).await?;
                true
            }
            "series" => self.apply_series_choice(&conflict, selected_tmdb_id).await?,
            other => {
                return Err(ConflictError::Other(anyhow!(
                    "conflict {} has unknown media kind '{}'",
                    conflict_id,
                    other
                )))
            }
        };

        if completed {
            self.store
                .mark_conflict_resolved(conflict_id, selected_tmdb_id)
                .await?;
        }

        Ok(())
    }

    /// Delete a single conflict without resolving it
    pub async fn delete(&self, conflict_id: Uuid) -> Result<(), ConflictError> {
        if !self.store.delete_conflict(conflict_id).await? {
            return Err(ConflictError::NotFound(conflict_id));
        }
        Ok(())
    }

    /// Delete every unresolved conflict, returning how many were dropped
    pub async fn delete_all_unresolved(&self) -> Result<u64, ConflictError> {
        Ok(self.store.delete_unresolved_conflicts().await?)
    }

    async fn apply_movie_choice(
        &self,
        conflict: &ScanningConflictRecord,
        tmdb_id: i64,
    ) -> Result<(), ConflictError> {
        let binding = movie_binding_for(&conflict.file_path, &conflict.file_name);

        if let Some(existing) = self.store.get_movie_by_tmdb_id(tmdb_id).await? {
            self.store.update_movie_binding(existing.id, &binding).await?;
            return Ok(());
        }

        let details = self
            .resolver
            .movie_details(tmdb_id)
            .await?
            .ok_or_else(|| ConflictError::Other(anyhow!("TMDB has no movie with id {tmdb_id}")))?;

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

        Ok(())
    }

    /// Apply a series choice; returns false when the chosen episode is
    /// missing upstream and the conflict was left open instead of resolved
    async fn apply_series_choice(
        &self,
        conflict: &ScanningConflictRecord,
        tmdb_id: i64,
    ) -> Result<bool, ConflictError> {
        let series = match self.store.get_series_by_tmdb_id(tmdb_id).await? {
            Some(existing) => existing,
            None => {
                let details = self.resolver.series_details(tmdb_id).await?.ok_or_else(|| {
                    ConflictError::Other(anyhow!("TMDB has no series with id {tmdb_id}"))
                })?;
                self.store
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
                    .await?
            }
        };

        // Grouped folder conflicts point at a directory of files the parser
        // could not read; creating the series is all that can be done here,
        // and the next scan picks up from there.
        if Path::new(&conflict.file_path).is_dir() {
            return Ok(true);
        }

        let Some(parsed) = filename_parser::parse_episode(&conflict.file_path) else {
            warn!(path = %conflict.file_path, "Conflict file no longer parses as an episode");
            return Ok(true);
        };

        let Some(details) = self
            .resolver
            .episode_details(series.tmdb_id, parsed.season_number, parsed.episode_number)
            .await?
        else {
            // The series exists but the episode does not; clear the
            // candidates and leave the conflict awaiting a new decision.
            warn!(
                series = %series.title,
                season = parsed.season_number,
                episode = parsed.episode_number,
                "Resolver has no such episode, leaving conflict open"
            );
            self.store
                .upsert_conflict(UpsertConflict {
                    file_name: conflict.file_name.clone(),
                    file_path: conflict.file_path.clone(),
                    media_kind: "series".to_string(),
                    possible_matches: Vec::new(),
                })
                .await?;
            return Ok(false);
        };

        let binding = FileBinding {
            file_path: parsed.file_path.clone(),
            file_name: parsed.file_name.clone(),
            resolution: parsed.resolution.clone(),
            quality: parsed.quality.clone(),
            rip: parsed.rip.clone(),
            sound: parsed.sound.clone(),
            provider: parsed.provider.clone(),
        };

        if let Some(existing) = self
            .store
            .get_episode_by_key(details.tmdb_id, parsed.season_number, parsed.episode_number)
            .await?
        {
            self.store.update_episode_binding(existing.id, &binding).await?;
            return Ok(true);
        }

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

        Ok(true)
    }
}

/// Binding for a resolved movie conflict
///
/// Re-parses the stored path to recover quality attributes; if the name
/// still does not parse the binding carries the raw path and name only.
fn movie_binding_for(file_path: &str, file_name: &str) -> FileBinding {
    match filename_parser::parse_movie(file_path) {
        Some(parsed) => FileBinding {
            file_path: parsed.file_path,
            file_name: parsed.file_name,
            resolution: parsed.resolution,
            quality: parsed.quality,
            rip: parsed.rip,
            sound: parsed.sound,
            provider: parsed.provider,
        },
        None => FileBinding {
            file_path: file_path.to_string(),
            file_name: file_name.to_string(),
            resolution: None,
            quality: None,
            rip: None,
            sound: None,
            provider: None,
        },
    }
}
