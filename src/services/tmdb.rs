//! TMDB (The Movie Database) API client
//!
//! Base URL: https://api.themoviedb.org/3
//!
//! Rate limiting: TMDB allows ~40 requests per 10 seconds. This client uses
//! rate limiting and retry logic to handle this gracefully. It is the
//! production [`MetadataResolver`]; a missing remote record surfaces as
//! `Ok(None)`, never as an error.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::rate_limiter::{retry_async, RateLimitedClient, RetryConfig};
use super::scanner::{EpisodeDetails, MetadataResolver, MovieDetails, SeriesDetails};
use crate::db::MatchCandidate;

/// TMDB API client with rate limiting and retry logic
pub struct TmdbClient {
    client: Arc<RateLimitedClient>,
    base_url: String,
    api_key: String,
    retry_config: RetryConfig,
}

#[derive(Debug, Clone, Deserialize)]
struct TmdbSearchPage<T> {
    results: Vec<T>,
}

/// Movie payload shared by search results and the details endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbMovie {
    pub id: i64,
    pub title: String,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub runtime: Option<i32>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_average: Option<f64>,
    /// Present in search results
    pub genre_ids: Option<Vec<i32>>,
    /// Present in the details endpoint
    pub genres: Option<Vec<TmdbGenre>>,
}

/// Series payload shared by search results and the details endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbSeries {
    pub id: i64,
    pub name: String,
    pub overview: Option<String>,
    pub first_air_date: Option<String>,
    pub last_air_date: Option<String>,
    pub status: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_average: Option<f64>,
    pub genre_ids: Option<Vec<i32>>,
    pub genres: Option<Vec<TmdbGenre>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbEpisode {
    pub id: i64,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub air_date: Option<String>,
    pub season_number: i32,
    pub episode_number: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbGenre {
    pub id: i32,
    pub name: String,
}

/// Static TMDB genre id table (movie and TV lists combined)
///
/// Search results only carry genre_ids; resolving them locally avoids a
/// second API round-trip per search.
const GENRES: &[(i32, &str)] = &[
    (28, "Action"),
    (12, "Adventure"),
    (16, "Animation"),
    (35, "Comedy"),
    (80, "Crime"),
    (99, "Documentary"),
    (18, "Drama"),
    (10751, "Family"),
    (14, "Fantasy"),
    (36, "History"),
    (27, "Horror"),
    (10402, "Music"),
    (9648, "Mystery"),
    (10749, "Romance"),
    (878, "Science Fiction"),
    (10770, "TV Movie"),
    (53, "Thriller"),
    (10752, "War"),
    (37, "Western"),
    (10759, "Action & Adventure"),
    (10762, "Kids"),
    (10763, "News"),
    (10764, "Reality"),
    (10765, "Sci-Fi & Fantasy"),
    (10766, "Soap"),
    (10767, "Talk"),
    (10768, "War & Politics"),
];

fn genre_names(ids: Option<&[i32]>, inline: Option<&[TmdbGenre]>) -> Vec<String> {
    if let Some(genres) = inline {
        return genres.iter().map(|g| g.name.clone()).collect();
    }
    ids.unwrap_or_default()
        .iter()
        .filter_map(|id| GENRES.iter().find(|(gid, _)| gid == id))
        .map(|(_, name)| name.to_string())
        .collect()
}

fn parse_date(date: Option<&str>) -> Option<chrono::NaiveDate> {
    date.filter(|d| !d.is_empty())
        .and_then(|d| chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}

fn year_of(date: Option<&str>) -> Option<i32> {
    date.and_then(|d| d.split('-').next())
        .and_then(|y| y.parse().ok())
}

impl TmdbClient {
    /// Create a new TMDB client with the given API key
    pub fn new(api_key: String) -> Self {
        Self {
            client: Arc::new(RateLimitedClient::for_tmdb()),
            base_url: "https://api.themoviedb.org/3".to_string(),
            api_key,
            retry_config: RetryConfig {
                max_retries: 3,
                initial_interval: Duration::from_millis(500),
                max_interval: Duration::from_secs(10),
                multiplier: 2.0,
            },
        }
    }

    /// Check if the client has a valid API key configured
    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Get the image base URL for poster/backdrop images
    pub fn image_url(&self, path: &str, size: &str) -> String {
        format!("https://image.tmdb.org/t/p/{}{}", size, path)
    }

    /// Get full poster URL (w500 size - good for display)
    pub fn poster_url(&self, path: Option<&str>) -> Option<String> {
        path.map(|p| self.image_url(p, "w500"))
    }

    /// Get full backdrop URL (w1280 size - good for backgrounds)
    pub fn backdrop_url(&self, path: Option<&str>) -> Option<String> {
        path.map(|p| self.image_url(p, "w1280"))
    }

    /// GET a TMDB endpoint with retry; 404 maps to `Ok(None)`
    async fn fetch_json<T: DeserializeOwned>(
        &self,
        path: &str,
        extra_query: &[(&str, String)],
        operation_name: &str,
    ) -> Result<Option<T>> {
        if !self.has_api_key() {
            anyhow::bail!("TMDB API key not configured");
        }

        let url = format!("{}{}", self.base_url, path);
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let query: Vec<(String, String)> = extra_query
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();

        retry_async(
            || {
                let url = url.clone();
                let client = client.clone();
                let key = api_key.clone();
                let query = query.clone();
                async move {
                    let mut params: Vec<(String, String)> =
                        vec![("api_key".to_string(), key)];
                    params.extend(query);

                    let response = client.get_with_query(&url, &params).await?;

                    match response.status().as_u16() {
                        429 => {
                            warn!("TMDB rate limit hit, will retry");
                            anyhow::bail!("Rate limited (429)")
                        }
                        401 => anyhow::bail!("TMDB API key is invalid"),
                        404 => return Ok(None),
                        s if !(200..300).contains(&s) => {
                            anyhow::bail!("TMDB request failed with status: {}", s)
                        }
                        _ => {}
                    }

                    let body: T = response
                        .json()
                        .await
                        .context("Failed to parse TMDB response")?;

                    Ok(Some(body))
                }
            },
            &self.retry_config,
            operation_name,
        )
        .await
    }

    /// Search for movies by title, optionally constrained to a year
    pub async fn search_movie_titles(
        &self,
        query: &str,
        year: Option<i32>,
    ) -> Result<Vec<TmdbMovie>> {
        info!(query = %query, year = ?year, "Searching TMDB for movie");

        let mut params = vec![
            ("query", query.to_string()),
            ("include_adult", "false".to_string()),
        ];
        if let Some(y) = year {
            params.push(("year", y.to_string()));
        }

        let page: Option<TmdbSearchPage<TmdbMovie>> = self
            .fetch_json("/search/movie", &params, "tmdb_search_movies")
            .await?;
        let results = page.map(|p| p.results).unwrap_or_default();

        debug!(count = results.len(), "TMDB movie search returned results");
        Ok(results)
    }

    /// Search for TV series by name
    pub async fn search_series_names(&self, query: &str) -> Result<Vec<TmdbSeries>> {
        info!(query = %query, "Searching TMDB for series");

        let params = vec![
            ("query", query.to_string()),
            ("include_adult", "false".to_string()),
        ];

        let page: Option<TmdbSearchPage<TmdbSeries>> = self
            .fetch_json("/search/tv", &params, "tmdb_search_series")
            .await?;
        let results = page.map(|p| p.results).unwrap_or_default();

        debug!(count = results.len(), "TMDB series search returned results");
        Ok(results)
    }

    /// Get movie details by TMDB id
    pub async fn get_movie(&self, tmdb_id: i64) -> Result<Option<TmdbMovie>> {
        debug!(tmdb_id, "Fetching movie details from TMDB");
        self.fetch_json(&format!("/movie/{tmdb_id}"), &[], "tmdb_get_movie")
            .await
    }

    /// Get series details by TMDB id
    pub async fn get_series(&self, tmdb_id: i64) -> Result<Option<TmdbSeries>> {
        debug!(tmdb_id, "Fetching series details from TMDB");
        self.fetch_json(&format!("/tv/{tmdb_id}"), &[], "tmdb_get_series")
            .await
    }

    /// Get a single episode of a series
    pub async fn get_episode(
        &self,
        series_tmdb_id: i64,
        season: i32,
        episode: i32,
    ) -> Result<Option<TmdbEpisode>> {
        debug!(series_tmdb_id, season, episode, "Fetching episode details from TMDB");
        self.fetch_json(
            &format!("/tv/{series_tmdb_id}/season/{season}/episode/{episode}"),
            &[],
            "tmdb_get_episode",
        )
        .await
    }

    fn movie_candidate(&self, movie: &TmdbMovie) -> MatchCandidate {
        MatchCandidate {
            tmdb_id: movie.id,
            title: movie.title.clone(),
            overview: movie.overview.clone(),
            poster_path: self.poster_url(movie.poster_path.as_deref()),
            backdrop_path: self.backdrop_url(movie.backdrop_path.as_deref()),
            genres: genre_names(movie.genre_ids.as_deref(), movie.genres.as_deref()),
            year: year_of(movie.release_date.as_deref()),
            rating: movie.vote_average,
            runtime: movie.runtime,
            first_air_date: None,
            last_air_date: None,
            status: None,
        }
    }

    fn series_candidate(&self, series: &TmdbSeries) -> MatchCandidate {
        MatchCandidate {
            tmdb_id: series.id,
            title: series.name.clone(),
            overview: series.overview.clone(),
            poster_path: self.poster_url(series.poster_path.as_deref()),
            backdrop_path: self.backdrop_url(series.backdrop_path.as_deref()),
            genres: genre_names(series.genre_ids.as_deref(), series.genres.as_deref()),
            year: year_of(series.first_air_date.as_deref()),
            rating: series.vote_average,
            runtime: None,
            first_air_date: series.first_air_date.clone(),
            last_air_date: series.last_air_date.clone(),
            status: series.status.clone(),
        }
    }
}

#[async_trait]
impl MetadataResolver for TmdbClient {
    async fn search_movies(&self, title: &str, year: Option<i32>) -> Result<Vec<MatchCandidate>> {
        let results = self.search_movie_titles(title, year).await?;
        Ok(results.iter().map(|m| self.movie_candidate(m)).collect())
    }

    async fn movie_details(&self, tmdb_id: i64) -> Result<Option<MovieDetails>> {
        let Some(movie) = self.get_movie(tmdb_id).await? else {
            return Ok(None);
        };

        Ok(Some(MovieDetails {
            tmdb_id: movie.id,
            title: movie.title.clone(),
            year: year_of(movie.release_date.as_deref()),
            overview: movie.overview.clone(),
            poster_url: self.poster_url(movie.poster_path.as_deref()),
            backdrop_url: self.backdrop_url(movie.backdrop_path.as_deref()),
            genres: genre_names(movie.genre_ids.as_deref(), movie.genres.as_deref()),
            runtime: movie.runtime,
            rating: movie.vote_average,
            release_date: parse_date(movie.release_date.as_deref()),
        }))
    }

    async fn search_series(&self, name: &str) -> Result<Vec<MatchCandidate>> {
        let results = self.search_series_names(name).await?;
        Ok(results.iter().map(|s| self.series_candidate(s)).collect())
    }

    async fn series_details(&self, tmdb_id: i64) -> Result<Option<SeriesDetails>> {
        let Some(series) = self.get_series(tmdb_id).await? else {
            return Ok(None);
        };

        Ok(Some(SeriesDetails {
            tmdb_id: series.id,
            title: series.name.clone(),
            overview: series.overview.clone(),
            poster_url: self.poster_url(series.poster_path.as_deref()),
            backdrop_url: self.backdrop_url(series.backdrop_path.as_deref()),
            genres: genre_names(series.genre_ids.as_deref(), series.genres.as_deref()),
            first_air_date: parse_date(series.first_air_date.as_deref()),
            last_air_date: parse_date(series.last_air_date.as_deref()),
            status: series.status.clone(),
        }))
    }

    async fn episode_details(
        &self,
        series_tmdb_id: i64,
        season: i32,
        episode: i32,
    ) -> Result<Option<EpisodeDetails>> {
        let Some(ep) = self.get_episode(series_tmdb_id, season, episode).await? else {
            return Ok(None);
        };

        Ok(Some(EpisodeDetails {
            tmdb_id: ep.id,
            title: ep.name.clone(),
            overview: ep.overview.clone(),
            air_date: parse_date(ep.air_date.as_deref()),
        }))
    }
}
