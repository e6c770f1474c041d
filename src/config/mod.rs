//! Application configuration management

use std::env;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Database URL (PostgreSQL)
    pub database_url: String,

    /// TMDB API key
    pub tmdb_api_key: String,

    /// Cron expression for the periodic full scan
    pub scan_schedule: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .context("Invalid PORT")?,

            database_url: env::var("DATABASE_URL").context("DATABASE_URL is required")?,

            tmdb_api_key: env::var("TMDB_API_KEY").unwrap_or_default(),

            // Every hour on the hour by default
            scan_schedule: env::var("SCAN_SCHEDULE").unwrap_or_else(|_| "0 0 * * * *".to_string()),
        })
    }
}
