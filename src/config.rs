//! Crawler configuration loaded from environment variables.
//!
//! Credentials are read once at startup; nothing is persisted back to disk.

use chrono::NaiveDate;
use std::env;

/// Crawler configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Login email for the authenticated session
    pub email: String,
    /// Login password
    pub password: String,
    /// Club whose activity feed is crawled
    pub club_id: u64,
    /// Site root (overridable for local test servers)
    pub base_url: String,
    /// Optional calendar-date filter for crawled entries
    pub filter_date: Option<NaiveDate>,
    /// Where the plain-text crawl report is written
    pub results_path: String,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            email: "athlete@example.com".to_string(),
            password: "test_password".to_string(),
            club_id: 786435,
            base_url: "https://www.strava.com".to_string(),
            filter_date: None,
            results_path: "results.txt".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            email: env::var("STRAVA_EMAIL").map_err(|_| ConfigError::Missing("STRAVA_EMAIL"))?,
            password: env::var("STRAVA_PASSWORD")
                .map_err(|_| ConfigError::Missing("STRAVA_PASSWORD"))?,
            club_id: env::var("STRAVA_CLUB_ID")
                .map_err(|_| ConfigError::Missing("STRAVA_CLUB_ID"))?
                .parse()
                .map_err(|_| ConfigError::Invalid("STRAVA_CLUB_ID"))?,
            base_url: env::var("STRAVA_BASE_URL")
                .unwrap_or_else(|_| "https://www.strava.com".to_string()),
            filter_date: match env::var("CRAWL_FILTER_DATE") {
                Ok(raw) => Some(
                    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                        .map_err(|_| ConfigError::Invalid("CRAWL_FILTER_DATE"))?,
                ),
                Err(_) => None,
            },
            results_path: env::var("CRAWL_RESULTS_PATH")
                .unwrap_or_else(|_| "results.txt".to_string()),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Malformed environment variable: {0}")]
    Invalid(&'static str),
}
