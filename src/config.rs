//! Runtime configuration loaded from environment variables.

use crate::application::registry::DEFAULT_MAX_ATTEMPTS;
use crate::error::{DonationError, Result};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the donation backend (e.g. http://localhost:8000/api/)
    pub api_url: String,
    /// Bearer token attached to every backend request
    pub api_token: Option<String>,
    /// RocksDB directory for the correlation store; in-memory when unset
    pub db_path: Option<PathBuf>,
    /// Verification attempts allowed per payment identifier
    pub max_verify_attempts: u32,
    /// Per-request timeout
    pub http_timeout_secs: u64,
    /// Program used to open payment pages
    pub opener: String,
}

impl Config {
    /// Reads the configuration, loading a `.env` file first if one exists.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let max_verify_attempts = match non_empty("DONATION_MAX_VERIFY_ATTEMPTS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                DonationError::Config(format!("Invalid DONATION_MAX_VERIFY_ATTEMPTS: {raw}"))
            })?,
            None => DEFAULT_MAX_ATTEMPTS,
        };
        if max_verify_attempts == 0 {
            return Err(DonationError::Config(
                "DONATION_MAX_VERIFY_ATTEMPTS must be at least 1".to_string(),
            ));
        }

        let http_timeout_secs = match non_empty("DONATION_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                DonationError::Config(format!("Invalid DONATION_HTTP_TIMEOUT_SECS: {raw}"))
            })?,
            None => 30,
        };

        Ok(Config {
            api_url: non_empty("DONATION_API_URL")
                .unwrap_or_else(|| "http://localhost:8000/api/".to_string()),
            api_token: non_empty("DONATION_API_TOKEN"),
            db_path: non_empty("DONATION_DB_PATH").map(PathBuf::from),
            max_verify_attempts,
            http_timeout_secs,
            opener: non_empty("DONATION_OPENER").unwrap_or_else(|| "xdg-open".to_string()),
        })
    }
}
