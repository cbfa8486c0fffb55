use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";
/// Matches the backend's development auth middleware.
const DEFAULT_API_TOKEN: &str = "local-mock-token";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Application configuration loaded from environment variables (and `.env` if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub api_token: String,
    /// Where the profile is persisted. `None` runs without persistence.
    pub profile_store_path: Option<PathBuf>,
    /// Optional base JSON resume the profile is overlaid onto.
    pub resume_path: Option<PathBuf>,
    /// `None` means backend calls never time out.
    pub request_timeout: Option<Duration>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout_secs = match var("REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .context("REQUEST_TIMEOUT_SECS must be a whole number of seconds")?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Config {
            api_base_url: var("API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_token: var("API_TOKEN").unwrap_or_else(|| DEFAULT_API_TOKEN.to_string()),
            profile_store_path: var("PROFILE_STORE_PATH").map(PathBuf::from),
            resume_path: var("RESUME_PATH").map(PathBuf::from),
            request_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}
