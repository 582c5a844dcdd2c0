use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Application configuration loaded from environment variables.
/// Every variable has a default; a value that does not parse fails startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Versioned root of the ScholarLens backend, e.g. `http://localhost:8000/api/v1`.
    pub api_base_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Client-wide timeout for backend calls, including uploads.
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let timeout_secs = match var("HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .context("HTTP_TIMEOUT_SECS must be a whole number of seconds")?,
            None => 120,
        };

        Ok(Config {
            api_base_url: var("API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            port: var("PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
