//! Configuration management for the client runtime.

use std::env;
use std::time::Duration;

/// Default location of the embedded database.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://rentx.db";

/// Runtime configuration, usually loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the RentX API, without a trailing slash
    pub api_url: String,
    /// SQLite connection URL for the local store
    pub database_url: String,
    /// Timeout applied to every HTTP request
    pub http_timeout: Duration,
    /// Minimum time between the starts of two sync rounds
    pub sync_min_interval: Duration,
}

impl Config {
    /// Configuration with default timeouts.
    pub fn new(api_url: impl Into<String>, database_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            database_url: database_url.into(),
            http_timeout: Duration::from_secs(30),
            sync_min_interval: Duration::from_millis(2000),
        }
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn with_sync_min_interval(mut self, interval: Duration) -> Self {
        self.sync_min_interval = interval;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is read first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let api_url = env::var("RENTX_API_URL").map_err(|_| ConfigError::MissingApiUrl)?;

        let database_url =
            env::var("RENTX_DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let mut config = Self::new(api_url, database_url);

        if let Some(secs) = parse_var("RENTX_HTTP_TIMEOUT_SECS")? {
            config.http_timeout = Duration::from_secs(secs);
        }
        if let Some(millis) = parse_var("RENTX_SYNC_MIN_INTERVAL_MS")? {
            config.sync_min_interval = Duration::from_millis(millis);
        }

        Ok(config)
    }
}

fn parse_var(key: &'static str) -> Result<Option<u64>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(None),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("RENTX_API_URL environment variable is required")]
    MissingApiUrl,

    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}
