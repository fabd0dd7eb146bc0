//! Client configuration parsed from environment variables.

use std::time::Duration;

use crate::session::RefreshFailurePolicy;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_SECURETOKEN_BASE_URL: &str = "https://securetoken.googleapis.com/v1";
pub const DEFAULT_API_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Parse(String),
    #[error("missing identity API key: env var IDENTITY_API_KEY not set")]
    MissingApiKey,
}

/// Endpoints and key for the identity provider's REST API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub api_key: String,
    pub identity_base_url: String,
    pub securetoken_base_url: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Where the SeatScout API lives, without trailing slash.
    pub api_base_url: String,
    pub api_request_timeout: Duration,
    pub provider: ProviderConfig,
    pub refresh_failure_policy: RefreshFailurePolicy,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Required:
    /// - `IDENTITY_API_KEY`
    ///
    /// Optional:
    /// - `SEATSCOUT_API_BASE_URL`: default `http://localhost:3000`
    /// - `IDENTITY_BASE_URL`, `SECURETOKEN_BASE_URL`: provider endpoints
    /// - `REFRESH_FAILURE_POLICY`: `retain-stale` (default) or `clear`
    /// - `API_REQUEST_TIMEOUT_SECS`: default 10, must be non-zero
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or a value does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("IDENTITY_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let refresh_failure_policy = match std::env::var("REFRESH_FAILURE_POLICY") {
            Ok(raw) => raw.parse().map_err(ConfigError::Parse)?,
            Err(_) => RefreshFailurePolicy::default(),
        };
        let request_secs = env_parse_u64("API_REQUEST_TIMEOUT_SECS", DEFAULT_API_REQUEST_TIMEOUT_SECS)?;
        if request_secs == 0 {
            return Err(ConfigError::Parse("API_REQUEST_TIMEOUT_SECS must be greater than zero".into()));
        }
        let request_timeout = Duration::from_secs(request_secs);

        Ok(Self {
            api_base_url: env_url("SEATSCOUT_API_BASE_URL", DEFAULT_API_BASE_URL),
            api_request_timeout: request_timeout,
            provider: ProviderConfig {
                api_key,
                identity_base_url: env_url("IDENTITY_BASE_URL", DEFAULT_IDENTITY_BASE_URL),
                securetoken_base_url: env_url("SECURETOKEN_BASE_URL", DEFAULT_SECURETOKEN_BASE_URL),
                request_timeout,
                connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            },
            refresh_failure_policy,
        })
    }
}

fn env_url(key: &str, default: &str) -> String {
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

fn env_parse_u64(key: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::Parse(format!("invalid {key}: {raw}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
