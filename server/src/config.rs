//! Server configuration parsed from environment variables.
//!
//! The identity provider trust relationship is established either from a
//! credentials bundle on disk (`IDENTITY_CREDENTIALS_FILE`) or from a bare
//! `IDENTITY_API_KEY`. The bundle wins when both are set.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_VERIFY_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_PROVIDER_CONNECT_TIMEOUT_SECS: u64 = 3;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Parse(String),
    #[error("identity credentials missing: set IDENTITY_CREDENTIALS_FILE or IDENTITY_API_KEY")]
    MissingCredentials,
    #[error("failed to read credentials file {path}: {source}")]
    CredentialsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid credentials file {path}: {source}")]
    CredentialsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Credentials bundle identifying this server to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderCredentials {
    #[serde(default)]
    pub project_id: Option<String>,
    pub api_key: String,
}

impl ProviderCredentials {
    /// Parse a credentials bundle from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns the underlying JSON error when the document is not a bundle.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityProviderConfig {
    pub credentials: ProviderCredentials,
    pub base_url: String,
    /// Upper bound for one token verification round trip.
    pub verify_timeout: Duration,
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub identity: IdentityProviderConfig,
}

impl ServerConfig {
    /// Build typed server config from environment variables.
    ///
    /// Required (one of):
    /// - `IDENTITY_CREDENTIALS_FILE`: path to `{ "project_id", "api_key" }` JSON
    /// - `IDENTITY_API_KEY`
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `IDENTITY_BASE_URL`: default Identity Toolkit v1 endpoint
    /// - `VERIFY_TIMEOUT_MS`: default 5000
    ///
    /// # Errors
    ///
    /// Returns an error if credentials are missing or unreadable, or if a
    /// numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = env_parse_strict("PORT", DEFAULT_PORT)?;
        let credentials = load_credentials()?;
        let base_url = std::env::var("IDENTITY_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_IDENTITY_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let verify_timeout_ms = env_parse_strict("VERIFY_TIMEOUT_MS", DEFAULT_VERIFY_TIMEOUT_MS)?;
        if verify_timeout_ms == 0 {
            return Err(ConfigError::Parse("VERIFY_TIMEOUT_MS must be greater than zero".into()));
        }

        Ok(Self {
            port,
            identity: IdentityProviderConfig {
                credentials,
                base_url,
                verify_timeout: Duration::from_millis(verify_timeout_ms),
                connect_timeout: Duration::from_secs(DEFAULT_PROVIDER_CONNECT_TIMEOUT_SECS),
            },
        })
    }
}

fn load_credentials() -> Result<ProviderCredentials, ConfigError> {
    if let Ok(path) = std::env::var("IDENTITY_CREDENTIALS_FILE") {
        let path = PathBuf::from(path);
        let raw = std::fs::read_to_string(&path)
            .map_err(|source| ConfigError::CredentialsRead { path: path.clone(), source })?;
        return ProviderCredentials::from_json(&raw).map_err(|source| ConfigError::CredentialsParse { path, source });
    }

    std::env::var("IDENTITY_API_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty())
        .map(|api_key| ProviderCredentials { project_id: None, api_key })
        .ok_or(ConfigError::MissingCredentials)
}

fn env_parse_strict<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Parse(format!("invalid {key}: {raw}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
