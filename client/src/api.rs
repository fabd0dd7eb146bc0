//! REST client for the SeatScout API.
//!
//! ERROR HANDLING
//! ==============
//! Every call returns a typed [`ApiError`]; screens show
//! [`ApiError::user_message`] and treat [`ApiError::Unauthorized`] as a cue
//! to send the user back to login.

use std::time::Duration;

use identity::{ErrorBody, UserProfile, VerifyRequest, VerifyResponse, bearer_header};
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;

use crate::config::{ClientConfig, DEFAULT_CONNECT_TIMEOUT_SECS};
use crate::session::Session;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not signed in")]
    NotSignedIn,
    #[error("unauthorized")]
    Unauthorized,
    #[error("not found")]
    NotFound,
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response decode failed: {0}")]
    Decode(String),
    #[error("http client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NotSignedIn | Self::Unauthorized => "Please sign in again.",
            Self::NotFound => "Profile not found.",
            Self::Request(_) => "Unable to reach SeatScout. Please try again.",
            Self::Status { .. } | Self::Decode(_) | Self::HttpClientBuild(_) => "Something went wrong. Please try again.",
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::with_base_url(&config.api_base_url, config.api_request_timeout)
    }

    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the signed-in user's profile from `GET /user/profile`.
    ///
    /// # Errors
    ///
    /// [`ApiError::NotSignedIn`] without a token (no request is made),
    /// [`ApiError::Unauthorized`] on 401, [`ApiError::NotFound`] on 404.
    pub async fn fetch_profile(&self, session: &Session) -> Result<UserProfile, ApiError> {
        let token = session.token.as_deref().ok_or(ApiError::NotSignedIn)?;
        let response = self
            .http
            .get(format!("{}/user/profile", self.base_url))
            .header(AUTHORIZATION, bearer_header(token))
            .send()
            .await
            .map_err(ApiError::Request)?;
        decode(response).await
    }

    /// Ask the API to verify a raw ID token via `POST /auth/verify`.
    ///
    /// # Errors
    ///
    /// [`ApiError::Unauthorized`] when the server rejects the token.
    pub async fn verify_token(&self, id_token: &str) -> Result<VerifyResponse, ApiError> {
        let response = self
            .http
            .post(format!("{}/auth/verify", self.base_url))
            .json(&VerifyRequest { id_token: id_token.to_owned() })
            .send()
            .await
            .map_err(ApiError::Request)?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let text = response.text().await.map_err(ApiError::Request)?;
    interpret(status, &text)
}

/// Map an API status and body to a typed result.
pub(crate) fn interpret<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, ApiError> {
    match status {
        StatusCode::OK => serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string())),
        StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
        StatusCode::NOT_FOUND => Err(ApiError::NotFound),
        other => {
            let body = serde_json::from_str::<ErrorBody>(body).map_or_else(|_| body.to_owned(), |e| e.error);
            tracing::warn!(status = other.as_u16(), %body, "api request failed");
            Err(ApiError::Status { status: other.as_u16(), body })
        }
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
