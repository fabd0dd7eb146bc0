//! Request authentication gate.
//!
//! ARCHITECTURE
//! ============
//! `authenticate` turns the raw `Authorization` header into a
//! [`VerifiedIdentity`] by asking the [`TokenVerifier`] under a hard timeout.
//! The route layer (`routes::auth::require_identity`) runs it before any
//! handler that needs identity and stores the result in request extensions.
//!
//! TRADE-OFFS
//! ==========
//! Every failure is answered with the same 401. The distinct causes stay in
//! [`GateError`] for logs; callers cannot tell an expired token from a forged
//! one or from a provider outage.

use std::time::Duration;

use axum::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use identity::{BEARER_SCHEME, ErrorBody, Identity};

use super::verifier::{TokenVerifier, VerifyError};

/// Identity proven by the bearer token of the current request.
///
/// Only the gate constructs one; handlers receive it through request
/// extensions and it is dropped with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity(Identity);

impl VerifiedIdentity {
    #[must_use]
    pub fn subject_id(&self) -> &str {
        &self.0.subject_id
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.0.email
    }

    #[must_use]
    pub fn as_identity(&self) -> &Identity {
        &self.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("missing authorization header")]
    MissingCredential,
    #[error("malformed authorization header")]
    MalformedCredential,
    #[error("invalid credential: {0}")]
    InvalidCredential(#[source] VerifyError),
}

impl GateError {
    /// Short label for logs; never sent to the caller.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::MalformedCredential => "malformed_credential",
            Self::InvalidCredential(VerifyError::Expired) => "expired",
            Self::InvalidCredential(VerifyError::Rejected(_)) => "rejected",
            Self::InvalidCredential(VerifyError::MalformedClaims(_)) => "malformed_claims",
            Self::InvalidCredential(VerifyError::Unreachable(_) | VerifyError::HttpClientBuild(_)) => {
                "provider_unavailable"
            }
            Self::InvalidCredential(VerifyError::TimedOut(_)) => "provider_timeout",
        }
    }
}

/// Uniform 401. The body never names the cause.
pub fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(WWW_AUTHENTICATE, BEARER_SCHEME)],
        Json(ErrorBody::new("unauthorized")),
    )
        .into_response()
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        unauthorized()
    }
}

/// Read the bearer token out of request headers.
///
/// # Errors
///
/// [`GateError::MissingCredential`] when there is no `Authorization` header,
/// [`GateError::MalformedCredential`] when it is not valid UTF-8 or not a
/// single-token `Bearer` value.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, GateError> {
    let raw = headers.get(AUTHORIZATION).ok_or(GateError::MissingCredential)?;
    let value = raw.to_str().map_err(|_| GateError::MalformedCredential)?;
    identity::parse_bearer(value).map_err(|_| GateError::MalformedCredential)
}

/// Verify `token` with the provider, bounded by `timeout`.
///
/// # Errors
///
/// Any verifier failure, including the timeout elapsing, is returned as
/// [`GateError::InvalidCredential`].
pub async fn verify_token(
    verifier: &dyn TokenVerifier,
    token: &str,
    timeout: Duration,
) -> Result<VerifiedIdentity, GateError> {
    let claims = tokio::time::timeout(timeout, verifier.verify(token))
        .await
        .map_err(|_| GateError::InvalidCredential(VerifyError::TimedOut(timeout)))?
        .map_err(GateError::InvalidCredential)?;

    Ok(VerifiedIdentity(Identity::new(claims.subject_id, claims.email)))
}

/// Authenticate one request from its headers.
///
/// # Errors
///
/// See [`extract_bearer`] and [`verify_token`].
pub async fn authenticate(
    verifier: &dyn TokenVerifier,
    headers: &HeaderMap,
    timeout: Duration,
) -> Result<VerifiedIdentity, GateError> {
    let token = extract_bearer(headers)?;
    verify_token(verifier, token, timeout).await
}

#[cfg(test)]
#[path = "gate_test.rs"]
mod tests;
