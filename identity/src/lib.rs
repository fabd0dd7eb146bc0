//! Shared identity and profile model for the SeatScout client and server.
//!
//! This crate owns the JSON shapes exchanged over HTTP (profile body,
//! token-verification bodies, error envelope) and the `Authorization`
//! header format, so both sides agree on a single definition.

use serde::{Deserialize, Serialize};

/// Authentication scheme carried in the `Authorization` header.
pub const BEARER_SCHEME: &str = "Bearer";

/// Error returned by [`parse_bearer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    /// The header value is not `"<scheme> <token>"` with a single, non-empty token.
    #[error("malformed authorization header")]
    Malformed,
    /// The scheme is present but is not `Bearer`.
    #[error("unsupported authorization scheme")]
    UnsupportedScheme,
}

// =============================================================================
// IDENTITY
// =============================================================================

/// A resolved user identity: the provider's subject id plus email.
///
/// On the client this is the identity half of the session; on the server it
/// is the verified result of token validation, scoped to one request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-assigned subject identifier (`uid`).
    pub subject_id: String,
    /// Email address bound to the subject.
    pub email: String,
}

impl Identity {
    #[must_use]
    pub fn new(subject_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self { subject_id: subject_id.into(), email: email.into() }
    }
}

// =============================================================================
// PROFILE
// =============================================================================

/// Profile record returned by `GET /user/profile`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    /// Avatar image URL.
    pub avatar: String,
    pub stats: ProfileStats,
}

/// Social counters shown on the profile screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileStats {
    pub posts: u64,
    pub followers: u64,
    pub following: u64,
}

// =============================================================================
// TOKEN VERIFICATION ENDPOINT
// =============================================================================

/// Body of `POST /auth/verify`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyRequest {
    #[serde(rename = "idToken", default)]
    pub id_token: String,
}

/// Successful body of `POST /auth/verify`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub data: VerifyData,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyData {
    pub user: VerifiedUser,
}

/// User section of a verification response, in the provider's naming.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedUser {
    pub uid: String,
    pub email: String,
}

impl VerifyResponse {
    /// Build the success body for a verified identity.
    #[must_use]
    pub fn valid(identity: &Identity) -> Self {
        Self {
            success: true,
            data: VerifyData {
                user: VerifiedUser { uid: identity.subject_id.clone(), email: identity.email.clone() },
            },
            message: "Token is valid".to_owned(),
        }
    }
}

// =============================================================================
// ERROR ENVELOPE
// =============================================================================

/// Error body returned by every non-2xx API response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

// =============================================================================
// AUTHORIZATION HEADER
// =============================================================================

/// Format a token as an `Authorization` header value.
#[must_use]
pub fn bearer_header(token: &str) -> String {
    format!("{BEARER_SCHEME} {token}")
}

/// Extract the token portion of a `"Bearer <token>"` header value.
///
/// The value must contain exactly one space separating the scheme from a
/// non-empty token. The scheme is matched case-insensitively.
///
/// # Errors
///
/// Returns [`CredentialError::Malformed`] when the token portion is missing,
/// empty, or followed by extra segments, and
/// [`CredentialError::UnsupportedScheme`] for any scheme other than `Bearer`.
pub fn parse_bearer(value: &str) -> Result<&str, CredentialError> {
    let mut parts = value.split(' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().ok_or(CredentialError::Malformed)?;
    if token.is_empty() || parts.next().is_some() {
        return Err(CredentialError::Malformed);
    }
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return Err(CredentialError::UnsupportedScheme);
    }
    Ok(token)
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
