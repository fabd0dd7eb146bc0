//! Identity provider adapter for server-side token verification.
//!
//! DESIGN
//! ======
//! The gate depends only on the [`TokenVerifier`] trait. The production
//! implementation asks the Identity Toolkit `accounts:lookup` endpoint to
//! resolve the ID token; the provider checks signature, expiry and revocation
//! and returns the account the token belongs to. Response parsing is a pure
//! function so it can be tested without a network.

use std::time::Duration;

use serde::Deserialize;

use crate::config::IdentityProviderConfig;

/// Claims the provider vouches for after a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub subject_id: String,
    pub email: String,
}

/// Detailed verification failure. Kept server-side only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("token rejected by provider: {0}")]
    Rejected(String),
    #[error("token expired")]
    Expired,
    #[error("verified token carried malformed claims: {0}")]
    MalformedClaims(String),
    #[error("identity provider unreachable: {0}")]
    Unreachable(String),
    #[error("verification timed out after {0:?}")]
    TimedOut(Duration),
    #[error("http client build failed: {0}")]
    HttpClientBuild(String),
}

/// Verify an opaque bearer token against the identity provider.
#[async_trait::async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Resolve `token` to the claims it proves.
    ///
    /// # Errors
    ///
    /// Returns a [`VerifyError`] describing why the token was not accepted.
    async fn verify(&self, token: &str) -> Result<Claims, VerifyError>;
}

// =============================================================================
// IDENTITY TOOLKIT CLIENT
// =============================================================================

pub struct IdentityToolkitVerifier {
    http: reqwest::Client,
    lookup_url: String,
    api_key: String,
}

impl IdentityToolkitVerifier {
    /// Build a verifier from provider config.
    ///
    /// The HTTP client's request timeout matches the gate's verification
    /// bound so a stalled provider never holds a connection past it.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn new(config: &IdentityProviderConfig) -> Result<Self, VerifyError> {
        let http = reqwest::Client::builder()
            .timeout(config.verify_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| VerifyError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            lookup_url: format!("{}/accounts:lookup", config.base_url),
            api_key: config.credentials.api_key.clone(),
        })
    }
}

#[async_trait::async_trait]
impl TokenVerifier for IdentityToolkitVerifier {
    async fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        let response = self
            .http
            .post(&self.lookup_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&serde_json::json!({ "idToken": token }))
            .send()
            .await
            .map_err(|e| VerifyError::Unreachable(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| VerifyError::Unreachable(e.to_string()))?;

        parse_lookup_response(status, &text)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: Option<String>,
    email: Option<String>,
    #[serde(default)]
    disabled: bool,
}

#[derive(Deserialize)]
struct ProviderErrorEnvelope {
    error: ProviderErrorDetail,
}

#[derive(Deserialize)]
struct ProviderErrorDetail {
    #[serde(default)]
    message: String,
}

/// Map an `accounts:lookup` HTTP response to verified claims.
///
/// # Errors
///
/// - 4xx with `TOKEN_EXPIRED` → [`VerifyError::Expired`]
/// - other 4xx → [`VerifyError::Rejected`]
/// - 5xx or any other non-200 → [`VerifyError::Unreachable`]
/// - 200 without exactly one enabled user with id and email → [`VerifyError::MalformedClaims`]
pub(crate) fn parse_lookup_response(status: u16, body: &str) -> Result<Claims, VerifyError> {
    if (400..500).contains(&status) {
        let message = serde_json::from_str::<ProviderErrorEnvelope>(body)
            .map(|env| env.error.message)
            .unwrap_or_default();
        return if message.starts_with("TOKEN_EXPIRED") {
            Err(VerifyError::Expired)
        } else {
            Err(VerifyError::Rejected(if message.is_empty() { format!("status {status}") } else { message }))
        };
    }
    if status != 200 {
        return Err(VerifyError::Unreachable(format!("status {status}")));
    }

    let parsed: LookupResponse =
        serde_json::from_str(body).map_err(|e| VerifyError::MalformedClaims(format!("unparseable body: {e}")))?;

    let mut users = parsed.users.into_iter();
    let (Some(user), None) = (users.next(), users.next()) else {
        return Err(VerifyError::MalformedClaims("expected exactly one account".into()));
    };
    if user.disabled {
        return Err(VerifyError::Rejected("account disabled".into()));
    }
    let subject_id = user
        .local_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| VerifyError::MalformedClaims("missing subject id".into()))?;
    let email = user
        .email
        .filter(|email| !email.is_empty())
        .ok_or_else(|| VerifyError::MalformedClaims("missing email".into()))?;

    Ok(Claims { subject_id, email })
}

#[cfg(test)]
#[path = "verifier_test.rs"]
mod tests;
