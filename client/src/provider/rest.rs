//! Identity Toolkit REST implementation of [`IdentityProvider`].
//!
//! Email/password sign-in and sign-up go to the Identity Toolkit
//! `accounts:*` endpoints; token refresh goes to the Secure Token service.
//! The provider keeps the current user's credentials in memory and hands
//! out the cached ID token until it is close to expiry.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::mpsc;

use super::{ChangeNotifier, IdentityProvider, Principal, ProviderError, ProviderEvent};
use crate::config::ProviderConfig;

/// Refresh this long before the provider-reported expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(300);

/// Longest token lifetime accepted from the provider. ID tokens live one hour.
pub(crate) const MAX_EXPIRES_IN_SECS: u64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Credentials {
    pub principal: Principal,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: Instant,
}

impl Credentials {
    fn is_fresh(&self, now: Instant) -> bool {
        now.checked_add(EXPIRY_MARGIN)
            .is_some_and(|cutoff| cutoff < self.expires_at)
    }
}

fn expiry_after(lifetime: Duration) -> Result<Instant, ProviderError> {
    Instant::now()
        .checked_add(lifetime)
        .ok_or_else(|| ProviderError::Protocol(format!("token lifetime out of range: {lifetime:?}")))
}

/// Result of a successful sign-in or sign-up call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AuthGrant {
    pub principal: Principal,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_in: Duration,
}

/// Result of a successful refresh call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RefreshGrant {
    pub uid: String,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_in: Duration,
}

pub struct RestIdentityProvider {
    http: reqwest::Client,
    config: ProviderConfig,
    credentials: Mutex<Option<Credentials>>,
    notifier: ChangeNotifier,
}

impl RestIdentityProvider {
    /// # Errors
    ///
    /// Returns [`ProviderError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ProviderError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, config: config.clone(), credentials: Mutex::new(None), notifier: ChangeNotifier::new() })
    }

    fn current(&self) -> Option<Credentials> {
        self.credentials
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn replace(&self, credentials: Option<Credentials>) {
        *self
            .credentials
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = credentials;
    }

    async fn password_call(&self, endpoint: &str, email: &str, password: &str) -> Result<Principal, ProviderError> {
        let url = format!("{}/{endpoint}", self.config.identity_base_url);
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });
        let (status, text) = self.post(&url, &body).await?;
        let grant = parse_auth_response(status, &text)?;

        let expires_at = expiry_after(grant.expires_in)?;
        let principal = grant.principal.clone();
        self.replace(Some(Credentials {
            principal: grant.principal,
            id_token: grant.id_token,
            refresh_token: grant.refresh_token,
            expires_at,
        }));
        self.notifier.emit(&ProviderEvent::SignedIn(principal.clone()));
        Ok(principal)
    }

    async fn post(&self, url: &str, body: &serde_json::Value) -> Result<(u16, String), ProviderError> {
        let response = self
            .http
            .post(url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Unreachable(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Unreachable(e.to_string()))?;
        Ok((status, text))
    }
}

#[async_trait::async_trait]
impl IdentityProvider for RestIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Principal, ProviderError> {
        self.password_call("accounts:signInWithPassword", email, password)
            .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Principal, ProviderError> {
        self.password_call("accounts:signUp", email, password).await
    }

    async fn sign_out(&self) {
        let had_user = self.current().is_some();
        self.replace(None);
        if had_user {
            self.notifier.emit(&ProviderEvent::SignedOut);
        }
    }

    async fn fresh_token(&self, principal: &Principal) -> Result<String, ProviderError> {
        let creds = self
            .current()
            .filter(|c| c.principal.uid == principal.uid)
            .ok_or(ProviderError::NoCurrentUser)?;
        if creds.is_fresh(Instant::now()) {
            return Ok(creds.id_token);
        }

        tracing::debug!(uid = %principal.uid, "refreshing id token");
        let url = format!("{}/token", self.config.securetoken_base_url);
        let body = serde_json::json!({
            "grant_type": "refresh_token",
            "refresh_token": creds.refresh_token,
        });
        let (status, text) = self.post(&url, &body).await?;
        let grant = parse_refresh_response(status, &text)?;
        if grant.uid != principal.uid {
            return Err(ProviderError::NoCurrentUser);
        }
        let expires_at = expiry_after(grant.expires_in)?;

        // Sign-out or another sign-in may have landed during the call.
        let mut guard = self
            .credentials
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match guard.as_mut() {
            Some(current) if current.principal.uid == grant.uid => {
                current.id_token.clone_from(&grant.id_token);
                current.refresh_token = grant.refresh_token;
                current.expires_at = expires_at;
                Ok(grant.id_token)
            }
            _ => Err(ProviderError::NoCurrentUser),
        }
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<ProviderEvent> {
        let current = self.current().map(|c| c.principal);
        self.notifier.subscribe(ProviderEvent::from_principal(current))
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    local_id: Option<String>,
    email: Option<String>,
    id_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<String>,
}

#[derive(Deserialize)]
struct RefreshResponse {
    id_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<String>,
    user_id: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

fn check_status(status: u16, body: &str) -> Result<(), ProviderError> {
    if (400..500).contains(&status) {
        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .map(|env| env.error.message)
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("status {status}"));
        return Err(ProviderError::CredentialRejected(message));
    }
    if status != 200 {
        return Err(ProviderError::Unreachable(format!("status {status}")));
    }
    Ok(())
}

fn required(field: Option<String>, name: &str) -> Result<String, ProviderError> {
    field
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ProviderError::Protocol(format!("missing {name}")))
}

fn parse_expires_in(raw: Option<String>) -> Result<Duration, ProviderError> {
    let raw = required(raw, "expiresIn")?;
    let secs = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| ProviderError::Protocol(format!("invalid expiresIn: {raw}")))?;
    if secs > MAX_EXPIRES_IN_SECS {
        return Err(ProviderError::Protocol(format!("expiresIn out of range: {raw}")));
    }
    Ok(Duration::from_secs(secs))
}

/// Map a sign-in or sign-up response.
///
/// # Errors
///
/// 4xx → [`ProviderError::CredentialRejected`] carrying the provider's error
/// code, other non-200 → [`ProviderError::Unreachable`], incomplete body →
/// [`ProviderError::Protocol`].
pub(crate) fn parse_auth_response(status: u16, body: &str) -> Result<AuthGrant, ProviderError> {
    check_status(status, body)?;
    let parsed: AuthResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Protocol(format!("unparseable body: {e}")))?;
    let uid = required(parsed.local_id, "localId")?;
    let email = required(parsed.email, "email")?;
    Ok(AuthGrant {
        principal: Principal::new(uid, email),
        id_token: required(parsed.id_token, "idToken")?,
        refresh_token: required(parsed.refresh_token, "refreshToken")?,
        expires_in: parse_expires_in(parsed.expires_in)?,
    })
}

/// Map a Secure Token refresh response.
///
/// # Errors
///
/// Same mapping as [`parse_auth_response`].
pub(crate) fn parse_refresh_response(status: u16, body: &str) -> Result<RefreshGrant, ProviderError> {
    check_status(status, body)?;
    let parsed: RefreshResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Protocol(format!("unparseable body: {e}")))?;
    Ok(RefreshGrant {
        uid: required(parsed.user_id, "user_id")?,
        id_token: required(parsed.id_token, "id_token")?,
        refresh_token: required(parsed.refresh_token, "refresh_token")?,
        expires_in: parse_expires_in(parsed.expires_in)?,
    })
}

#[cfg(test)]
#[path = "rest_test.rs"]
mod tests;
