//! Login, signup and logout flows.
//!
//! Each flow talks to the identity provider and then writes the session
//! store directly, so the UI sees the new state without waiting for the
//! provider's own change notification. Provider errors never reach the UI
//! verbatim; [`AuthFlowError::user_message`] is what gets displayed.

use std::sync::Arc;

use identity::Identity;

use crate::provider::{IdentityProvider, Principal, ProviderError};
use crate::session::SessionStore;

pub const LOGIN_REJECTED_MESSAGE: &str = "Email or password is incorrect";
pub const SIGNUP_REJECTED_MESSAGE: &str = "Signup failed";
pub const PROVIDER_UNAVAILABLE_MESSAGE: &str = "Unable to reach the sign-in service. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum AuthFlowError {
    #[error("login rejected: {0}")]
    CredentialRejected(#[source] ProviderError),
    #[error("signup rejected: {0}")]
    SignupRejected(#[source] ProviderError),
    #[error("identity provider unavailable: {0}")]
    ProviderUnavailable(#[source] ProviderError),
}

impl AuthFlowError {
    /// Fixed, user-facing text for this failure.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::CredentialRejected(_) => LOGIN_REJECTED_MESSAGE,
            Self::SignupRejected(_) => SIGNUP_REJECTED_MESSAGE,
            Self::ProviderUnavailable(_) => PROVIDER_UNAVAILABLE_MESSAGE,
        }
    }
}

#[derive(Clone)]
pub struct AuthFlow {
    provider: Arc<dyn IdentityProvider>,
    store: SessionStore,
}

impl AuthFlow {
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>, store: SessionStore) -> Self {
        Self { provider, store }
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Sign in with email and password and establish the session.
    ///
    /// # Errors
    ///
    /// [`AuthFlowError::CredentialRejected`] for bad credentials,
    /// [`AuthFlowError::ProviderUnavailable`] otherwise. The session is left
    /// untouched on error.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthFlowError> {
        let principal = self.provider.sign_in(email, password).await.map_err(|e| match e {
            ProviderError::CredentialRejected(_) => AuthFlowError::CredentialRejected(e),
            other => AuthFlowError::ProviderUnavailable(other),
        })?;
        tracing::info!(uid = %principal.uid, "login succeeded");
        self.establish(&principal).await
    }

    /// Create an account, sign it in and establish the session.
    ///
    /// # Errors
    ///
    /// [`AuthFlowError::SignupRejected`] when the provider refuses the
    /// account, [`AuthFlowError::ProviderUnavailable`] otherwise.
    pub async fn signup(&self, email: &str, password: &str) -> Result<Identity, AuthFlowError> {
        let principal = self.provider.sign_up(email, password).await.map_err(|e| match e {
            ProviderError::CredentialRejected(_) => AuthFlowError::SignupRejected(e),
            other => AuthFlowError::ProviderUnavailable(other),
        })?;
        tracing::info!(uid = %principal.uid, "signup succeeded");
        self.establish(&principal).await
    }

    /// Sign out at the provider and clear the session. Safe to repeat.
    pub async fn logout(&self) {
        self.store.clear();
        self.provider.sign_out().await;
        tracing::info!("logged out");
    }

    async fn establish(&self, principal: &Principal) -> Result<Identity, AuthFlowError> {
        let token = self.provider.fresh_token(principal).await.map_err(|e| {
            tracing::warn!(error = %e, uid = %principal.uid, "signed in but no token issued");
            AuthFlowError::ProviderUnavailable(e)
        })?;
        let identity = principal.identity();
        self.store.establish(token, identity.clone());
        Ok(identity)
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
