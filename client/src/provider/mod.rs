//! Identity provider adapter seen from the client.
//!
//! DESIGN
//! ======
//! The provider is an external service. The rest of the client talks to it
//! through [`IdentityProvider`]; [`rest::RestIdentityProvider`] is the
//! production implementation. Change notifications are delivered as a
//! channel of [`ProviderEvent`]s instead of callbacks so the session store
//! can consume them from a single task.

pub mod rest;

use std::sync::Mutex;

use identity::Identity;
use tokio::sync::mpsc;

/// The provider's currently authenticated user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub uid: String,
    pub email: String,
}

impl Principal {
    #[must_use]
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self { uid: uid.into(), email: email.into() }
    }

    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::new(self.uid.clone(), self.email.clone())
    }
}

/// Token-state change pushed by the provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderEvent {
    SignedIn(Principal),
    SignedOut,
}

impl ProviderEvent {
    #[must_use]
    pub fn from_principal(principal: Option<Principal>) -> Self {
        principal.map_or(Self::SignedOut, Self::SignedIn)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// Email/password (or refresh credential) refused by the provider.
    #[error("credentials rejected: {0}")]
    CredentialRejected(String),
    #[error("identity provider unreachable: {0}")]
    Unreachable(String),
    /// `fresh_token` was asked for a principal that is no longer signed in.
    #[error("no current user")]
    NoCurrentUser,
    #[error("unexpected provider response: {0}")]
    Protocol(String),
    #[error("http client build failed: {0}")]
    HttpClientBuild(String),
}

#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Submit email/password credentials.
    ///
    /// # Errors
    ///
    /// [`ProviderError::CredentialRejected`] for bad credentials, other
    /// variants for transport or protocol failures.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Principal, ProviderError>;

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// As for [`IdentityProvider::sign_in`].
    async fn sign_up(&self, email: &str, password: &str) -> Result<Principal, ProviderError>;

    /// Forget the current user. Always succeeds locally.
    async fn sign_out(&self);

    /// Return a currently valid ID token for `principal`, refreshing if needed.
    ///
    /// # Errors
    ///
    /// [`ProviderError::NoCurrentUser`] when `principal` is not signed in;
    /// transport errors when a refresh was required and failed.
    async fn fresh_token(&self, principal: &Principal) -> Result<String, ProviderError>;

    /// Open a change stream. The current state is delivered first.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<ProviderEvent>;
}

/// Fan-out of provider events to every open change stream.
#[derive(Debug, Default)]
pub struct ChangeNotifier {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<ProviderEvent>>>,
}

impl ChangeNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new stream, seeding it with `current`.
    pub fn subscribe(&self, current: ProviderEvent) -> mpsc::UnboundedReceiver<ProviderEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        // Cannot fail: the receiver is still in hand.
        let _ = tx.send(current);
        self.subscribers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Deliver `event` to all live streams, dropping closed ones.
    pub fn emit(&self, event: &ProviderEvent) {
        self.subscribers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}
