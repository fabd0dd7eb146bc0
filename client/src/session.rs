//! Client session store.
//!
//! ARCHITECTURE
//! ============
//! One [`SessionStore`] owns the current [`Session`] (token + identity) and
//! is handed to whatever needs it; there is no global. Writes come from two
//! places: the provider run loop started by
//! [`SessionStore::subscribe_to_provider_changes`], and explicit calls from
//! login/logout flows. Readers take synchronous snapshots with
//! [`SessionStore::read`] or follow changes with [`SessionStore::watch`].
//!
//! ORDERING
//! ========
//! Every write bumps a generation counter. A token refresh started for a
//! provider notification remembers the generation it was issued under and
//! is applied only if nothing else was written meanwhile. A logout that
//! lands while a refresh is in flight therefore stays logged out.
//!
//! TRADE-OFFS
//! ==========
//! With [`RefreshFailurePolicy::RetainStale`] a failed refresh leaves the
//! previous token in place. The app stays usable through provider blips, but
//! a token revoked at the provider keeps being sent until the server rejects
//! it or the next notification arrives. [`RefreshFailurePolicy::Clear`]
//! trades that availability for prompt sign-out.

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use identity::Identity;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::provider::{IdentityProvider, ProviderEvent};

// =============================================================================
// SESSION
// =============================================================================

/// The client's current token and the identity it belongs to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub identity: Option<Identity>,
}

impl Session {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.identity.is_some()
    }
}

/// What to do with the session when a provider-driven token refresh fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RefreshFailurePolicy {
    /// Keep the last known token and identity.
    #[default]
    RetainStale,
    /// Drop the session.
    Clear,
}

impl RefreshFailurePolicy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RetainStale => "retain-stale",
            Self::Clear => "clear",
        }
    }
}

impl FromStr for RefreshFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "retain-stale" => Ok(Self::RetainStale),
            "clear" => Ok(Self::Clear),
            other => Err(format!(
                "unknown refresh failure policy '{other}' (expected 'retain-stale' or 'clear')"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubscribeError {
    /// A provider observer is already running for this store.
    #[error("session store already follows a provider")]
    AlreadySubscribed,
}

#[derive(Clone, Debug, Default)]
struct Versioned {
    session: Session,
    generation: u64,
}

// =============================================================================
// STORE
// =============================================================================

/// Shared handle to the session. Cloning yields another handle to the same state.
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<watch::Sender<Versioned>>,
    policy: RefreshFailurePolicy,
    /// Set while a [`ProviderSubscription`] for this store is alive.
    observed: Arc<AtomicBool>,
}

impl SessionStore {
    /// Create a store with an empty session.
    #[must_use]
    pub fn new(policy: RefreshFailurePolicy) -> Self {
        let (tx, _rx) = watch::channel(Versioned::default());
        Self { state: Arc::new(tx), policy, observed: Arc::new(AtomicBool::new(false)) }
    }

    #[must_use]
    pub fn policy(&self) -> RefreshFailurePolicy {
        self.policy
    }

    /// Snapshot of the current session. Never waits on I/O.
    #[must_use]
    pub fn read(&self) -> Session {
        self.state.borrow().session.clone()
    }

    /// Number of writes applied so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.state.borrow().generation
    }

    /// Follow session changes. Only writes that alter the session are observed.
    #[must_use]
    pub fn watch(&self) -> SessionWatch {
        SessionWatch { rx: self.state.subscribe() }
    }

    pub fn set_token(&self, token: Option<String>) {
        self.write(|s| s.token = token);
    }

    pub fn set_identity(&self, identity: Option<Identity>) {
        self.write(|s| s.identity = identity);
    }

    /// Set token and identity in one write.
    pub fn establish(&self, token: String, identity: Identity) {
        self.write(|s| {
            s.token = Some(token);
            s.identity = Some(identity);
        });
    }

    /// Clear token and identity in one write. Idempotent.
    pub fn clear(&self) {
        self.write(|s| *s = Session::default());
    }

    /// Start the provider observer.
    ///
    /// The returned handle keeps the run loop alive; release it (or drop
    /// it) at teardown. A store follows one provider at a time.
    ///
    /// # Errors
    ///
    /// [`SubscribeError::AlreadySubscribed`] while an earlier subscription
    /// on this store (or a clone of it) is still held.
    pub fn subscribe_to_provider_changes(
        &self,
        provider: Arc<dyn IdentityProvider>,
    ) -> Result<ProviderSubscription, SubscribeError> {
        if self.observed.swap(true, Ordering::SeqCst) {
            return Err(SubscribeError::AlreadySubscribed);
        }
        let mut events = provider.subscribe();
        let store = self.clone();
        let task = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                store.handle_provider_event(provider.as_ref(), event).await;
            }
            tracing::debug!("provider change stream closed");
        });
        Ok(ProviderSubscription { task, observed: Arc::clone(&self.observed) })
    }

    /// Apply one provider notification.
    pub(crate) async fn handle_provider_event(&self, provider: &dyn IdentityProvider, event: ProviderEvent) {
        let principal = match event {
            ProviderEvent::SignedOut => {
                tracing::debug!("provider reported sign-out");
                self.clear();
                return;
            }
            ProviderEvent::SignedIn(principal) => principal,
        };

        let ticket = self.write(|_| {});
        match provider.fresh_token(&principal).await {
            Ok(token) => {
                let identity = principal.identity();
                let applied = self.apply_if_current(ticket, |s| {
                    s.token = Some(token);
                    s.identity = Some(identity);
                });
                if applied {
                    tracing::debug!(uid = %principal.uid, "session refreshed from provider");
                } else {
                    tracing::debug!(uid = %principal.uid, ticket, "discarding superseded token refresh");
                }
            }
            Err(e) => match self.policy {
                RefreshFailurePolicy::RetainStale => {
                    tracing::warn!(error = %e, policy = self.policy.as_str(), "token refresh failed; keeping last known session");
                }
                RefreshFailurePolicy::Clear => {
                    tracing::warn!(error = %e, policy = self.policy.as_str(), "token refresh failed; clearing session");
                    self.apply_if_current(ticket, |s| *s = Session::default());
                }
            },
        }
    }

    /// Unconditional write. Returns the generation it was assigned.
    fn write(&self, f: impl FnOnce(&mut Session)) -> u64 {
        let mut generation = 0;
        self.state.send_if_modified(|v| {
            let before = v.session.clone();
            f(&mut v.session);
            v.generation += 1;
            generation = v.generation;
            v.session != before
        });
        generation
    }

    /// Write only if no other write happened since `ticket` was issued.
    fn apply_if_current(&self, ticket: u64, f: impl FnOnce(&mut Session)) -> bool {
        let mut applied = false;
        self.state.send_if_modified(|v| {
            if v.generation != ticket {
                return false;
            }
            let before = v.session.clone();
            f(&mut v.session);
            v.generation += 1;
            applied = true;
            v.session != before
        });
        applied
    }
}

// =============================================================================
// HANDLES
// =============================================================================

/// Receiver side of [`SessionStore::watch`].
pub struct SessionWatch {
    rx: watch::Receiver<Versioned>,
}

impl SessionWatch {
    #[must_use]
    pub fn current(&self) -> Session {
        self.rx.borrow().session.clone()
    }

    /// Wait for the next session change. `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<Session> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().session.clone())
    }
}

/// Keeps the provider observer running. Aborts it on release or drop.
#[must_use = "dropping the subscription stops provider updates"]
pub struct ProviderSubscription {
    task: JoinHandle<()>,
    observed: Arc<AtomicBool>,
}

impl ProviderSubscription {
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn release(self) {
        self.task.abort();
    }
}

impl Drop for ProviderSubscription {
    fn drop(&mut self) {
        self.task.abort();
        self.observed.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
