//! In-memory identity provider for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{mpsc, oneshot};

use crate::provider::{ChangeNotifier, IdentityProvider, Principal, ProviderError, ProviderEvent};

/// Holds a refresh until the test releases it.
pub struct RefreshGate {
    started: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

/// Test-side ends of a [`RefreshGate`].
pub struct RefreshControl {
    pub started: oneshot::Receiver<()>,
    pub release: oneshot::Sender<()>,
}

#[derive(Default)]
pub struct MockProvider {
    notifier: ChangeNotifier,
    accounts: Mutex<HashMap<String, (String, Principal)>>,
    tokens: Mutex<HashMap<String, Result<String, ProviderError>>>,
    current: Mutex<Option<Principal>>,
    gate: Mutex<Option<RefreshGate>>,
    unreachable: Mutex<bool>,
    pub refresh_calls: AtomicUsize,
    pub sign_out_calls: AtomicUsize,
}

impl MockProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account whose refreshes return `token`.
    #[must_use]
    pub fn with_account(self, uid: &str, email: &str, password: &str, token: &str) -> Self {
        self.accounts
            .lock()
            .expect("mock mutex should lock")
            .insert(email.to_owned(), (password.to_owned(), Principal::new(uid, email)));
        self.set_token(uid, Ok(token.to_owned()));
        self
    }

    pub fn set_token(&self, uid: &str, outcome: Result<String, ProviderError>) {
        self.tokens
            .lock()
            .expect("mock mutex should lock")
            .insert(uid.to_owned(), outcome);
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        *self.unreachable.lock().expect("mock mutex should lock") = unreachable;
    }

    /// Make the next `fresh_token` call wait until released.
    pub fn hold_next_refresh(&self) -> RefreshControl {
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        *self.gate.lock().expect("mock mutex should lock") =
            Some(RefreshGate { started: started_tx, release: release_rx });
        RefreshControl { started: started_rx, release: release_tx }
    }

    /// Push a notification as if the provider's state changed on its own.
    pub fn emit(&self, event: ProviderEvent) {
        *self.current.lock().expect("mock mutex should lock") = match &event {
            ProviderEvent::SignedIn(p) => Some(p.clone()),
            ProviderEvent::SignedOut => None,
        };
        self.notifier.emit(&event);
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    fn authenticate(&self, email: &str, password: &str) -> Result<Principal, ProviderError> {
        if *self.unreachable.lock().expect("mock mutex should lock") {
            return Err(ProviderError::Unreachable("network down".into()));
        }
        let accounts = self.accounts.lock().expect("mock mutex should lock");
        match accounts.get(email) {
            Some((expected, principal)) if expected == password => Ok(principal.clone()),
            _ => Err(ProviderError::CredentialRejected("INVALID_LOGIN_CREDENTIALS".into())),
        }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for MockProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Principal, ProviderError> {
        let principal = self.authenticate(email, password)?;
        self.emit(ProviderEvent::SignedIn(principal.clone()));
        Ok(principal)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Principal, ProviderError> {
        if *self.unreachable.lock().expect("mock mutex should lock") {
            return Err(ProviderError::Unreachable("network down".into()));
        }
        if password.len() < 6 {
            return Err(ProviderError::CredentialRejected("WEAK_PASSWORD".into()));
        }
        let principal = {
            let mut accounts = self.accounts.lock().expect("mock mutex should lock");
            if accounts.contains_key(email) {
                return Err(ProviderError::CredentialRejected("EMAIL_EXISTS".into()));
            }
            let principal = Principal::new(format!("uid-{}", accounts.len() + 1), email);
            accounts.insert(email.to_owned(), (password.to_owned(), principal.clone()));
            principal
        };
        self.set_token(&principal.uid, Ok(format!("token-for-{}", principal.uid)));
        self.emit(ProviderEvent::SignedIn(principal.clone()));
        Ok(principal)
    }

    async fn sign_out(&self) {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        self.emit(ProviderEvent::SignedOut);
    }

    async fn fresh_token(&self, principal: &Principal) -> Result<String, ProviderError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().expect("mock mutex should lock").take();
        if let Some(gate) = gate {
            let _ = gate.started.send(());
            let _ = gate.release.await;
        }
        self.tokens
            .lock()
            .expect("mock mutex should lock")
            .get(&principal.uid)
            .cloned()
            .unwrap_or(Err(ProviderError::NoCurrentUser))
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<ProviderEvent> {
        let current = self.current.lock().expect("mock mutex should lock").clone();
        self.notifier.subscribe(ProviderEvent::from_principal(current))
    }
}
