//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers and middleware via the `State`
//! extractor. It holds only the collaborators the gate and handlers call
//! out to; no per-request or per-user data lives here.

use std::sync::Arc;
use std::time::Duration;

use crate::services::profile::ProfileResolver;
use crate::services::verifier::TokenVerifier;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Copy.
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<dyn TokenVerifier>,
    pub profiles: Arc<dyn ProfileResolver>,
    /// Upper bound for one verification round trip in the gate.
    pub verify_timeout: Duration,
}

impl AppState {
    #[must_use]
    pub fn new(verifier: Arc<dyn TokenVerifier>, profiles: Arc<dyn ProfileResolver>, verify_timeout: Duration) -> Self {
        Self { verifier, profiles, verify_timeout }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
