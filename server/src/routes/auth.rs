//! Auth routes: bearer-token gate middleware and token verification.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use identity::{VerifyRequest, VerifyResponse};

use crate::services::gate::{self, GateError};
use crate::state::AppState;

// =============================================================================
// GATE MIDDLEWARE
// =============================================================================

/// Require a verified bearer token before the wrapped route runs.
///
/// On success the [`gate::VerifiedIdentity`] is inserted into request
/// extensions for the handler to extract. On failure the handler is never
/// called. If the client goes away mid-verification this future is dropped,
/// so no identity is attached and nothing downstream runs.
pub async fn require_identity(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let verified = gate::authenticate(state.verifier.as_ref(), request.headers(), state.verify_timeout).await;
    match verified {
        Ok(identity) => {
            tracing::debug!(subject_id = identity.subject_id(), path = %request.uri().path(), "request authenticated");
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(err) => {
            log_rejection(&err, request.uri().path());
            err.into_response()
        }
    }
}

fn log_rejection(err: &GateError, path: &str) {
    match err {
        GateError::InvalidCredential(cause) => {
            tracing::warn!(reason = err.reason(), error = %cause, %path, "auth gate rejected request");
        }
        _ => tracing::info!(reason = err.reason(), %path, "auth gate rejected request"),
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `POST /auth/verify`: verify an ID token and echo the identity it proves.
pub async fn verify(State(state): State<AppState>, body: Result<Json<VerifyRequest>, JsonRejection>) -> Response {
    let Ok(Json(req)) = body else {
        log_rejection(&GateError::MalformedCredential, "/auth/verify");
        return gate::unauthorized();
    };
    if req.id_token.is_empty() {
        log_rejection(&GateError::MissingCredential, "/auth/verify");
        return gate::unauthorized();
    }

    match gate::verify_token(state.verifier.as_ref(), &req.id_token, state.verify_timeout).await {
        Ok(identity) => Json(VerifyResponse::valid(identity.as_identity())).into_response(),
        Err(err) => {
            log_rejection(&err, "/auth/verify");
            err.into_response()
        }
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
