//! User profile routes.

use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use identity::ErrorBody;

use crate::services::gate::VerifiedIdentity;
use crate::state::AppState;

/// `GET /user/profile`: return the profile of the authenticated caller.
///
/// Must be mounted behind `auth::require_identity`; the identity comes from
/// the gate, never from the request itself.
pub async fn profile(State(state): State<AppState>, Extension(identity): Extension<VerifiedIdentity>) -> Response {
    match state.profiles.find_by_email(identity.email()).await {
        Ok(Some(profile)) => Json(profile).into_response(),
        Ok(None) => {
            tracing::info!(subject_id = identity.subject_id(), "no profile for verified identity");
            (StatusCode::NOT_FOUND, Json(ErrorBody::new("profile not found"))).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, subject_id = identity.subject_id(), "profile lookup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::new("internal error"))).into_response()
        }
    }
}

#[cfg(test)]
#[path = "user_test.rs"]
mod tests;
