//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Public routes (`/auth/verify`, `/healthz`) sit beside the identity-gated
//! routes. Gated routes get `auth::require_identity` as a route layer so the
//! gate runs only for matched paths and always before the handler.

pub mod auth;
pub mod user;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Router, middleware};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let gated = Router::new()
        .route("/user/profile", get(user::profile))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_identity));

    Router::new()
        .merge(gated)
        .route("/auth/verify", post(auth::verify))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
