mod config;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use services::profile::StaticProfileStore;
use services::verifier::IdentityToolkitVerifier;

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("failed to load .env: {e}");
        }
    }
    tracing_subscriber::fmt::init();

    let config = config::ServerConfig::from_env().expect("invalid server configuration");

    let verifier = IdentityToolkitVerifier::new(&config.identity).expect("identity verifier init failed");
    tracing::info!(
        base_url = %config.identity.base_url,
        project_id = config.identity.credentials.project_id.as_deref().unwrap_or("-"),
        verify_timeout_ms = u64::try_from(config.identity.verify_timeout.as_millis()).unwrap_or(u64::MAX),
        "identity verifier initialized"
    );

    let state = state::AppState::new(Arc::new(verifier), Arc::new(StaticProfileStore), config.identity.verify_timeout);

    let app = routes::app(state);
    let port = config.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "seatscout server listening");
    axum::serve(listener, app).await.expect("server failed");
}
