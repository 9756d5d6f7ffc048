mod error;
pub mod events;
mod handlers;
mod middleware;

use crate::runner::Orchestrator;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Screenshots arrive base64-encoded in the body
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub api_key: Option<String>,
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/personas", get(handlers::list_personas))
        .route("/api/feedback", post(handlers::feedback))
        .route("/api/feedback/stream", post(handlers::feedback_stream))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_api_key,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(api)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(axum::middleware::from_fn(middleware::log_requests))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let auth = if state.api_key.is_some() {
        "API key required"
    } else {
        "no API key"
    };
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    let addr = listener.local_addr()?;
    info!("panelrev listening on http://{addr} ({auth})");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("panelrev shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
