// ABOUTME: Asset gateway library - routes public asset reads and editor uploads
// ABOUTME: to object storage behind prefix allow-list and CORS negotiation

pub mod bridge;
pub mod config;
pub mod cors;
pub mod download;
pub mod error;
pub mod mime;
pub mod policy;
pub mod sanitize;
pub mod storage;
pub mod upload;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;

use crate::config::Config;
use crate::storage::ObjectStore;

/// Shared state for all request handlers. Built once at startup;
/// nothing in here is mutated after construction.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ObjectStore>,
}

/// Build the gateway router. Split out from `main` so integration tests
/// can serve it on an ephemeral listener with an in-memory store.
pub fn router(state: Arc<AppState>) -> Router {
    let max_upload_size = state.config.max_upload_size;

    Router::new()
        .route("/", get(handle_empty_path).options(handle_cors_preflight))
        .route("/healthz", get(handle_healthz))
        .route(
            "/upload",
            post(upload::handle_upload)
                .put(upload::handle_upload)
                .options(handle_cors_preflight),
        )
        .route(
            "/{*key}",
            get(download::handle_download).options(handle_cors_preflight),
        )
        .layer(DefaultBodyLimit::max(max_upload_size))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            cors::negotiate_response_origin,
        ))
        .with_state(state)
}

async fn handle_healthz() -> &'static str {
    "ok"
}

/// GET / - the wildcard route never sees an empty key, so the
/// sanitizer's empty-path rejection is surfaced here.
async fn handle_empty_path() -> error::GatewayError {
    error::GatewayError::BadRequest("empty path".into())
}

/// CORS preflight response. The negotiated Access-Control headers are
/// added by the middleware layer like every other response.
async fn handle_cors_preflight() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [("Access-Control-Max-Age", "86400")],
    )
}
