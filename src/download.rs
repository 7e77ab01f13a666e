// ABOUTME: Public GET surface - validates, authorizes, fetches and streams
// ABOUTME: Served objects are immutable, so responses cache for a year

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::error::GatewayError;
use crate::storage::StorageError;
use crate::{mime, sanitize, AppState};

/// Objects are content-addressed and never overwritten once served, so
/// clients may cache them indefinitely.
const CACHE_FOREVER: &str = "public, max-age=31536000, immutable";

/// GET /<key> - Stream an object from the backing store.
///
/// Request flow, with an early exit at every step: sanitize the raw path
/// (400), check the prefix allow-list (403), fetch from storage (404/500),
/// respond with content type and caching headers. CORS headers are stamped
/// on by the middleware layer for every exit path.
pub async fn handle_download(
    State(state): State<Arc<AppState>>,
    Path(raw_path): Path<String>,
) -> Result<Response, GatewayError> {
    let key = sanitize::sanitize(&raw_path)?;

    if !state.config.prefixes.is_allowed(&key) {
        return Err(GatewayError::Forbidden(format!(
            "prefix not allow-listed: {key}"
        )));
    }

    let bytes = state.store.get(&key).await.map_err(|e| match e {
        StorageError::NotFound(_) => GatewayError::NotFound(key.clone()),
        StorageError::Transient(msg) => GatewayError::Storage(msg),
    })?;

    tracing::info!(key = %key, size = bytes.len(), "serving object");

    Ok((
        [
            (header::CONTENT_TYPE, mime::resolve(&key)),
            (header::CACHE_CONTROL, CACHE_FOREVER),
        ],
        bytes,
    )
        .into_response())
}
