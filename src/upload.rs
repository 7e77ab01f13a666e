// ABOUTME: Upload surface consumed by the editor bridge
// ABOUTME: Persists bytes under content-derived keys and returns durable URLs

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::GatewayError;
use crate::storage::StorageError;
use crate::{mime, sanitize, AppState};

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    /// Explicit target key. When absent the gateway derives one from the
    /// content hash, which makes concurrent uploads collision-free.
    pub key: Option<String>,
}

/// Returned to the uploader. `url` is the durable replacement for the
/// caller's transient reference.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub content_type: String,
}

/// POST /upload (also PUT) - Persist raw bytes and return the durable URL.
///
/// The declared Content-Type header is trusted as-is; absent, the payload
/// is treated as opaque binary. Client-supplied keys pass the same
/// traversal check as the read path plus the prefix allow-list, so a
/// malicious uploader cannot write outside intended prefixes. Storage
/// failures map to 502 and are not retried here; retry policy belongs to
/// the caller.
pub async fn handle_upload(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UploadResponse>, GatewayError> {
    if body.is_empty() {
        return Err(GatewayError::BadRequest("empty upload body".into()));
    }
    // The body-limit layer already caps extraction; this guards the
    // handler's own contract independent of how the body arrived
    if body.len() > state.config.max_upload_size {
        return Err(GatewayError::TooLarge(format!(
            "upload exceeds {} bytes",
            state.config.max_upload_size
        )));
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(mime::OCTET_STREAM)
        .to_string();

    let key = match params.key {
        Some(requested) => {
            let key = sanitize::sanitize(&requested)?;
            if !state.config.prefixes.is_allowed(&key) {
                return Err(GatewayError::Forbidden(format!(
                    "prefix not allow-listed: {key}"
                )));
            }
            key
        }
        None => generate_key(&state.config.upload_prefix, &body, &content_type),
    };

    let size = body.len() as u64;

    state
        .store
        .put(&key, body, &content_type)
        .await
        .map_err(|e| match e {
            // A missing object is not a meaningful write outcome; treat
            // everything as an upstream failure
            StorageError::NotFound(msg) | StorageError::Transient(msg) => {
                GatewayError::Upstream(msg)
            }
        })?;

    tracing::info!(key = %key, size, content_type = %content_type, "stored upload");

    Ok(Json(UploadResponse {
        url: format!("{}/{}", state.config.public_base_url, key),
        size,
        content_type,
    }))
}

/// Derive a content-addressed key: `{prefix}/{sha256(bytes)}.{ext}`.
/// Identical payloads land on the same key, which makes re-uploads
/// harmless overwrites of identical bytes.
fn generate_key(prefix: &str, bytes: &Bytes, content_type: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let hash = hex::encode(hasher.finalize());
    format!("{}/{}.{}", prefix, hash, mime::extension_for(content_type))
}
