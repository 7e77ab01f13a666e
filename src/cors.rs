// ABOUTME: Per-request CORS origin negotiation from a static allow-list
// ABOUTME: Allow-listed origins get a verbatim echo, everyone else gets "*"

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;

use crate::AppState;

const ALLOW_METHODS_READ: &str = "GET,HEAD,OPTIONS";
const ALLOW_METHODS_UPLOAD: &str = "GET,HEAD,POST,PUT,OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization, Range";

/// Trusted front-end origins. Loaded once at startup, immutable for the
/// process lifetime.
pub struct OriginAllowList {
    origins: Vec<String>,
}

impl OriginAllowList {
    pub fn new(origins: Vec<String>) -> Self {
        Self { origins }
    }

    pub fn from_csv(csv: &str) -> Self {
        Self::new(
            csv.split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Pick the Access-Control-Allow-Origin value for a request.
    ///
    /// An allow-listed origin is echoed back verbatim, which is what
    /// browsers require for credentialed cross-origin reads. Everything
    /// else (including requests with no Origin header) gets the wildcard:
    /// served assets are public media, so anonymous `<img>`-style fetches
    /// stay unrestricted.
    pub fn negotiate(&self, request_origin: Option<&str>) -> String {
        match request_origin {
            Some(origin) if self.origins.iter().any(|o| o == origin) => origin.to_string(),
            _ => "*".to_string(),
        }
    }
}

/// Middleware that stamps negotiated CORS headers onto every response.
/// Running as a response map guarantees error exits and the router
/// fallback carry the headers too, so browser-side error handling gets a
/// readable response instead of an opaque CORS failure.
pub async fn negotiate_response_origin(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let allow_origin = state.config.origins.negotiate(origin.as_deref());
    // The upload route also takes POST/PUT; a preflighted editor upload
    // must see those advertised or the browser blocks it
    let allow_methods = if req.uri().path() == "/upload" {
        ALLOW_METHODS_UPLOAD
    } else {
        ALLOW_METHODS_READ
    };

    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_str(&allow_origin).unwrap_or(HeaderValue::from_static("*")),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(allow_methods),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    response
}
