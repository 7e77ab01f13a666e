// ABOUTME: Process configuration loaded once from the environment
// ABOUTME: Allow-lists are immutable for the process lifetime

use std::env;

use crate::cors::OriginAllowList;
use crate::policy::PrefixAllowList;

/// Maximum upload size accepted by the gateway (25 MB) unless overridden.
const DEFAULT_MAX_UPLOAD_SIZE: usize = 25 * 1024 * 1024;

/// Gateway configuration. Constructed at process start and passed by
/// reference into the handlers; never mutated afterwards.
pub struct Config {
    /// Backing bucket name.
    pub bucket: String,
    /// Base URL under which stored objects are publicly reachable.
    /// Durable URLs returned by the upload path are `{public_base_url}/{key}`.
    pub public_base_url: String,
    /// Listen port.
    pub port: u16,
    /// Path prefixes readable through the gateway.
    pub prefixes: PrefixAllowList,
    /// Front-end origins that get a verbatim CORS echo.
    pub origins: OriginAllowList,
    /// Prefix under which generated upload keys are placed.
    pub upload_prefix: String,
    /// Upload body cap in bytes.
    pub max_upload_size: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            bucket: env::var("GCS_BUCKET").unwrap_or_else(|_| "site-assets".to_string()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string())
                .trim_end_matches('/')
                .to_string(),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            prefixes: PrefixAllowList::from_csv(
                &env::var("ALLOWED_PREFIXES")
                    .unwrap_or_else(|_| "products,blog,nature,avatars,blog-content".to_string()),
            ),
            origins: OriginAllowList::from_csv(
                &env::var("ALLOWED_ORIGINS").unwrap_or_default(),
            ),
            upload_prefix: env::var("UPLOAD_PREFIX")
                .unwrap_or_else(|_| "blog-content".to_string()),
            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_SIZE),
        }
    }
}
