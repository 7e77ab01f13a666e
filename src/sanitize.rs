// ABOUTME: Structural validation of raw request paths before storage access
// ABOUTME: Rejects empty paths and parent-directory traversal, nothing else

use crate::error::GatewayError;

/// Validate a raw request path into a storage key.
///
/// Only two structural invariants are enforced here: the path must be
/// non-empty and must not contain a `..` traversal sequence anywhere.
/// Prefix legality is a separate concern handled by the allow-list, so
/// the list can change without touching validation.
///
/// Sanitizing an already-sanitized key yields the same key.
pub fn sanitize(raw_path: &str) -> Result<String, GatewayError> {
    if raw_path.is_empty() {
        return Err(GatewayError::BadRequest("empty path".into()));
    }
    if raw_path.contains("..") {
        return Err(GatewayError::BadRequest(
            "path contains traversal sequence".into(),
        ));
    }
    Ok(raw_path.to_string())
}
