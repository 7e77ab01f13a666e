// ABOUTME: Content type inference from storage key extensions
// ABOUTME: Key-only lookup, never sniffs file contents

/// Fallback for unknown or missing extensions.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Resolve the MIME type for a storage key from its file extension.
/// Extension matching is case-insensitive. Returns the generic binary
/// type when the extension is unknown or absent.
pub fn resolve(key: &str) -> &'static str {
    let extension = match key.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => return OCTET_STREAM,
    };

    match extension.as_str() {
        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        // Video
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        // Audio
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        "wav" => "audio/wav",
        // Documents and text
        "pdf" => "application/pdf",
        "json" => "application/json",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "text/javascript",
        "txt" => "text/plain",
        "xml" => "application/xml",
        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        _ => OCTET_STREAM,
    }
}

/// File extension for a declared MIME type, used when generating upload
/// keys. Unknown types get "bin".
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/avif" => "avif",
        "image/svg+xml" => "svg",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        "audio/mpeg" => "mp3",
        "audio/ogg" => "ogg",
        "application/pdf" => "pdf",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(resolve("blog/photo.png"), "image/png");
        assert_eq!(resolve("blog/photo.jpg"), "image/jpeg");
        assert_eq!(resolve("blog/photo.jpeg"), "image/jpeg");
        assert_eq!(resolve("products/spec.pdf"), "application/pdf");
        assert_eq!(resolve("nature/clip.mp4"), "video/mp4");
    }

    #[test]
    fn test_extension_case_insensitive() {
        assert_eq!(resolve("blog/PHOTO.PNG"), "image/png");
        assert_eq!(resolve("blog/photo.JpG"), "image/jpeg");
    }

    #[test]
    fn test_unknown_or_missing_extension_falls_back() {
        assert_eq!(resolve("blog/archive.xyz"), OCTET_STREAM);
        assert_eq!(resolve("blog/no-extension"), OCTET_STREAM);
        assert_eq!(resolve("trailing-dot."), OCTET_STREAM);
    }

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("image/png"), "png");
        assert_eq!(extension_for("application/x-unknown"), "bin");
    }
}
