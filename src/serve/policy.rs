use std::path::Path;

use crate::http::response::{Response, ResponseBuilder, StatusCode};

/// Cache directive for long-lived static assets. Build outputs carry hashed
/// filenames, so a year of immutability is safe.
pub const CACHE_IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// Whether an asset class gets the immutable cache directive: stylesheets,
/// scripts, images, and fonts do; everything else (notably HTML) gets no
/// Cache-Control header at all. The omission is deliberate, not a missing
/// `no-cache`: the app shell must always revalidate through default
/// heuristics while hashed assets pin forever.
pub fn is_cacheable(path: &Path, content_type: &str) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    matches!(ext.as_deref(), Some("css") | Some("js"))
        || content_type.starts_with("image/")
        || content_type.starts_with("font/")
        || content_type == "application/vnd.ms-fontobject"
}

/// Builds the 200 response for a successfully read file: content type from
/// the classifier, the fixed security header set, and conditionally the
/// cache directive.
pub fn success(path: &Path, content_type: &str, body: Vec<u8>) -> Response {
    let mut builder = security_headers(
        ResponseBuilder::new(StatusCode::Ok).header("Content-Type", content_type),
    );

    if is_cacheable(path, content_type) {
        builder = builder.header("Cache-Control", CACHE_IMMUTABLE);
    }

    builder.body(body).build()
}

/// Builds the 200 app-shell response used by the SPA fallback: always
/// text/html, never cached.
pub fn spa_fallback(body: Vec<u8>) -> Response {
    security_headers(ResponseBuilder::new(StatusCode::Ok).header("Content-Type", "text/html"))
        .body(body)
        .build()
}

fn security_headers(builder: ResponseBuilder) -> ResponseBuilder {
    builder
        .header("X-Content-Type-Options", "nosniff")
        .header("X-Frame-Options", "SAMEORIGIN")
        .header("Referrer-Policy", "strict-origin-when-cross-origin")
}
