use std::collections::HashMap;
use std::path::Path;

/// Fallback content type for extensions not in the table.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Immutable extension → content-type table.
///
/// Built once at startup and shared read-only by every connection; lookups
/// are pure and safe under unlimited concurrency. Keys carry the leading
/// dot and are lower-case.
#[derive(Debug)]
pub struct MimeTable {
    types: HashMap<&'static str, &'static str>,
}

impl MimeTable {
    pub fn new() -> Self {
        let types = HashMap::from([
            (".html", "text/html"),
            (".css", "text/css"),
            (".js", "application/javascript"),
            (".json", "application/json"),
            (".png", "image/png"),
            (".jpg", "image/jpeg"),
            (".jpeg", "image/jpeg"),
            (".gif", "image/gif"),
            (".svg", "image/svg+xml"),
            (".webp", "image/webp"),
            (".ico", "image/x-icon"),
            (".woff", "font/woff"),
            (".woff2", "font/woff2"),
            (".ttf", "font/ttf"),
            (".eot", "application/vnd.ms-fontobject"),
        ]);
        Self { types }
    }

    /// Looks up a dotted, lower-cased extension (e.g. ".css").
    pub fn lookup(&self, ext: &str) -> &'static str {
        self.types.get(ext).copied().unwrap_or(OCTET_STREAM)
    }

    /// Classifies a path by its extension, lower-casing it first.
    /// Paths without an extension map to `application/octet-stream`.
    pub fn classify(&self, path: &Path) -> &'static str {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => self.lookup(&format!(".{}", ext.to_ascii_lowercase())),
            None => OCTET_STREAM,
        }
    }
}

impl Default for MimeTable {
    fn default() -> Self {
        Self::new()
    }
}
