use std::sync::Arc;

use crate::config::Config;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::serve::mime::MimeTable;
use crate::serve::policy;
use crate::serve::resolve::{ResolveError, Resolver};

/// Serves files from the configured root, falling back to the default
/// document for unresolved paths when SPA fallback is enabled.
///
/// State machine per request:
///
/// ```text
/// RESOLVE → SERVE    → 200 | 500
///         → FALLBACK → 200 | 404
/// ```
#[derive(Debug)]
pub struct StaticHandler {
    resolver: Resolver,
    mime: Arc<MimeTable>,
    spa_fallback: bool,
}

impl StaticHandler {
    pub fn new(cfg: &Config, mime: Arc<MimeTable>) -> Self {
        Self {
            resolver: Resolver::new(cfg),
            mime,
            spa_fallback: cfg.spa_fallback,
        }
    }

    /// Handles one request. All errors are resolved into a response here;
    /// nothing propagates past the connection.
    pub async fn handle(&self, req: &Request) -> Response {
        let resolved = match self.resolver.resolve(&req.path).await {
            Ok(r) => r,
            Err(ResolveError::OutsideRoot) => {
                // A traversal attempt, not a client-side route. No SPA
                // fallback for these.
                tracing::warn!(path = %req.path, "rejected request outside root");
                return Response::not_found();
            }
        };

        if resolved.exists && !resolved.is_dir {
            match tokio::fs::read(&resolved.path).await {
                Ok(body) => {
                    let content_type = self.mime.classify(&resolved.path);
                    policy::success(&resolved.path, content_type, body)
                }
                Err(e) => {
                    tracing::error!(path = %resolved.path.display(), error = %e, "failed to read file");
                    Response::internal_error()
                }
            }
        } else {
            self.fallback(&req.path).await
        }
    }

    /// The path did not resolve to a file. Serve the app shell so the
    /// client-side router can take over, or a plain 404 when the shell is
    /// missing or SPA fallback is disabled.
    async fn fallback(&self, request_path: &str) -> Response {
        if self.spa_fallback {
            let index = self.resolver.index_path();
            if let Ok(body) = tokio::fs::read(&index).await {
                tracing::debug!(path = %request_path, "serving SPA fallback");
                return policy::spa_fallback(body);
            }
        }

        tracing::debug!(path = %request_path, "not found");
        Response::not_found()
    }
}
