use std::collections::HashMap;

/// A parsed HTTP request.
///
/// The method is kept as the raw token: the server treats every method as a
/// GET-style fetch, so there is nothing to dispatch on. Request bodies are
/// consumed during parsing for keep-alive framing and discarded.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method token (e.g. "GET"), uninterpreted.
    pub method: String,
    /// The request target (e.g. "/index.html", may carry a query string).
    pub path: String,
    /// HTTP version (typically "HTTP/1.1").
    pub version: String,
    /// Request headers as key-value pairs.
    pub headers: HashMap<String, String>,
}

impl Request {
    /// A bare GET request for the given path, for tests and internal use.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            path: path.into(),
            version: "HTTP/1.1".to_string(),
            headers: HashMap::new(),
        }
    }

    /// Header lookup by exact name.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|v| v.as_str())
    }

    /// Whether the connection should stay open after the response.
    ///
    /// An explicit `Connection` header wins; without one, HTTP/1.1
    /// defaults to keep-alive and older versions to close.
    pub fn keep_alive(&self) -> bool {
        match self.header("Connection") {
            Some(v) => v.eq_ignore_ascii_case("keep-alive"),
            None => self.version == "HTTP/1.1",
        }
    }
}
