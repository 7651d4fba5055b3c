/// HTTP status codes the server emits.
///
/// A successful serve is always 200; unresolved paths end in 404 and read
/// failures on existing files in 500. Nothing else is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 404 Not Found
    NotFound,
    /// 500 Internal Server Error
    InternalServerError,
}

impl StatusCode {
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
        }
    }

    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

/// A complete HTTP response ready to be written to a client.
///
/// Headers are an ordered list and are fully determined before the first
/// body byte is written; nothing mutates a response after it is built.
#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    /// Headers, emitted in insertion order.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Builder for constructing responses in a fluent style.
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl ResponseBuilder {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Appends a header. Order is preserved on the wire.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Builds the final response, appending Content-Length if absent.
    pub fn build(mut self) -> Response {
        if !self
            .headers
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case("Content-Length"))
        {
            self.headers
                .push(("Content-Length".to_string(), self.body.len().to_string()));
        }

        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Response {
    /// Looks up a header value by name, case-insensitively.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// 404 with the plain-text body clients of the original server expect.
    pub fn not_found() -> Self {
        ResponseBuilder::new(StatusCode::NotFound)
            .body(b"404 - File not found".to_vec())
            .build()
    }

    /// 500 with a plain-text body.
    pub fn internal_error() -> Self {
        ResponseBuilder::new(StatusCode::InternalServerError)
            .body(b"500 - Internal server error".to_vec())
            .build()
    }
}
