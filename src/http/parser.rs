use crate::http::request::Request;
use std::collections::HashMap;

#[derive(Debug)]
pub enum ParseError {
    InvalidRequest,
    InvalidHeader,
    InvalidContentLength,
    Incomplete,
}

/// Parses one HTTP request from the front of `buf`.
///
/// Returns the request and the number of bytes consumed, including any body
/// announced by Content-Length. The body itself is discarded: every method
/// is served as a fetch, but the bytes must still be consumed so the next
/// pipelined request starts at the right offset.
pub fn parse_http_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    let headers_end = find_headers_end(buf).ok_or(ParseError::Incomplete)?;
    let header_bytes = &buf[..headers_end];
    let body_bytes = &buf[headers_end + 4..];

    let headers_str = std::str::from_utf8(header_bytes).map_err(|_| ParseError::InvalidRequest)?;

    let mut lines = headers_str.split("\r\n");

    // Request line: METHOD target VERSION. Any method token is accepted;
    // the server does not branch on it.
    let request_line = lines.next().ok_or(ParseError::InvalidRequest)?;
    let mut parts = request_line.split_whitespace();

    let method = parts.next().ok_or(ParseError::InvalidRequest)?;
    let path = parts.next().ok_or(ParseError::InvalidRequest)?;
    let version = parts.next().ok_or(ParseError::InvalidRequest)?;

    if method.is_empty() || !path.starts_with('/') {
        return Err(ParseError::InvalidRequest);
    }

    let mut headers = HashMap::new();

    for line in lines {
        if line.is_empty() {
            continue;
        }

        let (key, value) = line.split_once(':').ok_or(ParseError::InvalidHeader)?;

        headers.insert(key.trim().to_string(), value.trim().to_string());
    }

    let content_length = headers
        .get("Content-Length")
        .map(|v| v.parse::<usize>().map_err(|_| ParseError::InvalidContentLength))
        .transpose()?
        .unwrap_or(0);

    if body_bytes.len() < content_length {
        return Err(ParseError::Incomplete);
    }

    let request = Request {
        method: method.to_string(),
        path: path.to_string(),
        version: version.to_string(),
        headers,
    };

    let total_consumed = headers_end + 4 + content_length;
    Ok((request, total_consumed))
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";

        let (parsed, consumed) = parse_http_request(req).unwrap();

        assert_eq!(parsed.path, "/");
        assert_eq!(parsed.headers.get("Host").unwrap(), "example.com");
        assert_eq!(consumed, req.len());
    }

    #[test]
    fn body_is_consumed_but_dropped() {
        let req = b"POST /submit HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";

        let (parsed, consumed) = parse_http_request(req).unwrap();

        assert_eq!(parsed.method, "POST");
        assert_eq!(consumed, req.len());
    }
}
