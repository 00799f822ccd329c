//! Head serialization shared by the server's response writer and the
//! client's request writer.
//!
//! Builds the start line and headers into a plain `Vec<u8>`, then hands
//! that and the body (however it's framed) to the connection writer.

use http::{HeaderMap, Method, StatusCode, Version};

fn write_version(out: &mut Vec<u8>, version: Version) {
    out.extend_from_slice(match version {
        Version::HTTP_10 => b"HTTP/1.0",
        _ => b"HTTP/1.1",
    });
}

fn write_headers(out: &mut Vec<u8>, headers: &HeaderMap) {
    for (name, value) in headers.iter() {
        out.extend_from_slice(name.as_str().as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"\r\n");
}

/// Writes a request line and headers: `METHOD target HTTP/1.1\r\n...`.
pub fn write_request_head(
    out: &mut Vec<u8>,
    method: &Method,
    target: &str,
    version: Version,
    headers: &HeaderMap,
) {
    out.extend_from_slice(method.as_str().as_bytes());
    out.push(b' ');
    out.extend_from_slice(target.as_bytes());
    out.push(b' ');
    write_version(out, version);
    out.extend_from_slice(b"\r\n");
    write_headers(out, headers);
}

/// Writes a status line and headers: `HTTP/1.1 200 OK\r\n...`. `reason`
/// overrides the status code's canonical reason phrase when set.
pub fn write_response_head(
    out: &mut Vec<u8>,
    version: Version,
    status: StatusCode,
    reason: Option<&str>,
    headers: &HeaderMap,
) {
    write_version(out, version);
    out.push(b' ');
    out.extend_from_slice(status.as_str().as_bytes());
    out.push(b' ');
    out.extend_from_slice(reason.unwrap_or_else(|| status.canonical_reason().unwrap_or("")).as_bytes());
    out.extend_from_slice(b"\r\n");
    write_headers(out, headers);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_request_line_and_headers() {
        let mut out = Vec::new();
        let mut headers = HeaderMap::new();
        headers.insert("host", "example.com".parse().unwrap());
        write_request_head(&mut out, &Method::GET, "/", Version::HTTP_11, &headers);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "GET / HTTP/1.1\r\nhost: example.com\r\n\r\n"
        );
    }

    #[test]
    fn writes_status_line_with_canonical_reason_phrase() {
        let mut out = Vec::new();
        write_response_head(&mut out, Version::HTTP_11, StatusCode::NOT_FOUND, None, &HeaderMap::new());
        assert_eq!(String::from_utf8(out).unwrap(), "HTTP/1.1 404 Not Found\r\n\r\n");
    }

    #[test]
    fn writes_status_line_with_overridden_reason_phrase() {
        let mut out = Vec::new();
        write_response_head(&mut out, Version::HTTP_11, StatusCode::NOT_FOUND, Some("Nope"), &HeaderMap::new());
        assert_eq!(String::from_utf8(out).unwrap(), "HTTP/1.1 404 Nope\r\n\r\n");
    }
}
