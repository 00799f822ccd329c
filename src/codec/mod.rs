//! Incremental HTTP/1.1 wire encoding.
//!
//! Head parsing (via `httparse`) and body-framing decisions (an `Encoding`
//! enum) live here; the parts that need an open connection (reading more
//! bytes, writing to the socket) live in [`crate::server`] and
//! [`crate::client`].

pub mod chunk;
pub mod request;
pub mod response;
pub mod sse;
pub mod write;

pub use chunk::{ChunkDecoder, ChunkEvent};
pub use sse::SseDecoder;

use headers::HeaderMapExt;
use http::HeaderMap;

use crate::error::{Error, Result};

/// How a message body is framed on the wire, decided once the head is
/// parsed and reused by both the reader and any downstream consumer that
/// needs to know when the body ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// `Content-Length: N`: exactly `N` bytes follow.
    FixedLength(u64),
    /// `Transfer-Encoding: chunked`.
    Chunked,
    /// Neither header present: body runs until the connection closes.
    /// Only valid for responses; a request with neither header has no body
    /// at all.
    CloseDelimited,
}

/// Determines body framing from a parsed header map.
/// `chunked` takes precedence over `Content-Length` if both are present,
/// per RFC 7230 §3.3.3, read from the two typed headers via
/// `headers::HeaderMapExt`.
///
/// `default_to_close` controls what happens when neither header is
/// present: `true` for responses (EOF-terminated body), `false` for
/// requests (no body).
pub fn encoding_from_headers(headers: &HeaderMap, default_to_close: bool) -> Result<Encoding> {
    if let Some(encoding) = headers.typed_try_get::<headers::TransferEncoding>()? {
        if !encoding.is_chunked() {
            return Err(Error::protocol("unsupported transfer-encoding"));
        }
        return Ok(Encoding::Chunked);
    }

    if let Some(len) = headers.typed_try_get::<headers::ContentLength>()? {
        return Ok(Encoding::FixedLength(len.0));
    }

    if default_to_close {
        Ok(Encoding::CloseDelimited)
    } else {
        Ok(Encoding::FixedLength(0))
    }
}

/// Scans `buf` for the blank line ending an HTTP head and returns the
/// number of bytes (including the blank line) that make up the head, or
/// `None` if the head hasn't fully arrived yet.
pub(crate) fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|pos| pos + 4)
        .or_else(|| {
            buf.windows(2)
                .position(|w| w == b"\n\n")
                .map(|pos| pos + 2)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
    use http::HeaderValue;

    #[test]
    fn chunked_takes_precedence_over_content_length() {
        let mut headers = HeaderMap::new();
        headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("10"));
        assert_eq!(encoding_from_headers(&headers, true).unwrap(), Encoding::Chunked);
    }

    #[test]
    fn missing_headers_default_per_role() {
        let headers = HeaderMap::new();
        assert_eq!(
            encoding_from_headers(&headers, true).unwrap(),
            Encoding::CloseDelimited
        );
        assert_eq!(
            encoding_from_headers(&headers, false).unwrap(),
            Encoding::FixedLength(0)
        );
    }

    #[test]
    fn find_head_end_wants_blank_line() {
        assert_eq!(find_head_end(b"GET / HTTP/1.1\r\nHost: x\r\n\r\nbody"), Some(27));
        assert_eq!(find_head_end(b"GET / HTTP/1.1\r\nHost: x\r\n"), None);
    }
}
