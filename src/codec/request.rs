//! Request-head parsing, server side.
//!
//! Scans the accumulated buffer for the end of the head, hands that slice
//! to `httparse`, then rebuilds typed `http` values from it.

use bytes::{Buf, BytesMut};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Version};

use super::find_head_end;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    /// Raw request-target as sent on the wire (path plus optional query).
    pub target: String,
    pub version: Version,
    pub headers: HeaderMap,
}

/// Attempts to parse one request head out of the front of `buf`. On
/// success, the consumed bytes are drained from `buf`. Returns `Ok(None)`
/// when the head hasn't fully arrived.
pub fn parse_request_head(buf: &mut BytesMut) -> Result<Option<RequestHead>> {
    let Some(head_len) = find_head_end(buf) else {
        return Ok(None);
    };

    let mut header_storage = [httparse::EMPTY_HEADER; 64];
    let mut parsed = httparse::Request::new(&mut header_storage);
    let status = parsed.parse(&buf[..head_len])?;
    let consumed = match status {
        httparse::Status::Complete(len) => len,
        httparse::Status::Partial => return Ok(None),
    };

    let method = parsed
        .method
        .ok_or_else(|| Error::bad_field("method"))?;
    let method = Method::from_bytes(method.as_bytes())
        .map_err(|_| Error::protocol(format!("invalid method: {method}")))?;

    let target = parsed
        .path
        .ok_or_else(|| Error::bad_field("request-target"))?
        .to_string();

    let version = match parsed.version {
        Some(1) => Version::HTTP_11,
        Some(0) => Version::HTTP_10,
        Some(v) => return Err(Error::protocol(format!("unsupported HTTP version 1.{v}"))),
        None => return Err(Error::bad_field("version")),
    };

    let mut headers = HeaderMap::new();
    for header in parsed.headers.iter() {
        let name = HeaderName::from_bytes(header.name.as_bytes())
            .map_err(|_| Error::protocol(format!("invalid header name: {}", header.name)))?;
        let value = HeaderValue::from_bytes(header.value)
            .map_err(|_| Error::protocol(format!("invalid header value for {name}")))?;
        headers.append(name, value);
    }

    buf.advance(consumed);
    Ok(Some(RequestHead { method, target, version, headers }))
}
