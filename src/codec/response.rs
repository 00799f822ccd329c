//! Response-head parsing, client side.
//!
//! Mirrors [`super::request::parse_request_head`], swapped for a status
//! line instead of a request line.

use bytes::{Buf, BytesMut};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, Version};

use super::find_head_end;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub reason: String,
    pub version: Version,
    pub headers: HeaderMap,
}

pub fn parse_response_head(buf: &mut BytesMut) -> Result<Option<ResponseHead>> {
    let Some(head_len) = find_head_end(buf) else {
        return Ok(None);
    };

    let mut header_storage = [httparse::EMPTY_HEADER; 64];
    let mut parsed = httparse::Response::new(&mut header_storage);
    let status = parsed.parse(&buf[..head_len])?;
    let consumed = match status {
        httparse::Status::Complete(len) => len,
        httparse::Status::Partial => return Ok(None),
    };

    let code = parsed.code.ok_or_else(|| Error::bad_field("status code"))?;
    let status =
        StatusCode::from_u16(code).map_err(|_| Error::protocol(format!("invalid status code: {code}")))?;
    let reason = parsed.reason.unwrap_or_default().to_string();

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
    Ok(Some(ResponseHead { status, reason, version, headers }))
}
