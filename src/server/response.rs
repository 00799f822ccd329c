//! The response type handlers build and the writer serializes.
//!
//! A response is either fully buffered up front, or a header plus a
//! [`channel::Receiver`] a background producer keeps feeding chunks into.
//! The streaming variant is always written with `Transfer-Encoding:
//! chunked`.

use http::header::{CONTENT_TYPE, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderValue, StatusCode, Version};

use crate::channel::Receiver;
use crate::message::HttpChunk;

pub struct StreamingBody {
    pub rx: Receiver<HttpChunk>,
}

pub enum OutgoingResponse {
    Buffered { parts: ResponseParts, body: String },
    Streaming { parts: ResponseParts, body: StreamingBody },
}

#[derive(Debug, Clone)]
pub struct ResponseParts {
    pub version: Version,
    pub status: StatusCode,
    pub reason: Option<String>,
    pub headers: HeaderMap,
    pub keep_alive: bool,
}

impl Default for ResponseParts {
    fn default() -> Self {
        ResponseParts {
            version: Version::HTTP_11,
            status: StatusCode::OK,
            reason: None,
            headers: HeaderMap::new(),
            keep_alive: true,
        }
    }
}

impl OutgoingResponse {
    pub fn parts(&self) -> &ResponseParts {
        match self {
            OutgoingResponse::Buffered { parts, .. } => parts,
            OutgoingResponse::Streaming { parts, .. } => parts,
        }
    }

    pub fn parts_mut(&mut self) -> &mut ResponseParts {
        match self {
            OutgoingResponse::Buffered { parts, .. } => parts,
            OutgoingResponse::Streaming { parts, .. } => parts,
        }
    }
}

/// Builds an [`OutgoingResponse`], mirroring `response_builder`'s fluent
/// setters.
pub struct ResponseBuilder {
    parts: ResponseParts,
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        ResponseBuilder { parts: ResponseParts::default() }
    }
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.parts.status = status;
        self
    }

    /// The status set so far, so a caller can decide whether to attach a
    /// streaming body before committing to one.
    pub fn current_status(&self) -> StatusCode {
        self.parts.status
    }

    pub fn ok(self) -> Self {
        self.status(StatusCode::OK)
    }

    pub fn not_found(self) -> Self {
        self.status(StatusCode::NOT_FOUND)
    }

    pub fn bad_request(self) -> Self {
        self.status(StatusCode::BAD_REQUEST)
    }

    pub fn server_error(self) -> Self {
        self.status(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn version(mut self, version: Version) -> Self {
        self.parts.version = version;
        self
    }

    /// Overrides the status line's reason phrase, which otherwise defaults
    /// to the status code's canonical reason.
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.parts.reason = Some(reason.into());
        self
    }

    pub fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.parts.keep_alive = keep_alive;
        self
    }

    pub fn content_type(self, content_type: &str) -> Self {
        self.header(CONTENT_TYPE.as_str(), content_type)
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.parts.headers.insert(name, value);
        }
        self
    }

    pub fn body(self, body: impl Into<String>) -> OutgoingResponse {
        OutgoingResponse::Buffered { parts: self.parts, body: body.into() }
    }

    pub fn empty(self) -> OutgoingResponse {
        self.body(String::new())
    }

    pub fn streaming(mut self, rx: Receiver<HttpChunk>) -> OutgoingResponse {
        self.parts.headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        OutgoingResponse::Streaming { parts: self.parts, body: StreamingBody { rx } }
    }

    /// Same as [`ResponseBuilder::streaming`] with `Content-Type:
    /// text/event-stream` set.
    pub fn sse(self, rx: Receiver<HttpChunk>) -> OutgoingResponse {
        self.content_type("text/event-stream").streaming(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streaming_sets_chunked_header() {
        let (_tx, rx) = crate::channel::channel();
        let response = ResponseBuilder::new().ok().streaming(rx);
        assert_eq!(
            response.parts().headers.get(TRANSFER_ENCODING).unwrap(),
            "chunked"
        );
    }

    #[test]
    fn sse_sets_content_type_and_chunked() {
        let (_tx, rx) = crate::channel::channel();
        let response = ResponseBuilder::new().ok().sse(rx);
        assert_eq!(response.parts().headers.get(CONTENT_TYPE).unwrap(), "text/event-stream");
        assert_eq!(response.parts().headers.get(TRANSFER_ENCODING).unwrap(), "chunked");
    }
}
