//! Wire-level payload units shared by client and server.
//!
//! `HttpChunk` and `ServerSentEvent` are defined once here for reuse by
//! both roles rather than duplicated per role.

/// One chunk of a `Transfer-Encoding: chunked` body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpChunk {
    pub body: Vec<u8>,
    pub extensions: Option<String>,
}

impl HttpChunk {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        HttpChunk {
            body: body.into(),
            extensions: None,
        }
    }

    pub fn with_extensions(body: impl Into<Vec<u8>>, extensions: impl Into<String>) -> Self {
        HttpChunk {
            body: body.into(),
            extensions: Some(extensions.into()),
        }
    }

    /// A chunk is valid iff its body is non-empty.
    pub fn valid(&self) -> bool {
        !self.body.is_empty()
    }
}

/// One Server-Sent Event, per the W3C EventSource wire framing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerSentEvent {
    pub event: Option<String>,
    pub id: Option<String>,
    pub data: Option<String>,
    pub retry: Option<u64>,
}

impl ServerSentEvent {
    /// An event is valid iff at least one field is set. Empty events are
    /// dropped by both the parser and the writer.
    pub fn valid(&self) -> bool {
        self.event.is_some() || self.id.is_some() || self.data.is_some() || self.retry.is_some()
    }

    /// Serialize into the wire body of an [`HttpChunk`]/chunk body, with
    /// fields emitted in a fixed order — `event`, `id`, `data`, `retry`,
    /// each `field: value\n` — terminated by a blank line.
    pub fn to_chunk_body(&self) -> Vec<u8> {
        let mut out = String::new();
        if let Some(event) = &self.event {
            out.push_str("event: ");
            out.push_str(event);
            out.push('\n');
        }
        if let Some(id) = &self.id {
            out.push_str("id: ");
            out.push_str(id);
            out.push('\n');
        }
        if let Some(data) = &self.data {
            out.push_str("data: ");
            out.push_str(data);
            out.push('\n');
        }
        if let Some(retry) = &self.retry {
            out.push_str("retry: ");
            out.push_str(&retry.to_string());
            out.push('\n');
        }
        out.push('\n');
        out.into_bytes()
    }

    pub fn to_chunk(&self) -> HttpChunk {
        HttpChunk::new(self.to_chunk_body())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_event_is_invalid() {
        assert!(!ServerSentEvent::default().valid());
    }

    #[test]
    fn field_order_is_event_id_data_retry() {
        let event = ServerSentEvent {
            event: Some("message".into()),
            id: Some("1".into()),
            data: Some("hello".into()),
            retry: Some(3000),
        };

        assert_eq!(
            String::from_utf8(event.to_chunk_body()).unwrap(),
            "event: message\nid: 1\ndata: hello\nretry: 3000\n\n"
        );
    }

    #[test]
    fn partial_fields_still_valid() {
        let event = ServerSentEvent {
            data: Some("hello".into()),
            ..Default::default()
        };
        assert!(event.valid());
        assert_eq!(
            String::from_utf8(event.to_chunk_body()).unwrap(),
            "data: hello\n\n"
        );
    }
}
