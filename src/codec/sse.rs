//! Server-Sent Events decoder.
//!
//! Parses the `text/event-stream` framing described in spec design notes:
//! events are separated by a blank line, each line within an event is either
//! a `field: value` pair (one leading space stripped from the value), a
//! bare `field` line with an empty value, or a `:`-prefixed comment that is
//! discarded. `data` fields accumulate across repeated lines, joined by
//! `\n`; `event`/`id` are last-write-wins; `retry` is parsed as `u64` and
//! silently dropped if it doesn't parse.

use bytes::{Buf, BytesMut};

use crate::message::ServerSentEvent;

#[derive(Debug, Default)]
struct PendingEvent {
    event: Option<String>,
    id: Option<String>,
    data: Vec<String>,
    retry: Option<u64>,
    touched: bool,
}

impl PendingEvent {
    fn apply_line(&mut self, line: &str) {
        if line.starts_with(':') {
            return;
        }
        if line.is_empty() {
            return;
        }
        self.touched = true;
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            "retry" => {
                if let Ok(ms) = value.parse::<u64>() {
                    self.retry = Some(ms);
                }
            }
            _ => {}
        }
    }

    fn into_event(self) -> Option<ServerSentEvent> {
        if !self.touched {
            return None;
        }
        let event = ServerSentEvent {
            event: self.event,
            id: self.id,
            data: if self.data.is_empty() { None } else { Some(self.data.join("\n")) },
            retry: self.retry,
        };
        if event.valid() {
            Some(event)
        } else {
            None
        }
    }
}

/// Sans-io decoder for `text/event-stream` bodies. Feed it bytes as they
/// arrive (already de-chunked, if the transport used chunked encoding) and
/// call [`SseDecoder::decode`] until it returns `Ok(None)`.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: PendingEvent,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, buf: &mut BytesMut) -> Option<ServerSentEvent> {
        loop {
            let pos = buf.iter().position(|&b| b == b'\n')?;
            let mut line = buf.split_to(pos + 1);
            line.truncate(pos);
            if line.last() == Some(&b'\r') {
                line.truncate(line.len() - 1);
            }
            let line = String::from_utf8_lossy(&line).into_owned();

            if line.is_empty() {
                let pending = std::mem::take(&mut self.pending);
                if let Some(event) = pending.into_event() {
                    return Some(event);
                }
                continue;
            }

            self.pending.apply_line(&line);
        }
    }

    /// Drains any remaining partial buffer at end-of-stream. Used when the
    /// underlying body closes without a trailing blank line.
    pub fn finish(&mut self) -> Option<ServerSentEvent> {
        let pending = std::mem::take(&mut self.pending);
        pending.into_event()
    }
}

/// Consumes `buf` entirely, discarding any trailing non-newline-terminated
/// bytes remaining in it. Used by callers that drive [`SseDecoder`] with a
/// `BytesMut` they also want returned to an empty state between reads.
pub fn discard_remainder(buf: &mut BytesMut) {
    buf.advance(buf.len());
}

/// Serializes an event the way [`ServerSentEvent::to_chunk_body`] does, for
/// callers writing a raw (non-chunked) event stream directly to the wire.
pub fn write_event(out: &mut Vec<u8>, event: &ServerSentEvent) {
    out.extend_from_slice(&event.to_chunk_body());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(input: &[u8]) -> Vec<ServerSentEvent> {
        let mut decoder = SseDecoder::new();
        let mut buf = BytesMut::from(input);
        let mut events = Vec::new();
        while let Some(event) = decoder.decode(&mut buf) {
            events.push(event);
        }
        if let Some(event) = decoder.finish() {
            events.push(event);
        }
        events
    }

    #[test]
    fn parses_three_events() {
        let input = b"event: greeting\ndata: hi\n\ndata: line1\ndata: line2\n\nid: 9\ndata: bye\n\n";
        let events = decode_all(input);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].event.as_deref(), Some("greeting"));
        assert_eq!(events[0].data.as_deref(), Some("hi"));
        assert_eq!(events[1].data.as_deref(), Some("line1\nline2"));
        assert_eq!(events[2].id.as_deref(), Some("9"));
    }

    #[test]
    fn comment_lines_are_ignored() {
        let events = decode_all(b": keepalive\ndata: hi\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data.as_deref(), Some("hi"));
    }

    #[test]
    fn unparseable_retry_is_dropped_not_fatal() {
        let events = decode_all(b"retry: soon\ndata: hi\n\n");
        assert_eq!(events[0].retry, None);
        assert_eq!(events[0].data.as_deref(), Some("hi"));
    }

    #[test]
    fn bare_field_without_colon_has_empty_value() {
        let events = decode_all(b"data\n\n");
        assert_eq!(events[0].data.as_deref(), Some(""));
    }

    #[test]
    fn empty_block_yields_no_event() {
        let events = decode_all(b"\n\ndata: hi\n\n");
        assert_eq!(events.len(), 1);
    }
}
