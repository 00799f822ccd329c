//! Incremental decoder and writer for `Transfer-Encoding: chunked` bodies.
//!
//! The decoder is fed bytes as they arrive off the connection and yields one
//! [`ChunkEvent`] at a time, asking for more data with `Ok(None)` rather than
//! blocking.
//!
//! It waits until a whole chunk body is buffered before yielding it, so
//! every chunk is delivered as a single [`ChunkEvent::Body`] slice with
//! `remaining == bytes.len()`.

use bytes::{Buf, BytesMut};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkEvent {
    /// A chunk-size line was parsed. `extensions` is the raw text following
    /// the first `;` on the size line, or empty if there was none.
    Header { size: u64, extensions: String },
    /// The complete body of the chunk just announced by `Header`.
    Body { bytes: Vec<u8>, remaining: u64 },
    /// The terminal zero-size chunk and any trailers were consumed.
    End,
}

#[derive(Debug)]
enum State {
    Size,
    Body { size: u64, extensions: String },
    Trailers,
    Done,
}

/// Sans-io chunked-body decoder. Feed it bytes via [`ChunkDecoder::decode`]
/// as they arrive; call repeatedly until it returns `Ok(None)`, then read
/// more off the connection and call again.
#[derive(Debug)]
pub struct ChunkDecoder {
    state: State,
}

impl Default for ChunkDecoder {
    fn default() -> Self {
        ChunkDecoder { state: State::Size }
    }
}

impl ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, State::Done)
    }

    /// Consumes as much of `buf` as it can and returns at most one event.
    /// Returns `Ok(None)` when `buf` doesn't yet hold a full line/chunk and
    /// more bytes must be read from the connection.
    pub fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<ChunkEvent>> {
        loop {
            match &self.state {
                State::Done => return Ok(Some(ChunkEvent::End)),
                State::Size => match split_line(buf) {
                    None => return Ok(None),
                    Some(line) => {
                        let (size, extensions) = parse_chunk_size_line(&line)?;
                        if size == 0 {
                            self.state = State::Trailers;
                        } else {
                            self.state = State::Body { size, extensions: extensions.clone() };
                            return Ok(Some(ChunkEvent::Header { size, extensions }));
                        }
                    }
                },
                State::Body { size, .. } => {
                    let size = *size as usize;
                    if buf.len() < size + 2 {
                        return Ok(None);
                    }
                    let body = buf.split_to(size).to_vec();
                    let terminator = buf.split_to(2);
                    if &terminator[..] != b"\r\n" {
                        return Err(Error::protocol("chunk body missing CRLF terminator"));
                    }
                    self.state = State::Size;
                    let remaining = body.len() as u64;
                    return Ok(Some(ChunkEvent::Body { bytes: body, remaining }));
                }
                State::Trailers => match find_blank_line(buf) {
                    None => return Ok(None),
                    Some(consumed) => {
                        buf.advance(consumed);
                        self.state = State::Done;
                        return Ok(Some(ChunkEvent::End));
                    }
                },
            }
        }
    }
}

/// Splits off one line (sans its terminator) from the front of `buf`, if a
/// full line is available. Accepts both `\r\n` and bare `\n`.
fn split_line(buf: &mut BytesMut) -> Option<Vec<u8>> {
    let pos = buf.iter().position(|&b| b == b'\n')?;
    let mut line = buf.split_to(pos + 1);
    line.truncate(pos);
    if line.last() == Some(&b'\r') {
        line.truncate(line.len() - 1);
    }
    Some(line.to_vec())
}

fn parse_chunk_size_line(line: &[u8]) -> Result<(u64, String)> {
    let line = std::str::from_utf8(line)
        .map_err(|_| Error::protocol("chunk size line is not valid utf-8"))?;
    let (size_hex, extensions) = match line.split_once(';') {
        Some((size, ext)) => (size.trim(), ext.trim()),
        None => (line.trim(), ""),
    };
    let size = u64::from_str_radix(size_hex, 16)
        .map_err(|_| Error::protocol(format!("invalid chunk size: {size_hex:?}")))?;
    Ok((size, extensions.to_string()))
}

/// Finds a blank line (`\r\n\r\n` or `\n\n`) and returns how many bytes to
/// consume, scanning trailer header lines in between.
fn find_blank_line(buf: &BytesMut) -> Option<usize> {
    if buf.starts_with(b"\r\n") {
        return Some(2);
    }
    if buf.starts_with(b"\n") {
        return Some(1);
    }
    let bytes = &buf[..];
    for i in 0..bytes.len() {
        if bytes[i..].starts_with(b"\r\n\r\n") {
            return Some(i + 4);
        }
        if bytes[i..].starts_with(b"\n\n") {
            return Some(i + 2);
        }
    }
    None
}

/// Writes one chunk: `<hex-size>\r\n<body>\r\n`. Extensions are not emitted
/// on the way out; this crate's server/client never produce them.
pub fn write_chunk(out: &mut Vec<u8>, body: &[u8]) {
    out.extend_from_slice(format!("{:x}\r\n", body.len()).as_bytes());
    out.extend_from_slice(body);
    out.extend_from_slice(b"\r\n");
}

/// Writes the terminal zero-size chunk with no trailers.
pub fn write_last_chunk(out: &mut Vec<u8>) {
    out.extend_from_slice(b"0\r\n\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(input: &[u8]) -> Vec<ChunkEvent> {
        let mut decoder = ChunkDecoder::new();
        let mut buf = BytesMut::from(input);
        let mut events = Vec::new();
        loop {
            match decoder.decode(&mut buf).unwrap() {
                Some(ChunkEvent::End) => {
                    events.push(ChunkEvent::End);
                    break;
                }
                Some(event) => events.push(event),
                None => panic!("decoder starved with input fully buffered"),
            }
        }
        events
    }

    #[test]
    fn decodes_two_chunks() {
        let events = decode_all(b"5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n");
        assert_eq!(
            events,
            vec![
                ChunkEvent::Header { size: 5, extensions: String::new() },
                ChunkEvent::Body { bytes: b"hello".to_vec(), remaining: 5 },
                ChunkEvent::Header { size: 6, extensions: String::new() },
                ChunkEvent::Body { bytes: b" world".to_vec(), remaining: 6 },
                ChunkEvent::End,
            ]
        );
    }

    #[test]
    fn empty_body_is_just_end() {
        let events = decode_all(b"0\r\n\r\n");
        assert_eq!(events, vec![ChunkEvent::End]);
    }

    #[test]
    fn captures_chunk_extensions() {
        let events = decode_all(b"3;foo=bar\r\nabc\r\n0\r\n\r\n");
        assert_eq!(events[0], ChunkEvent::Header { size: 3, extensions: "foo=bar".into() });
    }

    #[test]
    fn rejects_malformed_size() {
        let mut decoder = ChunkDecoder::new();
        let mut buf = BytesMut::from(&b"zz\r\n"[..]);
        assert!(decoder.decode(&mut buf).is_err());
    }

    #[test]
    fn asks_for_more_data_on_partial_input() {
        let mut decoder = ChunkDecoder::new();
        let mut buf = BytesMut::from(&b"5\r\nhel"[..]);
        assert_eq!(decoder.decode(&mut buf).unwrap(), Some(ChunkEvent::Header { size: 5, extensions: String::new() }));
        assert_eq!(decoder.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b"lo\r\n");
        assert_eq!(
            decoder.decode(&mut buf).unwrap(),
            Some(ChunkEvent::Body { bytes: b"hello".to_vec(), remaining: 5 })
        );
    }

    #[test]
    fn write_chunk_then_last_chunk_round_trips() {
        let mut out = Vec::new();
        write_chunk(&mut out, b"hello");
        write_chunk(&mut out, b" world");
        write_last_chunk(&mut out);
        let events = decode_all(&out);
        assert_eq!(events.len(), 5);
    }
}
