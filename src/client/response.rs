//! The response the client receives.
//!
//! Parses the head once, classifies the body (chunked? SSE?) from its
//! headers, then offers one of three ways to read the body depending on
//! that classification. Each read mode spawns a task driving the connection
//! and handing decoded items back over a [`crate::channel::Receiver`].

use bytes::BytesMut;
use http::{HeaderMap, StatusCode, Version};
use url::Url;

use crate::channel::{self, Receiver};
use crate::codec::{self, chunk::ChunkDecoder, response::parse_response_head, sse::SseDecoder, Encoding};
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::message::{HttpChunk, ServerSentEvent};

const REDIRECT_STATUSES: [StatusCode; 5] = [
    StatusCode::MOVED_PERMANENTLY,
    StatusCode::FOUND,
    StatusCode::SEE_OTHER,
    StatusCode::TEMPORARY_REDIRECT,
    StatusCode::PERMANENT_REDIRECT,
];

pub struct IncomingResponse {
    connection: Connection,
    buf: BytesMut,
    status: StatusCode,
    reason: String,
    version: Version,
    headers: HeaderMap,
    encoding: Encoding,
    is_sse: bool,
    request_url: Url,
}

impl IncomingResponse {
    pub(crate) async fn read_head(mut connection: Connection, mut buf: BytesMut, request_url: Url) -> Result<Self> {
        let head = loop {
            if let Some(head) = parse_response_head(&mut buf)? {
                break head;
            }
            let mut read_buf = [0u8; 4096];
            use tokio::io::AsyncReadExt;
            let read = connection.read(&mut read_buf).await?;
            if read == 0 {
                return Err(Error::protocol("connection closed before a full response head arrived"));
            }
            buf.extend_from_slice(&read_buf[..read]);
        };

        let encoding = codec::encoding_from_headers(&head.headers, true)?;
        let is_sse = head
            .headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("text/event-stream"))
            .unwrap_or(false);

        Ok(IncomingResponse {
            connection,
            buf,
            status: head.status,
            reason: head.reason,
            version: head.version,
            headers: head.headers,
            encoding,
            is_sse,
            request_url,
        })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The reason phrase from the status line, e.g. `"Not Found"`.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }

    pub fn is_redirection(&self) -> bool {
        REDIRECT_STATUSES.contains(&self.status)
    }

    /// The `Location` header resolved against the request URL, if this is a
    /// redirect response and the header is present and parses.
    pub fn redirect_url(&self) -> Option<Url> {
        if !self.is_redirection() {
            return None;
        }
        let location = self.headers.get(http::header::LOCATION)?.to_str().ok()?;
        Url::options().base_url(Some(&self.request_url)).parse(location).ok()
    }

    /// Reads the whole body as one string. Errors if the body is chunked or
    /// an SSE stream; use [`Self::read_chunks`] or [`Self::read_sse`]
    /// instead.
    pub async fn read_full(mut self) -> Result<String> {
        if self.is_sse || matches!(self.encoding, Encoding::Chunked) {
            return Err(Error::bad_transfer_encoding());
        }
        use tokio::io::AsyncReadExt;

        let body = match self.encoding {
            Encoding::FixedLength(len) => {
                while (self.buf.len() as u64) < len {
                    let mut read_buf = [0u8; 4096];
                    let read = self.connection.read(&mut read_buf).await?;
                    if read == 0 {
                        return Err(Error::protocol("connection closed before full response body arrived"));
                    }
                    self.buf.extend_from_slice(&read_buf[..read]);
                }
                self.buf.split_to(len as usize).to_vec()
            }
            Encoding::CloseDelimited => {
                let mut body = self.buf.to_vec();
                self.buf.clear();
                let mut read_buf = [0u8; 4096];
                loop {
                    let read = self.connection.read(&mut read_buf).await?;
                    if read == 0 {
                        break;
                    }
                    body.extend_from_slice(&read_buf[..read]);
                }
                body
            }
            Encoding::Chunked => unreachable!(),
        };

        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Spawns a task decoding the chunked body and streams each chunk back.
    pub fn read_chunks(mut self) -> Result<Receiver<HttpChunk>> {
        if !matches!(self.encoding, Encoding::Chunked) {
            return Err(Error::bad_transfer_encoding());
        }
        let (tx, rx) = channel::channel();
        tokio::spawn(async move {
            use tokio::io::AsyncReadExt;
            let mut decoder = ChunkDecoder::new();
            let mut pending: Option<HttpChunk> = None;
            loop {
                match decoder.decode(&mut self.buf) {
                    Ok(Some(codec::chunk::ChunkEvent::Header { extensions, .. })) => {
                        pending = Some(HttpChunk { body: Vec::new(), extensions: if extensions.is_empty() { None } else { Some(extensions) } });
                    }
                    Ok(Some(codec::chunk::ChunkEvent::Body { bytes, .. })) => {
                        let mut item = pending.take().unwrap_or_default();
                        item.body = bytes;
                        if tx.send(item).await.is_err() {
                            return;
                        }
                    }
                    Ok(Some(codec::chunk::ChunkEvent::End)) => return,
                    Ok(None) => {
                        let mut read_buf = [0u8; 4096];
                        match self.connection.read(&mut read_buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => self.buf.extend_from_slice(&read_buf[..n]),
                        }
                    }
                    Err(_) => return,
                }
            }
        });
        Ok(rx)
    }

    /// Spawns a task decoding the body as `text/event-stream` (whether
    /// chunked or not) and streams each event back.
    pub fn read_sse(mut self) -> Result<Receiver<ServerSentEvent>> {
        if !self.is_sse {
            return Err(Error::bad_transfer_encoding());
        }
        let chunked = matches!(self.encoding, Encoding::Chunked);
        let (tx, rx) = channel::channel();
        tokio::spawn(async move {
            use tokio::io::AsyncReadExt;
            let mut sse = SseDecoder::new();
            let mut chunk_decoder = ChunkDecoder::new();
            let mut sse_buf = BytesMut::new();

            loop {
                let event = if chunked {
                    match chunk_decoder.decode(&mut self.buf) {
                        Ok(Some(codec::chunk::ChunkEvent::Body { bytes, .. })) => {
                            sse_buf.extend_from_slice(&bytes);
                            sse.decode(&mut sse_buf)
                        }
                        Ok(Some(codec::chunk::ChunkEvent::Header { .. })) => None,
                        Ok(Some(codec::chunk::ChunkEvent::End)) => {
                            let final_event = sse.finish();
                            if let Some(event) = final_event {
                                let _ = tx.send(event).await;
                            }
                            return;
                        }
                        Ok(None) => {
                            let mut read_buf = [0u8; 4096];
                            match self.connection.read(&mut read_buf).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => self.buf.extend_from_slice(&read_buf[..n]),
                            }
                            None
                        }
                        Err(_) => return,
                    }
                } else {
                    match sse.decode(&mut self.buf) {
                        Some(event) => Some(event),
                        None => {
                            let mut read_buf = [0u8; 4096];
                            match self.connection.read(&mut read_buf).await {
                                Ok(0) => {
                                    if let Some(event) = sse.finish() {
                                        let _ = tx.send(event).await;
                                    }
                                    return;
                                }
                                Err(_) => return,
                                Ok(n) => self.buf.extend_from_slice(&read_buf[..n]),
                            }
                            None
                        }
                    }
                };

                if let Some(event) = event {
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
            }
        });
        Ok(rx)
    }
}
