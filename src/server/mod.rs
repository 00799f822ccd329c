//! The HTTP/1.1 server.
//!
//! Owns the accept loop and connection bound, and the per-connection
//! request/response loop: read a head with a timeout, buffer or stream the
//! body, hand the request to the matched route's [`service::Service`],
//! write the response, decide whether to keep the connection alive.

pub mod middleware;
pub mod request;
pub mod response;
pub mod router;
pub mod service;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use headers::HeaderMapExt;
use http::header::{CONNECTION, CONTENT_LENGTH};
use http::{HeaderValue, Method, Version};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::codec::{self, chunk, request::parse_request_head, write, Encoding};
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::message::HttpChunk;
use crate::SERVER_AGENT;

use request::Request;
use response::OutgoingResponse;
use router::{matches_path, Matcher};
use service::Service;

/// How long a connection may sit idle waiting for the next request head
/// before the server gives up on it.
const HEADER_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Default concurrent-connection bound.
const DEFAULT_MAX_CONNECTIONS: usize = 512;

struct Route {
    method: Method,
    matcher: Box<dyn Matcher>,
    service: Box<dyn Service>,
}

/// The route table: requests are matched in registration order against
/// same-method routes; the first matching pattern wins.
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, method: Method, pattern: &str, service: impl Service + 'static) -> Self {
        let matcher = router::make_matcher(pattern).unwrap_or_else(|err| {
            panic!("invalid route pattern {pattern:?}: {err}");
        });
        self.routes.push(Route { method, matcher, service: Box::new(service) });
        self
    }

    pub fn get(self, pattern: &str, service: impl Service + 'static) -> Self {
        self.route(Method::GET, pattern, service)
    }

    pub fn post(self, pattern: &str, service: impl Service + 'static) -> Self {
        self.route(Method::POST, pattern, service)
    }

    fn dispatch(&self, request: &mut Request) -> Option<&dyn Service> {
        for route in &self.routes {
            if &route.method != request.method() {
                continue;
            }
            if matches_path(route.matcher.as_ref(), request) {
                return Some(route.service.as_ref());
            }
        }
        None
    }
}

pub struct ServerBuilder {
    router: Router,
    max_connections: usize,
    #[cfg(feature = "tls")]
    tls_config: Option<Arc<rustls::ServerConfig>>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        ServerBuilder {
            router: Router::new(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            #[cfg(feature = "tls")]
            tls_config: None,
        }
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    pub fn max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    #[cfg(feature = "tls")]
    pub fn tls_config(mut self, config: Arc<rustls::ServerConfig>) -> Self {
        self.tls_config = Some(config);
        self
    }

    pub async fn bind(self, addr: impl Into<SocketAddr>) -> Result<Server> {
        let addr = addr.into();
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "server bound");
        Ok(Server {
            listener,
            router: Arc::new(self.router),
            semaphore: Arc::new(Semaphore::new(self.max_connections)),
            #[cfg(feature = "tls")]
            acceptor: self.tls_config.map(crate::tls::acceptor_from_config),
        })
    }
}

pub struct Server {
    listener: TcpListener,
    router: Arc<Router>,
    semaphore: Arc<Semaphore>,
    #[cfg(feature = "tls")]
    acceptor: Option<tokio_rustls::TlsAcceptor>,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until the process is asked to stop. Each
    /// connection gets its own task, bounded by `max_connections`.
    pub async fn serve(self) -> Result<()> {
        loop {
            let (tcp, peer) = self.listener.accept().await?;
            tracing::info!(%peer, "accepted connection");
            let permit = self.semaphore.clone().acquire_owned().await.expect("semaphore not closed");
            let router = self.router.clone();

            #[cfg(feature = "tls")]
            let acceptor = self.acceptor.clone();

            tokio::spawn(async move {
                let _permit = permit;

                #[cfg(feature = "tls")]
                let connection: Result<Connection> = match acceptor {
                    Some(acceptor) => match crate::tls::accept(&acceptor, tcp).await {
                        Ok(tls) => Ok(Connection::from(tls)),
                        Err(err) => Err(err),
                    },
                    None => Ok(Connection::from(tcp)),
                };
                #[cfg(not(feature = "tls"))]
                let connection: Result<Connection> = Ok(Connection::from(tcp));

                match connection {
                    Ok(connection) => {
                        if let Err(err) = serve_connection(connection, router).await {
                            tracing::debug!(%peer, error = %err, "connection ended with error");
                        }
                    }
                    Err(err) => tracing::error!(%peer, error = %err, "tls handshake failed"),
                }
            });
        }
    }
}

async fn serve_connection(mut connection: Connection, router: Arc<Router>) -> Result<()> {
    let mut buf = BytesMut::with_capacity(8 * 1024);

    loop {
        let head = match read_request_head(&mut connection, &mut buf).await? {
            Some(head) => head,
            None => return Ok(()), // peer closed before sending another request
        };

        let body = read_request_body(&mut connection, &mut buf, &head.headers).await?;

        let mut request = Request::new(head.method, head.version, &head.target, head.headers, body);
        let client_wants_keep_alive = connection_wants_keep_alive(&request);

        let response = match router.dispatch(&mut request) {
            Some(service) => {
                tracing::debug!(method = %request.method(), path = %request.path, "dispatching request");
                service.handle(request).await.unwrap_or_else(|err| {
                    tracing::error!(error = %err, "handler error synthesized into a 500 response");
                    error_response(err)
                })
            }
            None => {
                tracing::debug!(method = %request.method(), path = %request.path, "no route matched");
                not_found_response()
            }
        };
        tracing::debug!(status = %response.parts().status, "request handled");
        let keep_alive = client_wants_keep_alive && response.parts().keep_alive;

        write_response(&mut connection, response, keep_alive).await?;

        if !keep_alive {
            return Ok(());
        }
    }
}

async fn read_request_head(
    connection: &mut Connection,
    buf: &mut BytesMut,
) -> Result<Option<codec::request::RequestHead>> {
    loop {
        if let Some(head) = parse_request_head(buf)? {
            return Ok(Some(head));
        }

        let mut read_buf = [0u8; 4096];
        let read = tokio::time::timeout(HEADER_READ_TIMEOUT, connection.read(&mut read_buf)).await??;
        if read == 0 {
            return if buf.is_empty() { Ok(None) } else { Err(Error::protocol("connection closed mid-request")) };
        }
        buf.extend_from_slice(&read_buf[..read]);
    }
}

async fn read_request_body(connection: &mut Connection, buf: &mut BytesMut, headers: &http::HeaderMap) -> Result<String> {
    match codec::encoding_from_headers(headers, false)? {
        Encoding::FixedLength(0) => Ok(String::new()),
        Encoding::FixedLength(len) => {
            while (buf.len() as u64) < len {
                let mut read_buf = [0u8; 4096];
                let read = connection.read(&mut read_buf).await?;
                if read == 0 {
                    return Err(Error::protocol("connection closed before full request body arrived"));
                }
                buf.extend_from_slice(&read_buf[..read]);
            }
            let body = buf.split_to(len as usize);
            Ok(String::from_utf8_lossy(&body).into_owned())
        }
        Encoding::Chunked => {
            let mut decoder = chunk::ChunkDecoder::new();
            let mut body = Vec::new();
            loop {
                match decoder.decode(buf)? {
                    Some(chunk::ChunkEvent::Header { .. }) => continue,
                    Some(chunk::ChunkEvent::Body { bytes, .. }) => body.extend_from_slice(&bytes),
                    Some(chunk::ChunkEvent::End) => break,
                    None => {
                        let mut more = [0u8; 4096];
                        let read = connection.read(&mut more).await?;
                        if read == 0 {
                            return Err(Error::protocol("connection closed mid-chunked-request-body"));
                        }
                        buf.extend_from_slice(&more[..read]);
                    }
                }
            }
            Ok(String::from_utf8_lossy(&body).into_owned())
        }
        Encoding::CloseDelimited => Err(Error::bad_transfer_encoding()),
    }
}

fn connection_wants_keep_alive(request: &Request) -> bool {
    match request.headers().typed_get::<headers::Connection>() {
        Some(connection) => !connection.contains("close"),
        None => request.version() != Version::HTTP_10,
    }
}

fn not_found_response() -> OutgoingResponse {
    response::ResponseBuilder::new().not_found().content_type("text/plain").body("no route matched")
}

fn error_response(error: Error) -> OutgoingResponse {
    response::ResponseBuilder::new().server_error().content_type("text/plain").body(error.to_string())
}

async fn write_response(connection: &mut Connection, mut response: OutgoingResponse, keep_alive: bool) -> Result<()> {
    response.parts_mut().headers.insert(http::header::SERVER, HeaderValue::from_static(SERVER_AGENT));
    response.parts_mut().headers.insert(
        CONNECTION,
        HeaderValue::from_static(if keep_alive { "keep-alive" } else { "close" }),
    );

    match response {
        OutgoingResponse::Buffered { parts, body } => {
            let mut parts = parts;
            parts.headers.insert(CONTENT_LENGTH, HeaderValue::from_str(&body.len().to_string()).unwrap());
            let mut out = Vec::with_capacity(body.len() + 256);
            write::write_response_head(&mut out, parts.version, parts.status, parts.reason.as_deref(), &parts.headers);
            out.extend_from_slice(body.as_bytes());
            connection.write_all(&out).await?;
        }
        OutgoingResponse::Streaming { parts, mut body } => {
            let mut out = Vec::with_capacity(256);
            write::write_response_head(&mut out, parts.version, parts.status, parts.reason.as_deref(), &parts.headers);
            connection.write_all(&out).await?;

            loop {
                match body.rx.receive().await {
                    Ok(Some(item)) => {
                        if !item.valid() {
                            continue;
                        }
                        let mut frame = Vec::with_capacity(item.body.len() + 16);
                        chunk::write_chunk(&mut frame, &item.body);
                        connection.write_all(&frame).await?;
                    }
                    Ok(None) => break,
                    Err(_) => break,
                }
            }

            let mut last = Vec::with_capacity(8);
            chunk::write_last_chunk(&mut last);
            connection.write_all(&last).await?;
        }
    }

    connection.flush().await?;
    Ok(())
}
