//! The HTTP/1.1 client.
//!
//! Resolves the host, connects (TLS or not, chosen by URL scheme), writes
//! the request head and body, reads the response head, and follows
//! redirects by recursing with the `Location` URL until `max_redirects` is
//! hit or the response isn't a redirect. One method handles both schemes
//! parameterized on whether the connection needs a TLS handshake.

pub mod request;
pub mod response;

use std::future::Future;
use std::pin::Pin;

use http::header::{CONTENT_LENGTH, HOST, USER_AGENT as USER_AGENT_HEADER};
use http::HeaderValue;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::codec::write::write_request_head;
use crate::connection::Connection;
use crate::error::{Error, Result};

pub use request::{HttpRequest, RequestBuilder};
pub use response::IncomingResponse;

/// Sends requests, following redirects and resolving TLS as needed.
#[derive(Clone)]
pub struct Client {
    #[cfg(feature = "tls")]
    tls_connector: tokio_rustls::TlsConnector,
}

impl Client {
    /// Builds a client trusting the operating system's certificate store.
    pub fn new() -> Result<Self> {
        #[cfg(feature = "tls")]
        {
            let config = crate::tls::client_config_with_native_roots()?;
            Ok(Client { tls_connector: crate::tls::connector_from_config(config) })
        }
        #[cfg(not(feature = "tls"))]
        {
            Ok(Client {})
        }
    }

    /// Sends `request`, following redirects up to its `max_redirects`
    /// unless `auto_redirect` is disabled, and bounding the whole exchange
    /// (connect through response head) by its `timeout` if set.
    pub async fn send(&self, request: HttpRequest) -> Result<IncomingResponse> {
        let timeout = request.timeout;
        let send_fut = self.send_inner(request, 0);
        match timeout {
            Some(duration) => tokio::time::timeout(duration, send_fut).await?,
            None => send_fut.await,
        }
    }

    fn send_inner<'a>(
        &'a self,
        request: HttpRequest,
        redirect_count: u64,
    ) -> Pin<Box<dyn Future<Output = Result<IncomingResponse>> + Send + 'a>> {
        Box::pin(async move {
            let is_https = request.url.scheme() == "https";
            let connection = self.connect(&request, is_https).await?;

            let response = self.write_and_read(connection, &request).await?;

            if response.is_redirection() && request.auto_redirect {
                let location = response.redirect_url().ok_or_else(|| Error::bad_field("location"))?;
                if redirect_count >= request.max_redirects {
                    return Err(Error::protocol("too many redirects"));
                }
                tracing::info!(from = %request.url, to = %location, "following redirect");
                let mut next = request;
                next.url = location;
                return self.send_inner(next, redirect_count + 1).await;
            }

            Ok(response)
        })
    }

    async fn connect(&self, request: &HttpRequest, is_https: bool) -> Result<Connection> {
        let host = request
            .url
            .host_str()
            .ok_or_else(|| Error::protocol("request url has no host"))?;
        let port = request
            .url
            .port_or_known_default()
            .ok_or_else(|| Error::protocol("request url has no resolvable port"))?;

        let addr = tokio::net::lookup_host((host, port))
            .await?
            .next()
            .ok_or_else(|| Error::protocol(format!("no addresses found for host {host}")))?;

        let tcp = TcpStream::connect(addr).await?;

        if is_https {
            #[cfg(feature = "tls")]
            {
                let tls = crate::tls::connect(&self.tls_connector, host, tcp).await?;
                Ok(Connection::from(tls))
            }
            #[cfg(not(feature = "tls"))]
            {
                let _ = host;
                Err(Error::protocol("https requested but the tls feature is disabled"))
            }
        } else {
            Ok(Connection::from(tcp))
        }
    }

    async fn write_and_read(&self, mut connection: Connection, request: &HttpRequest) -> Result<IncomingResponse> {
        let host = request.url.host_str().unwrap_or_default();
        let target = match request.url.query() {
            Some(query) => format!("{}?{}", request.url.path(), query),
            None => request.url.path().to_string(),
        };

        let mut headers = request.headers.clone();
        headers.insert(HOST, HeaderValue::from_str(host).map_err(|_| Error::protocol("invalid host"))?);
        headers
            .entry(USER_AGENT_HEADER)
            .or_insert_with(|| HeaderValue::from_static(crate::USER_AGENT));
        if !request.body.is_empty() {
            headers.insert(CONTENT_LENGTH, HeaderValue::from_str(&request.body.len().to_string()).unwrap());
        }

        let mut out = Vec::with_capacity(256 + request.body.len());
        write_request_head(&mut out, &request.method, &target, request.version, &headers);
        out.extend_from_slice(request.body.as_bytes());
        connection.write_all(&out).await?;
        connection.flush().await?;

        let buf = bytes::BytesMut::with_capacity(4 * 1024);
        IncomingResponse::read_head(connection, buf, request.url.clone()).await
    }
}
