//! The transport abstraction shared by the server and the client.
//!
//! A small enum over the concrete stream types, implementing
//! `tokio::io::{AsyncRead, AsyncWrite}` by delegation so the rest of the
//! crate reads and writes through one type regardless of whether TLS is in
//! play.

use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{self, AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;

#[cfg(feature = "tls")]
use tokio_rustls::server::TlsStream as ServerTlsStream;
#[cfg(feature = "tls")]
use tokio_rustls::client::TlsStream as ClientTlsStream;

/// A plain TCP or TLS-wrapped TCP stream, read and written uniformly.
pub enum Connection {
    Plain(TcpStream),
    #[cfg(feature = "tls")]
    TlsServer(Box<ServerTlsStream<TcpStream>>),
    #[cfg(feature = "tls")]
    TlsClient(Box<ClientTlsStream<TcpStream>>),
}

impl Connection {
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        match self {
            Connection::Plain(tcp) => tcp.peer_addr(),
            #[cfg(feature = "tls")]
            Connection::TlsServer(tls) => tls.get_ref().0.peer_addr(),
            #[cfg(feature = "tls")]
            Connection::TlsClient(tls) => tls.get_ref().0.peer_addr(),
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        match self {
            Connection::Plain(tcp) => tcp.local_addr(),
            #[cfg(feature = "tls")]
            Connection::TlsServer(tls) => tls.get_ref().0.local_addr(),
            #[cfg(feature = "tls")]
            Connection::TlsClient(tls) => tls.get_ref().0.local_addr(),
        }
    }

    pub fn is_tls(&self) -> bool {
        match self {
            Connection::Plain(_) => false,
            #[cfg(feature = "tls")]
            Connection::TlsServer(_) | Connection::TlsClient(_) => true,
        }
    }
}

impl From<TcpStream> for Connection {
    fn from(tcp: TcpStream) -> Self {
        Connection::Plain(tcp)
    }
}

#[cfg(feature = "tls")]
impl From<ServerTlsStream<TcpStream>> for Connection {
    fn from(tls: ServerTlsStream<TcpStream>) -> Self {
        Connection::TlsServer(Box::new(tls))
    }
}

#[cfg(feature = "tls")]
impl From<ClientTlsStream<TcpStream>> for Connection {
    fn from(tls: ClientTlsStream<TcpStream>) -> Self {
        Connection::TlsClient(Box::new(tls))
    }
}

impl AsyncRead for Connection {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Connection::Plain(tcp) => Pin::new(tcp).poll_read(cx, buf),
            #[cfg(feature = "tls")]
            Connection::TlsServer(tls) => Pin::new(tls.as_mut()).poll_read(cx, buf),
            #[cfg(feature = "tls")]
            Connection::TlsClient(tls) => Pin::new(tls.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Connection {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Connection::Plain(tcp) => Pin::new(tcp).poll_write(cx, buf),
            #[cfg(feature = "tls")]
            Connection::TlsServer(tls) => Pin::new(tls.as_mut()).poll_write(cx, buf),
            #[cfg(feature = "tls")]
            Connection::TlsClient(tls) => Pin::new(tls.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Connection::Plain(tcp) => Pin::new(tcp).poll_flush(cx),
            #[cfg(feature = "tls")]
            Connection::TlsServer(tls) => Pin::new(tls.as_mut()).poll_flush(cx),
            #[cfg(feature = "tls")]
            Connection::TlsClient(tls) => Pin::new(tls.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Connection::Plain(tcp) => Pin::new(tcp).poll_shutdown(cx),
            #[cfg(feature = "tls")]
            Connection::TlsServer(tls) => Pin::new(tls.as_mut()).poll_shutdown(cx),
            #[cfg(feature = "tls")]
            Connection::TlsClient(tls) => Pin::new(tls.as_mut()).poll_shutdown(cx),
        }
    }
}
