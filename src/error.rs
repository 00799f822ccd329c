//! Crate-wide error kinds.
//!
//! Kinds, not type names: every fallible operation in this crate returns one
//! of the variants below, matching the taxonomy a caller needs to react to
//! (retry, give up, log) rather than which internal stage produced it.

use std::io;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Connection refused, reset, or EOF in the middle of a message.
    #[error("network error: {0}")]
    Network(#[source] io::Error),

    /// TLS handshake failure, or certificate/hostname verification failure.
    #[error("tls error: {0}")]
    Tls(String),

    /// Malformed HTTP, malformed chunk framing, a missing/unparseable
    /// header the protocol requires, or too many redirects.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// No route matched a request path on a given method.
    #[error("no route matched")]
    Routing,

    /// A service returned a failure while handling a request.
    #[error("application error: {0}")]
    Application(String),

    /// A streaming channel was closed or cancelled while sending or
    /// receiving.
    #[error("channel cancelled")]
    Cancelled,

    /// A deadline was exceeded during a client operation.
    #[error("timed out")]
    Timeout,
}

impl Error {
    pub(crate) fn protocol(msg: impl Into<String>) -> Self {
        Error::Protocol(msg.into())
    }

    pub(crate) fn bad_transfer_encoding() -> Self {
        Error::Protocol("mismatched body read for this response's transfer encoding".into())
    }

    pub(crate) fn bad_field(field: &str) -> Self {
        Error::Protocol(format!("missing or unparseable field: {field}"))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Network(err)
    }
}

impl From<httparse::Error> for Error {
    fn from(err: httparse::Error) -> Self {
        Error::Protocol(err.to_string())
    }
}

impl From<headers::Error> for Error {
    fn from(err: headers::Error) -> Self {
        Error::Protocol(format!("invalid header: {err}"))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Protocol(format!("invalid url: {err}"))
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Error::Timeout
    }
}

#[cfg(feature = "tls")]
impl From<tokio_rustls::rustls::Error> for Error {
    fn from(err: tokio_rustls::rustls::Error) -> Self {
        Error::Tls(err.to_string())
    }
}
