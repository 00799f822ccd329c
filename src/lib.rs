//! Streaming HTTP/1.1 client and server.
//!
//! The three load-bearing pieces are:
//!
//! - [`codec`]: incremental HTTP/1.1 parsing and emission, chunked transfer
//!   encoding, and Server-Sent Events framing.
//! - [`connection`] + [`channel`]: a TCP-or-TLS [`connection::Connection`] and
//!   the bounded, closable/cancellable [`channel::StreamingChannel`] that
//!   decouples a producer task from a consumer task for streaming bodies.
//! - [`server`] and [`client`]: the request/response pipelines built on top
//!   of the above.
#![warn(rust_2018_idioms)]

pub mod channel;
pub mod codec;
pub mod connection;
pub mod error;
pub mod message;

#[cfg(feature = "tls")]
pub mod tls;

#[cfg(feature = "client")]
pub mod client;

#[cfg(feature = "server")]
pub mod server;

pub use error::{Error, Result};
pub use message::{HttpChunk, ServerSentEvent};

#[doc(no_inline)]
pub use http::{HeaderMap, Method, StatusCode, Version};

#[cfg(feature = "client")]
pub use client::Client;

#[cfg(feature = "server")]
pub use server::Server;

/// Default `Server` header value.
pub const SERVER_AGENT: &str = "fluxhttp/server";

/// Default `User-Agent` header value sent by the client.
pub const USER_AGENT: &str = "fluxhttp/client";
