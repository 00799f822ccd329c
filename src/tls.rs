//! TLS configuration and handshakes.
//!
//! Each connection drives its own I/O from a single task, so the handshake
//! result is handed back as a stream that already implements
//! `AsyncRead`/`AsyncWrite` directly via `tokio_rustls`, with no extra
//! wrapping needed. This module covers the *setup* side: loading a server
//! certificate chain and key with `rustls-pemfile`, and building a client
//! config from the system's trust store with `rustls-native-certs`.

use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName};
use rustls::{ClientConfig, RootCertStore, ServerConfig};
use tokio::net::TcpStream;
use tokio_rustls::{TlsAcceptor, TlsConnector};

use crate::error::{Error, Result};

/// Loads a PEM certificate chain and private key into a server TLS config.
pub fn server_config_from_pem_files(
    cert_path: impl AsRef<Path>,
    key_path: impl AsRef<Path>,
) -> Result<Arc<ServerConfig>> {
    let cert_file = std::fs::File::open(cert_path.as_ref())
        .map_err(|err| Error::Tls(format!("reading certificate file: {err}")))?;
    let certs: Vec<CertificateDer<'static>> =
        rustls_pemfile::certs(&mut BufReader::new(cert_file))
            .collect::<std::result::Result<_, _>>()
            .map_err(|err| Error::Tls(format!("parsing certificate chain: {err}")))?;

    let key_file = std::fs::File::open(key_path.as_ref())
        .map_err(|err| Error::Tls(format!("reading private key file: {err}")))?;
    let key: PrivateKeyDer<'static> =
        rustls_pemfile::private_key(&mut BufReader::new(key_file))
            .map_err(|err| Error::Tls(format!("parsing private key: {err}")))?
            .ok_or_else(|| Error::Tls("no private key found in key file".into()))?;

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|err| Error::Tls(err.to_string()))?;

    Ok(Arc::new(config))
}

pub fn acceptor_from_config(config: Arc<ServerConfig>) -> TlsAcceptor {
    TlsAcceptor::from(config)
}

/// Builds a client TLS config trusting the operating system's certificate
/// store, via `rustls-native-certs`.
pub fn client_config_with_native_roots() -> Result<Arc<ClientConfig>> {
    let mut roots = RootCertStore::empty();
    for cert in rustls_native_certs::load_native_certs().certs {
        // A handful of platform roots are routinely malformed or
        // duplicated; skip them rather than fail the whole client.
        let _ = roots.add(cert);
    }

    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();

    Ok(Arc::new(config))
}

pub fn connector_from_config(config: Arc<ClientConfig>) -> TlsConnector {
    TlsConnector::from(config)
}

/// Performs a client TLS handshake over an already-connected TCP stream,
/// verifying the peer certificate against `hostname` (SNI is sent as part
/// of the same handshake).
pub async fn connect(
    connector: &TlsConnector,
    hostname: &str,
    tcp: TcpStream,
) -> Result<tokio_rustls::client::TlsStream<TcpStream>> {
    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::Tls(format!("invalid hostname for SNI: {hostname}")))?;
    connector
        .connect(server_name, tcp)
        .await
        .map_err(|err| Error::Tls(err.to_string()))
}

/// Performs a server TLS handshake over an accepted TCP stream.
pub async fn accept(
    acceptor: &TlsAcceptor,
    tcp: TcpStream,
) -> Result<tokio_rustls::server::TlsStream<TcpStream>> {
    acceptor
        .accept(tcp)
        .await
        .map_err(|err| Error::Tls(err.to_string()))
}
