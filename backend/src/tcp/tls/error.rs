//! TLS error types.

use native_tls::HandshakeError;
use std::io;
use std::net::TcpStream;
use thiserror::Error;

/// TLS setup or handshake failure
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid certificate: {0}")]
    InvalidCertificate(String),
    #[error("TLS error: {0}")]
    NativeTls(#[from] native_tls::Error),
    #[error("TLS handshake failed: {0}")]
    Handshake(#[from] HandshakeError<TcpStream>),
}
