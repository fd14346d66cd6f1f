use std::io;

use thiserror::Error;

/// The control connection or the direct channel went away or refused data.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("direct channel is closed")]
    ChannelClosed,
    #[error("send failed: {0}")]
    Send(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("signaling error: {0}")]
    Signaling(#[from] protocol::ProtocolError),
    #[error("TLS error: {0}")]
    Tls(String),
    #[error("signaling connection closed")]
    Disconnected,
}

/// A broker message this endpoint could not act on.
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error(transparent)]
    Handshake(#[from] crate::handshake::HandshakeError),
    #[error(transparent)]
    Protocol(#[from] protocol::ProtocolError),
    #[error("{0} received while not in a room")]
    NotInRoom(&'static str),
}
