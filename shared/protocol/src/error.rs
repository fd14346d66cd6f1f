use std::io;

use thiserror::Error;

/// Malformed or unrecognized control-plane traffic.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("message too large: {0} bytes")]
    MessageTooLarge(u32),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0} is not accepted from an endpoint")]
    UnexpectedKind(&'static str),
}

impl ProtocolError {
    /// True when a read timed out before any byte of a frame arrived.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ProtocolError::Io(e)
                if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut
        )
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid room code '{0}'")]
pub struct InvalidRoomCode(pub String);
