use thiserror::Error;

use crate::handshake::{HandshakeState, Role};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum HandshakeError {
    #[error("{signal} is not valid for the {role:?} in state {state:?}")]
    UnexpectedSignal {
        signal: &'static str,
        role: Role,
        state: HandshakeState,
    },
    #[error("peer connection error: {0}")]
    PeerConnection(String),
}
