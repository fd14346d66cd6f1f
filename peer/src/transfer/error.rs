use thiserror::Error;

use crate::error::TransportError;

/// Why a transfer message was not applied. None of these corrupt data that
/// was already accepted.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("transfer {0} is already in progress")]
    Busy(String),
    #[error("no active transfer {0}")]
    UnknownFile(String),
    #[error("chunk {got} out of order, expected {expected}")]
    OutOfOrder { expected: u32, got: u32 },
    #[error("unexpected ack for chunk {got}")]
    UnexpectedAck { got: u32 },
    #[error("chunk is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("chunk {index} carries {actual} bytes, expected {expected}")]
    ChunkLength {
        index: u32,
        expected: usize,
        actual: usize,
    },
    #[error("file of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
    #[error("invalid file metadata: {0}")]
    InvalidMetadata(String),
    #[error("cannot resume after chunk {0}")]
    ResumeOutOfRange(i64),
    #[error("no paused transfer to resume")]
    NothingToResume,
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Transport(#[from] TransportError),
}
