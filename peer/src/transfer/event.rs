//! File transfer events

use std::path::PathBuf;

/// Which side of a transfer an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
}

/// Events emitted by the transfer roles and the endpoint session
#[derive(Debug, Clone, PartialEq)]
pub enum TransferEvent {
    /// A transfer was announced (outgoing) or accepted (incoming)
    Started {
        file_id: String,
        direction: Direction,
        name: String,
        size: u64,
    },
    /// Chunk `index` was acknowledged (outgoing) or accepted (incoming)
    Progress {
        file_id: String,
        direction: Direction,
        index: u32,
        bytes: u64,
        total: u64,
    },
    Completed {
        file_id: String,
        direction: Direction,
    },
    Paused {
        file_id: String,
        direction: Direction,
        reason: String,
    },
    /// Stop-and-wait continues from `from_chunk`
    Resumed {
        file_id: String,
        direction: Direction,
        from_chunk: u32,
    },
    /// The receiver refused the file
    Rejected {
        file_id: String,
        direction: Direction,
        reason: String,
    },
    /// A received file was handed to the delivery collaborator
    Delivered { file_id: String, path: PathBuf },
}
