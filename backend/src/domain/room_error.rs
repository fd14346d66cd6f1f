use protocol::RoomCode;
use thiserror::Error;

/// Why a room operation was refused. The display text is what the
/// requesting endpoint sees in its `ERROR` message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("Room {0} not found")]
    RoomNotFound(String),
    #[error("Room {0} is full")]
    RoomFull(RoomCode),
    #[error("You cannot join your own room")]
    SelfJoin(RoomCode),
    #[error("Already in room {0}; leave it first")]
    AlreadyInRoom(RoomCode),
    #[error("Server is at its room limit, try again later")]
    CapacityReached,
    #[error("Could not allocate a free room code")]
    CodeSpaceExhausted,
}
