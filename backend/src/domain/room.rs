//! Room domain model - an ephemeral two-slot pairing record

use chrono::{DateTime, Utc};
use protocol::RoomCode;

use crate::domain::ConnectionId;

/// Which slot of a room a connection occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomSlot {
    Initiator,
    Joiner,
}

/// A live room. There is no "empty" room: when the initiator goes, the
/// room goes with it.
#[derive(Debug, Clone)]
pub struct Room {
    pub code: RoomCode,
    pub initiator: ConnectionId,
    pub joiner: Option<ConnectionId>,
    pub created_at: DateTime<Utc>,
}

impl Room {
    /// Creates a room waiting for its joiner
    pub fn new(code: RoomCode, initiator: ConnectionId) -> Self {
        Room {
            code,
            initiator,
            joiner: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_paired(&self) -> bool {
        self.joiner.is_some()
    }

    pub fn slot_of(&self, connection: ConnectionId) -> Option<RoomSlot> {
        if self.initiator == connection {
            Some(RoomSlot::Initiator)
        } else if self.joiner == Some(connection) {
            Some(RoomSlot::Joiner)
        } else {
            None
        }
    }

    /// The other member, if the room is paired and `connection` is in it.
    pub fn peer_of(&self, connection: ConnectionId) -> Option<ConnectionId> {
        match self.slot_of(connection)? {
            RoomSlot::Initiator => self.joiner,
            RoomSlot::Joiner => Some(self.initiator),
        }
    }
}
