//! Control-plane messages exchanged between endpoints and the broker.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::room_code::RoomCode;

/// Every control message, tagged on the wire by `type`.
///
/// `sdp` and `candidate` are opaque: the broker forwards whatever JSON value
/// it received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum SignalMessage {
    CreateRoom,
    RoomCreated { room_id: RoomCode },
    /// Kept as raw text so a malformed code is answered with "room not
    /// found" instead of being dropped as a protocol error.
    JoinRoom { room_id: String },
    RoomJoined { room_id: RoomCode },
    PeerJoined { room_id: RoomCode },
    PeerDisconnected { message: String },
    Error { message: String },
    RtcOffer { sdp: Value },
    RtcAnswer { sdp: Value },
    IceCandidate { candidate: Value },
}

impl SignalMessage {
    /// Wire name of the variant, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            SignalMessage::CreateRoom => "CREATE_ROOM",
            SignalMessage::RoomCreated { .. } => "ROOM_CREATED",
            SignalMessage::JoinRoom { .. } => "JOIN_ROOM",
            SignalMessage::RoomJoined { .. } => "ROOM_JOINED",
            SignalMessage::PeerJoined { .. } => "PEER_JOINED",
            SignalMessage::PeerDisconnected { .. } => "PEER_DISCONNECTED",
            SignalMessage::Error { .. } => "ERROR",
            SignalMessage::RtcOffer { .. } => "RTC_OFFER",
            SignalMessage::RtcAnswer { .. } => "RTC_ANSWER",
            SignalMessage::IceCandidate { .. } => "ICE_CANDIDATE",
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(json)
    }
}
