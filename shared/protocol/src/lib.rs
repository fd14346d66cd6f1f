//! Control-plane vocabulary shared by the signaling broker and endpoints:
//! room codes, the [`SignalMessage`] sum type, socket framing and join links.

pub mod error;
pub mod framing;
pub mod join_link;
mod message;
mod room_code;

pub use error::{InvalidRoomCode, ProtocolError, Result};
pub use framing::{MAX_MESSAGE_SIZE, read_frame, read_message, write_frame, write_message};
pub use join_link::{join_url, room_from_url};
pub use message::SignalMessage;
pub use room_code::{ROOM_CODE_ALPHABET, ROOM_CODE_LEN, RoomCode};
