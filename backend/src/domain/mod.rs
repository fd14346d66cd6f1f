//! Domain layer - rooms and the connections that occupy them

mod connection;
mod room;
mod room_error;

pub use connection::ConnectionId;
pub use room::{Room, RoomSlot};
pub use room_error::RoomError;
