//! Infrastructure layer - room repository and outbound connection table

pub mod outbox;
pub mod room_registry;

pub use outbox::Outbox;
pub use room_registry::{CodeSource, Departure, Joined, RandomCodes, RoomRegistry};
