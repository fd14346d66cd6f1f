//! Roomdrop signaling broker
//!
//! Pairs two endpoints under a short room code and relays their connection
//! handshake messages. File bytes never pass through here.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod tcp;

pub use application::{BrokerStats, SignalingBroker};
pub use config::BrokerConfig;
pub use domain::{ConnectionId, Room, RoomError};
pub use infrastructure::RoomRegistry;
