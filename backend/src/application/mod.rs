//! Application layer - the signaling broker and its use cases

pub mod handlers;
pub mod usecases;

pub use handlers::message_handler::{BrokerStats, SignalingBroker};
