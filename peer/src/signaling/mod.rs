//! Broker connection and control-message routing

mod client;
mod endpoint;

pub use client::SignalingClient;
pub use endpoint::{Endpoint, EndpointEvent};
