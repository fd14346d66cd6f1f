//! Control-connection transport: TCP/TLS sockets feeding the broker loop.

pub mod broker_loop;
mod client_handler;
pub mod event;
mod server;
mod stream_type;
pub mod tls;

pub use broker_loop::{run_broker, spawn_broker};
pub use event::BrokerEvent;
pub use server::TcpServer;
