//! Chunked file transfer over the direct channel
//!
//! Stop-and-wait: the sender keeps exactly one chunk in flight and moves on
//! only when the receiver acknowledges it. A receiver that reconnects asks
//! the sender to continue after the last chunk it accepted.

pub mod chunker;
mod config;
mod error;
mod event;
mod incoming;
pub(crate) mod message;
mod outgoing;
mod state;

pub use config::TransferConfig;
pub use error::TransferError;
pub use event::{Direction, TransferEvent};
pub use incoming::{ReceivedFile, TransferReceiver};
pub use message::{FileMeta, PeerMessage};
pub use outgoing::TransferSender;
pub use state::{ReceiverState, SenderState};
