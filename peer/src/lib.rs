//! Roomdrop endpoint library
//!
//! Everything one side of a room needs once it is connected to the broker:
//! - `handshake`: drives the direct channel negotiation over relayed signals
//! - `transfer`: chunked stop-and-wait file transfer with resume
//! - `session`: one direct channel plus both transfer roles
//! - `signaling`: the broker connection and the glue routing its messages
//!
//! The WebRTC stack, wake lock and file saving are traits implemented by the
//! host application.

pub mod channel;
pub mod error;
pub mod handshake;
pub mod session;
pub mod signaling;
pub mod transfer;

pub use channel::DataChannel;
pub use error::{EndpointError, TransportError};
pub use handshake::{HandshakeCoordinator, HandshakeError, HandshakeState, PeerConnection, Role};
pub use session::{DirectoryDelivery, FileDelivery, NoWakeLock, PeerSession, WakeLock};
pub use signaling::{Endpoint, SignalingClient};
pub use transfer::{TransferConfig, TransferError, TransferEvent};
