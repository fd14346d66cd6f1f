//! Direct channel negotiation over relayed signals

mod candidate_queue;
mod coordinator;
mod error;
mod peer_connection;
mod state;

pub use candidate_queue::CandidateQueue;
pub use coordinator::HandshakeCoordinator;
pub use error::HandshakeError;
pub use peer_connection::PeerConnection;
pub use state::{HandshakeState, Role};
