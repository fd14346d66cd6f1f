use serde_json::Value;

use crate::handshake::HandshakeError;

/// The host's WebRTC peer connection.
///
/// Session descriptions and candidates are opaque JSON values; they travel
/// through the broker untouched.
pub trait PeerConnection {
    fn create_offer(&mut self) -> Result<Value, HandshakeError>;
    fn create_answer(&mut self) -> Result<Value, HandshakeError>;
    fn set_local_description(&mut self, sdp: &Value) -> Result<(), HandshakeError>;
    fn set_remote_description(&mut self, sdp: &Value) -> Result<(), HandshakeError>;
    fn add_candidate(&mut self, candidate: &Value) -> Result<(), HandshakeError>;
    fn close(&mut self);
}
