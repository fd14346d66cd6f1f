//! Offer, answer and ICE candidate forwarding.

use protocol::SignalMessage;

use crate::application::SignalingBroker;
use crate::domain::ConnectionId;

impl SignalingBroker {
    /// Forwards a handshake message to the sender's paired peer unchanged.
    ///
    /// The payload is never inspected. Without a peer the message is dropped.
    pub(crate) fn relay(&mut self, connection: ConnectionId, message: SignalMessage) {
        let kind = message.kind();
        match self.registry.peer_of(connection) {
            Some(peer) => {
                if self.outbox.send(peer, message) {
                    self.logger
                        .debug(&format!("Relayed {} from {} to {}", kind, connection, peer));
                } else {
                    self.logger.debug(&format!(
                        "Relay of {} to {} failed, peer already gone",
                        kind, peer
                    ));
                }
            }
            None => {
                self.logger.info(&format!(
                    "Dropping {} from {}: no paired peer",
                    kind, connection
                ));
            }
        }
    }
}
