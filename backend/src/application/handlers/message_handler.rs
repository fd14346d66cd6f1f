//! Signaling broker - routes control messages to room and relay use cases

use std::sync::mpsc::Sender;

use protocol::{ProtocolError, SignalMessage};

use crate::domain::ConnectionId;
use crate::infrastructure::{Outbox, RoomRegistry};

/// Snapshot of broker occupancy for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrokerStats {
    pub connections: usize,
    pub rooms: usize,
    pub paired_rooms: usize,
}

/// Owns the room registry and the outbound table.
///
/// Not shared: the broker loop calls into it one event at a time, so no
/// locking is needed around registry mutations.
pub struct SignalingBroker {
    pub(crate) registry: RoomRegistry,
    pub(crate) outbox: Outbox,
    pub(crate) logger: logging::Logger,
}

impl SignalingBroker {
    pub fn new(registry: RoomRegistry, logger: logging::Logger) -> Self {
        SignalingBroker {
            registry,
            outbox: Outbox::new(),
            logger,
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn stats(&self) -> BrokerStats {
        BrokerStats {
            connections: self.outbox.len(),
            rooms: self.registry.len(),
            paired_rooms: self.registry.paired_count(),
        }
    }

    pub fn connect(&mut self, connection: ConnectionId, sender: Sender<SignalMessage>) {
        self.outbox.register(connection, sender);
        self.logger.debug(&format!("{} connected", connection));
    }

    /// Decodes one frame; anything malformed is dropped without a reply.
    pub fn handle_frame(&mut self, connection: ConnectionId, payload: &[u8]) {
        match SignalMessage::from_json(payload) {
            Ok(message) => self.handle_message(connection, message),
            Err(e) => self.drop_malformed(connection, &ProtocolError::Json(e)),
        }
    }

    /// Exhaustive dispatch over every message kind.
    pub fn handle_message(&mut self, connection: ConnectionId, message: SignalMessage) {
        match message {
            SignalMessage::CreateRoom => self.create_room(connection),
            SignalMessage::JoinRoom { room_id } => self.join_room(connection, &room_id),
            SignalMessage::RtcOffer { .. }
            | SignalMessage::RtcAnswer { .. }
            | SignalMessage::IceCandidate { .. } => self.relay(connection, message),
            SignalMessage::RoomCreated { .. }
            | SignalMessage::RoomJoined { .. }
            | SignalMessage::PeerJoined { .. }
            | SignalMessage::PeerDisconnected { .. }
            | SignalMessage::Error { .. } => {
                self.drop_malformed(connection, &ProtocolError::UnexpectedKind(message.kind()))
            }
        }
    }

    fn drop_malformed(&self, connection: ConnectionId, error: &ProtocolError) {
        self.logger
            .warn(&format!("Dropping message from {}: {}", connection, error));
    }

    /// Tears down every room. Used on shutdown.
    pub fn dispose(&mut self) {
        let rooms = self.registry.dispose();
        self.outbox.clear();
        self.logger
            .info(&format!("Broker disposed, {} live rooms discarded", rooms.len()));
    }
}
