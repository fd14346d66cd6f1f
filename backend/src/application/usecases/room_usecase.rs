//! Room lifecycle use cases: create, join, disconnect.

use protocol::SignalMessage;

use crate::application::SignalingBroker;
use crate::domain::{ConnectionId, RoomError};
use crate::infrastructure::Departure;

impl SignalingBroker {
    pub(crate) fn create_room(&mut self, connection: ConnectionId) {
        match self.registry.create(connection) {
            Ok(code) => {
                self.logger
                    .info(&format!("Room {} created by {}", code, connection));
                self.outbox
                    .send(connection, SignalMessage::RoomCreated { room_id: code });
            }
            Err(e) => self.refuse(connection, e),
        }
    }

    pub(crate) fn join_room(&mut self, connection: ConnectionId, raw_code: &str) {
        match self.registry.join(raw_code, connection) {
            Ok(joined) => {
                self.logger.info(&format!(
                    "{} joined room {} (initiator {})",
                    connection, joined.code, joined.initiator
                ));
                self.outbox.send(
                    connection,
                    SignalMessage::RoomJoined {
                        room_id: joined.code.clone(),
                    },
                );
                self.outbox.send(
                    joined.initiator,
                    SignalMessage::PeerJoined {
                        room_id: joined.code,
                    },
                );
            }
            Err(e) => self.refuse(connection, e),
        }
    }

    /// Applies the lifecycle rules for a closed connection and tells the
    /// remaining member, if any.
    pub fn disconnect(&mut self, connection: ConnectionId) {
        self.outbox.unregister(connection);

        match self.registry.remove_connection(connection) {
            Departure::NotInRoom => {
                self.logger
                    .debug(&format!("{} disconnected outside any room", connection));
            }
            Departure::InitiatorLeft { code, joiner } => {
                self.logger.info(&format!(
                    "Initiator {} left, room {} deleted",
                    connection, code
                ));
                if let Some(joiner) = joiner {
                    self.outbox.send(
                        joiner,
                        SignalMessage::PeerDisconnected {
                            message: "The room owner disconnected".to_string(),
                        },
                    );
                }
            }
            Departure::JoinerLeft { code, initiator } => {
                self.logger.info(&format!(
                    "Joiner {} left room {}, waiting for a new peer",
                    connection, code
                ));
                self.outbox.send(
                    initiator,
                    SignalMessage::PeerDisconnected {
                        message: "Your peer disconnected".to_string(),
                    },
                );
            }
        }
    }

    fn refuse(&self, connection: ConnectionId, error: RoomError) {
        self.logger
            .warn(&format!("Refusing request from {}: {}", connection, error));
        self.outbox.send(
            connection,
            SignalMessage::Error {
                message: error.to_string(),
            },
        );
    }
}
