//! Outbound message channels, one per live control connection

use std::collections::HashMap;
use std::sync::mpsc::Sender;

use protocol::SignalMessage;

use crate::domain::ConnectionId;

/// Table of per-connection senders. Each connection handler drains its
/// receiver onto the socket.
#[derive(Default)]
pub struct Outbox {
    connections: HashMap<ConnectionId, Sender<SignalMessage>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, connection: ConnectionId, sender: Sender<SignalMessage>) {
        self.connections.insert(connection, sender);
    }

    pub fn unregister(&mut self, connection: ConnectionId) {
        self.connections.remove(&connection);
    }

    /// Queues `message` for `connection`. Returns false when the connection
    /// is unknown or its handler has already gone; callers ignore that.
    pub fn send(&self, connection: ConnectionId, message: SignalMessage) -> bool {
        self.connections
            .get(&connection)
            .is_some_and(|sender| sender.send(message).is_ok())
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn clear(&mut self) {
        self.connections.clear();
    }
}
