//! Events the connection threads feed to the broker loop.

use std::sync::mpsc::Sender;

use protocol::SignalMessage;

use crate::domain::ConnectionId;

#[derive(Debug)]
pub enum BrokerEvent {
    Connected {
        connection: ConnectionId,
        outbox: Sender<SignalMessage>,
    },
    Frame {
        connection: ConnectionId,
        payload: Vec<u8>,
    },
    Disconnected {
        connection: ConnectionId,
    },
    Shutdown,
}
