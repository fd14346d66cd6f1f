//! Single-threaded event loop around the signaling broker.

use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread::{self, JoinHandle};

use crate::application::SignalingBroker;
use crate::tcp::event::BrokerEvent;

/// Processes events one at a time until `Shutdown` arrives or every sender
/// is dropped, then disposes the broker and hands it back.
pub fn run_broker(mut broker: SignalingBroker, events: Receiver<BrokerEvent>) -> SignalingBroker {
    for event in events {
        match event {
            BrokerEvent::Connected { connection, outbox } => broker.connect(connection, outbox),
            BrokerEvent::Frame {
                connection,
                payload,
            } => broker.handle_frame(connection, &payload),
            BrokerEvent::Disconnected { connection } => broker.disconnect(connection),
            BrokerEvent::Shutdown => break,
        }
    }
    broker.dispose();
    broker
}

/// Runs [`run_broker`] on its own thread.
pub fn spawn_broker(broker: SignalingBroker) -> (Sender<BrokerEvent>, JoinHandle<SignalingBroker>) {
    let (sender, receiver) = channel();
    let handle = thread::spawn(move || run_broker(broker, receiver));
    (sender, handle)
}
