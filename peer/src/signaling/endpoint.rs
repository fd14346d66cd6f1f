//! Routes broker messages into the handshake coordinator

use protocol::{ProtocolError, RoomCode, SignalMessage};
use serde_json::Value;

use crate::error::{EndpointError, TransportError};
use crate::handshake::{HandshakeCoordinator, HandshakeState, PeerConnection, Role};
use crate::signaling::SignalingClient;

/// What happened in the room, for the host to show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointEvent {
    RoomCreated(RoomCode),
    RoomJoined(RoomCode),
    PeerJoined,
    /// The other member left; carries the broker's message
    PeerLeft(String),
    /// The broker refused a request
    Refused(String),
}

/// One endpoint's control-plane state: its room, its role in it and the
/// handshake for the current peer.
///
/// A fresh peer connection is made for every peer, so an initiator whose
/// joiner left can negotiate again with the next one.
pub struct Endpoint<P: PeerConnection> {
    make_connection: Box<dyn FnMut() -> P>,
    coordinator: Option<HandshakeCoordinator<P>>,
    room: Option<RoomCode>,
    events: Vec<EndpointEvent>,
    logger: logging::Logger,
}

impl<P: PeerConnection> Endpoint<P> {
    pub fn new<F>(make_connection: F, logger: logging::Logger) -> Self
    where
        F: FnMut() -> P + 'static,
    {
        Endpoint {
            make_connection: Box::new(make_connection),
            coordinator: None,
            room: None,
            events: Vec::new(),
            logger,
        }
    }

    pub fn room(&self) -> Option<&RoomCode> {
        self.room.as_ref()
    }

    pub fn role(&self) -> Option<Role> {
        self.coordinator.as_ref().map(HandshakeCoordinator::role)
    }

    pub fn handshake_state(&self) -> Option<HandshakeState> {
        self.coordinator.as_ref().map(HandshakeCoordinator::state)
    }

    pub fn coordinator(&self) -> Option<&HandshakeCoordinator<P>> {
        self.coordinator.as_ref()
    }

    pub fn drain_events(&mut self) -> Vec<EndpointEvent> {
        std::mem::take(&mut self.events)
    }

    /// Applies one broker message. Returns the reply to send back for relay,
    /// if the handshake produced one.
    pub fn handle(&mut self, message: SignalMessage) -> Result<Option<SignalMessage>, EndpointError> {
        match message {
            SignalMessage::RoomCreated { room_id } => {
                self.enter_room(room_id.clone(), Role::Initiator);
                self.events.push(EndpointEvent::RoomCreated(room_id));
                Ok(None)
            }
            SignalMessage::RoomJoined { room_id } => {
                self.enter_room(room_id.clone(), Role::Joiner);
                self.events.push(EndpointEvent::RoomJoined(room_id));
                Ok(None)
            }
            SignalMessage::PeerJoined { .. } => {
                let coordinator = self.in_room("PEER_JOINED")?;
                if coordinator.state() == HandshakeState::Closed {
                    let fresh = (self.make_connection)();
                    // Re-borrow after calling the factory.
                    self.in_room("PEER_JOINED")?.reset(fresh);
                }
                let offer = self.in_room("PEER_JOINED")?.on_peer_joined()?;
                self.events.push(EndpointEvent::PeerJoined);
                Ok(Some(offer))
            }
            SignalMessage::PeerDisconnected { message } => {
                self.logger.info(&format!("Peer left: {}", message));
                if let Some(coordinator) = self.coordinator.as_mut() {
                    coordinator.close();
                }
                // A joiner's room is gone once the initiator leaves.
                if self.role() == Some(Role::Joiner) {
                    self.room = None;
                    self.coordinator = None;
                }
                self.events.push(EndpointEvent::PeerLeft(message));
                Ok(None)
            }
            SignalMessage::Error { message } => {
                self.logger.warn(&format!("Broker refused request: {}", message));
                self.events.push(EndpointEvent::Refused(message));
                Ok(None)
            }
            SignalMessage::RtcOffer { sdp } => Ok(Some(self.in_room("RTC_OFFER")?.on_offer(&sdp)?)),
            SignalMessage::RtcAnswer { sdp } => {
                self.in_room("RTC_ANSWER")?.on_answer(&sdp)?;
                Ok(None)
            }
            SignalMessage::IceCandidate { candidate } => {
                self.in_room("ICE_CANDIDATE")?.on_remote_candidate(candidate)?;
                Ok(None)
            }
            SignalMessage::CreateRoom | SignalMessage::JoinRoom { .. } => {
                Err(ProtocolError::UnexpectedKind(message.kind()).into())
            }
        }
    }

    /// Wraps a locally gathered candidate for relay.
    pub fn local_candidate(&self, candidate: Value) -> Result<SignalMessage, EndpointError> {
        let coordinator = self
            .coordinator
            .as_ref()
            .ok_or(EndpointError::NotInRoom("local candidate"))?;
        Ok(coordinator.on_local_candidate(candidate)?)
    }

    pub fn on_channel_open(&mut self) -> Result<(), EndpointError> {
        Ok(self.in_room("channel open")?.on_channel_open()?)
    }

    pub fn on_channel_close(&mut self) {
        if let Some(coordinator) = self.coordinator.as_mut() {
            coordinator.on_channel_close();
        }
    }

    /// Leaves the room locally, tearing down the handshake.
    pub fn leave(&mut self) {
        if let Some(mut coordinator) = self.coordinator.take() {
            coordinator.close();
        }
        if let Some(room) = self.room.take() {
            self.logger.info(&format!("Left room {}", room));
        }
    }

    /// Reads at most one broker message, applies it and sends any reply.
    /// Messages that cannot be applied are logged and dropped. Returns
    /// whether a message was processed.
    pub fn pump(&mut self, client: &mut SignalingClient) -> Result<bool, TransportError> {
        let Some(message) = client.poll()? else {
            return Ok(false);
        };
        let kind = message.kind();
        match self.handle(message) {
            Ok(Some(reply)) => client.send(&reply)?,
            Ok(None) => {}
            Err(e) => self.logger.warn(&format!("Dropping {}: {}", kind, e)),
        }
        Ok(true)
    }

    fn enter_room(&mut self, room: RoomCode, role: Role) {
        self.logger.info(&format!("In room {} as {:?}", room, role));
        if let Some(mut previous) = self.coordinator.take() {
            previous.close();
        }
        let connection = (self.make_connection)();
        self.coordinator = Some(HandshakeCoordinator::new(
            role,
            connection,
            self.logger.for_component("Handshake"),
        ));
        self.room = Some(room);
    }

    fn in_room(&mut self, signal: &'static str) -> Result<&mut HandshakeCoordinator<P>, EndpointError> {
        self.coordinator
            .as_mut()
            .ok_or(EndpointError::NotInRoom(signal))
    }
}
