//! Offer/answer exchange and candidate ordering for one endpoint

use protocol::SignalMessage;
use serde_json::Value;

use crate::handshake::{CandidateQueue, HandshakeError, HandshakeState, PeerConnection, Role};

/// Drives one peer connection from `Idle` to `ChannelOpen`.
///
/// Remote candidates that arrive before the remote description are queued
/// and applied in receipt order, each exactly once, as soon as it is set.
/// A signal that does not fit the current state is refused and leaves the
/// state unchanged.
pub struct HandshakeCoordinator<P: PeerConnection> {
    role: Role,
    state: HandshakeState,
    connection: P,
    pending: CandidateQueue,
    remote_description_set: bool,
    logger: logging::Logger,
}

impl<P: PeerConnection> HandshakeCoordinator<P> {
    pub fn new(role: Role, connection: P, logger: logging::Logger) -> Self {
        HandshakeCoordinator {
            role,
            state: HandshakeState::Idle,
            connection,
            pending: CandidateQueue::new(),
            remote_description_set: false,
            logger,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    pub fn connection(&self) -> &P {
        &self.connection
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending.len()
    }

    pub fn is_channel_open(&self) -> bool {
        self.state == HandshakeState::ChannelOpen
    }

    /// Initiator: a joiner arrived, make the offer.
    pub fn on_peer_joined(&mut self) -> Result<SignalMessage, HandshakeError> {
        self.expect("PEER_JOINED", Role::Initiator, HandshakeState::Idle)?;
        let offer = self.connection.create_offer()?;
        self.connection.set_local_description(&offer)?;
        self.transition(HandshakeState::OfferCreated);
        Ok(SignalMessage::RtcOffer { sdp: offer })
    }

    /// Joiner: apply the offer and answer it.
    pub fn on_offer(&mut self, sdp: &Value) -> Result<SignalMessage, HandshakeError> {
        self.expect("RTC_OFFER", Role::Joiner, HandshakeState::Idle)?;
        self.connection.set_remote_description(sdp)?;
        self.transition(HandshakeState::OfferReceived);
        self.remote_description_set = true;
        self.flush_candidates();

        let answer = self.connection.create_answer()?;
        self.connection.set_local_description(&answer)?;
        self.transition(HandshakeState::AnswerExchanged);
        Ok(SignalMessage::RtcAnswer { sdp: answer })
    }

    /// Initiator: apply the answer.
    pub fn on_answer(&mut self, sdp: &Value) -> Result<(), HandshakeError> {
        self.expect("RTC_ANSWER", Role::Initiator, HandshakeState::OfferCreated)?;
        self.connection.set_remote_description(sdp)?;
        self.remote_description_set = true;
        self.transition(HandshakeState::AnswerExchanged);
        self.flush_candidates();
        Ok(())
    }

    /// Applies a relayed candidate now, or queues it until the remote
    /// description is known.
    pub fn on_remote_candidate(&mut self, candidate: Value) -> Result<(), HandshakeError> {
        if self.state == HandshakeState::Closed {
            return Err(self.unexpected("ICE_CANDIDATE"));
        }
        if self.remote_description_set {
            return self.connection.add_candidate(&candidate);
        }
        self.pending.push(candidate);
        self.logger.debug(&format!(
            "Queued remote candidate ({} pending)",
            self.pending.len()
        ));
        Ok(())
    }

    /// Wraps a locally gathered candidate for relay.
    pub fn on_local_candidate(&self, candidate: Value) -> Result<SignalMessage, HandshakeError> {
        if self.state == HandshakeState::Closed {
            return Err(self.unexpected("local candidate"));
        }
        Ok(SignalMessage::IceCandidate { candidate })
    }

    pub fn on_channel_open(&mut self) -> Result<(), HandshakeError> {
        if self.state != HandshakeState::AnswerExchanged {
            return Err(self.unexpected("channel open"));
        }
        self.transition(HandshakeState::ChannelOpen);
        Ok(())
    }

    /// The data channel closed; the connection may still bring it back.
    pub fn on_channel_close(&mut self) {
        if self.state == HandshakeState::ChannelOpen {
            self.transition(HandshakeState::AnswerExchanged);
        }
    }

    /// Peer left or this endpoint left the room.
    pub fn close(&mut self) {
        if self.state == HandshakeState::Closed {
            return;
        }
        self.pending.clear();
        self.remote_description_set = false;
        self.connection.close();
        self.transition(HandshakeState::Closed);
    }

    /// Starts over with a fresh peer connection, e.g. when a new joiner
    /// enters a surviving room.
    pub fn reset(&mut self, connection: P) {
        self.close();
        self.connection = connection;
        self.transition(HandshakeState::Idle);
    }

    fn flush_candidates(&mut self) {
        let queued = self.pending.len();
        for candidate in self.pending.drain() {
            if let Err(e) = self.connection.add_candidate(&candidate) {
                self.logger
                    .warn(&format!("Queued candidate rejected: {}", e));
            }
        }
        if queued > 0 {
            self.logger
                .debug(&format!("Applied {} queued candidates", queued));
        }
    }

    fn expect(
        &self,
        signal: &'static str,
        role: Role,
        state: HandshakeState,
    ) -> Result<(), HandshakeError> {
        if self.role != role || self.state != state {
            return Err(self.unexpected(signal));
        }
        Ok(())
    }

    fn unexpected(&self, signal: &'static str) -> HandshakeError {
        HandshakeError::UnexpectedSignal {
            signal,
            role: self.role,
            state: self.state,
        }
    }

    fn transition(&mut self, next: HandshakeState) {
        self.logger
            .debug(&format!("Handshake {:?} -> {:?}", self.state, next));
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Records every call in order.
    #[derive(Debug, Default)]
    struct FakeConnection {
        calls: Vec<String>,
        candidates: Vec<Value>,
        closed: bool,
    }

    impl PeerConnection for FakeConnection {
        fn create_offer(&mut self) -> Result<Value, HandshakeError> {
            self.calls.push("create_offer".into());
            Ok(json!({"type": "offer", "sdp": "v=0 offer"}))
        }
        fn create_answer(&mut self) -> Result<Value, HandshakeError> {
            self.calls.push("create_answer".into());
            Ok(json!({"type": "answer", "sdp": "v=0 answer"}))
        }
        fn set_local_description(&mut self, _: &Value) -> Result<(), HandshakeError> {
            self.calls.push("set_local".into());
            Ok(())
        }
        fn set_remote_description(&mut self, _: &Value) -> Result<(), HandshakeError> {
            self.calls.push("set_remote".into());
            Ok(())
        }
        fn add_candidate(&mut self, candidate: &Value) -> Result<(), HandshakeError> {
            self.calls.push("add_candidate".into());
            self.candidates.push(candidate.clone());
            Ok(())
        }
        fn close(&mut self) {
            self.closed = true;
        }
    }

    fn coordinator(role: Role) -> HandshakeCoordinator<FakeConnection> {
        HandshakeCoordinator::new(role, FakeConnection::default(), logging::Logger::disabled())
    }

    #[test]
    fn test_initiator_flow() {
        let mut hs = coordinator(Role::Initiator);
        let offer = hs.on_peer_joined().unwrap();
        assert!(matches!(offer, SignalMessage::RtcOffer { .. }));
        assert_eq!(hs.state(), HandshakeState::OfferCreated);

        hs.on_answer(&json!({"type": "answer"})).unwrap();
        assert_eq!(hs.state(), HandshakeState::AnswerExchanged);
        hs.on_channel_open().unwrap();
        assert!(hs.is_channel_open());
        assert_eq!(
            hs.connection().calls,
            vec!["create_offer", "set_local", "set_remote"]
        );
    }

    #[test]
    fn test_joiner_flow() {
        let mut hs = coordinator(Role::Joiner);
        let answer = hs.on_offer(&json!({"type": "offer"})).unwrap();
        assert!(matches!(answer, SignalMessage::RtcAnswer { .. }));
        assert_eq!(hs.state(), HandshakeState::AnswerExchanged);
        assert_eq!(
            hs.connection().calls,
            vec!["set_remote", "create_answer", "set_local"]
        );
    }

    #[test]
    fn test_early_candidates_flushed_in_order_once() {
        let mut hs = coordinator(Role::Joiner);
        for n in 0..3 {
            hs.on_remote_candidate(json!({ "candidate": n })).unwrap();
        }
        assert_eq!(hs.pending_candidates(), 3);
        assert!(hs.connection().candidates.is_empty());

        hs.on_offer(&json!({"type": "offer"})).unwrap();
        hs.on_remote_candidate(json!({"candidate": 3})).unwrap();

        assert_eq!(hs.pending_candidates(), 0);
        assert_eq!(
            hs.connection().candidates,
            (0..4).map(|n| json!({ "candidate": n })).collect::<Vec<_>>()
        );
        // Queued candidates are applied right after the remote description.
        assert_eq!(&hs.connection().calls[..4], &[
            "set_remote",
            "add_candidate",
            "add_candidate",
            "add_candidate"
        ]);
    }

    #[test]
    fn test_initiator_queues_until_answer() {
        let mut hs = coordinator(Role::Initiator);
        hs.on_peer_joined().unwrap();
        hs.on_remote_candidate(json!({"candidate": "a"})).unwrap();
        assert_eq!(hs.pending_candidates(), 1);
        hs.on_answer(&json!({})).unwrap();
        assert_eq!(hs.connection().candidates, vec![json!({"candidate": "a"})]);
    }

    #[test]
    fn test_out_of_place_signals_leave_state_unchanged() {
        let mut hs = coordinator(Role::Initiator);
        assert!(matches!(
            hs.on_answer(&json!({})),
            Err(HandshakeError::UnexpectedSignal { signal: "RTC_ANSWER", .. })
        ));
        assert!(hs.on_offer(&json!({})).is_err());
        assert!(hs.on_channel_open().is_err());
        assert_eq!(hs.state(), HandshakeState::Idle);

        let mut joiner = coordinator(Role::Joiner);
        assert!(joiner.on_peer_joined().is_err());
        assert!(joiner.connection().calls.is_empty());
    }

    #[test]
    fn test_channel_close_and_reopen() {
        let mut hs = coordinator(Role::Joiner);
        hs.on_offer(&json!({})).unwrap();
        hs.on_channel_open().unwrap();
        hs.on_channel_close();
        assert_eq!(hs.state(), HandshakeState::AnswerExchanged);
        hs.on_channel_open().unwrap();
        assert!(hs.is_channel_open());
    }

    #[test]
    fn test_close_and_reset() {
        let mut hs = coordinator(Role::Initiator);
        hs.on_remote_candidate(json!({"candidate": 1})).unwrap();
        hs.close();
        assert_eq!(hs.state(), HandshakeState::Closed);
        assert!(hs.connection().closed);
        assert_eq!(hs.pending_candidates(), 0);
        assert!(hs.on_remote_candidate(json!({})).is_err());
        assert!(hs.on_local_candidate(json!({})).is_err());

        hs.reset(FakeConnection::default());
        assert_eq!(hs.state(), HandshakeState::Idle);
        assert!(hs.on_peer_joined().is_ok());
    }
}
