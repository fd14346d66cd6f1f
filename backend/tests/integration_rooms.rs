//! Broker-level room flows, driven without sockets.
//!
//! Each test connection gets an in-memory outbox so the messages the broker
//! emits can be checked directly.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver};

use protocol::{RoomCode, SignalMessage};
use roomdrop_server::config::RoomsConfig;
use roomdrop_server::infrastructure::CodeSource;
use roomdrop_server::{ConnectionId, RoomRegistry, SignalingBroker};
use serde_json::json;

struct Scripted(VecDeque<&'static str>);

impl CodeSource for Scripted {
    fn next_code(&mut self) -> RoomCode {
        RoomCode::parse(self.0.pop_front().unwrap_or("ZZZZ")).unwrap()
    }
}

fn broker_with_codes(codes: &[&'static str]) -> (SignalingBroker, logging::CapturedLines) {
    let registry = RoomRegistry::with_code_source(
        &RoomsConfig::default(),
        Box::new(Scripted(codes.iter().copied().collect())),
    );
    let (logger, lines) = logging::Logger::capture(logging::LogLevel::Debug);
    (SignalingBroker::new(registry, logger), lines)
}

fn connect(broker: &mut SignalingBroker, id: u64) -> (ConnectionId, Receiver<SignalMessage>) {
    let (tx, rx) = mpsc::channel();
    let connection = ConnectionId(id);
    broker.connect(connection, tx);
    (connection, rx)
}

fn drain(rx: &Receiver<SignalMessage>) -> Vec<SignalMessage> {
    rx.try_iter().collect()
}

fn send(broker: &mut SignalingBroker, connection: ConnectionId, json: &str) {
    broker.handle_frame(connection, json.as_bytes());
}

#[test]
fn test_create_then_join_with_lowercase_code() {
    let (mut broker, _) = broker_with_codes(&["7F2K"]);
    let (a, rx_a) = connect(&mut broker, 1);
    let (b, rx_b) = connect(&mut broker, 2);

    send(&mut broker, a, r#"{"type":"CREATE_ROOM"}"#);
    let code = RoomCode::parse("7F2K").unwrap();
    assert_eq!(
        drain(&rx_a),
        vec![SignalMessage::RoomCreated {
            room_id: code.clone()
        }]
    );

    send(&mut broker, b, r#"{"type":"JOIN_ROOM","roomId":"7f2k"}"#);
    assert_eq!(
        drain(&rx_b),
        vec![SignalMessage::RoomJoined {
            room_id: code.clone()
        }]
    );
    assert_eq!(drain(&rx_a), vec![SignalMessage::PeerJoined { room_id: code }]);

    let stats = broker.stats();
    assert_eq!(stats.connections, 2);
    assert_eq!(stats.rooms, 1);
    assert_eq!(stats.paired_rooms, 1);
}

#[test]
fn test_join_refusals_reach_only_the_requester() {
    let (mut broker, _) = broker_with_codes(&["7F2K"]);
    let (a, rx_a) = connect(&mut broker, 1);
    let (b, rx_b) = connect(&mut broker, 2);
    let (c, rx_c) = connect(&mut broker, 3);

    send(&mut broker, a, r#"{"type":"CREATE_ROOM"}"#);
    drain(&rx_a);

    send(&mut broker, b, r#"{"type":"JOIN_ROOM","roomId":"QQQQ"}"#);
    assert!(matches!(
        drain(&rx_b).as_slice(),
        [SignalMessage::Error { message }] if message.contains("not found")
    ));

    send(&mut broker, a, r#"{"type":"JOIN_ROOM","roomId":"7F2K"}"#);
    assert!(matches!(
        drain(&rx_a).as_slice(),
        [SignalMessage::Error { message }] if message.contains("own room")
    ));

    send(&mut broker, b, r#"{"type":"JOIN_ROOM","roomId":"7F2K"}"#);
    drain(&rx_a);
    drain(&rx_b);

    send(&mut broker, c, r#"{"type":"JOIN_ROOM","roomId":"7F2K"}"#);
    assert!(matches!(
        drain(&rx_c).as_slice(),
        [SignalMessage::Error { message }] if message.contains("full")
    ));
    assert!(drain(&rx_a).is_empty());
    assert!(drain(&rx_b).is_empty());
}

#[test]
fn test_initiator_leaving_notifies_joiner_once_and_deletes_room() {
    let (mut broker, _) = broker_with_codes(&["7F2K"]);
    let (a, rx_a) = connect(&mut broker, 1);
    let (b, rx_b) = connect(&mut broker, 2);
    send(&mut broker, a, r#"{"type":"CREATE_ROOM"}"#);
    send(&mut broker, b, r#"{"type":"JOIN_ROOM","roomId":"7F2K"}"#);
    drain(&rx_a);
    drain(&rx_b);

    broker.disconnect(a);
    let received = drain(&rx_b);
    assert_eq!(received.len(), 1);
    assert!(matches!(received[0], SignalMessage::PeerDisconnected { .. }));
    assert!(broker.registry().is_empty());

    // The joiner's own departure afterwards produces nothing further.
    broker.disconnect(b);
    assert!(broker.registry().is_empty());
    assert_eq!(broker.stats().connections, 0);
}

#[test]
fn test_joiner_leaving_keeps_room_open_for_new_joiner() {
    let (mut broker, _) = broker_with_codes(&["7F2K"]);
    let (a, rx_a) = connect(&mut broker, 1);
    let (b, rx_b) = connect(&mut broker, 2);
    let (c, rx_c) = connect(&mut broker, 3);
    send(&mut broker, a, r#"{"type":"CREATE_ROOM"}"#);
    send(&mut broker, b, r#"{"type":"JOIN_ROOM","roomId":"7F2K"}"#);
    drain(&rx_a);
    drain(&rx_b);

    broker.disconnect(b);
    assert!(matches!(
        drain(&rx_a).as_slice(),
        [SignalMessage::PeerDisconnected { .. }]
    ));
    assert_eq!(broker.registry().len(), 1);

    send(&mut broker, c, r#"{"type":"JOIN_ROOM","roomId":"7F2K"}"#);
    assert!(matches!(
        drain(&rx_c).as_slice(),
        [SignalMessage::RoomJoined { .. }]
    ));
    assert!(matches!(
        drain(&rx_a).as_slice(),
        [SignalMessage::PeerJoined { .. }]
    ));
}

#[test]
fn test_handshake_payloads_are_relayed_untouched() {
    let (mut broker, _) = broker_with_codes(&["7F2K"]);
    let (a, rx_a) = connect(&mut broker, 1);
    let (b, rx_b) = connect(&mut broker, 2);
    send(&mut broker, a, r#"{"type":"CREATE_ROOM"}"#);
    send(&mut broker, b, r#"{"type":"JOIN_ROOM","roomId":"7F2K"}"#);
    drain(&rx_a);
    drain(&rx_b);

    let sdp = json!({"type": "offer", "sdp": "v=0\r\no=- 1 2 IN IP4 0.0.0.0", "extra": [1, 2, 3]});
    broker.handle_message(a, SignalMessage::RtcOffer { sdp: sdp.clone() });
    assert_eq!(drain(&rx_b), vec![SignalMessage::RtcOffer { sdp }]);
    assert!(drain(&rx_a).is_empty());

    send(
        &mut broker,
        b,
        r#"{"type":"ICE_CANDIDATE","candidate":{"candidate":"candidate:1 1 udp 1 10.0.0.2 5000 typ host","sdpMid":"0"}}"#,
    );
    assert_eq!(
        drain(&rx_a),
        vec![SignalMessage::IceCandidate {
            candidate: json!({"candidate": "candidate:1 1 udp 1 10.0.0.2 5000 typ host", "sdpMid": "0"})
        }]
    );
}

#[test]
fn test_relay_without_peer_is_dropped_and_logged() {
    let (mut broker, lines) = broker_with_codes(&["7F2K"]);
    let (a, rx_a) = connect(&mut broker, 1);
    send(&mut broker, a, r#"{"type":"CREATE_ROOM"}"#);
    drain(&rx_a);

    send(&mut broker, a, r#"{"type":"RTC_ANSWER","sdp":{"type":"answer"}}"#);
    assert!(drain(&rx_a).is_empty());
    assert!(
        lines
            .lock()
            .unwrap()
            .iter()
            .any(|line| line.contains("RTC_ANSWER") && line.contains("no paired peer"))
    );
}

#[test]
fn test_malformed_frames_are_dropped_without_reply() {
    let (mut broker, lines) = broker_with_codes(&["7F2K"]);
    let (a, rx_a) = connect(&mut broker, 1);

    send(&mut broker, a, "not json at all");
    send(&mut broker, a, r#"{"type":"NO_SUCH_KIND"}"#);
    send(&mut broker, a, r#"{"type":"ROOM_CREATED","roomId":"7F2K"}"#);
    assert!(drain(&rx_a).is_empty());
    assert!(broker.registry().is_empty());

    let warnings = lines
        .lock()
        .unwrap()
        .iter()
        .filter(|line| line.contains("WARN") && line.contains("Dropping message"))
        .count();
    assert_eq!(warnings, 3);

    // The connection keeps working afterwards.
    send(&mut broker, a, r#"{"type":"CREATE_ROOM"}"#);
    assert_eq!(drain(&rx_a).len(), 1);
}

#[test]
fn test_creating_twice_is_refused() {
    let (mut broker, _) = broker_with_codes(&["7F2K", "ABCD"]);
    let (a, rx_a) = connect(&mut broker, 1);
    send(&mut broker, a, r#"{"type":"CREATE_ROOM"}"#);
    send(&mut broker, a, r#"{"type":"CREATE_ROOM"}"#);

    let received = drain(&rx_a);
    assert_eq!(received.len(), 2);
    assert!(matches!(received[1], SignalMessage::Error { .. }));
    assert_eq!(broker.registry().len(), 1);
}
