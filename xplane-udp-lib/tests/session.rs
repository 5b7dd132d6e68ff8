//! Session state machine driven by a scripted datagram source

mod common;

use common::*;
use std::io;

#[test]
fn test_data_packet_end_to_end() {
    init_tracing();
    let mut session = session([datagram(DATA_HEX)]);

    let packet = match session.request_next().expect("request failed") {
        SessionOutcome::Packet(packet) => packet,
        other => panic!("Expected a packet, got {:?}", other),
    };

    assert_eq!(packet.kind, PacketKind::Data);
    assert_eq!(packet.sender, sim_addr());
    let speeds = packet.data().unwrap().block(xplane_udp_lib::SubBlockKind::Speeds);
    assert_eq!(speeds.get_f64("vind_kias"), Some(150.0));
    assert_eq!(packet.payload.len(), 149);
    assert_eq!(session.phase(), SessionPhase::Done);
    assert_eq!(session.state().sender, Some(sim_addr()));
    assert_eq!(session.stats().decoded, 1);
}

#[test]
fn test_eleven_timeouts_yield_no_data() {
    init_tracing();
    let mut session = session(std::iter::repeat_n(Step::Timeout, 20));

    let outcome = session.request_next().unwrap();
    assert!(matches!(outcome, SessionOutcome::NoData { timeouts: 11 }), "{:?}", outcome);
    assert_eq!(session.phase(), SessionPhase::Failed);
    assert_eq!(session.stats().timeouts, 11);

    let source = session.into_inner();
    assert_eq!(source.receives, 11, "no 12th receive after the limit");
    assert_eq!(source.remaining(), 9);
}

#[test]
fn test_custom_timeout_limit() {
    let config = SessionConfig {
        max_timeouts: 3,
        ..Default::default()
    };
    let mut session = DatagramSession::new(ScriptedSource::new([]), &config).unwrap();
    assert!(matches!(session.request_next().unwrap(), SessionOutcome::NoData { timeouts: 3 }));
    assert_eq!(session.into_inner().receives, 3);
}

#[test]
fn test_timeouts_then_data() {
    let mut steps = vec![Step::Timeout; 10];
    steps.push(datagram(XGPS_HEX));
    let mut session = session(steps);

    let outcome = session.request_next().unwrap();
    assert!(matches!(outcome, SessionOutcome::Packet(ref p) if p.kind == PacketKind::Gps));
    assert_eq!(session.state().consecutive_timeouts, 0);
    assert_eq!(session.stats().timeouts, 10);
}

#[test]
fn test_timeout_counter_resets_on_receive() {
    // 10 timeouts, a beacon, then 10 more: never 11 in a row
    let mut steps = vec![Step::Timeout; 10];
    steps.push(datagram(BEACON_HEX));
    steps.extend(vec![Step::Timeout; 10]);
    steps.push(datagram(DATA_HEX));
    let mut session = session(steps);

    let outcome = session.request_next().unwrap();
    assert!(matches!(outcome, SessionOutcome::Packet(_)), "{:?}", outcome);
    assert_eq!(session.stats().beacons, 1);
    assert_eq!(session.into_inner().receives, 22);
}

#[test]
fn test_timeout_counter_resets_per_request() {
    let mut steps = vec![Step::Timeout; 6];
    steps.push(datagram(DATA_HEX));
    steps.extend(vec![Step::Timeout; 6]);
    steps.push(datagram(DATA_HEX));
    let mut session = session(steps);

    assert!(matches!(session.request_next().unwrap(), SessionOutcome::Packet(_)));
    assert!(matches!(session.request_next().unwrap(), SessionOutcome::Packet(_)));
    assert_eq!(session.stats().timeouts, 12);
}

#[test]
fn test_beacon_and_unknown_are_skipped() {
    init_tracing();
    let mut session = session([datagram(BEACON_HEX), datagram("52524546000102"), datagram(XGPS_HEX)]);

    let packet = match session.request_next().unwrap() {
        SessionOutcome::Packet(packet) => packet,
        other => panic!("Expected a packet, got {:?}", other),
    };
    assert_eq!(packet.kind, PacketKind::Gps);
    assert_eq!(packet.flat_position().unwrap().dat_lat, 47.449);

    let stats = *session.stats();
    assert_eq!(stats.datagrams, 3);
    assert_eq!(stats.beacons, 1);
    assert_eq!(stats.unknown, 1);
    assert_eq!(stats.decoded, 1);

    // Nothing left: the next request runs into timeouts
    assert!(matches!(session.request_next().unwrap(), SessionOutcome::NoData { .. }));
}

#[test]
fn test_short_datagrams_are_unknown() {
    let mut session = session([datagram(""), datagram("444154"), datagram(DATA_HEX)]);
    assert!(matches!(session.request_next().unwrap(), SessionOutcome::Packet(_)));
    assert_eq!(session.stats().unknown, 2);
}

#[test]
fn test_truncated_data_is_a_decode_error() {
    init_tracing();
    let short = &DATA_HEX[..DATA_HEX.len() - 2];
    let mut session = session([datagram(short), datagram(DATA_HEX)]);

    let err = session.request_next().unwrap_err();
    assert!(matches!(err, XpError::TruncatedBuffer { .. }), "{:?}", err);
    assert_eq!(session.phase(), SessionPhase::Failed);
    assert_eq!(session.stats().decode_errors, 1);

    // Not retried; the next request picks up the following datagram
    assert_eq!(session.into_inner().remaining(), 1);
}

#[test]
fn test_small_buffer_truncates_data() {
    let config = SessionConfig {
        packet_size: 100,
        ..Default::default()
    };
    let mut session = DatagramSession::new(ScriptedSource::new([datagram(DATA_HEX)]), &config).unwrap();
    assert!(matches!(session.request_next(), Err(XpError::TruncatedBuffer { .. })));
}

#[test]
fn test_fatal_io_error() {
    let mut session = session([Step::Timeout, Step::Fatal(io::ErrorKind::ConnectionReset)]);

    let err = session.request_next().unwrap_err();
    match err {
        XpError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::ConnectionReset),
        other => panic!("Expected Io error, got {:?}", other),
    }
    assert_eq!(session.phase(), SessionPhase::Failed);
}

#[test]
fn test_invalid_session_config() {
    let config = SessionConfig {
        packet_size: 0,
        ..Default::default()
    };
    assert!(matches!(
        DatagramSession::new(ScriptedSource::new([]), &config),
        Err(XpError::InvalidConfig(_))
    ));
}

#[test]
fn test_close_is_forwarded() {
    let mut session = session([]);
    assert_eq!(session.phase(), SessionPhase::Idle);
    session.close();
    session.close();
    assert_eq!(session.into_inner().closes, 2);
}
