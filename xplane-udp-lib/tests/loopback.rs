//! Real UDP sockets on the loopback interface

mod common;

use common::*;
use std::io;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::time::Duration;
use xplane_udp_lib::channel::UdpChannel;
use xplane_udp_lib::config::{BindMode, ChannelConfig};

fn loopback_config() -> ChannelConfig {
    ChannelConfig {
        bind: BindMode::Host(IpAddr::V4(Ipv4Addr::LOCALHOST)),
        port: 0,
        read_timeout: Duration::from_millis(50),
    }
}

#[test]
fn test_receive_over_loopback() {
    init_tracing();
    let channel = UdpChannel::open(&loopback_config()).expect("Failed to bind loopback");
    let target = channel.local_addr();
    assert_ne!(target.port(), 0);

    let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
    sender.send_to(&hex_to_bytes(BEACON_HEX), target).unwrap();
    sender.send_to(&hex_to_bytes(DATA_HEX), target).unwrap();

    let mut session = DatagramSession::new(channel, &SessionConfig::default()).unwrap();
    let packet = match session.request_next().unwrap() {
        SessionOutcome::Packet(packet) => packet,
        other => panic!("Expected a packet, got {:?}", other),
    };
    assert_eq!(packet.kind, PacketKind::Data);
    assert_eq!(packet.sender, sender.local_addr().unwrap());
    assert_eq!(packet.speeds().unwrap().vind_kias, 150.0);
    assert_eq!(session.stats().beacons, 1);
}

#[test]
fn test_silence_over_loopback_reports_no_data() {
    let channel = UdpChannel::open(&loopback_config()).unwrap();
    let config = SessionConfig {
        max_timeouts: 2,
        ..Default::default()
    };
    let mut session = DatagramSession::new(channel, &config).unwrap();
    assert!(matches!(session.request_next().unwrap(), SessionOutcome::NoData { timeouts: 2 }));
}

#[test]
fn test_close_is_idempotent() {
    let mut channel = UdpChannel::open(&loopback_config()).unwrap();
    assert!(channel.is_open());
    channel.close();
    channel.close();
    assert!(!channel.is_open());

    let mut buf = [0u8; 16];
    match channel.receive(&mut buf) {
        ReceiveOutcome::Fatal(e) => assert_eq!(e.kind(), io::ErrorKind::NotConnected),
        other => panic!("Expected Fatal after close, got {:?}", other),
    }
}

#[test]
fn test_closed_session_fails_fatally() {
    let channel = UdpChannel::open(&loopback_config()).unwrap();
    let mut session = DatagramSession::new(channel, &SessionConfig::default()).unwrap();
    session.close();
    assert!(matches!(session.request_next(), Err(XpError::Io(_))));
}

#[test]
fn test_bind_to_foreign_address_fails() {
    // TEST-NET-3, never assigned to a local interface
    let config = ChannelConfig {
        bind: BindMode::Host(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7))),
        port: 0,
        ..Default::default()
    };
    match UdpChannel::open(&config) {
        Err(XpError::Bind { addr, .. }) => assert_eq!(addr.ip(), config.bind_addr().ip()),
        Err(other) => panic!("Expected Bind error, got {:?}", other),
        Ok(_) => panic!("Binding a foreign address should fail"),
    }
}
