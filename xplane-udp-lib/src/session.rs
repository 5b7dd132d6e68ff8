use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use std::net::SocketAddr;
use strum_macros::Display;
use tracing::{debug, trace, warn};

use crate::channel::{DatagramSource, ReceiveOutcome};
use crate::config::SessionConfig;
use crate::decode::decode_packet;
use crate::error::{Result, XpError};
use crate::layout::Registry;
use crate::message::DecodedPacket;
use crate::packet::{PacketKind, RawPacket};

/// What one `request_next` call produced.
#[derive(Debug)]
pub enum SessionOutcome {
    /// A data-bearing packet, fully decoded.
    Packet(DecodedPacket),
    /// `timeouts` consecutive receives expired without a datagram.
    NoData { timeouts: u32 },
}

/// Where the session is within one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum SessionPhase {
    Idle,
    Awaiting,
    Classifying,
    Decoding,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionState {
    /// Sender of the most recent datagram.
    pub sender: Option<SocketAddr>,
    pub consecutive_timeouts: u32,
    pub max_timeouts: u32,
    pub packet_size: usize,
}

/// Running counters over the lifetime of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub datagrams: u64,
    pub beacons: u64,
    pub unknown: u64,
    pub timeouts: u64,
    pub decoded: u64,
    pub decode_errors: u64,
}

/// Drives a [`DatagramSource`] until it yields a decodable packet.
///
/// The receive buffer is allocated once and reused for every datagram.
/// Beacons and unknown packets are consumed silently; a request only ever
/// returns decoded data, `NoData`, or an error.
pub struct DatagramSession<S: DatagramSource> {
    source: S,
    registry: Registry,
    buf: Vec<u8>,
    state: SessionState,
    stats: SessionStats,
    phase: SessionPhase,
}

impl<S: DatagramSource> DatagramSession<S> {
    pub fn new(source: S, config: &SessionConfig) -> Result<Self> {
        config.validate()?;
        let registry = Registry::new()?;
        debug!(
            packet_size = config.packet_size,
            max_timeouts = config.max_timeouts,
            "Datagram session created"
        );
        Ok(Self {
            source,
            registry,
            buf: vec![0; config.packet_size],
            state: SessionState {
                sender: None,
                consecutive_timeouts: 0,
                max_timeouts: config.max_timeouts,
                packet_size: config.packet_size,
            },
            stats: SessionStats::default(),
            phase: SessionPhase::Idle,
        })
    }

    /// Block until the next data-bearing packet is decoded, or until
    /// `max_timeouts` receives in a row expire.
    pub fn request_next(&mut self) -> Result<SessionOutcome> {
        self.transition(SessionPhase::Idle);
        self.state.consecutive_timeouts = 0;

        loop {
            self.transition(SessionPhase::Awaiting);
            let (len, sender) = match self.source.receive(&mut self.buf) {
                ReceiveOutcome::Received { len, sender } => (len.min(self.buf.len()), sender),
                ReceiveOutcome::TimedOut => {
                    self.stats.timeouts += 1;
                    self.state.consecutive_timeouts += 1;
                    trace!(
                        timeouts = self.state.consecutive_timeouts,
                        max = self.state.max_timeouts,
                        "Receive timed out"
                    );
                    if self.state.consecutive_timeouts >= self.state.max_timeouts {
                        let timeouts = self.state.consecutive_timeouts;
                        self.transition(SessionPhase::Failed);
                        warn!(timeouts, "No data received");
                        return Ok(SessionOutcome::NoData { timeouts });
                    }
                    continue;
                }
                ReceiveOutcome::Fatal(e) => {
                    self.transition(SessionPhase::Failed);
                    return Err(XpError::Io(e));
                }
            };

            self.state.consecutive_timeouts = 0;
            self.state.sender = Some(sender);
            self.stats.datagrams += 1;

            self.transition(SessionPhase::Classifying);
            let raw = RawPacket::new(&self.buf[..len], sender);
            let kind = raw.kind();
            match kind {
                PacketKind::Beacon => {
                    self.stats.beacons += 1;
                    debug!(%sender, len, "Ignoring beacon");
                    continue;
                }
                PacketKind::Unknown => {
                    self.stats.unknown += 1;
                    warn!(
                        %sender,
                        len,
                        tag = %raw.tag_lossy(),
                        data = %raw.hex_dump(),
                        "Unknown packet"
                    );
                    continue;
                }
                _ => trace!(%sender, len, %kind, "Data-bearing packet"),
            }

            self.transition(SessionPhase::Decoding);
            let body = match decode_packet(kind, &self.buf[..len], &self.registry) {
                Ok(body) => body,
                Err(e) => {
                    self.stats.decode_errors += 1;
                    self.transition(SessionPhase::Failed);
                    return Err(e);
                }
            };

            self.stats.decoded += 1;
            self.transition(SessionPhase::Done);
            return Ok(SessionOutcome::Packet(DecodedPacket {
                kind,
                sender,
                received_at: Utc::now(),
                payload: Bytes::copy_from_slice(&self.buf[..len]),
                body,
            }));
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Close the underlying source. Safe to call more than once.
    pub fn close(&mut self) {
        self.source.close();
    }

    /// Give back the source, e.g. to inspect a test double.
    pub fn into_inner(self) -> S {
        self.source
    }

    fn transition(&mut self, next: SessionPhase) {
        trace!(from = %self.phase, to = %next, "Session phase");
        self.phase = next;
    }
}
