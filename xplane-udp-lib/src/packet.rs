use crate::constants::*;
use serde::Serialize;
use std::net::SocketAddr;
use strum_macros::Display;

/// Packet kind, taken from the 4-byte ASCII tag at the start of a datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
pub enum PacketKind {
    #[strum(to_string = "BECN")]
    Beacon,
    #[strum(to_string = "DATA")]
    Data,
    #[strum(to_string = "XATT")]
    Attitude,
    #[strum(to_string = "XGPS")]
    Gps,
    #[strum(to_string = "XTRA")]
    Extra,
    #[strum(to_string = "UNKNOWN")]
    Unknown,
}

impl PacketKind {
    /// The wire tag for this kind, `None` for `Unknown`.
    pub fn tag(&self) -> Option<&'static [u8; TAG_SIZE]> {
        match self {
            PacketKind::Beacon => Some(TAG_BEACON),
            PacketKind::Data => Some(TAG_DATA),
            PacketKind::Attitude => Some(TAG_ATTITUDE),
            PacketKind::Gps => Some(TAG_GPS),
            PacketKind::Extra => Some(TAG_EXTRA),
            PacketKind::Unknown => None,
        }
    }

    /// Whether this kind carries telemetry that the decoder unpacks.
    pub fn is_data_bearing(&self) -> bool {
        matches!(
            self,
            PacketKind::Data | PacketKind::Attitude | PacketKind::Gps | PacketKind::Extra
        )
    }
}

/// Classify a datagram by its first four bytes.
///
/// Total over every input: anything shorter than the tag, or with a tag that
/// is not one of the five known ones, is `Unknown`.
pub fn classify(buf: &[u8]) -> PacketKind {
    let Some(tag) = buf.get(..TAG_SIZE) else {
        return PacketKind::Unknown;
    };
    match tag {
        t if t == TAG_BEACON => PacketKind::Beacon,
        t if t == TAG_DATA => PacketKind::Data,
        t if t == TAG_ATTITUDE => PacketKind::Attitude,
        t if t == TAG_GPS => PacketKind::Gps,
        t if t == TAG_EXTRA => PacketKind::Extra,
        _ => PacketKind::Unknown,
    }
}

/// A received datagram borrowed from the session's receive buffer.
///
/// The borrow ends on the next receive, which overwrites the buffer. Anything
/// that must outlive it is copied out (see `DecodedPacket::payload`).
#[derive(Debug, Clone, Copy)]
pub struct RawPacket<'a> {
    pub data: &'a [u8],
    pub sender: SocketAddr,
}

impl<'a> RawPacket<'a> {
    pub fn new(data: &'a [u8], sender: SocketAddr) -> Self {
        Self { data, sender }
    }

    pub fn kind(&self) -> PacketKind {
        classify(self.data)
    }

    /// Number of bytes actually received.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The tag bytes as text, lossy for non-ASCII garbage.
    pub fn tag_lossy(&self) -> String {
        let end = self.data.len().min(TAG_SIZE);
        String::from_utf8_lossy(&self.data[..end]).to_string()
    }

    /// Hex dump used when reporting packets nobody can decode.
    pub fn hex_dump(&self) -> String {
        hex::encode(self.data)
    }
}
