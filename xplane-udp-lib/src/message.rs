use bytes::{BufMut, Bytes, BytesMut};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::net::SocketAddr;

use crate::constants::*;
use crate::decode::{DecodedRecord, Value};
use crate::error::{Result, XpError};
use crate::layout::{LayoutId, SubBlockKind, SubBlockLayout};
use crate::packet::PacketKind;
use crate::records::{Dme, FlatPosition, Orientation, Position, Speeds, TypedRecord};

/// The four sub-block records of one DATA packet, in packet order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DataFrame {
    records: Vec<DecodedRecord>,
}

impl DataFrame {
    /// Assemble a frame. Records must be the four sub-blocks in packet order.
    pub fn new(records: Vec<DecodedRecord>) -> Result<Self> {
        if records.len() != SUB_BLOCK_COUNT {
            return Err(XpError::Decode(format!(
                "DATA frame needs {} sub-blocks, got {}",
                SUB_BLOCK_COUNT,
                records.len()
            )));
        }
        for (record, kind) in records.iter().zip(SubBlockKind::ALL) {
            if record.kind() != Some(kind) {
                return Err(XpError::Decode(format!(
                    "DATA sub-block {} decoded as {} instead of {}",
                    kind.index(),
                    record.layout(),
                    LayoutId::SubBlock(kind)
                )));
            }
        }
        Ok(Self { records })
    }

    pub fn block(&self, kind: SubBlockKind) -> &DecodedRecord {
        &self.records[kind.index()]
    }

    pub fn records(&self) -> &[DecodedRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = (SubBlockKind, &DecodedRecord)> {
        SubBlockKind::ALL.into_iter().zip(self.records.iter())
    }
}

/// Decoded content of a data-bearing packet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "format", content = "records", rename_all = "snake_case")]
pub enum PacketBody {
    /// Composite DATA packet (four sub-blocks)
    Data(DataFrame),
    /// Flat XATT/XGPS/XTRA record
    Flat(DecodedRecord),
}

/// One decoded datagram as handed to consumers.
///
/// `payload` is a copy of the received bytes, taken before the session's
/// receive buffer is reused, so the packet stays valid on its own.
#[derive(Debug, Clone, Serialize)]
pub struct DecodedPacket {
    pub kind: PacketKind,
    pub sender: SocketAddr,
    pub received_at: DateTime<Utc>,
    #[serde(skip)]
    pub payload: Bytes,
    pub body: PacketBody,
}

impl DecodedPacket {
    pub fn data(&self) -> Option<&DataFrame> {
        match &self.body {
            PacketBody::Data(frame) => Some(frame),
            PacketBody::Flat(_) => None,
        }
    }

    pub fn flat(&self) -> Option<&DecodedRecord> {
        match &self.body {
            PacketBody::Flat(record) => Some(record),
            PacketBody::Data(_) => None,
        }
    }

    fn typed_block<T: TypedRecord>(&self, kind: SubBlockKind) -> Option<T> {
        self.data()?;
        T::read_at(&self.payload, kind.packet_offset()).ok()
    }

    pub fn speeds(&self) -> Option<Speeds> {
        self.typed_block(SubBlockKind::Speeds)
    }

    pub fn orientation(&self) -> Option<Orientation> {
        self.typed_block(SubBlockKind::Orientation)
    }

    pub fn position(&self) -> Option<Position> {
        self.typed_block(SubBlockKind::Position)
    }

    pub fn dme(&self) -> Option<Dme> {
        self.typed_block(SubBlockKind::Dme)
    }

    pub fn flat_position(&self) -> Option<FlatPosition> {
        self.flat()?;
        FlatPosition::read_at(&self.payload, PAYLOAD_OFFSET).ok()
    }

    /// Magnetic heading (degrees) and CG altitude (feet MSL) of a DATA packet.
    pub fn heading_altitude(&self) -> Option<(f32, f32)> {
        Some((self.orientation()?.hding_mag, self.position()?.cg_ftmsl))
    }
}

impl fmt::Display for DecodedPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] from {}: ", self.kind, self.sender)?;
        match (&self.body, self.heading_altitude(), self.flat_position()) {
            (PacketBody::Data(_), Some((hdg, alt)), _) => {
                write!(f, "HDG: {:.0} mag, ALT: {:.0} ft MSL", hdg, alt)?;
                if let Some(speeds) = self.speeds() {
                    write!(f, ", GS: {:.0} kts", speeds.vtrue_ktgs)?;
                }
                Ok(())
            }
            (PacketBody::Flat(_), _, Some(flat)) => write!(f, "{}", flat),
            (PacketBody::Data(frame), None, _) => write!(f, "{} sub-blocks", frame.records().len()),
            (PacketBody::Flat(record), _, None) => write!(f, "{}", record),
        }
    }
}

/// Builds wire datagrams: tag, pad byte, then little-endian records.
#[derive(Debug, Clone)]
pub struct PacketBuilder {
    buf: BytesMut,
}

impl PacketBuilder {
    /// Start a packet with the tag of `kind`. `Unknown` has no tag.
    pub fn new(kind: PacketKind) -> Result<Self> {
        let tag = kind
            .tag()
            .ok_or_else(|| XpError::Decode("cannot build a packet without a tag".to_string()))?;
        Ok(Self::with_tag(tag))
    }

    /// Start a packet with an arbitrary 4-byte tag.
    pub fn with_tag(tag: &[u8; TAG_SIZE]) -> Self {
        let mut buf = BytesMut::with_capacity(DEFAULT_PACKET_SIZE);
        buf.put_slice(tag);
        buf.put_u8(0);
        Self { buf }
    }

    /// Append one record's values following `layout`.
    pub fn push_values(mut self, layout: &SubBlockLayout, values: &[Value]) -> Result<Self> {
        if values.len() != layout.fields.len() {
            return Err(XpError::Decode(format!(
                "{} has {} fields, got {} values",
                layout.id,
                layout.fields.len(),
                values.len()
            )));
        }
        for (field, value) in layout.fields.iter().zip(values) {
            if value.primitive() != field.primitive {
                return Err(XpError::Decode(format!(
                    "field {} of {} is {:?}, got {:?}",
                    field.name,
                    layout.id,
                    field.primitive,
                    value.primitive()
                )));
            }
            match *value {
                Value::Int(v) => self.buf.put_i32_le(v),
                Value::Float(v) => self.buf.put_f32_le(v),
                Value::Double(v) => self.buf.put_f64_le(v),
            }
        }
        Ok(self)
    }

    /// Append a typed record.
    pub fn push<T: TypedRecord>(mut self, record: &T) -> Self {
        self.buf.put_slice(&record.to_bytes());
        self
    }

    /// Append raw bytes, e.g. a beacon body or deliberately malformed data.
    pub fn push_bytes(mut self, bytes: &[u8]) -> Self {
        self.buf.put_slice(bytes);
        self
    }

    pub fn build(self) -> Bytes {
        self.buf.freeze()
    }

    /// A complete DATA packet from four typed sub-blocks.
    pub fn data(speeds: &Speeds, orientation: &Orientation, position: &Position, dme: &Dme) -> Bytes {
        Self::with_tag(TAG_DATA)
            .push(speeds)
            .push(orientation)
            .push(position)
            .push(dme)
            .build()
    }

    /// A complete flat packet (`XATT`, `XGPS` or `XTRA`).
    pub fn flat(kind: PacketKind, record: &FlatPosition) -> Result<Bytes> {
        if !matches!(kind, PacketKind::Attitude | PacketKind::Gps | PacketKind::Extra) {
            return Err(XpError::Decode(format!("{} packets do not carry a flat record", kind)));
        }
        Ok(Self::new(kind)?.push(record).build())
    }
}
