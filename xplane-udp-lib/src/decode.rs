//! Layout-driven binary decoder.
//!
//! One routine reads any [`SubBlockLayout`]: it walks the fields in order,
//! consuming 4 or 8 little-endian bytes each. The composite DATA format is
//! four calls at consecutive 36-byte offsets, the flat format is one call.

use bytes::Buf;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use tracing::{debug, warn};

use crate::constants::*;
use crate::error::{Result, XpError};
use crate::layout::{DecodeStrategy, FieldSpec, LayoutId, PrimitiveType, Registry, SubBlockKind, SubBlockLayout};
use crate::message::{DataFrame, PacketBody};
use crate::packet::PacketKind;

/// A decoded primitive. No unit conversion is applied.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i32),
    Float(f32),
    Double(f64),
}

impl Value {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Value::Int(v) => v as f64,
            Value::Float(v) => v as f64,
            Value::Double(v) => v,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Value::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            Value::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn primitive(&self) -> PrimitiveType {
        match self {
            Value::Int(_) => PrimitiveType::Int32,
            Value::Float(_) => PrimitiveType::Float32,
            Value::Double(_) => PrimitiveType::Float64,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{:.4}", v),
            Value::Double(v) => write!(f, "{:.6}", v),
        }
    }
}

/// Named values of one record, in layout order.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord {
    layout: LayoutId,
    fields: &'static [FieldSpec],
    values: Vec<Value>,
}

impl DecodedRecord {
    pub fn layout(&self) -> LayoutId {
        self.layout
    }

    /// Sub-block kind for DATA records, `None` for the flat record.
    pub fn kind(&self) -> Option<SubBlockKind> {
        match self.layout {
            LayoutId::SubBlock(kind) => Some(kind),
            LayoutId::FlatPosition => None,
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .map(|index| self.values[index])
    }

    /// Value of `name` widened to f64.
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).map(|v| v.as_f64())
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, Value)> + '_ {
        self.fields.iter().map(|f| f.name).zip(self.values.iter().copied())
    }

    /// The `ID` field every layout starts with.
    pub fn id(&self) -> Option<i32> {
        self.values.first().and_then(Value::as_i32)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for DecodedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.fields() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

impl fmt::Display for DecodedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in self.fields() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
            first = false;
        }
        Ok(())
    }
}

/// Decode one record described by `layout`, starting at `offset`.
///
/// The remaining length is checked against the whole layout before any field
/// is read, so a short buffer fails with `TruncatedBuffer` and nothing else.
pub fn decode(buf: &[u8], offset: usize, layout: &SubBlockLayout) -> Result<DecodedRecord> {
    let required = layout.computed_len();
    let available = buf.len().saturating_sub(offset);
    if offset > buf.len() || available < required {
        return Err(XpError::TruncatedBuffer {
            layout: layout.id,
            offset,
            required,
            available,
        });
    }

    let mut cursor = &buf[offset..offset + required];
    let values = layout
        .fields
        .iter()
        .map(|field| match field.primitive {
            PrimitiveType::Int32 => Value::Int(cursor.get_i32_le()),
            PrimitiveType::Float32 => Value::Float(cursor.get_f32_le()),
            PrimitiveType::Float64 => Value::Double(cursor.get_f64_le()),
        })
        .collect();

    Ok(DecodedRecord {
        layout: layout.id,
        fields: layout.fields,
        values,
    })
}

/// Decode the four 36-byte sub-blocks of a DATA packet.
///
/// Blocks are assigned by position. A block whose `ID` does not carry the
/// expected data-set index is still decoded, with a warning.
pub fn decode_composite(buf: &[u8], registry: &Registry) -> Result<DataFrame> {
    let mut records = Vec::with_capacity(SUB_BLOCK_COUNT);
    for index in 0..SUB_BLOCK_COUNT {
        let layout = registry.sub_block_at(index)?;
        let offset = PAYLOAD_OFFSET + index * SUB_BLOCK_SIZE;
        let record = decode(buf, offset, layout)?;

        if let (Some(kind), Some(id)) = (record.kind(), record.id()) {
            if id != i32::from(kind) {
                warn!(
                    block = index,
                    expected = i32::from(kind),
                    actual = id,
                    "DATA sub-block carries an unexpected data-set index"
                );
            }
        }
        records.push(record);
    }
    debug!("Decoded {} DATA sub-blocks", records.len());
    DataFrame::new(records)
}

/// Decode the single flat record of an XATT/XGPS/XTRA packet.
pub fn decode_flat(buf: &[u8], registry: &Registry) -> Result<DecodedRecord> {
    decode(buf, PAYLOAD_OFFSET, registry.flat())
}

/// Decode a data-bearing packet with the strategy selected by its tag.
pub fn decode_packet(kind: PacketKind, buf: &[u8], registry: &Registry) -> Result<PacketBody> {
    match registry.strategy_for(kind)? {
        DecodeStrategy::Composite => decode_composite(buf, registry).map(PacketBody::Data),
        DecodeStrategy::Flat => decode_flat(buf, registry).map(PacketBody::Flat),
    }
}
