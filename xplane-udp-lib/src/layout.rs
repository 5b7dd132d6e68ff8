//! Static field layouts for the binary telemetry records.
//!
//! X-Plane's UDP "Data Output" packs every data set into a 36-byte block: an
//! `i32` data-set index followed by eight 4-byte values. Which of those eight
//! are integers and which are floats depends on the data set. A DATA packet
//! concatenates four such blocks after the 5-byte header:
//!
//! ```text
//! ┌──────┬─────┬──────────┬─────────────┬──────────┬──────────┐
//! │ DATA │ 0x00│ Speeds   │ Orientation │ Position │ DME      │
//! │ 4 B  │ 1 B │ 36 B     │ 36 B        │ 36 B     │ 36 B     │
//! └──────┴─────┴──────────┴─────────────┴──────────┴──────────┘
//! ```
//!
//! `XATT`, `XGPS` and `XTRA` packets instead carry one 68-byte flat record
//! (ID + 3×f64 + 10×f32) after the same 5-byte header.

use crate::constants::*;
use crate::error::{Result, XpError};
use crate::packet::PacketKind;
use crate::records::{DmeRaw, FlatPositionRaw, OrientationRaw, PositionRaw, SpeedsRaw};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Serialize;
use std::fmt;
use strum_macros::Display;

/// Primitive field types found in the wire records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PrimitiveType {
    Int32,
    Float32,
    Float64,
}

impl PrimitiveType {
    /// Width of the type on the wire, in bytes.
    pub const fn size(&self) -> usize {
        match self {
            PrimitiveType::Int32 | PrimitiveType::Float32 => 4,
            PrimitiveType::Float64 => 8,
        }
    }
}

/// One named field of a layout. Its position is its index in the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub primitive: PrimitiveType,
}

const fn int(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        primitive: PrimitiveType::Int32,
    }
}

const fn float(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        primitive: PrimitiveType::Float32,
    }
}

const fn double(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        primitive: PrimitiveType::Float64,
    }
}

/// DATA sub-block kinds, numbered by their X-Plane data-set index (the value
/// carried in each block's `ID` field).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, TryFromPrimitive, IntoPrimitive,
)]
#[repr(i32)]
pub enum SubBlockKind {
    #[strum(to_string = "Speeds")]
    Speeds = 3,
    #[strum(to_string = "Pitch, roll, & headings")]
    Orientation = 17,
    #[strum(to_string = "Latitude, longitude, & altitude")]
    Position = 20,
    #[strum(to_string = "DME")]
    Dme = 102,
}

impl SubBlockKind {
    /// Sub-blocks in the order they appear in a DATA packet.
    pub const ALL: [SubBlockKind; SUB_BLOCK_COUNT] = [
        SubBlockKind::Speeds,
        SubBlockKind::Orientation,
        SubBlockKind::Position,
        SubBlockKind::Dme,
    ];

    /// Position of this block inside a DATA packet.
    pub fn index(&self) -> usize {
        match self {
            SubBlockKind::Speeds => 0,
            SubBlockKind::Orientation => 1,
            SubBlockKind::Position => 2,
            SubBlockKind::Dme => 3,
        }
    }

    /// Absolute byte offset of this block inside a DATA packet.
    pub fn packet_offset(&self) -> usize {
        PAYLOAD_OFFSET + self.index() * SUB_BLOCK_SIZE
    }
}

/// Identifies a layout in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LayoutId {
    SubBlock(SubBlockKind),
    FlatPosition,
}

impl fmt::Display for LayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutId::SubBlock(kind) => write!(f, "sub-block {:?}", kind),
            LayoutId::FlatPosition => write!(f, "flat position record"),
        }
    }
}

/// Ordered fields covering exactly one fixed-size binary record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubBlockLayout {
    pub id: LayoutId,
    pub byte_len: usize,
    pub fields: &'static [FieldSpec],
}

impl SubBlockLayout {
    /// Sum of the field widths.
    pub fn computed_len(&self) -> usize {
        self.fields.iter().map(|f| f.primitive.size()).sum()
    }

    /// Position of a field by name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Byte offset of a field relative to the start of the record.
    pub fn field_offset(&self, name: &str) -> Option<usize> {
        let index = self.position(name)?;
        Some(self.fields[..index].iter().map(|f| f.primitive.size()).sum())
    }

    fn validate(&self, raw_size: usize) -> Result<()> {
        let computed = self.computed_len();
        if computed != self.byte_len {
            return Err(XpError::LayoutMismatch {
                layout: self.id,
                declared: self.byte_len,
                computed,
            });
        }
        if raw_size != self.byte_len {
            return Err(XpError::LayoutMismatch {
                layout: self.id,
                declared: self.byte_len,
                computed: raw_size,
            });
        }
        Ok(())
    }
}

// Field order follows the little-endian unpack formats of each data set.

// <iffffifff
const SPEEDS_FIELDS: [FieldSpec; 9] = [
    int("ID"),
    float("vind_kias"),
    float("vind_keas"),
    float("vtrue_ktas"),
    float("vtrue_ktgs"),
    int("nothing"),
    float("vind_mph"),
    float("vtrue_mphas"),
    float("vtrue_mphgs"),
];

// <ifffiffif
const ORIENTATION_FIELDS: [FieldSpec; 9] = [
    int("ID"),
    float("pitch_deg"),
    float("roll_deg"),
    float("hding_true"),
    int("nothing1"),
    float("hding_mag"),
    float("mavar_deg"),
    int("nothing2"),
    float("mag_comp"),
];

// <iffffffff
const POSITION_FIELDS: [FieldSpec; 9] = [
    int("ID"),
    float("lat_deg"),
    float("lon_deg"),
    float("CG_ftmsl"),
    float("gear_ftagl"),
    float("terrn_ftmsl"),
    float("p_alt_ftmsl"),
    float("lat_origin"),
    float("lon_origin"),
];

// <iffffffii
const DME_FIELDS: [FieldSpec; 9] = [
    int("ID"),
    float("dme_nav01"),
    float("dme_mode"),
    float("dme_found"),
    float("dme_dist"),
    float("dme_speed"),
    float("dme_time"),
    int("dme_ntyp"),
    int("dme3_freq"),
];

// <idddffffffffff
const FLAT_POSITION_FIELDS: [FieldSpec; 14] = [
    int("ID"),
    double("dat_lon"),
    double("dat_lat"),
    double("dat_ele"),
    float("y_agl_mtr"),
    float("veh_the_loc"),
    float("veh_psi_loc"),
    float("veh_phi_loc"),
    float("vx_wrl"),
    float("vy_wrl"),
    float("vz_wrl"),
    float("Prad"),
    float("Qrad"),
    float("Rrad"),
];

pub const SPEEDS_LAYOUT: SubBlockLayout = SubBlockLayout {
    id: LayoutId::SubBlock(SubBlockKind::Speeds),
    byte_len: SUB_BLOCK_SIZE,
    fields: &SPEEDS_FIELDS,
};

pub const ORIENTATION_LAYOUT: SubBlockLayout = SubBlockLayout {
    id: LayoutId::SubBlock(SubBlockKind::Orientation),
    byte_len: SUB_BLOCK_SIZE,
    fields: &ORIENTATION_FIELDS,
};

pub const POSITION_LAYOUT: SubBlockLayout = SubBlockLayout {
    id: LayoutId::SubBlock(SubBlockKind::Position),
    byte_len: SUB_BLOCK_SIZE,
    fields: &POSITION_FIELDS,
};

pub const DME_LAYOUT: SubBlockLayout = SubBlockLayout {
    id: LayoutId::SubBlock(SubBlockKind::Dme),
    byte_len: SUB_BLOCK_SIZE,
    fields: &DME_FIELDS,
};

pub const FLAT_POSITION_LAYOUT: SubBlockLayout = SubBlockLayout {
    id: LayoutId::FlatPosition,
    byte_len: FLAT_RECORD_SIZE,
    fields: &FLAT_POSITION_FIELDS,
};

/// How a data-bearing packet is unpacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStrategy {
    /// Four 36-byte sub-blocks (`DATA`).
    Composite,
    /// One 68-byte flat record (`XATT`, `XGPS`, `XTRA`).
    Flat,
}

/// Validated table of every known layout.
#[derive(Debug, Clone)]
pub struct Registry {
    sub_blocks: [SubBlockLayout; SUB_BLOCK_COUNT],
    flat: SubBlockLayout,
}

impl Registry {
    /// Build the registry, checking that every layout's fields add up to its
    /// declared length and to the size of its typed record.
    pub fn new() -> Result<Self> {
        Self::from_layouts(
            [SPEEDS_LAYOUT, ORIENTATION_LAYOUT, POSITION_LAYOUT, DME_LAYOUT],
            FLAT_POSITION_LAYOUT,
        )
    }

    pub(crate) fn from_layouts(sub_blocks: [SubBlockLayout; SUB_BLOCK_COUNT], flat: SubBlockLayout) -> Result<Self> {
        let raw_sizes = [
            size_of::<SpeedsRaw>(),
            size_of::<OrientationRaw>(),
            size_of::<PositionRaw>(),
            size_of::<DmeRaw>(),
        ];
        for ((layout, kind), raw_size) in sub_blocks.iter().zip(SubBlockKind::ALL).zip(raw_sizes) {
            if layout.id != LayoutId::SubBlock(kind) {
                return Err(XpError::UnknownLayout(format!(
                    "slot {} holds {} instead of {}",
                    kind.index(),
                    layout.id,
                    LayoutId::SubBlock(kind)
                )));
            }
            layout.validate(raw_size)?;
        }
        if flat.id != LayoutId::FlatPosition {
            return Err(XpError::UnknownLayout(format!("flat slot holds {}", flat.id)));
        }
        flat.validate(size_of::<FlatPositionRaw>())?;

        Ok(Self { sub_blocks, flat })
    }

    pub fn layout(&self, id: LayoutId) -> &SubBlockLayout {
        match id {
            LayoutId::SubBlock(kind) => self.sub_block(kind),
            LayoutId::FlatPosition => &self.flat,
        }
    }

    pub fn sub_block(&self, kind: SubBlockKind) -> &SubBlockLayout {
        &self.sub_blocks[kind.index()]
    }

    /// Layout of the sub-block at `index` within a DATA packet.
    pub fn sub_block_at(&self, index: usize) -> Result<&SubBlockLayout> {
        self.sub_blocks
            .get(index)
            .ok_or_else(|| XpError::UnknownLayout(format!("no DATA sub-block at index {}", index)))
    }

    pub fn sub_blocks(&self) -> &[SubBlockLayout] {
        &self.sub_blocks
    }

    pub fn flat(&self) -> &SubBlockLayout {
        &self.flat
    }

    /// Decode strategy for a packet kind. Kinds without a layout fail.
    pub fn strategy_for(&self, kind: PacketKind) -> Result<DecodeStrategy> {
        match kind {
            PacketKind::Data => Ok(DecodeStrategy::Composite),
            PacketKind::Attitude | PacketKind::Gps | PacketKind::Extra => Ok(DecodeStrategy::Flat),
            PacketKind::Beacon | PacketKind::Unknown => {
                Err(XpError::UnknownLayout(format!("no layout for {} packets", kind)))
            }
        }
    }
}
