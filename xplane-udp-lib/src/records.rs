use serde::Serialize;
use std::fmt;
use zerocopy::byteorder::little_endian::{F32, F64, I32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::error::{Result, XpError};
use crate::layout::{LayoutId, SubBlockKind};

/// Data set 3: speeds (36 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct SpeedsRaw {
    pub id: I32,
    pub vind_kias: F32,   // indicated airspeed, knots
    pub vind_keas: F32,   // equivalent airspeed, knots
    pub vtrue_ktas: F32,  // true airspeed, knots
    pub vtrue_ktgs: F32,  // true groundspeed, knots
    pub nothing: I32,     // filler
    pub vind_mph: F32,    // indicated airspeed, mph
    pub vtrue_mphas: F32, // true airspeed, mph
    pub vtrue_mphgs: F32, // true groundspeed, mph
}

/// Data set 17: pitch, roll and headings (36 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct OrientationRaw {
    pub id: I32,
    pub pitch_deg: F32,
    pub roll_deg: F32,
    pub hding_true: F32,
    pub nothing1: I32,
    pub hding_mag: F32,
    pub mavar_deg: F32, // magnetic variation
    pub nothing2: I32,
    pub mag_comp: F32,
}

/// Data set 20: latitude, longitude and altitude (36 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct PositionRaw {
    pub id: I32,
    pub lat_deg: F32,
    pub lon_deg: F32,
    pub cg_ftmsl: F32,    // CG altitude, feet MSL
    pub gear_ftagl: F32,  // gear altitude, feet AGL
    pub terrn_ftmsl: F32, // terrain elevation, feet MSL
    pub p_alt_ftmsl: F32, // pressure altitude, feet
    pub lat_origin: F32,
    pub lon_origin: F32,
}

/// Data set 102: DME (36 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct DmeRaw {
    pub id: I32,
    pub dme_nav01: F32,
    pub dme_mode: F32,  // 1 = dme1, 2 = dme2
    pub dme_found: F32,
    pub dme_dist: F32,  // nm
    pub dme_speed: F32, // kts
    pub dme_time: F32,  // minutes to station
    pub dme_ntyp: I32,
    pub dme3_freq: I32,
}

/// Flat position record carried by XATT/XGPS/XTRA packets (68 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct FlatPositionRaw {
    pub id: I32,
    pub dat_lon: F64,
    pub dat_lat: F64,
    pub dat_ele: F64,     // elevation above sea level, meters
    pub y_agl_mtr: F32,   // elevation above terrain, meters
    pub veh_the_loc: F32, // pitch, degrees
    pub veh_psi_loc: F32, // true heading, degrees
    pub veh_phi_loc: F32, // roll, degrees
    pub vx_wrl: F32,      // speed east, m/s
    pub vy_wrl: F32,      // speed up, m/s
    pub vz_wrl: F32,      // speed south, m/s
    pub prad: F32,        // roll rate, rad/s
    pub qrad: F32,        // pitch rate, rad/s
    pub rrad: F32,        // yaw rate, rad/s
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Speeds {
    pub id: i32,
    pub vind_kias: f32,
    pub vind_keas: f32,
    pub vtrue_ktas: f32,
    pub vtrue_ktgs: f32,
    pub nothing: i32,
    pub vind_mph: f32,
    pub vtrue_mphas: f32,
    pub vtrue_mphgs: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Orientation {
    pub id: i32,
    pub pitch_deg: f32,
    pub roll_deg: f32,
    pub hding_true: f32,
    pub nothing1: i32,
    pub hding_mag: f32,
    pub mavar_deg: f32,
    pub nothing2: i32,
    pub mag_comp: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub id: i32,
    pub lat_deg: f32,
    pub lon_deg: f32,
    pub cg_ftmsl: f32,
    pub gear_ftagl: f32,
    pub terrn_ftmsl: f32,
    pub p_alt_ftmsl: f32,
    pub lat_origin: f32,
    pub lon_origin: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Dme {
    pub id: i32,
    pub dme_nav01: f32,
    pub dme_mode: f32,
    pub dme_found: f32,
    pub dme_dist: f32,
    pub dme_speed: f32,
    pub dme_time: f32,
    pub dme_ntyp: i32,
    pub dme3_freq: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FlatPosition {
    pub id: i32,
    pub dat_lon: f64,
    pub dat_lat: f64,
    pub dat_ele: f64,
    pub y_agl_mtr: f32,
    pub veh_the_loc: f32,
    pub veh_psi_loc: f32,
    pub veh_phi_loc: f32,
    pub vx_wrl: f32,
    pub vy_wrl: f32,
    pub vz_wrl: f32,
    pub prad: f32,
    pub qrad: f32,
    pub rrad: f32,
}

/// Fixed-shape view of one wire record.
///
/// Each implementor pairs a native struct with its zerocopy wire struct and
/// the registry layout it must agree with.
pub trait TypedRecord: Sized {
    type Raw: FromBytes + IntoBytes + KnownLayout + Immutable + Unaligned + Copy;

    const LAYOUT: LayoutId;

    fn from_raw(raw: &Self::Raw) -> Self;

    fn to_raw(&self) -> Self::Raw;

    /// Read the record from exactly `size_of::<Self::Raw>()` bytes at `offset`.
    fn read_at(buf: &[u8], offset: usize) -> Result<Self> {
        let required = size_of::<Self::Raw>();
        let available = buf.len().saturating_sub(offset);
        if offset > buf.len() || available < required {
            return Err(XpError::TruncatedBuffer {
                layout: Self::LAYOUT,
                offset,
                required,
                available,
            });
        }
        let raw = Self::Raw::ref_from_bytes(&buf[offset..offset + required])
            .map_err(|_| XpError::Decode(format!("failed to view {} bytes as {}", required, Self::LAYOUT)))?;
        Ok(Self::from_raw(raw))
    }

    /// Little-endian wire bytes of the record.
    fn to_bytes(&self) -> Vec<u8> {
        self.to_raw().as_bytes().to_vec()
    }
}

impl TypedRecord for Speeds {
    type Raw = SpeedsRaw;
    const LAYOUT: LayoutId = LayoutId::SubBlock(SubBlockKind::Speeds);

    fn from_raw(raw: &SpeedsRaw) -> Self {
        Self {
            id: raw.id.get(),
            vind_kias: raw.vind_kias.get(),
            vind_keas: raw.vind_keas.get(),
            vtrue_ktas: raw.vtrue_ktas.get(),
            vtrue_ktgs: raw.vtrue_ktgs.get(),
            nothing: raw.nothing.get(),
            vind_mph: raw.vind_mph.get(),
            vtrue_mphas: raw.vtrue_mphas.get(),
            vtrue_mphgs: raw.vtrue_mphgs.get(),
        }
    }

    fn to_raw(&self) -> SpeedsRaw {
        SpeedsRaw {
            id: I32::new(self.id),
            vind_kias: F32::new(self.vind_kias),
            vind_keas: F32::new(self.vind_keas),
            vtrue_ktas: F32::new(self.vtrue_ktas),
            vtrue_ktgs: F32::new(self.vtrue_ktgs),
            nothing: I32::new(self.nothing),
            vind_mph: F32::new(self.vind_mph),
            vtrue_mphas: F32::new(self.vtrue_mphas),
            vtrue_mphgs: F32::new(self.vtrue_mphgs),
        }
    }
}

impl TypedRecord for Orientation {
    type Raw = OrientationRaw;
    const LAYOUT: LayoutId = LayoutId::SubBlock(SubBlockKind::Orientation);

    fn from_raw(raw: &OrientationRaw) -> Self {
        Self {
            id: raw.id.get(),
            pitch_deg: raw.pitch_deg.get(),
            roll_deg: raw.roll_deg.get(),
            hding_true: raw.hding_true.get(),
            nothing1: raw.nothing1.get(),
            hding_mag: raw.hding_mag.get(),
            mavar_deg: raw.mavar_deg.get(),
            nothing2: raw.nothing2.get(),
            mag_comp: raw.mag_comp.get(),
        }
    }

    fn to_raw(&self) -> OrientationRaw {
        OrientationRaw {
            id: I32::new(self.id),
            pitch_deg: F32::new(self.pitch_deg),
            roll_deg: F32::new(self.roll_deg),
            hding_true: F32::new(self.hding_true),
            nothing1: I32::new(self.nothing1),
            hding_mag: F32::new(self.hding_mag),
            mavar_deg: F32::new(self.mavar_deg),
            nothing2: I32::new(self.nothing2),
            mag_comp: F32::new(self.mag_comp),
        }
    }
}

impl TypedRecord for Position {
    type Raw = PositionRaw;
    const LAYOUT: LayoutId = LayoutId::SubBlock(SubBlockKind::Position);

    fn from_raw(raw: &PositionRaw) -> Self {
        Self {
            id: raw.id.get(),
            lat_deg: raw.lat_deg.get(),
            lon_deg: raw.lon_deg.get(),
            cg_ftmsl: raw.cg_ftmsl.get(),
            gear_ftagl: raw.gear_ftagl.get(),
            terrn_ftmsl: raw.terrn_ftmsl.get(),
            p_alt_ftmsl: raw.p_alt_ftmsl.get(),
            lat_origin: raw.lat_origin.get(),
            lon_origin: raw.lon_origin.get(),
        }
    }

    fn to_raw(&self) -> PositionRaw {
        PositionRaw {
            id: I32::new(self.id),
            lat_deg: F32::new(self.lat_deg),
            lon_deg: F32::new(self.lon_deg),
            cg_ftmsl: F32::new(self.cg_ftmsl),
            gear_ftagl: F32::new(self.gear_ftagl),
            terrn_ftmsl: F32::new(self.terrn_ftmsl),
            p_alt_ftmsl: F32::new(self.p_alt_ftmsl),
            lat_origin: F32::new(self.lat_origin),
            lon_origin: F32::new(self.lon_origin),
        }
    }
}

impl TypedRecord for Dme {
    type Raw = DmeRaw;
    const LAYOUT: LayoutId = LayoutId::SubBlock(SubBlockKind::Dme);

    fn from_raw(raw: &DmeRaw) -> Self {
        Self {
            id: raw.id.get(),
            dme_nav01: raw.dme_nav01.get(),
            dme_mode: raw.dme_mode.get(),
            dme_found: raw.dme_found.get(),
            dme_dist: raw.dme_dist.get(),
            dme_speed: raw.dme_speed.get(),
            dme_time: raw.dme_time.get(),
            dme_ntyp: raw.dme_ntyp.get(),
            dme3_freq: raw.dme3_freq.get(),
        }
    }

    fn to_raw(&self) -> DmeRaw {
        DmeRaw {
            id: I32::new(self.id),
            dme_nav01: F32::new(self.dme_nav01),
            dme_mode: F32::new(self.dme_mode),
            dme_found: F32::new(self.dme_found),
            dme_dist: F32::new(self.dme_dist),
            dme_speed: F32::new(self.dme_speed),
            dme_time: F32::new(self.dme_time),
            dme_ntyp: I32::new(self.dme_ntyp),
            dme3_freq: I32::new(self.dme3_freq),
        }
    }
}

impl TypedRecord for FlatPosition {
    type Raw = FlatPositionRaw;
    const LAYOUT: LayoutId = LayoutId::FlatPosition;

    fn from_raw(raw: &FlatPositionRaw) -> Self {
        Self {
            id: raw.id.get(),
            dat_lon: raw.dat_lon.get(),
            dat_lat: raw.dat_lat.get(),
            dat_ele: raw.dat_ele.get(),
            y_agl_mtr: raw.y_agl_mtr.get(),
            veh_the_loc: raw.veh_the_loc.get(),
            veh_psi_loc: raw.veh_psi_loc.get(),
            veh_phi_loc: raw.veh_phi_loc.get(),
            vx_wrl: raw.vx_wrl.get(),
            vy_wrl: raw.vy_wrl.get(),
            vz_wrl: raw.vz_wrl.get(),
            prad: raw.prad.get(),
            qrad: raw.qrad.get(),
            rrad: raw.rrad.get(),
        }
    }

    fn to_raw(&self) -> FlatPositionRaw {
        FlatPositionRaw {
            id: I32::new(self.id),
            dat_lon: F64::new(self.dat_lon),
            dat_lat: F64::new(self.dat_lat),
            dat_ele: F64::new(self.dat_ele),
            y_agl_mtr: F32::new(self.y_agl_mtr),
            veh_the_loc: F32::new(self.veh_the_loc),
            veh_psi_loc: F32::new(self.veh_psi_loc),
            veh_phi_loc: F32::new(self.veh_phi_loc),
            vx_wrl: F32::new(self.vx_wrl),
            vy_wrl: F32::new(self.vy_wrl),
            vz_wrl: F32::new(self.vz_wrl),
            prad: F32::new(self.prad),
            qrad: F32::new(self.qrad),
            rrad: F32::new(self.rrad),
        }
    }
}

impl fmt::Display for Speeds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IAS: {:.1} kts, TAS: {:.1} kts, GS: {:.1} kts",
            self.vind_kias, self.vtrue_ktas, self.vtrue_ktgs
        )
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HDG: {:.0} mag ({:.0} true), Pitch: {:.1}°, Roll: {:.1}°",
            self.hding_mag, self.hding_true, self.pitch_deg, self.roll_deg
        )
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LAT: {:.4}, LON: {:.4}, ALT: {:.0} ft MSL",
            self.lat_deg, self.lon_deg, self.cg_ftmsl
        )
    }
}

impl fmt::Display for Dme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DME: {:.1} nm, {:.0} kts, {:.1} min, DME3: {} MHz",
            self.dme_dist, self.dme_speed, self.dme_time, self.dme3_freq
        )
    }
}

impl fmt::Display for FlatPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LAT: {:.4}, LON: {:.4}, ELE: {:.1} m, HDG: {:.0} true, Pitch: {:.1}°, Roll: {:.1}°",
            self.dat_lat, self.dat_lon, self.dat_ele, self.veh_psi_loc, self.veh_the_loc, self.veh_phi_loc
        )
    }
}
