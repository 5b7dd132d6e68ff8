//! Decoding through the public API: classify, decode_packet, typed views

mod common;

use common::*;
use xplane_udp_lib::decode::{Value, decode, decode_packet};
use xplane_udp_lib::layout::{Registry, SubBlockKind};
use xplane_udp_lib::message::{PacketBody, PacketBuilder};
use xplane_udp_lib::packet::classify;
use xplane_udp_lib::records::{FlatPosition, TypedRecord};

#[test]
fn test_all_flat_kinds_share_one_layout() {
    let registry = Registry::new().unwrap();
    let record = FlatPosition {
        id: 1,
        dat_lon: 8.5,
        dat_lat: 47.25,
        dat_ele: 420.0,
        veh_psi_loc: 90.0,
        ..Default::default()
    };

    for kind in [PacketKind::Attitude, PacketKind::Gps, PacketKind::Extra] {
        let bytes = PacketBuilder::flat(kind, &record).unwrap();
        assert_eq!(classify(&bytes), kind);
        match decode_packet(kind, &bytes, &registry).unwrap() {
            PacketBody::Flat(decoded) => {
                assert_eq!(decoded.get("dat_lat"), Some(Value::Double(47.25)));
                assert_eq!(decoded.get("veh_psi_loc"), Some(Value::Float(90.0)));
            }
            PacketBody::Data(_) => panic!("{} must decode as a flat record", kind),
        }
    }
}

#[test]
fn test_extra_bytes_after_record_are_ignored() {
    let mut bytes = hex_to_bytes(XGPS_HEX).to_vec();
    bytes.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
    let body = decode_packet(PacketKind::Gps, &bytes, &Registry::new().unwrap()).unwrap();
    let PacketBody::Flat(record) = body else {
        panic!("Expected flat record");
    };
    assert_eq!(record.get_f64("dat_ele"), Some(131.5));
}

#[test]
fn test_truncated_flat_record() {
    let bytes = hex_to_bytes(XGPS_HEX);
    let err = decode_packet(PacketKind::Gps, &bytes[..60], &Registry::new().unwrap()).unwrap_err();
    assert!(
        matches!(err, XpError::TruncatedBuffer { required: 68, available: 55, .. }),
        "{:?}",
        err
    );
}

#[test]
fn test_fields_iterate_in_layout_order() {
    let data = hex_to_bytes(DATA_HEX);
    let registry = Registry::new().unwrap();
    let record = decode(&data, SubBlockKind::Orientation.packet_offset(), registry.sub_block(SubBlockKind::Orientation))
        .unwrap();
    let names: Vec<_> = record.fields().map(|(name, _)| name).collect();
    assert_eq!(
        names,
        [
            "ID",
            "pitch_deg",
            "roll_deg",
            "hding_true",
            "nothing1",
            "hding_mag",
            "mavar_deg",
            "nothing2",
            "mag_comp"
        ]
    );
    assert_eq!(record.len(), 9);
}

#[test]
fn test_typed_and_generic_records_agree() {
    let data = hex_to_bytes(XGPS_HEX);
    let registry = Registry::new().unwrap();
    let typed = FlatPosition::read_at(&data, 5).unwrap();
    let generic = decode(&data, 5, registry.flat()).unwrap();

    assert_eq!(generic.get("ID"), Some(Value::Int(typed.id)));
    assert_eq!(generic.get("dat_lon"), Some(Value::Double(typed.dat_lon)));
    assert_eq!(generic.get("Prad"), Some(Value::Float(typed.prad)));
    assert_eq!(generic.get("vz_wrl"), Some(Value::Float(typed.vz_wrl)));
    assert_eq!(typed.to_bytes(), &data[5..]);
}

#[test]
fn test_random_garbage_never_panics() {
    let registry = Registry::new().unwrap();
    let mut seed = 0x2545_f491u32;
    for len in 0..200 {
        let mut garbage: Vec<u8> = (0..len)
            .map(|_| {
                seed ^= seed << 13;
                seed ^= seed >> 17;
                seed ^= seed << 5;
                seed as u8
            })
            .collect();
        let tags: [&[u8; 4]; 3] = [b"DATA", b"XGPS", b"XATT"];
        if len >= 4 && len % 2 == 0 {
            garbage[..4].copy_from_slice(tags[len % 3]);
        }
        let kind = classify(&garbage);
        if kind.is_data_bearing() {
            let _ = decode_packet(kind, &garbage, &registry);
        }
    }
}
