use aodine::{AodError, Lut, LutAxes};
use std::io::Write;

/// Small but fully populated table: 3 sza x 2 vza x 4 raa x 5 aot
fn build_lut() -> Lut {
    let axes = LutAxes {
        sza: vec![0.0, 24.0, 48.0],
        vza: vec![6.0, 30.0],
        raa: vec![0.0, 60.0, 120.0, 180.0],
        aot: vec![0.01, 0.05, 0.1, 0.5, 1.0],
    };

    let (n_sza, n_vza, n_raa, n_aot) = (3, 2, 4, 5);
    let mut s = Vec::new();
    let mut tdn = Vec::new();
    let mut tup = Vec::new();
    let mut t = Vec::new();
    let mut p = Vec::new();
    for i in 0..n_aot {
        s.push(0.08 + 0.03 * i as f32);
        for j in 0..n_sza {
            for k in 0..n_vza {
                tdn.push(0.85 - 0.02 * i as f32 - 0.01 * j as f32);
                tup.push(0.80 - 0.02 * i as f32 - 0.01 * k as f32);
                t.push(0.95 - 0.002 * (j + k) as f32);
                for l in 0..n_raa {
                    p.push(0.015 + 0.02 * i as f32 + 0.001 * (j + k + l) as f32);
                }
            }
        }
    }
    Lut::new(axes, s, tdn, tup, t, p).unwrap()
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("LUT_670");

    let lut = build_lut();
    lut.to_file(&path).expect("Failed to write LUT");

    let loaded = Lut::from_file(&path).expect("Failed to read LUT back");
    assert_eq!(lut, loaded);
}

#[test]
fn test_round_trip_is_byte_exact() {
    let lut = build_lut();
    let bytes = lut.encode();
    let decoded = Lut::decode(&bytes).expect("Failed to decode");
    assert_eq!(bytes, decoded.encode());
}

#[test]
fn test_truncated_file_is_corrupt() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("LUT_truncated");

    let bytes = build_lut().encode();
    let mut file = std::fs::File::create(&path).expect("Failed to create file");
    file.write_all(&bytes[..bytes.len() - 1])
        .expect("Failed to write truncated LUT");
    drop(file);

    match Lut::from_file(&path) {
        Err(AodError::CorruptLut(_)) => {}
        other => panic!("expected CorruptLut, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_appended_garbage_is_corrupt() {
    let mut bytes = build_lut().encode();
    bytes.extend_from_slice(&[0u8; 4]);
    assert!(matches!(Lut::decode(&bytes), Err(AodError::CorruptLut(_))));
}

#[test]
fn test_header_body_layout() {
    let lut = build_lut();
    let bytes = lut.encode();

    // Header1: the four axis lengths as single bytes
    assert_eq!(&bytes[..4], &[3, 2, 4, 5]);

    // Header2: f32 axis samples, little-endian, SZA first
    let sza0 = f32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    assert_eq!(sza0, 0.0);
    let header2_len = 4 * (3 + 2 + 4 + 5);

    // Body opens with the first AOT slice's spherical albedo
    let s0_off = 4 + header2_len;
    let s0 = f32::from_le_bytes([
        bytes[s0_off],
        bytes[s0_off + 1],
        bytes[s0_off + 2],
        bytes[s0_off + 3],
    ]);
    assert_eq!(s0, lut.spherical_albedo(0));

    // Per-slice body size: 4 + n_sza * n_vza * (12 + 4 * n_raa)
    assert_eq!(bytes.len(), 4 + header2_len + 5 * (4 + 3 * 2 * (12 + 4 * 4)));
}
