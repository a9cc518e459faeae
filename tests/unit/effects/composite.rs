use super::*;

#[test]
fn transparent_source_is_noop() {
    let dst = [10, 20, 30, 255];
    assert_eq!(over(dst, [255, 255, 255, 0]), dst);
}

#[test]
fn opaque_source_replaces_dst() {
    assert_eq!(over([0, 0, 0, 255], [255, 0, 0, 255]), [255, 0, 0, 255]);
}

#[test]
fn half_alpha_over_opaque_blends_evenly() {
    let out = over([0, 0, 0, 255], [200, 100, 0, 128]);
    assert_eq!(out[3], 255);
    assert!((i32::from(out[0]) - 100).abs() <= 1);
    assert!((i32::from(out[1]) - 50).abs() <= 1);
    assert_eq!(out[2], 0);
}

#[test]
fn source_over_transparent_dst_keeps_source_color() {
    assert_eq!(over([0, 0, 0, 0], [100, 110, 120, 200]), [100, 110, 120, 200]);
}

#[test]
fn in_place_rejects_mismatched_lengths() {
    let mut dst = vec![0u8; 8];
    assert!(over_in_place(&mut dst, &[0u8; 4]).is_err());
}
