use super::*;

fn half_darken() -> ColorMatrix {
    let mut v = [0.0f64; COLOR_MATRIX_LEN];
    v[0] = 0.5;
    v[6] = 0.5;
    v[12] = 0.5;
    v[18] = 0.5;
    ColorMatrix::new(v)
}

fn biased(seed: f64) -> ColorMatrix {
    let mut v = [0.0f64; COLOR_MATRIX_LEN];
    for (i, x) in v.iter_mut().enumerate() {
        *x = ((i as f64) * 0.37 + seed).sin();
    }
    ColorMatrix::new(v)
}

fn assert_close(a: &ColorMatrix, b: &ColorMatrix) {
    for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
        assert!((x - y).abs() < 1e-12, "{x} != {y}");
    }
}

#[test]
fn combine_empty_is_none_and_single_is_unchanged() {
    assert_eq!(combine(&[]), None);
    let m = biased(0.3);
    assert_eq!(combine(&[m]), Some(m));
}

#[test]
fn combine_is_left_fold_of_multiply() {
    let (a, b, c) = (biased(0.1), biased(1.7), biased(-2.2));
    let combined = combine(&[a, b, c]).unwrap();
    assert_close(&combined, &multiply(&c, &multiply(&b, &a)));
}

#[test]
fn identity_then_darken_equals_darken() {
    let b = half_darken();
    assert_eq!(combine(&[ColorMatrix::IDENTITY, b]), Some(b));
}

#[test]
fn multiply_composes_bias_in_application_order() {
    // Apply +51 bias on red, then halve everything: red bias becomes 25.5.
    let mut add = ColorMatrix::IDENTITY.as_slice().to_vec();
    add[4] = 51.0;
    let add = ColorMatrix::try_from(add).unwrap();
    let out = multiply(&half_darken(), &add);
    assert!((out.at(0, 4) - 25.5).abs() < 1e-12);
    assert_eq!(out.at(0, 0), 0.5);
}

#[test]
fn wire_parsing_rejects_wrong_lengths() {
    let err = ColorMatrix::try_from(vec![1.0; 19]).unwrap_err();
    assert!(matches!(err, VidfxError::Configuration(_)));
    assert!(ColorMatrix::try_from(vec![f64::NAN; 20]).is_err());
    assert!(combine_wire(&[vec![1.0; 20], vec![0.0; 3]]).is_err());
    assert_eq!(combine_wire(&[]).unwrap(), None);
}

#[test]
fn serde_uses_flat_list() {
    let json = serde_json::to_string(&ColorMatrix::IDENTITY).unwrap();
    assert!(json.starts_with("[1.0,0.0"));
    let back: ColorMatrix = serde_json::from_str(&json).unwrap();
    assert!(back.is_identity());
    assert!(serde_json::from_str::<ColorMatrix>("[1.0, 2.0]").is_err());
}

#[test]
fn apply_rgb_clamps_and_scales_bias() {
    let mut v = ColorMatrix::IDENTITY.as_slice().to_vec();
    v[4] = 255.0;
    let m = ColorMatrix::try_from(v).unwrap();
    assert_eq!(m.apply_rgb([0.5, 0.25, 0.0]), [1.0, 0.25, 0.0]);
    let gray = ColorMatrix::grayscale().apply_rgb([1.0, 1.0, 1.0]);
    assert!((gray[0] - 1.0).abs() < 1e-9);
}
