use super::*;

fn size() -> FrameSize {
    FrameSize::new(100, 50)
}

fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([255, 0, 0, 128]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

fn darken() -> Vec<f64> {
    vec![
        0.5, 0.0, 0.0, 0.0, 0.0, //
        0.0, 0.5, 0.0, 0.0, 0.0, //
        0.0, 0.0, 0.5, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0, 0.0,
    ]
}

#[test]
fn default_params_build_an_empty_chain() {
    let chain = build_effect_chain(&TransformParams::default(), size(), 33);
    assert!(chain.is_passthrough());
    assert!(chain.geometry.is_none());
    assert!(chain.speed.is_none());
    assert_eq!(chain.output, size());
}

#[test]
fn effects_follow_the_fixed_order() {
    let params = TransformParams {
        rotate_quarter_turns: 1,
        flip_y: true,
        crop_width: Some(40),
        scale_x: Some(2.0),
        color_matrices: vec![darken()],
        blur_sigma: Some(1.0),
        overlay_image: Some(png_bytes(8, 8)),
        playback_speed: Some(1.5),
        ..TransformParams::default()
    };
    let chain = build_effect_chain(&params, size(), 9);
    assert_eq!(
        chain.kinds(),
        vec![
            EffectKind::Rotate,
            EffectKind::Flip,
            EffectKind::Crop,
            EffectKind::Scale,
            EffectKind::ColorLut,
            EffectKind::Blur,
            EffectKind::Overlay,
        ]
    );
    assert!(chain.speed.is_some());
}

#[test]
fn blur_radius_is_sigma_times_two_and_a_half() {
    let params = TransformParams {
        blur_sigma: Some(2.0),
        ..TransformParams::default()
    };
    let chain = build_effect_chain(&params, size(), 33);
    assert_eq!(
        chain.video,
        vec![VideoEffect::Blur {
            sigma: 2.0,
            radius: 5.0
        }]
    );
}

#[test]
fn non_positive_blur_is_skipped() {
    for sigma in [0.0, -1.0] {
        let params = TransformParams {
            blur_sigma: Some(sigma),
            ..TransformParams::default()
        };
        assert!(build_effect_chain(&params, size(), 33).is_passthrough());
    }
}

#[test]
fn speed_two_halves_video_and_audio_durations() {
    let params = TransformParams {
        playback_speed: Some(2.0),
        ..TransformParams::default()
    };
    let speed = build_effect_chain(&params, size(), 33).speed.unwrap();
    assert_eq!(speed.duration_multiplier(), 0.5);
    assert_eq!(speed.audio_tempo(), 2.0);
    assert_eq!(speed.scale_duration_us(4_000_000), 2_000_000);
}

#[test]
fn unit_or_invalid_speed_is_skipped() {
    for s in [1.0, 0.0, -2.0, f64::NAN] {
        assert!(SpeedChange::new(s).is_none());
    }
}

#[test]
fn atempo_stages_multiply_back_to_the_factor() {
    for f in [0.25, 0.5, 1.5, 2.0, 3.0, 8.0] {
        let s = SpeedChange::new(f).unwrap();
        let stages = s.atempo_stages();
        assert!(stages.iter().all(|&t| (0.5..=2.0).contains(&t)));
        let product: f64 = stages.iter().product();
        assert!((product - f).abs() < 1e-9);
    }
}

#[test]
fn rotation_modulo_four_is_skipped() {
    let params = TransformParams {
        rotate_quarter_turns: 4,
        ..TransformParams::default()
    };
    assert!(build_effect_chain(&params, size(), 33).is_passthrough());
}

#[test]
fn bad_crop_is_dropped_but_rotation_survives() {
    let params = TransformParams {
        rotate_quarter_turns: 1,
        crop_x: Some(500),
        crop_width: Some(10),
        ..TransformParams::default()
    };
    let chain = build_effect_chain(&params, size(), 33);
    assert_eq!(chain.kinds(), vec![EffectKind::Rotate]);
    assert_eq!(chain.output, FrameSize::new(50, 100));
}

#[test]
fn zero_source_skips_geometry() {
    let params = TransformParams {
        rotate_quarter_turns: 1,
        blur_sigma: Some(1.0),
        ..TransformParams::default()
    };
    let chain = build_effect_chain(&params, FrameSize::new(0, 0), 33);
    assert!(chain.geometry.is_none());
    assert_eq!(chain.kinds(), vec![EffectKind::Blur]);
}

#[test]
fn invalid_color_matrix_is_skipped() {
    let params = TransformParams {
        color_matrices: vec![vec![1.0; 19]],
        ..TransformParams::default()
    };
    assert!(build_effect_chain(&params, size(), 33).is_passthrough());
}

#[test]
fn undecodable_overlay_is_skipped() {
    let params = TransformParams {
        overlay_image: Some(vec![1, 2, 3]),
        ..TransformParams::default()
    };
    assert!(build_effect_chain(&params, size(), 33).is_passthrough());
}

#[test]
fn overlay_is_resized_to_working_size() {
    let params = TransformParams {
        crop_width: Some(30),
        crop_height: Some(20),
        scale_x: Some(0.5),
        scale_y: Some(0.5),
        overlay_image: Some(png_bytes(4, 4)),
        ..TransformParams::default()
    };
    let chain = build_effect_chain(&params, size(), 33);
    assert_eq!(chain.output, FrameSize::new(15, 10));
    let overlay = chain
        .video
        .iter()
        .find_map(|e| match e {
            VideoEffect::Overlay { image } => Some(image.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(overlay.dimensions(), (15, 10));
}

#[test]
fn trim_is_carried_through() {
    let params = TransformParams {
        start_us: Some(1),
        end_us: Some(2),
        ..TransformParams::default()
    };
    let chain = build_effect_chain(&params, size(), 33);
    assert_eq!(chain.trim.start_us, Some(1));
    assert_eq!(chain.trim.end_us, Some(2));
}

#[test]
fn unusable_scale_is_dropped_but_rotation_and_flip_survive() {
    let params = TransformParams {
        rotate_quarter_turns: 1,
        flip_x: true,
        scale_x: Some(0.0),
        ..TransformParams::default()
    };
    params.validate().unwrap();
    let chain = build_effect_chain(&params, size(), 33);
    assert_eq!(chain.kinds(), vec![EffectKind::Rotate, EffectKind::Flip]);
    assert_eq!(chain.output, FrameSize::new(50, 100));
}
