use super::*;
use crate::foundation::core::{Point, Rect};

fn spec(turns: i64) -> GeometrySpec {
    GeometrySpec {
        rotation: QuarterTurns::new(turns),
        ..GeometrySpec::default()
    }
}

fn crop(x: i64, y: i64, w: i64, h: i64) -> CropSpec {
    CropSpec {
        x: Some(x),
        y: Some(y),
        width: Some(w),
        height: Some(h),
    }
}

fn transformed_bounds(g: &ResolvedGeometry, r: Rect) -> Rect {
    let pts = [
        Point::new(r.x0, r.y0),
        Point::new(r.x1, r.y0),
        Point::new(r.x0, r.y1),
        Point::new(r.x1, r.y1),
    ]
    .map(|p| g.transform * p);
    let mut out = Rect::from_points(pts[0], pts[1]);
    out = out.union_pt(pts[2]);
    out.union_pt(pts[3])
}

#[test]
fn quarter_turns_normalize() {
    assert_eq!(QuarterTurns::new(5).get(), 1);
    assert_eq!(QuarterTurns::new(-1).get(), 3);
    assert_eq!(QuarterTurns::new(8).degrees(), 0);
    assert!(QuarterTurns::new(3).swaps_axes());
}

#[test]
fn one_turn_swaps_portrait_to_landscape() {
    let g = resolve(FrameSize::new(100, 200), &spec(1)).unwrap();
    assert_eq!(g.output, FrameSize::new(200, 100));
    assert!(g.crop.is_none());
}

#[test]
fn odd_turns_swap_output_relative_to_even() {
    let source = FrameSize::new(320, 180);
    for c in [CropSpec::default(), crop(10, 20, 100, 50)] {
        for (sx, sy) in [(1.0, 1.0), (0.5, 2.0)] {
            let mk = |turns| GeometrySpec {
                rotation: QuarterTurns::new(turns),
                crop: c,
                scale_x: sx,
                scale_y: sy,
                ..GeometrySpec::default()
            };
            let even = resolve(source, &mk(0)).unwrap().cropped;
            assert_eq!(resolve(source, &mk(2)).unwrap().cropped, even);
            for turns in [1, 3] {
                assert_eq!(resolve(source, &mk(turns)).unwrap().cropped, even.transposed());
            }
        }
    }
}

#[test]
fn inner_crop_keeps_requested_size_before_scale() {
    let source = FrameSize::new(640, 480);
    for (x, y, w, h) in [(0, 0, 640, 100), (13, 7, 200, 300), (600, 400, 40, 80)] {
        for flip in [false, true] {
            let s = GeometrySpec {
                crop: crop(x, y, w, h),
                flip_x: flip,
                flip_y: flip,
                ..GeometrySpec::default()
            };
            let g = resolve(source, &s).unwrap();
            assert_eq!(g.cropped, FrameSize::new(w as u32, h as u32));
            assert_eq!(g.output, g.cropped);
        }
    }
}

#[test]
fn missing_crop_fields_default_to_remaining_space() {
    let s = GeometrySpec {
        crop: CropSpec {
            x: Some(40),
            y: Some(10),
            width: None,
            height: None,
        },
        ..GeometrySpec::default()
    };
    let g = resolve(FrameSize::new(100, 50), &s).unwrap();
    assert_eq!(
        g.crop,
        Some(PixelRect {
            x: 40,
            y: 10,
            width: 60,
            height: 40
        })
    );
}

#[test]
fn crop_origin_is_rederived_per_rotation_quadrant() {
    let source = FrameSize::new(100, 50);
    let c = crop(10, 5, 30, 20);
    let expected = [
        (0, PixelRect { x: 10, y: 5, width: 30, height: 20 }),
        (1, PixelRect { x: 25, y: 10, width: 20, height: 30 }),
        (2, PixelRect { x: 60, y: 25, width: 30, height: 20 }),
        (3, PixelRect { x: 5, y: 60, width: 20, height: 30 }),
    ];
    for (turns, rect) in expected {
        let s = GeometrySpec {
            crop: c,
            ..spec(turns)
        };
        assert_eq!(resolve(source, &s).unwrap().crop, Some(rect), "turns={turns}");
    }
}

#[test]
fn flip_mirrors_crop_origin() {
    let s = GeometrySpec {
        crop: crop(10, 5, 30, 20),
        flip_x: true,
        ..GeometrySpec::default()
    };
    let g = resolve(FrameSize::new(100, 50), &s).unwrap();
    assert_eq!(g.crop.unwrap().x, 60);
    assert_eq!(g.crop.unwrap().y, 5);
}

#[test]
fn transform_maps_crop_region_onto_output() {
    let source = FrameSize::new(100, 50);
    let c = crop(10, 5, 30, 20);
    let src_rect = Rect::new(10.0, 5.0, 40.0, 25.0);
    for turns in 0..4 {
        for (fx, fy) in [(false, false), (true, false), (false, true), (true, true)] {
            let s = GeometrySpec {
                rotation: QuarterTurns::new(turns),
                flip_x: fx,
                flip_y: fy,
                crop: c,
                scale_x: 2.0,
                scale_y: 0.5,
            };
            let g = resolve(source, &s).unwrap();
            let b = transformed_bounds(&g, src_rect);
            let out = Rect::new(0.0, 0.0, f64::from(g.output.width), f64::from(g.output.height));
            assert!((b.x0 - out.x0).abs() < 1e-9 && (b.y0 - out.y0).abs() < 1e-9, "{b:?}");
            assert!((b.x1 - out.x1).abs() < 1e-9 && (b.y1 - out.y1).abs() < 1e-9, "{b:?}");
        }
    }
}

#[test]
fn scale_multiplies_final_size() {
    let s = GeometrySpec {
        scale_x: 0.5,
        scale_y: 1.5,
        ..spec(1)
    };
    let g = resolve(FrameSize::new(100, 200), &s).unwrap();
    assert_eq!(g.output, FrameSize::new(100, 150));
    assert_eq!(g.cropped, FrameSize::new(200, 100));
}

#[test]
fn tiny_scale_keeps_positive_size() {
    let s = GeometrySpec {
        scale_x: 0.0001,
        scale_y: 0.0001,
        ..GeometrySpec::default()
    };
    let g = resolve(FrameSize::new(10, 10), &s).unwrap();
    assert_eq!(g.output, FrameSize::new(1, 1));
}

#[test]
fn invalid_geometry_is_reported() {
    let zero = resolve(FrameSize::new(0, 0), &GeometrySpec::default()).unwrap_err();
    assert!(matches!(zero, VidfxError::Geometry(_)));

    let neg = GeometrySpec {
        crop: CropSpec {
            x: Some(120),
            ..CropSpec::default()
        },
        ..GeometrySpec::default()
    };
    assert!(matches!(
        resolve(FrameSize::new(100, 100), &neg).unwrap_err(),
        VidfxError::Geometry(_)
    ));

    let outside = GeometrySpec {
        crop: crop(-50, 0, 20, 20),
        ..GeometrySpec::default()
    };
    assert!(resolve(FrameSize::new(100, 100), &outside).is_err());

    let bad_scale = GeometrySpec {
        scale_x: 0.0,
        ..GeometrySpec::default()
    };
    assert!(resolve(FrameSize::new(100, 100), &bad_scale).is_err());
}

#[test]
fn overhanging_crop_is_clipped() {
    let s = GeometrySpec {
        crop: crop(80, 80, 50, 50),
        ..GeometrySpec::default()
    };
    let g = resolve(FrameSize::new(100, 100), &s).unwrap();
    assert_eq!(g.cropped, FrameSize::new(20, 20));
}

#[test]
fn full_frame_crop_resolves_to_none() {
    let s = GeometrySpec {
        crop: crop(0, 0, 100, 100),
        ..GeometrySpec::default()
    };
    let g = resolve(FrameSize::new(100, 100), &s).unwrap();
    assert!(g.crop.is_none());
    assert!(g.is_identity());
}

#[test]
fn extreme_crop_offsets_are_clipped_or_rejected() {
    let far_right = GeometrySpec {
        crop: crop(i64::MAX, 0, 10, 10),
        ..spec(1)
    };
    assert!(matches!(
        resolve(FrameSize::new(100, 200), &far_right).unwrap_err(),
        VidfxError::Geometry(_)
    ));

    let far_left = GeometrySpec {
        crop: CropSpec {
            x: Some(i64::MIN),
            ..CropSpec::default()
        },
        flip_x: true,
        ..spec(3)
    };
    let g = resolve(FrameSize::new(100, 200), &far_left).unwrap();
    assert!(g.crop.is_none());
    assert_eq!(g.output, FrameSize::new(200, 100));

    let huge = GeometrySpec {
        crop: crop(i64::MIN, i64::MIN, i64::MAX, i64::MAX),
        ..spec(2)
    };
    assert!(resolve(FrameSize::new(100, 200), &huge).is_err());
}
