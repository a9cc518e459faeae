use super::*;
use crate::{
    effects::{chain::build_effect_chain, params::TransformParams},
    foundation::core::Point,
};

fn indexed_frame(size: FrameSize) -> FrameRGBA {
    let mut data = Vec::with_capacity(size.rgba8_len().unwrap());
    for i in 0..(size.width * size.height) {
        data.extend_from_slice(&[(i & 0xff) as u8, (i >> 8) as u8, 0, 255]);
    }
    FrameRGBA::new(size, data).unwrap()
}

fn processor(params: &TransformParams, source: FrameSize) -> FrameProcessor {
    FrameProcessor::new(Arc::new(build_effect_chain(params, source, 17)))
}

/// Every output pixel must come from the source pixel the composed transform maps onto it.
fn assert_pixels_follow_transform(params: &TransformParams) {
    let source = FrameSize::new(7, 4);
    let proc = processor(params, source);
    let geometry = proc.chain().geometry.unwrap();
    let inverse = geometry.transform.inverse();

    let out = proc.process(indexed_frame(source)).unwrap();
    assert_eq!(out.size(), geometry.output);

    for oy in 0..out.height {
        for ox in 0..out.width {
            let src = inverse * Point::new(f64::from(ox) + 0.5, f64::from(oy) + 0.5);
            let (sx, sy) = (src.x.floor() as u32, src.y.floor() as u32);
            let expected = sy * source.width + sx;
            let px = out.pixel(ox, oy).unwrap();
            assert_eq!(
                u32::from(px[0]) | (u32::from(px[1]) << 8),
                expected,
                "params {params:?} at output ({ox},{oy})"
            );
        }
    }
}

#[test]
fn rotation_and_flip_agree_with_the_transform() {
    for turns in 0..4 {
        for (flip_x, flip_y) in [(false, false), (true, false), (false, true), (true, true)] {
            if turns == 0 && !flip_x && !flip_y {
                continue;
            }
            assert_pixels_follow_transform(&TransformParams {
                rotate_quarter_turns: turns,
                flip_x,
                flip_y,
                ..TransformParams::default()
            });
        }
    }
}

#[test]
fn crop_agrees_with_the_transform_in_every_quadrant() {
    for turns in 0..4 {
        for flip_x in [false, true] {
            assert_pixels_follow_transform(&TransformParams {
                rotate_quarter_turns: turns,
                flip_x,
                crop_x: Some(1),
                crop_y: Some(1),
                crop_width: Some(4),
                crop_height: Some(2),
                ..TransformParams::default()
            });
        }
    }
}

#[test]
fn crop_keeps_the_requested_source_region() {
    let source = FrameSize::new(7, 4);
    let params = TransformParams {
        rotate_quarter_turns: 1,
        crop_x: Some(2),
        crop_y: Some(1),
        crop_width: Some(3),
        crop_height: Some(2),
        ..TransformParams::default()
    };
    let out = processor(&params, source)
        .process(indexed_frame(source))
        .unwrap();
    assert_eq!(out.size(), FrameSize::new(2, 3));

    let mut seen: Vec<u32> = out
        .data
        .chunks_exact(4)
        .map(|p| u32::from(p[0]) | (u32::from(p[1]) << 8))
        .collect();
    seen.sort_unstable();
    let mut expected: Vec<u32> = (1..3)
        .flat_map(|y| (2..5).map(move |x| y * 7 + x))
        .collect();
    expected.sort_unstable();
    assert_eq!(seen, expected);
}

#[test]
fn scale_resizes_to_output() {
    let source = FrameSize::new(8, 4);
    let params = TransformParams {
        scale_x: Some(0.5),
        scale_y: Some(0.5),
        ..TransformParams::default()
    };
    let frame = FrameRGBA::solid(source, [40, 80, 120, 255]).unwrap();
    let out = processor(&params, source).process(frame).unwrap();
    assert_eq!(out.size(), FrameSize::new(4, 2));
    let px = out.pixel(1, 1).unwrap();
    for (got, want) in px.iter().zip([40u8, 80, 120, 255]) {
        assert!((i32::from(*got) - i32::from(want)).abs() <= 1, "{px:?}");
    }
}

#[test]
fn color_lut_darkens_frame() {
    let source = FrameSize::new(2, 2);
    let params = TransformParams {
        color_matrices: vec![vec![
            0.5, 0.0, 0.0, 0.0, 0.0, //
            0.0, 0.5, 0.0, 0.0, 0.0, //
            0.0, 0.0, 0.5, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ]],
        ..TransformParams::default()
    };
    let frame = FrameRGBA::solid(source, [200, 100, 50, 255]).unwrap();
    let out = processor(&params, source).process(frame).unwrap();
    let px = out.pixel(0, 0).unwrap();
    for (got, want) in px.iter().zip([100u8, 50, 25, 255]) {
        assert!((i32::from(*got) - i32::from(want)).abs() <= 1, "{px:?}");
    }
}

#[test]
fn overlay_is_composited_over_the_frame() {
    let source = FrameSize::new(4, 4);
    let overlay = image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 255, 255, 255]));
    let mut png = std::io::Cursor::new(Vec::new());
    overlay.write_to(&mut png, image::ImageFormat::Png).unwrap();
    let params = TransformParams {
        overlay_image: Some(png.into_inner()),
        ..TransformParams::default()
    };
    let frame = FrameRGBA::solid(source, [0, 0, 0, 255]).unwrap();
    let out = processor(&params, source).process(frame).unwrap();
    let px = out.pixel(3, 3).unwrap();
    assert!(px.iter().all(|&c| c >= 254), "{px:?}");
}

#[test]
fn blur_keeps_flat_frames_flat() {
    let source = FrameSize::new(6, 6);
    let params = TransformParams {
        blur_sigma: Some(1.0),
        ..TransformParams::default()
    };
    let frame = FrameRGBA::solid(source, [9, 99, 199, 255]).unwrap();
    let out = processor(&params, source).process(frame.clone()).unwrap();
    assert_eq!(out, frame);
}

#[test]
fn passthrough_returns_the_frame() {
    let source = FrameSize::new(3, 2);
    let frame = indexed_frame(source);
    let out = processor(&TransformParams::default(), source)
        .process(frame.clone())
        .unwrap();
    assert_eq!(out, frame);
}

#[test]
fn wrong_frame_size_is_a_media_error() {
    let proc = processor(&TransformParams::default(), FrameSize::new(3, 2));
    let err = proc.process(indexed_frame(FrameSize::new(2, 2))).unwrap_err();
    assert!(matches!(err, VidfxError::MediaRead(_)));
}
