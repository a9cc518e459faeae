use super::*;

#[test]
fn keyframes_parse_sorted_and_deduplicated() {
    let json = br#"{ "frames": [
        { "best_effort_timestamp_time": "2.000000" },
        { "best_effort_timestamp_time": "0.000000" },
        { "best_effort_timestamp_time": "2.000000" },
        { },
        { "best_effort_timestamp_time": "N/A" },
        { "best_effort_timestamp_time": "4.5" }
    ] }"#;
    assert_eq!(
        parse_keyframes_json(json).unwrap(),
        vec![0, 2_000_000, 4_500_000]
    );
}

#[test]
fn empty_keyframe_listing_is_empty() {
    assert!(parse_keyframes_json(b"{}").unwrap().is_empty());
}

#[test]
fn read_full_stops_at_eof() {
    let mut src: &[u8] = &[1, 2, 3];
    let mut buf = [0u8; 8];
    assert_eq!(read_full(&mut src, &mut buf).unwrap(), 3);
    assert_eq!(&buf[..3], &[1, 2, 3]);
}

#[test]
fn zero_sized_decode_is_rejected() {
    let cfg = DecodeConfig {
        size: FrameSize::new(0, 10),
        start_us: 0,
        end_us: None,
        rate: None,
    };
    let err = FrameReader::open(&MediaTools::default(), Path::new("x.mp4"), &cfg)
        .err()
        .unwrap();
    assert!(matches!(err, VidfxError::MediaRead(_)));
}

#[test]
fn missing_decoder_binary_is_a_media_error() {
    let tools = MediaTools {
        ffmpeg: "/nonexistent/ffmpeg".into(),
        ffprobe: "/nonexistent/ffprobe".into(),
    };
    let err = grab_frame(&tools, Path::new("x.mp4"), FrameSize::new(2, 2), 0).unwrap_err();
    assert!(matches!(err, VidfxError::MediaRead(_)));
}
