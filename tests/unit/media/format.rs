use super::*;

#[test]
fn output_format_parses_aliases() {
    assert_eq!("HEVC".parse::<OutputFormat>().unwrap(), OutputFormat::H265);
    assert_eq!("mp4".parse::<OutputFormat>().unwrap(), OutputFormat::Mp4);
    assert_eq!("vp9".parse::<OutputFormat>().unwrap(), OutputFormat::Webm);
    assert!("gif".parse::<OutputFormat>().is_err());
}

#[test]
fn output_format_serde_accepts_hevc_alias() {
    let f: OutputFormat = serde_json::from_str("\"hevc\"").unwrap();
    assert_eq!(f, OutputFormat::H265);
    assert_eq!(serde_json::to_string(&OutputFormat::Av1).unwrap(), "\"av1\"");
}

#[test]
fn every_format_has_matching_container_and_audio() {
    for f in OutputFormat::ALL {
        assert_eq!(f.extension(), f.muxer());
        if f == OutputFormat::Webm {
            assert_eq!(f.audio_encoder(), "libopus");
        } else {
            assert_eq!(f.audio_encoder(), "aac");
        }
        assert!(!f.video_encoder().is_empty());
    }
}

#[test]
fn thumbnail_format_maps_to_image_format() {
    assert_eq!(
        "jpg".parse::<ThumbnailFormat>().unwrap().image_format(),
        image::ImageFormat::Jpeg
    );
    assert_eq!(ThumbnailFormat::Webp.extension(), "webp");
    assert!("bmp".parse::<ThumbnailFormat>().is_err());
}
