//! Closed sets of supported output formats.
//!
//! Host applications send format names as strings; they are parsed once at the boundary and
//! everything downstream matches on the enums.

use crate::foundation::error::{VidfxError, VidfxResult};

/// Video output format and codec.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// H.264 in an MP4 container.
    #[default]
    Mp4,
    /// H.264 in an MP4 container, named by codec.
    H264,
    /// H.265/HEVC in an MP4 container.
    #[serde(alias = "hevc")]
    #[value(alias = "hevc")]
    H265,
    /// AV1 in an MP4 container.
    Av1,
    /// VP9 in a WebM container.
    Webm,
}

impl OutputFormat {
    pub const ALL: [Self; 5] = [Self::Mp4, Self::H264, Self::H265, Self::Av1, Self::Webm];

    /// ffmpeg video encoder name.
    pub fn video_encoder(self) -> &'static str {
        match self {
            Self::Mp4 | Self::H264 => "libx264",
            Self::H265 => "libx265",
            Self::Av1 => "libsvtav1",
            Self::Webm => "libvpx-vp9",
        }
    }

    /// ffmpeg audio encoder compatible with the container.
    pub fn audio_encoder(self) -> &'static str {
        match self {
            Self::Webm => "libopus",
            _ => "aac",
        }
    }

    /// ffmpeg muxer name (`-f`).
    pub fn muxer(self) -> &'static str {
        match self {
            Self::Webm => "webm",
            _ => "mp4",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Webm => "webm",
            _ => "mp4",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Mp4 | Self::H264 => "video/avc",
            Self::H265 => "video/hevc",
            Self::Av1 => "video/av01",
            Self::Webm => "video/x-vnd.on2.vp9",
        }
    }

    /// Codec-specific output arguments.
    pub fn extra_args(self) -> &'static [&'static str] {
        match self {
            Self::Mp4 | Self::H264 | Self::H265 | Self::Av1 => &["-movflags", "+faststart"],
            Self::Webm => &[],
        }
    }

    /// Whether the muxer accepts `-tag:v hvc1` style tagging for Apple players.
    pub fn video_tag(self) -> Option<&'static str> {
        match self {
            Self::H265 => Some("hvc1"),
            _ => None,
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = VidfxError;

    fn from_str(s: &str) -> VidfxResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp4" => Ok(Self::Mp4),
            "h264" | "avc" => Ok(Self::H264),
            "h265" | "hevc" => Ok(Self::H265),
            "av1" => Ok(Self::Av1),
            "webm" | "vp9" => Ok(Self::Webm),
            other => Err(VidfxError::validation(format!(
                "unsupported output format '{other}'"
            ))),
        }
    }
}

/// Still image format for thumbnails.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailFormat {
    #[default]
    #[serde(alias = "jpg")]
    #[value(alias = "jpg")]
    Jpeg,
    Png,
    Webp,
}

impl ThumbnailFormat {
    pub fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
            Self::Webp => image::ImageFormat::WebP,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }
}

impl std::str::FromStr for ThumbnailFormat {
    type Err = VidfxError;

    fn from_str(s: &str) -> VidfxResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::Webp),
            other => Err(VidfxError::validation(format!(
                "unsupported thumbnail format '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/format.rs"]
mod tests;
