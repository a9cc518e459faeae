use std::path::Path;

use crate::{
    foundation::{
        core::{FrameSize, secs_to_micros},
        error::{VidfxError, VidfxResult},
    },
    media::{MediaTools, parse_ff_ratio},
};

/// What a host needs to know about a video file.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub file_size: u64,
    pub duration_us: i64,
    /// Coded width, before the rotation tag is applied.
    pub width: u32,
    pub height: u32,
    /// Clockwise display rotation in degrees: 0, 90, 180 or 270.
    pub rotation: u32,
    pub fps_num: u32,
    pub fps_den: u32,
    pub codec: Option<String>,
    pub has_audio: bool,
}

impl VideoMetadata {
    /// Size of the frames ffmpeg hands out, which are already auto-rotated.
    pub fn display_size(&self) -> FrameSize {
        let coded = FrameSize::new(self.width, self.height);
        if self.rotation % 180 == 90 {
            coded.transposed()
        } else {
            coded
        }
    }

    pub fn fps(&self) -> f64 {
        if self.fps_den == 0 {
            0.0
        } else {
            f64::from(self.fps_num) / f64::from(self.fps_den)
        }
    }

    /// ffmpeg rate argument, exact for rational rates.
    pub fn fps_arg(&self) -> String {
        format!("{}/{}", self.fps_num, self.fps_den.max(1))
    }

    pub fn frame_duration_us(&self) -> i64 {
        let fps = self.fps();
        if fps > 0.0 {
            (1_000_000.0 / fps).round() as i64
        } else {
            0
        }
    }
}

#[tracing::instrument(level = "debug", skip(tools, path), fields(path = %path.display()))]
pub fn probe(tools: &MediaTools, path: &Path) -> VidfxResult<VideoMetadata> {
    let file_size = std::fs::metadata(path)
        .map_err(|e| VidfxError::media_read(format!("cannot stat '{}': {e}", path.display())))?
        .len();

    let out = tools
        .ffprobe_cmd()
        .args(["-print_format", "json", "-show_streams", "-show_format"])
        .arg(path)
        .output()
        .map_err(|e| VidfxError::media_read(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(VidfxError::media_read(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    parse_probe_json(&out.stdout, file_size)
}

#[derive(serde::Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
    #[serde(default)]
    tags: std::collections::HashMap<String, String>,
    #[serde(default)]
    side_data_list: Vec<ProbeSideData>,
}

#[derive(serde::Deserialize)]
struct ProbeSideData {
    rotation: Option<f64>,
}

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

pub(crate) fn parse_probe_json(json: &[u8], file_size: u64) -> VidfxResult<VideoMetadata> {
    let parsed: ProbeOut = serde_json::from_slice(json)
        .map_err(|e| VidfxError::media_read(format!("ffprobe json parse failed: {e}")))?;

    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| VidfxError::media_read("no video stream found"))?;
    let width = video
        .width
        .ok_or_else(|| VidfxError::media_read("missing video width from ffprobe"))?;
    let height = video
        .height
        .ok_or_else(|| VidfxError::media_read("missing video height from ffprobe"))?;

    let (fps_num, fps_den) = [&video.avg_frame_rate, &video.r_frame_rate]
        .into_iter()
        .flatten()
        .filter_map(|r| parse_ff_ratio(r))
        .find(|&(n, _)| n > 0)
        .unwrap_or((0, 1));

    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or(video.duration.as_deref())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .unwrap_or(0.0);

    Ok(VideoMetadata {
        file_size,
        duration_us: secs_to_micros(duration_sec),
        width,
        height,
        rotation: rotation_of(video),
        fps_num,
        fps_den,
        codec: video.codec_name.clone(),
        has_audio: parsed
            .streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some("audio")),
    })
}

/// Clockwise rotation from either the display matrix side data or the legacy `rotate` tag.
fn rotation_of(stream: &ProbeStream) -> u32 {
    let degrees = stream
        .side_data_list
        .iter()
        .find_map(|sd| sd.rotation)
        .map(|r| -r)
        .or_else(|| stream.tags.get("rotate").and_then(|r| r.parse::<f64>().ok()))
        .unwrap_or(0.0);
    let quarter = (degrees / 90.0).round() as i64;
    (quarter.rem_euclid(4) * 90) as u32
}

#[cfg(test)]
#[path = "../../tests/unit/media/probe.rs"]
mod tests;
