use std::{
    io::Read,
    path::Path,
    process::{Child, ChildStdout, Stdio},
    thread::JoinHandle,
};

use crate::{
    foundation::{
        core::{FrameSize, secs_to_micros},
        error::{VidfxError, VidfxResult},
    },
    media::{MediaTools, ff_time},
    render::FrameRGBA,
};

/// Options for a sequential decode of one video stream.
#[derive(Clone, Debug)]
pub struct DecodeConfig {
    /// Auto-rotated frame size reported by the probe.
    pub size: FrameSize,
    pub start_us: i64,
    /// Exclusive end; `None` decodes to the end of the stream.
    pub end_us: Option<i64>,
    /// Constant output rate (`-r`), e.g. `30000/1001`.
    pub rate: Option<String>,
}

/// Streams raw RGBA frames out of an `ffmpeg` child process.
pub struct FrameReader {
    size: FrameSize,
    frame_len: usize,
    child: Child,
    stdout: Option<ChildStdout>,
    stderr: Option<JoinHandle<String>>,
    frames_read: u64,
}

impl FrameReader {
    #[tracing::instrument(level = "debug", skip(tools, input, cfg), fields(path = %input.display()))]
    pub fn open(tools: &MediaTools, input: &Path, cfg: &DecodeConfig) -> VidfxResult<Self> {
        if cfg.size.is_empty() {
            return Err(VidfxError::media_read(
                "decoded video frame size is zero (invalid source dimensions)",
            ));
        }
        let frame_len = cfg.size.rgba8_len()?;

        let mut cmd = tools.ffmpeg_cmd();
        cmd.args(["-v", "error"]);
        if cfg.start_us > 0 {
            cmd.args(["-ss", &ff_time(cfg.start_us)]);
        }
        if let Some(end) = cfg.end_us {
            cmd.args(["-to", &ff_time(end)]);
        }
        cmd.arg("-i").arg(input).args(["-map", "0:v:0", "-an"]);
        if let Some(rate) = &cfg.rate {
            cmd.args(["-r", rate]);
        }
        cmd.args(["-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| VidfxError::media_read(format!("failed to spawn ffmpeg decoder: {e}")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| VidfxError::media_read("failed to open ffmpeg stdout"))?;
        let stderr = child.stderr.take().map(drain_to_string);

        Ok(Self {
            size: cfg.size,
            frame_len,
            child,
            stdout: Some(stdout),
            stderr,
            frames_read: 0,
        })
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Next frame, or `None` at end of stream.
    pub fn next_frame(&mut self) -> VidfxResult<Option<FrameRGBA>> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };
        let mut buf = vec![0u8; self.frame_len];
        let filled = read_full(stdout, &mut buf)
            .map_err(|e| VidfxError::media_read(format!("ffmpeg decode pipe: {e}")))?;
        if filled == 0 {
            self.stdout = None;
            return Ok(None);
        }
        if filled < self.frame_len {
            self.stdout = None;
            return Err(VidfxError::media_read(format!(
                "truncated frame from ffmpeg: {filled} of {} bytes",
                self.frame_len
            )));
        }
        self.frames_read += 1;
        FrameRGBA::new(self.size, buf).map(Some)
    }

    /// Wait for the decoder to exit and surface its error output on failure.
    pub fn finish(mut self) -> VidfxResult<u64> {
        drop(self.stdout.take());
        let status = self
            .child
            .wait()
            .map_err(|e| VidfxError::media_read(format!("failed to wait for ffmpeg: {e}")))?;
        let stderr = self
            .stderr
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or_default();
        if !status.success() {
            return Err(VidfxError::media_read(format!(
                "ffmpeg decode exited with status {status}: {}",
                stderr.trim()
            )));
        }
        Ok(self.frames_read)
    }
}

impl Drop for FrameReader {
    fn drop(&mut self) {
        if self.stdout.is_some() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Decode the frame shown at `at_us` (the first frame at or after it).
pub fn grab_frame(
    tools: &MediaTools,
    input: &Path,
    size: FrameSize,
    at_us: i64,
) -> VidfxResult<FrameRGBA> {
    let expected_len = size.rgba8_len()?;
    if expected_len == 0 {
        return Err(VidfxError::media_read("frame size is zero"));
    }
    let out = tools
        .ffmpeg_cmd()
        .args(["-v", "error", "-ss", &ff_time(at_us)])
        .arg("-i")
        .arg(input)
        .args([
            "-map", "0:v:0", "-frames:v", "1", "-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1",
        ])
        .stdin(Stdio::null())
        .output()
        .map_err(|e| VidfxError::media_read(format!("failed to run ffmpeg for frame grab: {e}")))?;
    if !out.status.success() {
        return Err(VidfxError::media_read(format!(
            "ffmpeg frame grab failed for '{}' at {}: {}",
            input.display(),
            ff_time(at_us),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    if out.stdout.len() < expected_len {
        return Err(VidfxError::media_read(format!(
            "no frame at {} ({} bytes decoded)",
            ff_time(at_us),
            out.stdout.len()
        )));
    }
    let mut data = out.stdout;
    data.truncate(expected_len);
    FrameRGBA::new(size, data)
}

/// Decode the frame closest to `at_us`.
///
/// A timestamp inside the final frame interval has no frame at or after it; those fall back to
/// the last frame decoded from the `lookback_us` window before `at_us`.
pub fn grab_frame_closest(
    tools: &MediaTools,
    input: &Path,
    size: FrameSize,
    at_us: i64,
    lookback_us: i64,
) -> VidfxResult<FrameRGBA> {
    match grab_frame(tools, input, size, at_us) {
        Ok(frame) => Ok(frame),
        Err(e) => {
            tracing::debug!(at_us, error = %e, "no frame at timestamp, decoding the tail");
            last_frame_before(tools, input, size, at_us, lookback_us)?.ok_or(e)
        }
    }
}

fn last_frame_before(
    tools: &MediaTools,
    input: &Path,
    size: FrameSize,
    at_us: i64,
    lookback_us: i64,
) -> VidfxResult<Option<FrameRGBA>> {
    let cfg = DecodeConfig {
        size,
        start_us: at_us.saturating_sub(lookback_us.max(0)).max(0),
        end_us: None,
        rate: None,
    };
    let mut reader = FrameReader::open(tools, input, &cfg)?;
    let mut last = None;
    while let Some(frame) = reader.next_frame()? {
        last = Some(frame);
    }
    reader.finish()?;
    Ok(last)
}

/// Presentation timestamps of the key frames of the first video stream, ascending.
pub fn keyframe_timestamps(tools: &MediaTools, input: &Path) -> VidfxResult<Vec<i64>> {
    let out = tools
        .ffprobe_cmd()
        .args([
            "-select_streams",
            "v:0",
            "-skip_frame",
            "nokey",
            "-show_entries",
            "frame=best_effort_timestamp_time",
            "-print_format",
            "json",
        ])
        .arg(input)
        .output()
        .map_err(|e| VidfxError::media_read(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(VidfxError::media_read(format!(
            "ffprobe keyframe scan failed for '{}': {}",
            input.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    parse_keyframes_json(&out.stdout)
}

pub(crate) fn parse_keyframes_json(json: &[u8]) -> VidfxResult<Vec<i64>> {
    #[derive(serde::Deserialize)]
    struct Frame {
        best_effort_timestamp_time: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct Frames {
        #[serde(default)]
        frames: Vec<Frame>,
    }

    let parsed: Frames = serde_json::from_slice(json)
        .map_err(|e| VidfxError::media_read(format!("ffprobe json parse failed: {e}")))?;
    let mut out: Vec<i64> = parsed
        .frames
        .iter()
        .filter_map(|f| f.best_effort_timestamp_time.as_deref())
        .filter_map(|s| s.parse::<f64>().ok())
        .filter(|t| t.is_finite())
        .map(|t| secs_to_micros(t).max(0))
        .collect();
    out.sort_unstable();
    out.dedup();
    Ok(out)
}

fn read_full(r: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

pub(crate) fn drain_to_string(mut r: impl Read + Send + 'static) -> JoinHandle<String> {
    std::thread::spawn(move || {
        let mut s = String::new();
        let _ = r.read_to_string(&mut s);
        s
    })
}

#[cfg(test)]
#[path = "../../tests/unit/media/decode.rs"]
mod tests;
