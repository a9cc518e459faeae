use std::{
    io::Write as _,
    path::PathBuf,
    process::{Child, ChildStdin, Stdio},
    thread::JoinHandle,
};

use crate::{
    foundation::{
        core::FrameSize,
        error::{VidfxError, VidfxResult},
        math::mul_div255_u16,
    },
    media::{MediaTools, decode::drain_to_string, ensure_parent_dir, ff_time, format::OutputFormat},
    render::FrameRGBA,
};

/// Audio track copied from the source file into the output.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioInput {
    pub path: PathBuf,
    pub start_us: i64,
    pub end_us: Option<i64>,
    /// `atempo` stages; empty keeps the original tempo.
    pub tempo: Vec<f64>,
}

#[derive(Clone, Debug)]
pub struct EncodeConfig {
    pub size: FrameSize,
    /// Rate the raw frames are fed at, e.g. source fps times playback speed.
    pub input_rate: f64,
    /// Output frame rate; `None` keeps the input rate.
    pub output_rate: Option<String>,
    pub format: OutputFormat,
    pub bitrate: Option<u32>,
    pub audio: Option<AudioInput>,
    pub out_path: PathBuf,
    pub overwrite: bool,
}

impl EncodeConfig {
    pub fn validate(&self) -> VidfxResult<()> {
        if self.size.is_empty() {
            return Err(VidfxError::validation(
                "encode width/height must be non-zero",
            ));
        }
        if !self.input_rate.is_finite() || self.input_rate <= 0.0 {
            return Err(VidfxError::validation("encode input rate must be > 0"));
        }
        if self.bitrate == Some(0) {
            return Err(VidfxError::validation("encode bitrate must be > 0"));
        }
        Ok(())
    }

    /// Full ffmpeg argument list, excluding the binary.
    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();
        let mut push = |items: &[&str]| args.extend(items.iter().map(|s| s.to_string()));

        push(&[if self.overwrite { "-y" } else { "-n" }]);
        push(&["-loglevel", "error"]);
        push(&[
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", self.size.width, self.size.height),
            "-framerate",
            &format!("{:.6}", self.input_rate),
            "-i",
            "pipe:0",
        ]);

        if let Some(audio) = &self.audio {
            if audio.start_us > 0 {
                push(&["-ss", &ff_time(audio.start_us)]);
            }
            if let Some(end) = audio.end_us {
                push(&["-to", &ff_time(end)]);
            }
            push(&["-i", &audio.path.to_string_lossy()]);
        }

        push(&["-map", "0:v:0"]);

        // yuv420p needs even dimensions; drop the odd row/column instead of failing.
        if !self.size.width.is_multiple_of(2) || !self.size.height.is_multiple_of(2) {
            push(&["-vf", "crop=trunc(iw/2)*2:trunc(ih/2)*2"]);
        }
        push(&["-c:v", self.format.video_encoder()]);
        if let Some(tag) = self.format.video_tag() {
            push(&["-tag:v", tag]);
        }
        if let Some(b) = self.bitrate {
            push(&["-b:v", &b.to_string()]);
        }
        push(&["-pix_fmt", "yuv420p"]);
        if let Some(rate) = &self.output_rate {
            push(&["-r", rate]);
        }

        match &self.audio {
            Some(audio) => {
                push(&["-map", "1:a:0?"]);
                if !audio.tempo.is_empty() {
                    let chain = audio
                        .tempo
                        .iter()
                        .map(|t| format!("atempo={t:.6}"))
                        .collect::<Vec<_>>()
                        .join(",");
                    push(&["-af", &chain]);
                }
                push(&["-c:a", self.format.audio_encoder()]);
            }
            None => push(&["-an"]),
        }

        push(self.format.extra_args());
        push(&["-f", self.format.muxer()]);
        args.push(self.out_path.to_string_lossy().into_owned());
        args
    }
}

/// Raw RGBA frames in, encoded file out.
pub struct FfmpegEncoder {
    cfg: EncodeConfig,
    child: Child,
    stdin: Option<ChildStdin>,
    stderr: Option<JoinHandle<String>>,
    scratch: Vec<u8>,
    frames: u64,
}

impl FfmpegEncoder {
    #[tracing::instrument(level = "debug", skip_all, fields(out = %cfg.out_path.display(), format = ?cfg.format))]
    pub fn new(tools: &MediaTools, cfg: EncodeConfig) -> VidfxResult<Self> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;

        if !cfg.overwrite && cfg.out_path.exists() {
            return Err(VidfxError::validation(format!(
                "output file '{}' already exists",
                cfg.out_path.display()
            )));
        }

        let mut cmd = tools.ffmpeg_cmd();
        cmd.args(cfg.to_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| {
            VidfxError::export(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| VidfxError::export("failed to open ffmpeg stdin"))?;
        let stderr = child.stderr.take().map(drain_to_string);

        Ok(Self {
            scratch: vec![0u8; cfg.size.rgba8_len()?],
            cfg,
            child,
            stdin: Some(stdin),
            stderr,
            frames: 0,
        })
    }

    pub fn encode_frame(&mut self, frame: &FrameRGBA) -> VidfxResult<()> {
        if frame.size() != self.cfg.size {
            return Err(VidfxError::export(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.cfg.size.width, self.cfg.size.height
            )));
        }

        flatten_to_opaque_rgba8(&mut self.scratch, &frame.data)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(VidfxError::export("ffmpeg encoder is already finalized"));
        };
        stdin.write_all(&self.scratch).map_err(|e| {
            VidfxError::export(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        self.frames += 1;
        Ok(())
    }

    /// Close the input and wait for the muxer; returns the number of frames written.
    pub fn finish(mut self) -> VidfxResult<u64> {
        drop(self.stdin.take());

        let status = self
            .child
            .wait()
            .map_err(|e| VidfxError::export(format!("failed to wait for ffmpeg to finish: {e}")))?;
        let stderr = self
            .stderr
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or_default();

        if !status.success() {
            return Err(VidfxError::export(format!(
                "ffmpeg exited with status {status}: {}",
                stderr.trim()
            )));
        }
        if self.frames == 0 {
            return Err(VidfxError::export("no frames were encoded"));
        }
        Ok(self.frames)
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        if self.stdin.is_some() {
            drop(self.stdin.take());
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Composite straight-alpha pixels over black so the encoder sees opaque frames.
fn flatten_to_opaque_rgba8(dst: &mut [u8], src: &[u8]) -> VidfxResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(VidfxError::validation(
            "flatten_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        for c in 0..3 {
            d[c] = mul_div255_u16(u16::from(s[c]), a).min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/media/encode.rs"]
mod tests;
