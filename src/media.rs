//! System `ffmpeg`/`ffprobe` backend.
//!
//! Decoding, encoding and muxing all happen in child processes; this crate only moves raw RGBA
//! frames across pipes.

use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use crate::foundation::error::VidfxResult;

pub(crate) mod decode;
pub(crate) mod encode;
pub(crate) mod format;
pub(crate) mod probe;

/// Locations of the media binaries.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MediaTools {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for MediaTools {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl MediaTools {
    pub fn is_available(&self) -> bool {
        runs(&self.ffmpeg) && runs(&self.ffprobe)
    }

    pub(crate) fn ffmpeg_cmd(&self) -> Command {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-hide_banner", "-nostdin"]);
        cmd
    }

    pub(crate) fn ffprobe_cmd(&self) -> Command {
        let mut cmd = Command::new(&self.ffprobe);
        cmd.args(["-v", "error"]);
        cmd
    }
}

fn runs(bin: &Path) -> bool {
    Command::new(bin)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// `ffmpeg` and `ffprobe` from `PATH` both answer `-version`.
pub fn is_ffmpeg_on_path() -> bool {
    MediaTools::default().is_available()
}

pub fn ensure_parent_dir(path: &Path) -> VidfxResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// ffmpeg time argument for a microsecond position.
pub(crate) fn ff_time(us: i64) -> String {
    let us = us.max(0);
    format!("{}.{:06}", us / 1_000_000, us % 1_000_000)
}

pub(crate) fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.split('/');
    let a = parts.next()?.trim().parse::<u32>().ok()?;
    let b = match parts.next() {
        Some(b) => b.trim().parse::<u32>().ok()?,
        None => 1,
    };
    if b == 0 {
        return None;
    }
    Some((a, b))
}

#[cfg(test)]
#[path = "../tests/unit/media.rs"]
mod tests;
