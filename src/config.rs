use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    color::lut::{DEFAULT_LUT_SIZE, MAX_LUT_SIZE},
    foundation::error::{VidfxError, VidfxResult},
    media::MediaTools,
};

/// Process-wide pipeline options shared by every job.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineOpts {
    /// Side length of the color LUT derived from color matrices.
    pub lut_size: usize,
    /// Override the number of rayon worker threads. `None` uses rayon defaults.
    pub threads: Option<usize>,
    /// Frames decoded per chunk before being processed in parallel.
    pub chunk_size: usize,
    /// Bounded channel capacity between frame workers and the encoder thread.
    pub channel_capacity: usize,
    /// Minimum spacing between progress reports, in milliseconds.
    pub progress_interval_ms: u64,
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    /// Where job scratch directories are created. `None` uses the system temp dir.
    pub temp_dir: Option<PathBuf>,
    /// JPEG quality for thumbnails, 1..=100.
    pub jpeg_quality: u8,
}

impl Default for PipelineOpts {
    fn default() -> Self {
        let tools = MediaTools::default();
        Self {
            lut_size: DEFAULT_LUT_SIZE,
            threads: None,
            chunk_size: 16,
            channel_capacity: 4,
            progress_interval_ms: 200,
            ffmpeg: tools.ffmpeg,
            ffprobe: tools.ffprobe,
            temp_dir: None,
            jpeg_quality: 90,
        }
    }
}

impl PipelineOpts {
    pub fn from_json_file(path: &Path) -> VidfxResult<Self> {
        use anyhow::Context as _;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        let opts: Self = serde_json::from_str(&text).map_err(|e| {
            VidfxError::validation(format!("config '{}': {e}", path.display()))
        })?;
        opts.validate()?;
        Ok(opts)
    }

    pub fn validate(&self) -> VidfxResult<()> {
        if self.lut_size < 2 || self.lut_size > MAX_LUT_SIZE {
            return Err(VidfxError::validation(format!(
                "lut_size must be in 2..={MAX_LUT_SIZE}, got {}",
                self.lut_size
            )));
        }
        if self.threads == Some(0) {
            return Err(VidfxError::validation("threads must be >= 1 when set"));
        }
        if self.chunk_size == 0 {
            return Err(VidfxError::validation("chunk_size must be >= 1"));
        }
        if self.channel_capacity == 0 {
            return Err(VidfxError::validation("channel_capacity must be >= 1"));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(VidfxError::validation(format!(
                "jpeg_quality must be in 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }

    pub fn tools(&self) -> MediaTools {
        MediaTools {
            ffmpeg: self.ffmpeg.clone(),
            ffprobe: self.ffprobe.clone(),
        }
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    pub(crate) fn build_thread_pool(&self) -> VidfxResult<rayon::ThreadPool> {
        let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("vidfx-{i}"));
        if let Some(n) = self.threads {
            builder = builder.num_threads(n);
        }
        builder
            .build()
            .map_err(|e| VidfxError::configuration(format!("failed to build rayon thread pool: {e}")))
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
