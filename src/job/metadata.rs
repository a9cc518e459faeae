use crate::{
    config::PipelineOpts,
    foundation::error::VidfxResult,
    job::scratch::JobScratch,
    media::probe::{VideoMetadata, probe},
};

/// Probe encoded video bytes.
#[tracing::instrument(skip(input, opts), fields(bytes = input.len()))]
pub fn inspect(input: &[u8], extension: &str, opts: &PipelineOpts) -> VidfxResult<VideoMetadata> {
    let scratch = JobScratch::new(opts.temp_dir.as_deref())?;
    let path = scratch.write_input(input, extension)?;
    probe(&opts.tools(), &path)
}

/// One-line human summary.
pub fn describe(meta: &VideoMetadata) -> String {
    let size = meta.display_size();
    format!(
        "{}x{} @ {:.3} fps, {:.3}s, rotation {}{}",
        size.width,
        size.height,
        meta.fps(),
        meta.duration_us as f64 / 1_000_000.0,
        meta.rotation,
        if meta.has_audio { ", audio" } else { "" }
    )
}

#[cfg(test)]
#[path = "../../tests/unit/job/metadata.rs"]
mod tests;
