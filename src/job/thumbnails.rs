use std::{
    io::Cursor,
    path::Path,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use rayon::prelude::*;

use crate::{
    config::PipelineOpts,
    foundation::{
        core::FrameSize,
        error::{VidfxError, VidfxResult},
    },
    geometry::fit::{BoxFit, FitPlan, fit},
    job::scratch::JobScratch,
    media::{
        MediaTools,
        decode::{grab_frame_closest, keyframe_timestamps},
        format::ThumbnailFormat,
        probe::probe,
    },
    progress::ProgressTracker,
    render::FrameRGBA,
};

/// How far before a trailing timestamp to decode when looking for the final frame.
const TAIL_LOOKBACK_US: i64 = 2_000_000;

/// Default cap on key-frame thumbnails when no timestamps are given.
pub const DEFAULT_MAX_OUTPUT_FRAMES: usize = 10;

/// Which frames to capture and how to encode them.
///
/// Either `timestamps_us` is non-empty or `max_output_frames` selects evenly spaced key frames.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThumbnailRequest {
    #[serde(alias = "timestampsUs", alias = "timestamps")]
    pub timestamps_us: Vec<i64>,
    pub max_output_frames: Option<usize>,
    pub box_fit: BoxFit,
    /// Target box; an unset side keeps the source dimension.
    #[serde(alias = "outputWidth")]
    pub width: Option<u32>,
    #[serde(alias = "outputHeight")]
    pub height: Option<u32>,
    #[serde(alias = "outputFormat")]
    pub format: ThumbnailFormat,
}

impl Default for ThumbnailRequest {
    fn default() -> Self {
        Self {
            timestamps_us: Vec::new(),
            max_output_frames: Some(DEFAULT_MAX_OUTPUT_FRAMES),
            box_fit: BoxFit::default(),
            width: None,
            height: None,
            format: ThumbnailFormat::default(),
        }
    }
}

impl ThumbnailRequest {
    pub fn validate(&self) -> VidfxResult<()> {
        if self.timestamps_us.is_empty() && self.max_output_frames.is_none() {
            return Err(VidfxError::validation(
                "thumbnails need timestamps or maxOutputFrames",
            ));
        }
        if self.width == Some(0) || self.height == Some(0) {
            return Err(VidfxError::validation("thumbnail size must be non-zero"));
        }
        Ok(())
    }

    pub fn target_size(&self, source: FrameSize) -> FrameSize {
        FrameSize::new(
            self.width.unwrap_or(source.width),
            self.height.unwrap_or(source.height),
        )
    }
}

/// Capture and encode thumbnails.
///
/// Frames are grabbed in parallel; frames that fail are logged and left out while the rest keep
/// their request order. `on_progress` receives the completed fraction and a final `1.0`.
#[tracing::instrument(skip_all, fields(ext = extension, format = ?request.format))]
pub fn generate_thumbnails(
    input: &[u8],
    extension: &str,
    request: &ThumbnailRequest,
    opts: &PipelineOpts,
    on_progress: &(dyn Fn(f64) + Sync),
) -> VidfxResult<Vec<Vec<u8>>> {
    opts.validate()?;
    request.validate()?;

    let tools = opts.tools();
    let scratch = JobScratch::new(opts.temp_dir.as_deref())?;
    let path = scratch.write_input(input, extension)?;
    let meta = probe(&tools, &path)?;
    let source = meta.display_size();

    let timestamps = if request.timestamps_us.is_empty() {
        let max = request.max_output_frames.unwrap_or(0);
        sample_evenly(&keyframe_timestamps(&tools, &path)?, max)
    } else {
        let last_us = (meta.duration_us - meta.frame_duration_us()).max(0);
        request
            .timestamps_us
            .iter()
            .map(|&t| t.clamp(0, last_us))
            .collect()
    };
    let lookback_us = TAIL_LOOKBACK_US + meta.frame_duration_us();

    let plan = fit(source, request.target_size(source), request.box_fit)?;
    let quality = opts.jpeg_quality;
    let total = timestamps.len();
    let completed = AtomicUsize::new(0);
    let tracker = Mutex::new(ProgressTracker::new(opts.progress_interval()));

    let pool = opts.build_thread_pool()?;
    let results: Vec<Option<Vec<u8>>> = pool.install(|| {
        timestamps
            .par_iter()
            .map(|&at_us| {
                let out = thumbnail_at(
                    &tools,
                    &path,
                    source,
                    at_us,
                    lookback_us,
                    &plan,
                    request.format,
                    quality,
                );
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                if let Ok(mut t) = tracker.lock()
                    && let Some(p) = t.update(done as f64 / total as f64)
                {
                    on_progress(p);
                }
                match out {
                    Ok(bytes) => Some(bytes),
                    Err(e) => {
                        tracing::warn!(at_us, error = %e, "thumbnail frame failed");
                        None
                    }
                }
            })
            .collect()
    });

    if let Ok(mut t) = tracker.lock()
        && let Some(p) = t.finish()
    {
        on_progress(p);
    }
    Ok(results.into_iter().flatten().collect())
}

#[allow(clippy::too_many_arguments)]
fn thumbnail_at(
    tools: &MediaTools,
    path: &Path,
    source: FrameSize,
    at_us: i64,
    lookback_us: i64,
    plan: &FitPlan,
    format: ThumbnailFormat,
    jpeg_quality: u8,
) -> VidfxResult<Vec<u8>> {
    let frame = grab_frame_closest(tools, path, source, at_us, lookback_us)?;
    let img = fit_frame(frame, plan)?;
    encode_image(&img, format, jpeg_quality)
}

pub(crate) fn fit_frame(
    frame: FrameRGBA,
    plan: &FitPlan,
) -> VidfxResult<image::RgbaImage> {
    let img = frame.into_image()?;
    let resized = if img.dimensions() == (plan.resized.width, plan.resized.height) {
        img
    } else {
        image::imageops::resize(
            &img,
            plan.resized.width,
            plan.resized.height,
            image::imageops::FilterType::Triangle,
        )
    };
    Ok(match plan.crop {
        Some(r) => image::imageops::crop_imm(&resized, r.x, r.y, r.width, r.height).to_image(),
        None => resized,
    })
}

pub(crate) fn encode_image(
    img: &image::RgbaImage,
    format: ThumbnailFormat,
    jpeg_quality: u8,
) -> VidfxResult<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    let res = match format {
        ThumbnailFormat::Jpeg => {
            let rgb = image::DynamicImage::ImageRgba8(img.clone()).to_rgb8();
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, jpeg_quality);
            rgb.write_with_encoder(encoder)
        }
        ThumbnailFormat::Png | ThumbnailFormat::Webp => img.write_to(&mut out, format.image_format()),
    };
    res.map_err(|e| VidfxError::export(format!("thumbnail encode ({format:?}): {e}")))?;
    Ok(out.into_inner())
}

/// Pick `max` entries spread evenly over `items`, keeping all of them when there are fewer.
pub fn sample_evenly(items: &[i64], max: usize) -> Vec<i64> {
    if items.len() <= max {
        return items.to_vec();
    }
    let step = items.len() as f64 / max as f64;
    (0..max)
        .map(|i| items[((i as f64 * step) as usize).min(items.len() - 1)])
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/job/thumbnails.rs"]
mod tests;
