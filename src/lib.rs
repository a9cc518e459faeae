//! vidfx applies parameterised transforms to videos.
//!
//! A render takes encoded video bytes plus [`TransformParams`] and produces a new encoded file.
//! Frames pass through a fixed effect order: rotate, flip, crop, scale, color LUT, blur and
//! overlay, with playback speed and trim applied to both tracks. Decoding, encoding and muxing
//! are delegated to the system `ffmpeg`/`ffprobe` binaries.
//!
//! - Build an [`EffectChain`] with [`build_effect_chain`]
//! - Run a [`RenderJob`] synchronously or [`RenderJob::spawn`] it on its own thread
//! - Query [`inspect`] for metadata and [`generate_thumbnails`] for stills
#![forbid(unsafe_code)]

mod foundation;

pub(crate) mod color;
pub(crate) mod config;
pub(crate) mod effects;
pub(crate) mod geometry;
pub(crate) mod job;
pub(crate) mod media;
pub(crate) mod progress;
pub(crate) mod render;

pub use crate::foundation::core::{
    Affine, FrameSize, PixelRect, Point, Rect, TrimRange, Vec2, micros_to_secs, secs_to_micros,
};
pub use crate::foundation::error::{VidfxError, VidfxResult};

pub use crate::color::lut::{ColorLut, DEFAULT_LUT_SIZE, MAX_LUT_SIZE};
pub use crate::color::matrix::{COLOR_MATRIX_LEN, ColorMatrix, combine, combine_wire, multiply};
pub use crate::config::PipelineOpts;
pub use crate::effects::blur::gaussian_blur_rgba8;
pub use crate::effects::chain::{
    BLUR_SIGMA_SCALE, EffectChain, EffectKind, SpeedChange, VideoEffect, build_effect_chain,
};
pub use crate::effects::params::TransformParams;
pub use crate::geometry::fit::{BoxFit, FitPlan, fit};
pub use crate::geometry::resolver::{
    CropSpec, GeometrySpec, QuarterTurns, ResolvedGeometry, resolve,
};
pub use crate::job::metadata::{describe, inspect};
pub use crate::job::render::{JobHandle, JobId, ProgressEvent, RenderJob, RenderOutput};
pub use crate::job::scratch::JobScratch;
pub use crate::job::thumbnails::{
    DEFAULT_MAX_OUTPUT_FRAMES, ThumbnailRequest, generate_thumbnails, sample_evenly,
};
pub use crate::media::format::{OutputFormat, ThumbnailFormat};
pub use crate::media::probe::VideoMetadata;
pub use crate::media::{MediaTools, is_ffmpeg_on_path};
pub use crate::progress::{DEFAULT_PROGRESS_INTERVAL, ProgressTracker, estimate};
pub use crate::render::FrameRGBA;
pub use crate::render::cpu::FrameProcessor;
