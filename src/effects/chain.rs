//! Ordered effect list derived from [`TransformParams`].

use std::sync::Arc;

use crate::{
    color::{lut::ColorLut, matrix::combine_wire},
    effects::params::TransformParams,
    foundation::{
        core::{FrameSize, PixelRect, TrimRange, Vec2},
        error::{VidfxError, VidfxResult},
    },
    geometry::resolver::{GeometrySpec, QuarterTurns, ResolvedGeometry, resolve},
};

/// Blur radius handed to the renderer per unit of requested sigma.
pub const BLUR_SIGMA_SCALE: f32 = 2.5;

/// One per-frame video effect, in application order.
#[derive(Clone, Debug, PartialEq)]
pub enum VideoEffect {
    Rotate { turns: QuarterTurns },
    Flip { x: bool, y: bool },
    /// Crop rectangle in rotated and flipped coordinates.
    Crop { rect: PixelRect },
    Scale { factors: Vec2, size: FrameSize },
    ColorLut { lut: Arc<ColorLut> },
    Blur { sigma: f32, radius: f32 },
    /// Straight-alpha overlay already resized to the working frame.
    Overlay { image: Arc<image::RgbaImage> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Rotate,
    Flip,
    Crop,
    Scale,
    ColorLut,
    Blur,
    Overlay,
}

impl VideoEffect {
    pub fn kind(&self) -> EffectKind {
        match self {
            Self::Rotate { .. } => EffectKind::Rotate,
            Self::Flip { .. } => EffectKind::Flip,
            Self::Crop { .. } => EffectKind::Crop,
            Self::Scale { .. } => EffectKind::Scale,
            Self::ColorLut { .. } => EffectKind::ColorLut,
            Self::Blur { .. } => EffectKind::Blur,
            Self::Overlay { .. } => EffectKind::Overlay,
        }
    }
}

/// Playback speed change shared by the video and audio tracks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedChange {
    factor: f64,
}

impl SpeedChange {
    /// `None` for unset, non-positive, non-finite or unit speeds.
    pub fn new(factor: f64) -> Option<Self> {
        (factor.is_finite() && factor > 0.0 && factor != 1.0).then_some(Self { factor })
    }

    pub fn factor(self) -> f64 {
        self.factor
    }

    /// Output duration per unit of source duration, for video and audio alike.
    pub fn duration_multiplier(self) -> f64 {
        1.0 / self.factor
    }

    pub fn audio_tempo(self) -> f64 {
        self.factor
    }

    pub fn scale_duration_us(self, us: i64) -> i64 {
        (us as f64 * self.duration_multiplier()).round() as i64
    }

    /// `atempo` stages whose product is the tempo, each within the filter's [0.5, 2.0] range.
    pub fn atempo_stages(self) -> Vec<f64> {
        let mut stages = Vec::new();
        let mut rest = self.factor;
        while rest > 2.0 {
            stages.push(2.0);
            rest /= 2.0;
        }
        while rest < 0.5 {
            stages.push(0.5);
            rest /= 0.5;
        }
        stages.push(rest);
        stages
    }
}

/// Immutable per-job effect configuration.
#[derive(Clone, Debug)]
pub struct EffectChain {
    pub source: FrameSize,
    /// `None` when no geometry stage survived.
    pub geometry: Option<ResolvedGeometry>,
    /// Frame size every effect after the geometry stages works at.
    pub output: FrameSize,
    pub video: Vec<VideoEffect>,
    pub speed: Option<SpeedChange>,
    pub trim: TrimRange,
}

impl EffectChain {
    pub fn kinds(&self) -> Vec<EffectKind> {
        self.video.iter().map(VideoEffect::kind).collect()
    }

    pub fn has(&self, kind: EffectKind) -> bool {
        self.video.iter().any(|e| e.kind() == kind)
    }

    /// No frame needs touching; the renderer may forward decoded frames as-is.
    pub fn is_passthrough(&self) -> bool {
        self.video.is_empty()
    }
}

/// Build the effect chain for one job.
///
/// Cosmetic stages that cannot be built (bad crop, bad color matrix, undecodable overlay) are
/// dropped with a warning; the chain itself always builds.
#[tracing::instrument(level = "debug", skip(params))]
pub fn build_effect_chain(
    params: &TransformParams,
    source: FrameSize,
    lut_size: usize,
) -> EffectChain {
    let mut video = Vec::new();

    let geometry = resolve_geometry(&params.geometry(), source);
    let output = geometry.as_ref().map_or(source, |g| g.output);
    if let Some(g) = &geometry {
        push_geometry_effects(g, &mut video);
    }

    if !params.color_matrices.is_empty() {
        match build_lut(&params.color_matrices, lut_size) {
            Ok(Some(lut)) => {
                tracing::debug!(size = lut.size(), "color lut applied");
                video.push(VideoEffect::ColorLut { lut: Arc::new(lut) });
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "skipping color filter"),
        }
    }

    if let Some(sigma) = params.blur_sigma
        && sigma.is_finite()
        && sigma > 0.0
    {
        let sigma = sigma as f32;
        let radius = sigma * BLUR_SIGMA_SCALE;
        tracing::debug!(sigma, radius, "blur applied");
        video.push(VideoEffect::Blur { sigma, radius });
    }

    if let Some(bytes) = params.overlay_image.as_deref() {
        match decode_overlay(bytes, output) {
            Ok(image) => {
                tracing::debug!(width = output.width, height = output.height, "overlay applied");
                video.push(VideoEffect::Overlay {
                    image: Arc::new(image),
                });
            }
            Err(e) => tracing::warn!(error = %e, "skipping overlay"),
        }
    }

    let speed = params.playback_speed.and_then(SpeedChange::new);
    if let Some(s) = speed {
        tracing::debug!(factor = s.factor(), "playback speed applied");
    }

    EffectChain {
        source,
        geometry,
        output,
        video,
        speed,
        trim: params.trim(),
    }
}

fn resolve_geometry(spec: &GeometrySpec, source: FrameSize) -> Option<ResolvedGeometry> {
    if spec.is_identity() {
        return None;
    }
    let unscaled;
    let spec = if spec.has_usable_scale() {
        spec
    } else {
        tracing::warn!(sx = spec.scale_x, sy = spec.scale_y, "skipping scale");
        unscaled = spec.without_scale();
        &unscaled
    };
    let resolved = match resolve(source, spec) {
        Ok(g) => g,
        Err(e) if !spec.crop.is_unset() && !source.is_empty() => {
            tracing::warn!(error = %e, "skipping crop");
            match resolve(source, &spec.without_crop()) {
                Ok(g) => g,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping geometry");
                    return None;
                }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "skipping geometry");
            return None;
        }
    };
    (!resolved.is_identity()).then_some(resolved)
}

fn push_geometry_effects(g: &ResolvedGeometry, video: &mut Vec<VideoEffect>) {
    if !g.rotation.is_identity() {
        tracing::debug!(degrees = g.rotation.degrees(), "rotation applied");
        video.push(VideoEffect::Rotate { turns: g.rotation });
    }
    if g.flip_x || g.flip_y {
        tracing::debug!(x = g.flip_x, y = g.flip_y, "flip applied");
        video.push(VideoEffect::Flip {
            x: g.flip_x,
            y: g.flip_y,
        });
    }
    if let Some(rect) = g.crop {
        tracing::debug!(?rect, "crop applied");
        video.push(VideoEffect::Crop { rect });
    }
    if g.scale != Vec2::new(1.0, 1.0) {
        tracing::debug!(sx = g.scale.x, sy = g.scale.y, "scale applied");
        video.push(VideoEffect::Scale {
            factors: g.scale,
            size: g.output,
        });
    }
}

fn build_lut(lists: &[Vec<f64>], lut_size: usize) -> VidfxResult<Option<ColorLut>> {
    match combine_wire(lists)? {
        Some(m) => ColorLut::build(&m, lut_size).map(Some),
        None => Ok(None),
    }
}

fn decode_overlay(bytes: &[u8], size: FrameSize) -> VidfxResult<image::RgbaImage> {
    if size.is_empty() {
        return Err(VidfxError::geometry("overlay target size is empty"));
    }
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| VidfxError::configuration(format!("overlay decode: {e}")))?
        .to_rgba8();
    if decoded.dimensions() == (size.width, size.height) {
        return Ok(decoded);
    }
    Ok(image::imageops::resize(
        &decoded,
        size.width,
        size.height,
        image::imageops::FilterType::Triangle,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/effects/chain.rs"]
mod tests;
