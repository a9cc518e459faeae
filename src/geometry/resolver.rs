//! Rotation, flip, crop and scale resolution.
//!
//! Frames are transformed in a fixed order: rotate, flip, crop, scale. Crop rectangles are
//! supplied in source-frame coordinates (before rotation and flip), so they are re-expressed in
//! the rotated and flipped frame before being applied.

use crate::foundation::core::{Affine, FrameSize, PixelRect, Vec2};
use crate::foundation::error::{VidfxError, VidfxResult};

/// Clockwise rotation in 90° steps, normalized to `0..4`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(from = "i64", into = "i64")]
pub struct QuarterTurns(u8);

impl QuarterTurns {
    pub fn new(turns: i64) -> Self {
        Self(turns.rem_euclid(4) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn degrees(self) -> u32 {
        u32::from(self.0) * 90
    }

    pub fn is_identity(self) -> bool {
        self.0 == 0
    }

    /// True for 90° and 270°, which exchange width and height.
    pub fn swaps_axes(self) -> bool {
        self.0 % 2 == 1
    }

    /// Size of a `size` frame after this rotation.
    pub fn apply_to(self, size: FrameSize) -> FrameSize {
        if self.swaps_axes() {
            size.transposed()
        } else {
            size
        }
    }

    /// Affine mapping source pixel coordinates into the rotated frame (y down).
    pub fn to_affine(self, source: FrameSize) -> Affine {
        let w = f64::from(source.width);
        let h = f64::from(source.height);
        match self.0 {
            1 => Affine::new([0.0, 1.0, -1.0, 0.0, h, 0.0]),
            2 => Affine::new([-1.0, 0.0, 0.0, -1.0, w, h]),
            3 => Affine::new([0.0, -1.0, 1.0, 0.0, 0.0, w]),
            _ => Affine::IDENTITY,
        }
    }
}

impl From<i64> for QuarterTurns {
    fn from(turns: i64) -> Self {
        Self::new(turns)
    }
}

impl From<QuarterTurns> for i64 {
    fn from(t: QuarterTurns) -> Self {
        i64::from(t.0)
    }
}

/// Crop request in source-frame pixels. Unset fields default to the full remaining frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CropSpec {
    pub x: Option<i64>,
    pub y: Option<i64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

impl CropSpec {
    pub fn is_unset(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.width.is_none() && self.height.is_none()
    }
}

/// Geometric part of a transform request.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeometrySpec {
    pub rotation: QuarterTurns,
    pub flip_x: bool,
    pub flip_y: bool,
    pub crop: CropSpec,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Default for GeometrySpec {
    fn default() -> Self {
        Self {
            rotation: QuarterTurns::default(),
            flip_x: false,
            flip_y: false,
            crop: CropSpec::default(),
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

impl GeometrySpec {
    pub fn has_scale(&self) -> bool {
        self.scale_x != 1.0 || self.scale_y != 1.0
    }

    pub fn is_identity(&self) -> bool {
        self.rotation.is_identity()
            && !self.flip_x
            && !self.flip_y
            && self.crop.is_unset()
            && !self.has_scale()
    }

    /// Same request with the crop removed.
    pub fn without_crop(&self) -> Self {
        Self {
            crop: CropSpec::default(),
            ..*self
        }
    }

    pub fn has_usable_scale(&self) -> bool {
        [self.scale_x, self.scale_y]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
    }

    /// Same request at unit scale.
    pub fn without_scale(&self) -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
            ..*self
        }
    }
}

/// Fully resolved per-frame geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedGeometry {
    pub source: FrameSize,
    pub rotation: QuarterTurns,
    /// Frame size after rotation (and flip, which keeps the size).
    pub rotated: FrameSize,
    pub flip_x: bool,
    pub flip_y: bool,
    /// Crop rectangle in rotated+flipped coordinates, `None` when the whole frame is kept.
    pub crop: Option<PixelRect>,
    /// Working size after crop, before scale.
    pub cropped: FrameSize,
    pub scale: Vec2,
    pub output: FrameSize,
    /// Source pixel coordinates to output coordinates: rotate, flip, crop-translate, scale.
    pub transform: Affine,
}

impl ResolvedGeometry {
    pub fn is_identity(&self) -> bool {
        self.rotation.is_identity()
            && !self.flip_x
            && !self.flip_y
            && self.crop.is_none()
            && self.scale == Vec2::new(1.0, 1.0)
    }
}

/// Resolve `spec` against a source frame of size `source`.
pub fn resolve(source: FrameSize, spec: &GeometrySpec) -> VidfxResult<ResolvedGeometry> {
    if source.is_empty() {
        return Err(VidfxError::geometry(format!(
            "source dimensions {}x{} are not usable",
            source.width, source.height
        )));
    }
    for (axis, v) in [("scale_x", spec.scale_x), ("scale_y", spec.scale_y)] {
        if !v.is_finite() || v <= 0.0 {
            return Err(VidfxError::geometry(format!(
                "{axis} must be finite and > 0, got {v}"
            )));
        }
    }

    let rotation = spec.rotation;
    let rotated = rotation.apply_to(source);

    let crop = if spec.crop.is_unset() {
        None
    } else {
        let rect = crop_in_rotated_space(source, spec)?;
        if rect.x == 0 && rect.y == 0 && rect.size() == rotated {
            None
        } else {
            Some(rect)
        }
    };
    let cropped = crop.map_or(rotated, PixelRect::size);

    let output = FrameSize::new(
        scaled_dim(cropped.width, spec.scale_x),
        scaled_dim(cropped.height, spec.scale_y),
    );
    let scale = Vec2::new(spec.scale_x, spec.scale_y);

    let mut transform = rotation.to_affine(source);
    if spec.flip_x {
        transform = Affine::new([-1.0, 0.0, 0.0, 1.0, f64::from(rotated.width), 0.0]) * transform;
    }
    if spec.flip_y {
        transform = Affine::new([1.0, 0.0, 0.0, -1.0, 0.0, f64::from(rotated.height)]) * transform;
    }
    if let Some(rect) = crop {
        transform = Affine::translate((-f64::from(rect.x), -f64::from(rect.y))) * transform;
    }
    transform = Affine::scale_non_uniform(spec.scale_x, spec.scale_y) * transform;

    Ok(ResolvedGeometry {
        source,
        rotation,
        rotated,
        flip_x: spec.flip_x,
        flip_y: spec.flip_y,
        crop,
        cropped,
        scale,
        output,
        transform,
    })
}

/// Re-express the source-space crop in the rotated and flipped frame, clipped to its bounds.
fn crop_in_rotated_space(source: FrameSize, spec: &GeometrySpec) -> VidfxResult<PixelRect> {
    // i128 holds any sum of three i64 offsets, so caller-supplied crops cannot overflow.
    let w0 = i128::from(source.width);
    let h0 = i128::from(source.height);

    let cx = spec.crop.x.map_or(0, i128::from);
    let cy = spec.crop.y.map_or(0, i128::from);
    let cw = spec.crop.width.map_or(w0 - cx, i128::from);
    let ch = spec.crop.height.map_or(h0 - cy, i128::from);
    if cw <= 0 || ch <= 0 {
        return Err(VidfxError::geometry(format!(
            "crop size {cw}x{ch} must be positive"
        )));
    }

    let (mut x, mut y, w, h) = match spec.rotation.get() {
        1 => (h0 - ch - cy, cx, ch, cw),
        2 => (w0 - cw - cx, h0 - ch - cy, cw, ch),
        3 => (cy, w0 - cw - cx, ch, cw),
        _ => (cx, cy, cw, ch),
    };

    let rotated = spec.rotation.apply_to(source);
    let rw = i128::from(rotated.width);
    let rh = i128::from(rotated.height);
    if spec.flip_x {
        x = rw - w - x;
    }
    if spec.flip_y {
        y = rh - h - y;
    }

    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + w).min(rw);
    let y1 = (y + h).min(rh);
    if x1 <= x0 || y1 <= y0 {
        return Err(VidfxError::geometry(format!(
            "crop {cw}x{ch}+{cx}+{cy} lies outside the {}x{} frame",
            source.width, source.height
        )));
    }

    Ok(PixelRect {
        x: x0 as u32,
        y: y0 as u32,
        width: (x1 - x0) as u32,
        height: (y1 - y0) as u32,
    })
}

fn scaled_dim(dim: u32, factor: f64) -> u32 {
    let v = (f64::from(dim) * factor).round();
    if v < 1.0 {
        1
    } else if v > f64::from(u32::MAX) {
        u32::MAX
    } else {
        v as u32
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/resolver.rs"]
mod tests;
