use crate::foundation::error::{VidfxError, VidfxResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Pixel dimensions of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn transposed(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    /// Number of bytes in a tightly packed RGBA8 buffer of this size.
    pub fn rgba8_len(self) -> VidfxResult<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| VidfxError::validation("frame buffer size overflow"))
    }
}

/// Integer rectangle in pixel space (origin top-left, y down).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn size(self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }

    pub fn right(self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(self) -> u32 {
        self.y + self.height
    }

    pub fn to_rect(self) -> Rect {
        Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.right()),
            f64::from(self.bottom()),
        )
    }
}

/// Source time window in microseconds: start inclusive, end exclusive.
///
/// Either bound may be left open; an open end means "until the end of the source".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TrimRange {
    pub start_us: Option<i64>,
    pub end_us: Option<i64>,
}

impl TrimRange {
    pub fn is_unbounded(self) -> bool {
        self.start_us.is_none() && self.end_us.is_none()
    }

    /// Resolve open bounds against the source duration.
    ///
    /// The result is clamped into `[0, duration_us]` and `end >= start` always holds.
    pub fn resolve(self, duration_us: i64) -> (i64, i64) {
        let duration_us = duration_us.max(0);
        let start = self.start_us.unwrap_or(0).clamp(0, duration_us);
        let end = self.end_us.unwrap_or(duration_us).clamp(start, duration_us);
        (start, end)
    }
}

pub fn micros_to_secs(us: i64) -> f64 {
    (us as f64) / 1_000_000.0
}

pub fn secs_to_micros(secs: f64) -> i64 {
    (secs * 1_000_000.0).round() as i64
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
