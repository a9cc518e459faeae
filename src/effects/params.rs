//! Per-job transform parameters as received from a host application.

use crate::{
    foundation::{
        core::TrimRange,
        error::{VidfxError, VidfxResult},
    },
    geometry::resolver::{CropSpec, GeometrySpec, QuarterTurns},
    media::format::OutputFormat,
};

/// Flat argument map describing one render.
///
/// Field names follow the camelCase keys host applications send; the short legacy keys
/// (`rotateTurns`, `blur`, `colorMatrixList`, `startTime`, `endTime`, `imageBytes`) are accepted
/// as aliases. Every field is optional on the wire.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformParams {
    #[serde(alias = "rotateTurns")]
    pub rotate_quarter_turns: i64,
    pub flip_x: bool,
    pub flip_y: bool,
    pub crop_x: Option<i64>,
    pub crop_y: Option<i64>,
    pub crop_width: Option<i64>,
    pub crop_height: Option<i64>,
    pub scale_x: Option<f64>,
    pub scale_y: Option<f64>,
    #[serde(alias = "colorMatrixList")]
    pub color_matrices: Vec<Vec<f64>>,
    #[serde(alias = "blur")]
    pub blur_sigma: Option<f64>,
    /// Encoded overlay raster (PNG, JPEG, ...).
    #[serde(alias = "imageBytes", skip_serializing_if = "Option::is_none")]
    pub overlay_image: Option<Vec<u8>>,
    pub playback_speed: Option<f64>,
    #[serde(alias = "startTime")]
    pub start_us: Option<i64>,
    #[serde(alias = "endTime")]
    pub end_us: Option<i64>,
    /// Target video bitrate in bits per second.
    pub bitrate: Option<u32>,
    pub enable_audio: bool,
    pub output_format: OutputFormat,
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            rotate_quarter_turns: 0,
            flip_x: false,
            flip_y: false,
            crop_x: None,
            crop_y: None,
            crop_width: None,
            crop_height: None,
            scale_x: None,
            scale_y: None,
            color_matrices: Vec::new(),
            blur_sigma: None,
            overlay_image: None,
            playback_speed: None,
            start_us: None,
            end_us: None,
            bitrate: None,
            enable_audio: true,
            output_format: OutputFormat::default(),
        }
    }
}

impl TransformParams {
    pub fn from_json_str(s: &str) -> VidfxResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| VidfxError::validation(format!("transform params: {e}")))
    }

    pub fn crop(&self) -> CropSpec {
        CropSpec {
            x: self.crop_x,
            y: self.crop_y,
            width: self.crop_width,
            height: self.crop_height,
        }
    }

    pub fn geometry(&self) -> GeometrySpec {
        GeometrySpec {
            rotation: QuarterTurns::new(self.rotate_quarter_turns),
            flip_x: self.flip_x,
            flip_y: self.flip_y,
            crop: self.crop(),
            scale_x: self.scale_x.unwrap_or(1.0),
            scale_y: self.scale_y.unwrap_or(1.0),
        }
    }

    pub fn trim(&self) -> TrimRange {
        TrimRange {
            start_us: self.start_us,
            end_us: self.end_us,
        }
    }

    /// Reject values no stage could make sense of.
    ///
    /// Cosmetic stages recover from bad values on their own; this only catches inputs that are
    /// malformed rather than merely unusable.
    pub fn validate(&self) -> VidfxResult<()> {
        for (name, v) in [
            ("scaleX", self.scale_x),
            ("scaleY", self.scale_y),
            ("blur", self.blur_sigma),
            ("playbackSpeed", self.playback_speed),
        ] {
            if let Some(v) = v
                && !v.is_finite()
            {
                return Err(VidfxError::validation(format!("{name} must be finite")));
            }
        }
        if let (Some(s), Some(e)) = (self.start_us, self.end_us)
            && e < s
        {
            return Err(VidfxError::validation(format!(
                "endTime {e} precedes startTime {s}"
            )));
        }
        if self.bitrate == Some(0) {
            return Err(VidfxError::validation("bitrate must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/params.rs"]
mod tests;
