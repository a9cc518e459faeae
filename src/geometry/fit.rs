//! Aspect-ratio preserving box fitting, used for thumbnails.

use crate::foundation::core::{FrameSize, PixelRect};
use crate::foundation::error::{VidfxError, VidfxResult};

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum BoxFit {
    /// Fit entirely inside the target bounds.
    #[default]
    Contain,
    /// Fill the target bounds, cropping the excess around the center.
    Cover,
}

impl std::str::FromStr for BoxFit {
    type Err = VidfxError;

    fn from_str(s: &str) -> VidfxResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "contain" => Ok(Self::Contain),
            "cover" => Ok(Self::Cover),
            other => Err(VidfxError::validation(format!(
                "box fit must be 'contain' or 'cover', got '{other}'"
            ))),
        }
    }
}

/// Result of fitting a source into target bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FitPlan {
    /// Size the source is resized to.
    pub resized: FrameSize,
    /// Region of the resized image that is kept (`Cover` only).
    pub crop: Option<PixelRect>,
}

impl FitPlan {
    pub fn output(&self) -> FrameSize {
        self.crop.map_or(self.resized, PixelRect::size)
    }
}

pub fn fit(source: FrameSize, target: FrameSize, mode: BoxFit) -> VidfxResult<FitPlan> {
    if source.is_empty() {
        return Err(VidfxError::validation("cannot fit an empty source"));
    }
    if target.is_empty() {
        return Err(VidfxError::validation("fit target must be non-zero"));
    }

    let wr = f64::from(target.width) / f64::from(source.width);
    let hr = f64::from(target.height) / f64::from(source.height);
    let scale = match mode {
        BoxFit::Contain => wr.min(hr),
        BoxFit::Cover => wr.max(hr),
    };

    // The axis that decided the ratio lands exactly on the target.
    let dim = |src: u32, ratio: f64, tgt: u32| {
        if ratio == scale {
            tgt
        } else {
            ((f64::from(src) * scale) as u32).max(1)
        }
    };
    let resized = FrameSize::new(
        dim(source.width, wr, target.width),
        dim(source.height, hr, target.height),
    );

    let crop = match mode {
        BoxFit::Contain => None,
        BoxFit::Cover => {
            let width = resized.width.min(target.width);
            let height = resized.height.min(target.height);
            if width == resized.width && height == resized.height {
                None
            } else {
                Some(PixelRect {
                    x: (resized.width - width) / 2,
                    y: (resized.height - height) / 2,
                    width,
                    height,
                })
            }
        }
    };

    Ok(FitPlan { resized, crop })
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/fit.rs"]
mod tests;
