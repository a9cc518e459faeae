use std::sync::Arc;

use image::{RgbaImage, imageops};

use crate::{
    effects::{
        blur::gaussian_blur_rgba8,
        chain::{EffectChain, VideoEffect},
        composite::over_in_place,
    },
    foundation::{
        core::FrameSize,
        error::{VidfxError, VidfxResult},
    },
    render::FrameRGBA,
};

/// Applies an [`EffectChain`] to decoded frames.
///
/// Holds only the shared chain, so clones can run on separate threads.
#[derive(Clone, Debug)]
pub struct FrameProcessor {
    chain: Arc<EffectChain>,
}

impl FrameProcessor {
    pub fn new(chain: Arc<EffectChain>) -> Self {
        Self { chain }
    }

    pub fn chain(&self) -> &EffectChain {
        &self.chain
    }

    pub fn output_size(&self) -> FrameSize {
        self.chain.output
    }

    pub fn process(&self, frame: FrameRGBA) -> VidfxResult<FrameRGBA> {
        if frame.size() != self.chain.source {
            return Err(VidfxError::media_read(format!(
                "decoded frame is {}x{}, expected {}x{}",
                frame.width, frame.height, self.chain.source.width, self.chain.source.height
            )));
        }
        if self.chain.is_passthrough() {
            return Ok(frame);
        }

        let mut img = frame.into_image()?;
        for effect in &self.chain.video {
            img = apply_effect(img, effect)?;
        }

        let out = FrameRGBA::from_image(img);
        debug_assert_eq!(out.size(), self.chain.output);
        Ok(out)
    }
}

fn apply_effect(mut img: RgbaImage, effect: &VideoEffect) -> VidfxResult<RgbaImage> {
    match effect {
        VideoEffect::Rotate { turns } => Ok(match turns.get() {
            1 => imageops::rotate90(&img),
            2 => imageops::rotate180(&img),
            3 => imageops::rotate270(&img),
            _ => img,
        }),
        VideoEffect::Flip { x, y } => {
            if *x {
                imageops::flip_horizontal_in_place(&mut img);
            }
            if *y {
                imageops::flip_vertical_in_place(&mut img);
            }
            Ok(img)
        }
        VideoEffect::Crop { rect } => {
            if rect.right() > img.width() || rect.bottom() > img.height() {
                return Err(VidfxError::geometry(format!(
                    "crop {rect:?} exceeds the {}x{} frame",
                    img.width(),
                    img.height()
                )));
            }
            Ok(imageops::crop_imm(&img, rect.x, rect.y, rect.width, rect.height).to_image())
        }
        VideoEffect::Scale { size, .. } => {
            if img.dimensions() == (size.width, size.height) {
                return Ok(img);
            }
            Ok(imageops::resize(
                &img,
                size.width,
                size.height,
                imageops::FilterType::Triangle,
            ))
        }
        VideoEffect::ColorLut { lut } => {
            lut.apply_rgba8_in_place(&mut img)?;
            Ok(img)
        }
        VideoEffect::Blur { radius, .. } => {
            let (w, h) = img.dimensions();
            let blurred = gaussian_blur_rgba8(img.as_raw(), FrameSize::new(w, h), *radius)?;
            RgbaImage::from_raw(w, h, blurred)
                .ok_or_else(|| VidfxError::validation("blur output size mismatch"))
        }
        VideoEffect::Overlay { image } => {
            if image.dimensions() != img.dimensions() {
                return Err(VidfxError::geometry(format!(
                    "overlay is {:?}, frame is {:?}",
                    image.dimensions(),
                    img.dimensions()
                )));
            }
            over_in_place(&mut img, image.as_raw())?;
            Ok(img)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
