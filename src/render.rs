use crate::foundation::{
    core::FrameSize,
    error::{VidfxError, VidfxResult},
};

pub(crate) mod cpu;

/// Tightly packed straight-alpha RGBA8 frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl FrameRGBA {
    pub fn new(size: FrameSize, data: Vec<u8>) -> VidfxResult<Self> {
        let expected = size.rgba8_len()?;
        if data.len() != expected {
            return Err(VidfxError::validation(format!(
                "frame {}x{} expects {expected} bytes, got {}",
                size.width,
                size.height,
                data.len()
            )));
        }
        Ok(Self {
            width: size.width,
            height: size.height,
            data,
        })
    }

    pub fn solid(size: FrameSize, rgba: [u8; 4]) -> VidfxResult<Self> {
        let len = size.rgba8_len()?;
        Self::new(size, rgba.repeat(len / 4))
    }

    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    pub(crate) fn into_image(self) -> VidfxResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.data)
            .ok_or_else(|| VidfxError::validation("frame buffer does not match its size"))
    }

    pub(crate) fn from_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }
}
