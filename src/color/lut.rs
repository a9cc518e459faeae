//! 3D color lookup tables derived from a [`ColorMatrix`].
//!
//! Entries are stored with red varying fastest, then green, then blue, which is also the row
//! order of the `.cube` text format.

use std::fmt::Write as _;

use crate::color::matrix::ColorMatrix;
use crate::foundation::error::{VidfxError, VidfxResult};
use crate::foundation::math::unit_to_u8;

/// Default cube side length.
pub const DEFAULT_LUT_SIZE: usize = 33;

/// Largest accepted cube side (256 covers every 8-bit input exactly).
pub const MAX_LUT_SIZE: usize = 256;

#[derive(Clone, Debug, PartialEq)]
pub struct ColorLut {
    size: usize,
    data: Vec<[f32; 3]>,
}

impl ColorLut {
    /// Sample `matrix` on a `size`³ grid of normalized RGB coordinates.
    pub fn build(matrix: &ColorMatrix, size: usize) -> VidfxResult<Self> {
        validate_size(size)?;
        let step = 1.0 / (size - 1) as f64;
        let mut data = Vec::with_capacity(size * size * size);
        for b in 0..size {
            for g in 0..size {
                for r in 0..size {
                    let rgb = matrix.apply_rgb([r as f64 * step, g as f64 * step, b as f64 * step]);
                    data.push([rgb[0] as f32, rgb[1] as f32, rgb[2] as f32]);
                }
            }
        }
        Ok(Self { size, data })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn entries(&self) -> &[[f32; 3]] {
        &self.data
    }

    /// Entry at integer grid coordinate `(r, g, b)`.
    pub fn get(&self, r: usize, g: usize, b: usize) -> [f32; 3] {
        self.data[self.index(r, g, b)]
    }

    fn index(&self, r: usize, g: usize, b: usize) -> usize {
        (b * self.size + g) * self.size + r
    }

    /// Trilinear lookup of a normalized RGB triple.
    pub fn sample(&self, rgb: [f32; 3]) -> [f32; 3] {
        let max = (self.size - 1) as f32;
        let mut lo = [0usize; 3];
        let mut hi = [0usize; 3];
        let mut frac = [0.0f32; 3];
        for c in 0..3 {
            let p = rgb[c].clamp(0.0, 1.0) * max;
            let f = p.floor();
            lo[c] = f as usize;
            hi[c] = (lo[c] + 1).min(self.size - 1);
            frac[c] = p - f;
        }

        let lerp = |a: [f32; 3], b: [f32; 3], t: f32| -> [f32; 3] {
            [
                a[0] + (b[0] - a[0]) * t,
                a[1] + (b[1] - a[1]) * t,
                a[2] + (b[2] - a[2]) * t,
            ]
        };

        let c00 = lerp(self.get(lo[0], lo[1], lo[2]), self.get(hi[0], lo[1], lo[2]), frac[0]);
        let c10 = lerp(self.get(lo[0], hi[1], lo[2]), self.get(hi[0], hi[1], lo[2]), frac[0]);
        let c01 = lerp(self.get(lo[0], lo[1], hi[2]), self.get(hi[0], lo[1], hi[2]), frac[0]);
        let c11 = lerp(self.get(lo[0], hi[1], hi[2]), self.get(hi[0], hi[1], hi[2]), frac[0]);
        let c0 = lerp(c00, c10, frac[1]);
        let c1 = lerp(c01, c11, frac[1]);
        lerp(c0, c1, frac[2])
    }

    /// Map every pixel of a straight-alpha RGBA8 buffer through the table. Alpha is untouched.
    pub fn apply_rgba8_in_place(&self, rgba: &mut [u8]) -> VidfxResult<()> {
        if !rgba.len().is_multiple_of(4) {
            return Err(VidfxError::validation(
                "LUT application expects an rgba8 buffer",
            ));
        }
        for px in rgba.chunks_exact_mut(4) {
            let out = self.sample([
                f32::from(px[0]) / 255.0,
                f32::from(px[1]) / 255.0,
                f32::from(px[2]) / 255.0,
            ]);
            px[0] = unit_to_u8(out[0]);
            px[1] = unit_to_u8(out[1]);
            px[2] = unit_to_u8(out[2]);
        }
        Ok(())
    }

    /// Serialize as a `.cube` text file.
    pub fn to_cube_string(&self, title: &str) -> String {
        let mut out = String::with_capacity(self.data.len() * 28 + 128);
        let _ = writeln!(out, "TITLE \"{}\"", title.replace('"', "'"));
        let _ = writeln!(out, "LUT_3D_SIZE {}", self.size);
        out.push_str("DOMAIN_MIN 0.0 0.0 0.0\n");
        out.push_str("DOMAIN_MAX 1.0 1.0 1.0\n");
        for [r, g, b] in &self.data {
            let _ = writeln!(out, "{r:.6} {g:.6} {b:.6}");
        }
        out
    }

    pub fn write_cube(&self, path: &std::path::Path, title: &str) -> VidfxResult<()> {
        use anyhow::Context as _;
        std::fs::write(path, self.to_cube_string(title))
            .with_context(|| format!("write cube LUT '{}'", path.display()))?;
        Ok(())
    }

    /// Parse a `.cube` file with a 0..1 domain.
    pub fn parse_cube(text: &str) -> VidfxResult<Self> {
        let mut size = None;
        let mut data = Vec::new();
        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            let Some(head) = parts.next() else {
                continue;
            };
            match head {
                "TITLE" => {}
                "LUT_3D_SIZE" => {
                    let n = parts
                        .next()
                        .and_then(|v| v.parse::<usize>().ok())
                        .ok_or_else(|| {
                            VidfxError::configuration(format!(
                                "cube line {}: invalid LUT_3D_SIZE",
                                lineno + 1
                            ))
                        })?;
                    validate_size(n)?;
                    data.reserve(n * n * n);
                    size = Some(n);
                }
                "DOMAIN_MIN" | "DOMAIN_MAX" => {
                    let want = if head == "DOMAIN_MIN" { 0.0 } else { 1.0 };
                    let ok = parts.all(|v| v.parse::<f32>().is_ok_and(|x| x == want));
                    if !ok {
                        return Err(VidfxError::configuration(format!(
                            "cube line {}: only a 0..1 domain is supported",
                            lineno + 1
                        )));
                    }
                }
                _ => {
                    let mut row = [0.0f32; 3];
                    let values = std::iter::once(head).chain(parts).collect::<Vec<_>>();
                    if values.len() != 3 {
                        return Err(VidfxError::configuration(format!(
                            "cube line {}: expected 3 values",
                            lineno + 1
                        )));
                    }
                    for (slot, v) in row.iter_mut().zip(values) {
                        *slot = v.parse::<f32>().map_err(|_| {
                            VidfxError::configuration(format!(
                                "cube line {}: '{v}' is not a number",
                                lineno + 1
                            ))
                        })?;
                    }
                    data.push(row);
                }
            }
        }

        let size = size.ok_or_else(|| VidfxError::configuration("cube file has no LUT_3D_SIZE"))?;
        if data.len() != size * size * size {
            return Err(VidfxError::configuration(format!(
                "cube file has {} rows, expected {}",
                data.len(),
                size * size * size
            )));
        }
        Ok(Self { size, data })
    }
}

fn validate_size(size: usize) -> VidfxResult<()> {
    if size <= 1 {
        return Err(VidfxError::configuration("LUT size must be >= 2"));
    }
    if size > MAX_LUT_SIZE {
        return Err(VidfxError::configuration(format!(
            "LUT size must be <= {MAX_LUT_SIZE}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/color/lut.rs"]
mod tests;
