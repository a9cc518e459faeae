//! 4x5 affine color matrices.
//!
//! A matrix is stored row-major as 20 numbers. Rows are the output channels (R, G, B, A); the
//! first four columns weight the input channels and column 4 is an additive bias expressed on the
//! 0..=255 scale. The alpha bias (index 19) is carried through composition but ignored when
//! rendering.

use crate::foundation::error::{VidfxError, VidfxResult};

/// Number of entries in a color matrix.
pub const COLOR_MATRIX_LEN: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct ColorMatrix([f64; COLOR_MATRIX_LEN]);

impl ColorMatrix {
    pub const IDENTITY: Self = Self([
        1.0, 0.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0, 0.0,
    ]);

    pub fn new(values: [f64; COLOR_MATRIX_LEN]) -> Self {
        Self(values)
    }

    /// Rec. 601 luma weights on every color row.
    pub fn grayscale() -> Self {
        Self([
            0.299, 0.587, 0.114, 0.0, 0.0, //
            0.299, 0.587, 0.114, 0.0, 0.0, //
            0.299, 0.587, 0.114, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ])
    }

    pub fn sepia() -> Self {
        Self([
            0.393, 0.769, 0.189, 0.0, 0.0, //
            0.349, 0.686, 0.168, 0.0, 0.0, //
            0.272, 0.534, 0.131, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ])
    }

    /// Uniform gain on the color channels, alpha untouched.
    pub fn brightness(gain: f64) -> Self {
        let mut m = Self::IDENTITY;
        m.0[0] = gain;
        m.0[6] = gain;
        m.0[12] = gain;
        m
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.0[row * 5 + col]
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Apply the matrix to a normalized, opaque RGB triple.
    ///
    /// The bias column is divided by 255 to bring it onto the normalized scale and the input
    /// alpha is taken as 1.0. Results are clamped to `[0, 1]`.
    pub fn apply_rgb(&self, rgb: [f64; 3]) -> [f64; 3] {
        let mut out = [0.0f64; 3];
        for (c, o) in out.iter_mut().enumerate() {
            let v = self.at(c, 0) * rgb[0]
                + self.at(c, 1) * rgb[1]
                + self.at(c, 2) * rgb[2]
                + self.at(c, 3)
                + self.at(c, 4) / 255.0;
            *o = v.clamp(0.0, 1.0);
        }
        out
    }
}

impl Default for ColorMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl TryFrom<&[f64]> for ColorMatrix {
    type Error = VidfxError;

    fn try_from(values: &[f64]) -> VidfxResult<Self> {
        if values.len() != COLOR_MATRIX_LEN {
            return Err(VidfxError::configuration(format!(
                "color matrix must be 4x5 ({COLOR_MATRIX_LEN} elements), got {}",
                values.len()
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(VidfxError::configuration(
                "color matrix entries must be finite",
            ));
        }
        let mut out = [0.0f64; COLOR_MATRIX_LEN];
        out.copy_from_slice(values);
        Ok(Self(out))
    }
}

impl TryFrom<Vec<f64>> for ColorMatrix {
    type Error = VidfxError;

    fn try_from(values: Vec<f64>) -> VidfxResult<Self> {
        Self::try_from(values.as_slice())
    }
}

impl From<ColorMatrix> for Vec<f64> {
    fn from(m: ColorMatrix) -> Self {
        m.0.to_vec()
    }
}

/// Compose two matrices so that the result means "apply `m2`, then `m1`".
///
/// `out[i,j] = sum_k m1[i,k] * m2[k,j]`, plus `m1[i,4]` on the bias column.
pub fn multiply(m1: &ColorMatrix, m2: &ColorMatrix) -> ColorMatrix {
    let mut out = [0.0f64; COLOR_MATRIX_LEN];
    for i in 0..4 {
        for j in 0..5 {
            let mut v = 0.0;
            for k in 0..4 {
                v += m1.at(i, k) * m2.at(k, j);
            }
            if j == 4 {
                v += m1.at(i, 4);
            }
            out[i * 5 + j] = v;
        }
    }
    ColorMatrix(out)
}

/// Fold matrices in application order: each later matrix is applied after the accumulated ones.
///
/// Returns `None` for an empty input, in which case no LUT should be generated.
pub fn combine(matrices: &[ColorMatrix]) -> Option<ColorMatrix> {
    let (first, rest) = matrices.split_first()?;
    Some(rest.iter().fold(*first, |acc, next| multiply(next, &acc)))
}

/// Parse and combine matrices in the flat wire format (lists of 20 numbers).
pub fn combine_wire(lists: &[Vec<f64>]) -> VidfxResult<Option<ColorMatrix>> {
    let parsed = lists
        .iter()
        .map(|l| ColorMatrix::try_from(l.as_slice()))
        .collect::<VidfxResult<Vec<_>>>()?;
    Ok(combine(&parsed))
}

#[cfg(test)]
#[path = "../../tests/unit/color/matrix.rs"]
mod tests;
