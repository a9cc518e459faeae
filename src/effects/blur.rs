use crate::foundation::{
    core::FrameSize,
    error::{VidfxError, VidfxResult},
};

/// Widest kernel half-width the CPU path will build.
pub const MAX_KERNEL_RADIUS: u32 = 256;

/// Kernel half-width covering three standard deviations.
pub fn kernel_radius(sigma: f32) -> u32 {
    if !sigma.is_finite() || sigma <= 0.0 {
        return 0;
    }
    ((sigma * 3.0).ceil() as u32).min(MAX_KERNEL_RADIUS)
}

/// Separable gaussian blur of a straight-alpha RGBA8 frame.
///
/// Edges clamp to the nearest pixel. A non-positive `sigma` returns the input unchanged.
pub fn gaussian_blur_rgba8(src: &[u8], size: FrameSize, sigma: f32) -> VidfxResult<Vec<u8>> {
    let expected_len = size.rgba8_len()?;
    if src.len() != expected_len {
        return Err(VidfxError::validation(format!(
            "blur expects {expected_len} bytes for {}x{}, got {}",
            size.width,
            size.height,
            src.len()
        )));
    }
    let radius = kernel_radius(sigma);
    if radius == 0 || size.is_empty() {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    horizontal_pass(src, &mut tmp, size, &kernel);
    vertical_pass(&tmp, &mut out, size, &kernel);
    Ok(out)
}

/// Normalized kernel in Q16 fixed point; weights sum to exactly 65536.
fn gaussian_kernel_q16(radius: u32, sigma: f32) -> VidfxResult<Vec<u32>> {
    let r = radius as i32;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 || !sum.is_finite() {
        return Err(VidfxError::configuration("gaussian kernel sum is degenerate"));
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| (((wf / sum) * 65536.0).round() as i64).clamp(0, 65536) as u32)
        .collect();
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }
    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], size: FrameSize, k: &[u32]) {
    let radius = (k.len() / 2) as i64;
    let w = i64::from(size.width);
    for (y, row) in dst.chunks_exact_mut(size.width as usize * 4).enumerate() {
        let row_base = y as i64 * w;
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i64 - radius).clamp(0, w - 1);
                let idx = ((row_base + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out = (x as usize) * 4;
            for c in 0..4 {
                row[out + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], size: FrameSize, k: &[u32]) {
    let radius = (k.len() / 2) as i64;
    let w = i64::from(size.width);
    let h = i64::from(size.height);
    for (y, row) in dst.chunks_exact_mut(size.width as usize * 4).enumerate() {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y as i64 + ki as i64 - radius).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out = (x as usize) * 4;
            for c in 0..4 {
                row[out + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/effects/blur.rs"]
mod tests;
