use crate::foundation::{
    error::{VidfxError, VidfxResult},
    math::mul_div255_u16,
};

pub type Rgba8 = [u8; 4];

/// Straight-alpha source-over.
pub fn over(dst: Rgba8, src: Rgba8) -> Rgba8 {
    let sa = u16::from(src[3]);
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }

    let inv = 255 - sa;
    let da = mul_div255_u16(u16::from(dst[3]), inv);
    let out_a = sa + da;
    if out_a == 0 {
        return [0, 0, 0, 0];
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        let num = u32::from(src[i]) * u32::from(sa) + u32::from(dst[i]) * u32::from(da);
        out[i] = ((num + u32::from(out_a) / 2) / u32::from(out_a)).min(255) as u8;
    }
    out[3] = out_a.min(255) as u8;
    out
}

/// Composite a full-frame overlay onto `dst`; both buffers are straight RGBA8 of equal size.
pub fn over_in_place(dst: &mut [u8], src: &[u8]) -> VidfxResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(VidfxError::validation(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/effects/composite.rs"]
mod tests;
