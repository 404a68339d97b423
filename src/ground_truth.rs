//! Reference blur by direct Gaussian convolution.
//!
//! Slow and exact: two 1-D convolutions in `f64` with a sampled Gaussian
//! kernel. Use it to check the box-filter engines, not to render.
//!
//! The kernel models what three box passes converge to: a Gaussian with
//! `sigma = 0.57735 * radius + 0.5`, sampled over `+-3 sigma`. The margin is
//! that half-window, wider than a `4 * sigma` window at `sigma = radius / 2`.

use tracing::{trace, warn};

use crate::basics::PointI;
use crate::blur::{
    bounds_overflow, checked_outset, composite_style, restore_inner_bounds, BlurredMask,
    PASS_RADIUS_SCALE,
};
use crate::error::{BlurError, Result};
use crate::mask::{try_alloc, Mask, MaskFormat, MaskImage};
use crate::style::BlurStyle;

fn sigma(radius: f32) -> f64 {
    PASS_RADIUS_SCALE as f64 * radius as f64 + 0.5
}

/// Number of kernel taps for `radius`; always odd.
pub fn kernel_window(radius: f32) -> usize {
    (6.0 * sigma(radius)).ceil() as usize | 1
}

/// Normalised Gaussian weights for `radius`, [`kernel_window`] long, centred.
pub fn gaussian_kernel(radius: f32) -> Result<Vec<f64>> {
    let sigma = sigma(radius);
    let window = kernel_window(radius);
    let half = (window >> 1) as f64;
    let denom = 2.0 * sigma * sigma;

    let mut kernel = try_alloc(window, 0.0f64)?;
    for (i, k) in kernel.iter_mut().enumerate() {
        let x = i as f64 - half;
        *k = (-x * x / denom).exp();
    }
    let total: f64 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= total;
    }
    Ok(kernel)
}

/// Convolve `rows` rows of `len` samples with `kernel` and write them
/// transposed: output row `r` lands in column `r` of a buffer whose rows are
/// `rows` long. Each output row is `len + kernel.len() - 1` samples.
///
/// `padded` is scratch space of at least `len + 2 * (kernel.len() - 1)`.
fn convolve_transposed<F>(
    rows: usize,
    len: usize,
    mut read: F,
    kernel: &[f64],
    padded: &mut [f64],
    out: &mut [f64],
) where
    F: FnMut(usize, usize) -> f64,
{
    let half = kernel.len() >> 1;
    let out_len = len + 2 * half;
    let padded = &mut padded[..len + 4 * half];
    padded.fill(0.0);
    for r in 0..rows {
        for i in 0..len {
            padded[2 * half + i] = read(r, i);
        }
        for x in 0..out_len {
            let window = &padded[x..x + kernel.len()];
            let acc: f64 = window.iter().zip(kernel).map(|(p, k)| p * k).sum();
            out[x * rows + r] = acc;
        }
    }
}

/// Blur `src` by direct Gaussian convolution and apply `style`.
///
/// The output grows by half the kernel window on each side.
pub fn blur_ground_truth(src: &Mask, radius: f32, style: BlurStyle) -> Result<BlurredMask> {
    trace!(radius, ?style, width = src.width(), height = src.height(), "ground truth blur");
    if src.format != MaskFormat::A8 {
        warn!(format = ?src.format, "only A8 masks can be blurred");
        return Err(BlurError::UnsupportedFormat(src.format));
    }
    if !(radius.is_finite() && radius > 0.0) {
        warn!(radius, "rejecting blur radius");
        return Err(BlurError::InvalidRadius(radius));
    }

    let half = kernel_window(radius) >> 1;
    let pad = i32::try_from(half).map_err(|_| bounds_overflow(src.bounds, i32::MAX))?;
    let bounds =
        checked_outset(src.bounds, pad).ok_or_else(|| bounds_overflow(src.bounds, pad))?;
    let mut dst = Mask::bounds_only(bounds, bounds.width().max(0) as u32, MaskFormat::A8);

    if let Some(sp) = src.checked_pixels()? {
        let dst_size = dst.compute_image_size().ok_or_else(|| {
            warn!(
                width = dst.width(),
                height = dst.height(),
                "reference blur too large"
            );
            dst.too_large()
        })?;
        let kernel = gaussian_kernel(radius)?;
        let sw = src.width().max(0) as usize;
        let sh = src.height().max(0) as usize;
        let src_rb = src.row_bytes as usize;
        let p = pad as usize;
        let dw = sw + 2 * p;
        let dh = sh + 2 * p;

        let mut padded = try_alloc(dw.max(dh) + 2 * p, 0.0f64)?;
        let mut tmp = try_alloc(dw * sh, 0.0f64)?;
        let mut out = try_alloc(dw * dh, 0.0f64)?;

        // X pass: sh rows of sw -> dw rows of sh.
        convolve_transposed(
            sh,
            sw,
            |y, x| sp[y * src_rb + x] as f64,
            &kernel,
            &mut padded,
            &mut tmp,
        );
        // Y pass: dw rows of sh -> dh rows of dw.
        convolve_transposed(
            dw,
            sh,
            |x, y| tmp[x * sh + y],
            &kernel,
            &mut padded,
            &mut out,
        );

        let mut dp = MaskImage::alloc(dst_size)?;
        for (d, &v) in dp.iter_mut().zip(&out) {
            *d = (v + 0.5).floor().clamp(0.0, 255.0) as u8;
        }
        dst.image = Some(composite_style(
            src,
            sp,
            dp,
            dst.row_bytes as usize,
            p,
            style,
        )?);
    }

    restore_inner_bounds(src, &mut dst, style);
    Ok(BlurredMask {
        mask: dst,
        margin: PointI::new(pad, pad),
    })
}

// ============================================================================
// Tests
// ============================================================================
