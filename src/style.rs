//! Blur styles — combining a blurred mask with the shape it came from.
//!
//! The blur itself always produces the `Normal` result. The other styles are
//! a post-pass over the region where the blurred image overlaps the source:
//!
//! - `Solid` keeps the shape opaque and the blur outside it.
//! - `Outer` keeps only the blur that falls outside the shape.
//! - `Inner` keeps only the blur inside the shape, cropped to its bounds.

use crate::basics::{alpha_255_to_256, alpha_mul, mul_div_255_round};

/// How a blurred mask is composited with its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BlurStyle {
    /// Blur inside and outside.
    #[default]
    Normal,
    /// Solid inside, blur outside.
    Solid,
    /// Nothing inside, blur outside.
    Outer,
    /// Blur inside, nothing outside.
    Inner,
}

/// Fill `dst` with `blur` modulated by `src`: `blur * (src + 1) >> 8`.
///
/// All three images are `sw x sh`, each with its own row stride. `blur`
/// must already be positioned at the source's origin.
#[allow(clippy::too_many_arguments)]
pub fn merge_src_with_blur(
    dst: &mut [u8],
    dst_row_bytes: usize,
    src: &[u8],
    src_row_bytes: usize,
    blur: &[u8],
    blur_row_bytes: usize,
    sw: usize,
    sh: usize,
) {
    for y in 0..sh {
        let d = &mut dst[y * dst_row_bytes..y * dst_row_bytes + sw];
        let s = &src[y * src_row_bytes..y * src_row_bytes + sw];
        let b = &blur[y * blur_row_bytes..y * blur_row_bytes + sw];
        for ((d, &s), &b) in d.iter_mut().zip(s).zip(b) {
            *d = alpha_mul(b as u32, alpha_255_to_256(s as u32)) as u8;
        }
    }
}

/// Composite the source back over the part of the blurred image it covers.
///
/// `dst` is the blurred image positioned at the source's origin. Only
/// [`BlurStyle::Solid`] and [`BlurStyle::Outer`] change anything; other
/// styles are a logic error.
pub fn clamp_with_orig(
    dst: &mut [u8],
    dst_row_bytes: usize,
    src: &[u8],
    src_row_bytes: usize,
    sw: usize,
    sh: usize,
    style: BlurStyle,
) {
    for y in 0..sh {
        let d = &mut dst[y * dst_row_bytes..y * dst_row_bytes + sw];
        let s = &src[y * src_row_bytes..y * src_row_bytes + sw];
        match style {
            BlurStyle::Solid => {
                for (d, &s) in d.iter_mut().zip(s) {
                    let (sv, dv) = (s as u32, *d as u32);
                    *d = (sv + dv - mul_div_255_round(sv, dv)) as u8;
                }
            }
            BlurStyle::Outer => {
                for (d, &s) in d.iter_mut().zip(s) {
                    if s != 0 {
                        *d = alpha_mul(*d as u32, alpha_255_to_256(255 - s as u32)) as u8;
                    }
                }
            }
            BlurStyle::Normal | BlurStyle::Inner => {
                debug_assert!(false, "unexpected blur style {style:?}");
                return;
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
