//! One-dimensional box filters over rows of 8-bit coverage.
//!
//! Each call filters every row of a `width x height` source and writes rows
//! of `width + 2 * radius` outputs, optionally transposed so that a second
//! call over the result filters the other axis. Three passes of a box filter
//! approximate a Gaussian; a single pass is the low-quality blur.
//!
//! Averages are fixed point: the running sum is scaled by
//! `(1 << 24) / kernel_size` and shifted back down by 24 bits.

use crate::basics::ceil_to_int;

/// Rounding bias added before the final `>> 24`.
#[cfg(not(feature = "disable-blur-rounding"))]
pub(crate) const BLUR_HALF: u32 = 1 << 23;
#[cfg(feature = "disable-blur-rounding")]
pub(crate) const BLUR_HALF: u32 = 0;

#[inline]
fn scaled(sum: u32, scale: u32) -> u8 {
    ((sum * scale + BLUR_HALF) >> 24) as u8
}

// ============================================================================
// Integer-radius box blur
// ============================================================================

/// Box filter each row with a window that reaches `left_radius` pixels to the
/// left of the output and `right_radius` to the right.
///
/// Source rows are `src_y_stride` bytes apart and `width` bytes wide. Output
/// rows are `width + 2 * max(left_radius, right_radius)` wide; when the radii
/// differ, the shortfall is filled with zeros (leading when the right radius
/// is larger, trailing when the left is). With `transpose` the output is
/// stored column-major: output row `y` becomes column `y` of a buffer whose
/// rows are `height` bytes long.
///
/// Returns the output row width.
#[allow(clippy::too_many_arguments)]
pub fn box_blur(
    src: &[u8],
    src_y_stride: usize,
    dst: &mut [u8],
    left_radius: usize,
    right_radius: usize,
    width: usize,
    height: usize,
    transpose: bool,
) -> usize {
    let diameter = left_radius + right_radius;
    let kernel_size = diameter as u32 + 1;
    let border = width.min(diameter);
    let scale = (1u32 << 24) / kernel_size;
    let new_width = width + left_radius.max(right_radius) * 2;
    let (dst_x_stride, dst_y_stride) = if transpose {
        (height, 1)
    } else {
        (1, new_width)
    };

    for y in 0..height {
        let row = &src[y * src_y_stride..y * src_y_stride + width];
        let mut sum = 0u32;
        let mut d = y * dst_y_stride;
        let mut left = 0;
        let mut right = 0;

        for _ in 0..right_radius.saturating_sub(left_radius) {
            dst[d] = 0;
            d += dst_x_stride;
        }
        // Window entering from the left edge.
        for _ in 0..border {
            sum += row[right] as u32;
            right += 1;
            dst[d] = scaled(sum, scale);
            d += dst_x_stride;
        }
        // Window wider than the row: every output sees the whole row.
        for _ in width..diameter {
            dst[d] = scaled(sum, scale);
            d += dst_x_stride;
        }
        for _ in diameter..width {
            sum += row[right] as u32;
            right += 1;
            dst[d] = scaled(sum, scale);
            sum -= row[left] as u32;
            left += 1;
            d += dst_x_stride;
        }
        // Window leaving past the right edge.
        for _ in 0..border {
            dst[d] = scaled(sum, scale);
            sum -= row[left] as u32;
            left += 1;
            d += dst_x_stride;
        }
        for _ in 0..left_radius.saturating_sub(right_radius) {
            dst[d] = 0;
            d += dst_x_stride;
        }
        debug_assert_eq!(sum, 0);
    }
    new_width
}

// ============================================================================
// Fractional-radius box blur
// ============================================================================

/// Box filter with a fractional radius, expressed as a blend of a
/// `2 * radius + 1` outer box and a `2 * radius - 1` inner box.
///
/// `outer_weight` is the outer box's share out of 255; the inner box gets the
/// rest. Output rows are `width + 2 * radius` wide. `radius` must be at
/// least 1.
///
/// Returns the output row width.
#[allow(clippy::too_many_arguments)]
pub fn box_blur_interp(
    src: &[u8],
    src_y_stride: usize,
    dst: &mut [u8],
    radius: usize,
    width: usize,
    height: usize,
    transpose: bool,
    outer_weight: u8,
) -> usize {
    assert!(radius > 0, "interpolated box blur needs a radius of at least 1");
    let diameter = radius * 2;
    let kernel_size = diameter as u32 + 1;
    let border = width.min(diameter);
    let mut outer_weight = outer_weight as u32;
    let mut inner_weight = 255 - outer_weight;
    outer_weight += outer_weight >> 7;
    inner_weight += inner_weight >> 7;
    let outer_scale = (outer_weight << 16) / kernel_size;
    let inner_scale = (inner_weight << 16) / (kernel_size - 2);
    let new_width = width + diameter;
    let (dst_x_stride, dst_y_stride) = if transpose {
        (height, 1)
    } else {
        (1, new_width)
    };
    let blend = |outer: u32, inner: u32| -> u8 {
        ((outer * outer_scale + inner * inner_scale + BLUR_HALF) >> 24) as u8
    };

    for y in 0..height {
        let row = &src[y * src_y_stride..y * src_y_stride + width];
        let mut outer_sum = 0u32;
        let mut inner_sum = 0u32;
        let mut d = y * dst_y_stride;
        let mut left = 0;
        let mut right = 0;

        for _ in 0..border {
            inner_sum = outer_sum;
            outer_sum += row[right] as u32;
            right += 1;
            dst[d] = blend(outer_sum, inner_sum);
            d += dst_x_stride;
        }
        for _ in width..diameter {
            dst[d] = blend(outer_sum, inner_sum);
            d += dst_x_stride;
        }
        for _ in diameter..width {
            inner_sum = outer_sum - row[left] as u32;
            outer_sum += row[right] as u32;
            right += 1;
            dst[d] = blend(outer_sum, inner_sum);
            d += dst_x_stride;
            outer_sum -= row[left] as u32;
            left += 1;
        }
        for _ in 0..border {
            inner_sum = outer_sum - row[left] as u32;
            left += 1;
            dst[d] = blend(outer_sum, inner_sum);
            d += dst_x_stride;
            outer_sum = inner_sum;
        }
        debug_assert!(outer_sum == 0 && inner_sum == 0);
    }
    new_width
}

// ============================================================================
// Radius helpers
// ============================================================================

/// Split a per-pass radius into the `(low, high)` integer radii used by the
/// three asymmetric high-quality passes.
///
/// `high` is the ceiling of `pass_radius`; `low` is one less when the
/// ceiling overshoots by more than half a pixel.
pub fn adjusted_radii(pass_radius: f32) -> (usize, usize) {
    let hi = ceil_to_int(pass_radius).max(0);
    let lo = if hi as f32 - pass_radius > 0.5 {
        hi - 1
    } else {
        hi
    };
    (lo.max(0) as usize, hi as usize)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Small deterministic generator so the tests don't need a rand crate.
    struct Lcg(u32);

    impl Lcg {
        fn next_u8(&mut self) -> u8 {
            self.0 = self.0.wrapping_mul(1_103_515_245).wrapping_add(12345);
            (self.0 >> 16) as u8
        }
    }

    fn blur_row(src: &[u8], left: usize, right: usize) -> Vec<u8> {
        let mut dst = vec![0xAA; src.len() + 2 * left.max(right)];
        let w = box_blur(src, src.len(), &mut dst, left, right, src.len(), 1, false);
        assert_eq!(w, dst.len());
        dst
    }

    fn blur_row_interp(src: &[u8], radius: usize, outer_weight: u8) -> Vec<u8> {
        let mut dst = vec![0xAA; src.len() + 2 * radius];
        let w = box_blur_interp(
            src,
            src.len(),
            &mut dst,
            radius,
            src.len(),
            1,
            false,
            outer_weight,
        );
        assert_eq!(w, dst.len());
        dst
    }

    #[test]
    #[cfg(not(feature = "disable-blur-rounding"))]
    fn test_box_blur_constant_row() {
        assert_eq!(
            blur_row(&[255, 255, 255, 255], 1, 1),
            vec![85, 170, 255, 255, 170, 85]
        );
    }

    #[test]
    #[cfg(not(feature = "disable-blur-rounding"))]
    fn test_box_blur_asymmetric_pads_with_zeros() {
        // Larger right radius: zeros lead.
        assert_eq!(blur_row(&[255, 0, 0], 0, 2), vec![0, 0, 85, 85, 85, 0, 0]);
        // Larger left radius: zeros trail.
        let out = blur_row(&[255, 0, 0], 2, 0);
        assert_eq!(out.len(), 7);
        assert_eq!(&out[5..], &[0, 0]);
        assert_eq!(&out[..5], &[85, 85, 85, 0, 0]);
    }

    #[test]
    #[cfg(not(feature = "disable-blur-rounding"))]
    fn test_box_blur_window_wider_than_row() {
        // Diameter 6 > width 2: the middle outputs all see the whole row.
        let out = blur_row(&[140, 140], 3, 3);
        assert_eq!(out.len(), 8);
        assert_eq!(out[0], 20);
        assert!(out[1..7].iter().all(|&v| v == 40));
        assert_eq!(out[7], 20);
    }

    #[test]
    #[cfg(not(feature = "disable-blur-rounding"))]
    fn test_box_blur_transpose() {
        let src = [255, 255, 0, 255];
        let mut dst = [0u8; 8];
        let w = box_blur(&src, 2, &mut dst, 1, 1, 2, 2, true);
        assert_eq!(w, 4);
        // Row 0 -> [85,170,170,85], row 1 -> [0,85,85,85], stored column-major.
        assert_eq!(dst, [85, 0, 170, 85, 170, 85, 85, 85]);
    }

    #[test]
    #[cfg(not(feature = "disable-blur-rounding"))]
    fn test_box_blur_honours_source_stride() {
        let src = [255, 255, 9, 9, 255, 255, 9, 9];
        let mut dst = [0u8; 8];
        box_blur(&src, 4, &mut dst, 1, 1, 2, 2, false);
        assert_eq!(dst, [85, 170, 170, 85, 85, 170, 170, 85]);
    }

    #[test]
    fn test_box_blur_sums_return_to_zero() {
        // The running sum's debug assertion fires if any region is off by one.
        let mut rng = Lcg(7);
        for width in 0..12 {
            for left in 0..5 {
                for right in 0..5 {
                    let src: Vec<u8> = (0..width).map(|_| rng.next_u8()).collect();
                    blur_row(&src, left, right);
                }
            }
        }
        for width in 0..12 {
            for radius in 1..5 {
                for &ow in &[0u8, 1, 127, 128, 200, 255] {
                    let src: Vec<u8> = (0..width).map(|_| rng.next_u8()).collect();
                    blur_row_interp(&src, radius, ow);
                }
            }
        }
    }

    #[test]
    fn test_box_blur_preserves_symmetry() {
        let mut rng = Lcg(42);
        for _ in 0..50 {
            let half: Vec<u8> = (0..5).map(|_| rng.next_u8()).collect();
            let mut src = half.clone();
            src.extend(half.iter().rev());
            for r in 1..4 {
                let out = blur_row(&src, r, r);
                let rev: Vec<u8> = out.iter().rev().copied().collect();
                assert_eq!(out, rev);

                let out = blur_row_interp(&src, r, 100);
                let rev: Vec<u8> = out.iter().rev().copied().collect();
                assert_eq!(out, rev);
            }
        }
    }

    #[test]
    fn test_interp_full_outer_weight_matches_box_blur() {
        let mut rng = Lcg(3);
        for width in 1..15 {
            let src: Vec<u8> = (0..width).map(|_| rng.next_u8()).collect();
            for r in 1..5 {
                assert_eq!(blur_row_interp(&src, r, 255), blur_row(&src, r, r));
            }
        }
    }

    #[test]
    fn test_interp_zero_outer_weight_is_inner_box() {
        // With no outer weight only the 2r-1 box contributes, one pixel
        // further in than a plain radius r-1 blur.
        let mut rng = Lcg(11);
        for r in 1..5 {
            for width in 2 * r..2 * r + 8 {
                let src: Vec<u8> = (0..width).map(|_| rng.next_u8()).collect();
                let mut expected = vec![0];
                expected.extend(blur_row(&src, r - 1, r - 1));
                expected.push(0);
                assert_eq!(blur_row_interp(&src, r, 0), expected);
            }
        }
    }

    #[test]
    fn test_adjusted_radii() {
        assert_eq!(adjusted_radii(2.0), (2, 2));
        assert_eq!(adjusted_radii(1.7), (2, 2));
        assert_eq!(adjusted_radii(1.5), (2, 2));
        assert_eq!(adjusted_radii(1.4), (1, 2));
        assert_eq!(adjusted_radii(0.2), (0, 1));
    }
}
