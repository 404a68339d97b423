//! Summed-area tables and the box kernels evaluated on them.
//!
//! A summed-area table holds, at `(x + 1, y + 1)`, the sum of every source
//! pixel at or above and left of `(x, y)`; its first row and column are
//! zero. Any rectangle's sum is then four lookups, so a box blur of any
//! radius costs the same per pixel.
//!
//! Sums are `u32` and accumulate with wrapping arithmetic. The four-corner
//! difference is exact as long as the true box sum fits in 32 bits, which it
//! always does for 8-bit sources.
//!
//! Kernels write a compact `(sw + 2 * rx) x (sh + 2 * ry)` image and truncate
//! their averages.

// ============================================================================
// Building the table
// ============================================================================

/// Fill `sum` with the prefix sums of a `src_width x src_height` image whose
/// rows are `src_row_bytes` apart.
///
/// `sum` must hold at least `(src_width + 1) * (src_height + 1)` entries; its
/// row stride is `src_width + 1`.
pub fn build_sum_buffer(
    sum: &mut [u32],
    src_width: usize,
    src_height: usize,
    src: &[u8],
    src_row_bytes: usize,
) {
    let stride = src_width + 1;
    sum[..stride].fill(0);
    for y in 0..src_height {
        let row = &src[y * src_row_bytes..y * src_row_bytes + src_width];
        let above = y * stride;
        let here = above + stride;
        sum[here] = 0;
        let mut x_sum = 0u32;
        for (x, &p) in row.iter().enumerate() {
            x_sum = x_sum.wrapping_add(p as u32);
            sum[here + x + 1] = x_sum.wrapping_add(sum[above + x + 1]);
        }
    }
}

/// Sum of the table rectangle with corners `(px, py)` and `(nx, ny)`, where
/// `py` and `ny` are already multiplied by the stride.
#[inline]
fn box_sum(sum: &[u32], px: usize, py: usize, nx: usize, ny: usize) -> u32 {
    sum[px + py]
        .wrapping_add(sum[nx + ny])
        .wrapping_sub(sum[nx + py])
        .wrapping_sub(sum[px + ny])
}

// ============================================================================
// Integer box kernel
// ============================================================================

/// Box blur with radii `(rx, ry)` read from the summed-area table of a
/// `sw x sh` source.
///
/// Writes `(sw + 2 * rx) * (sh + 2 * ry)` bytes to `dst`.
pub fn apply_kernel(dst: &mut [u8], rx: usize, ry: usize, sum: &[u32], sw: usize, sh: usize) {
    if 2 * rx > sw {
        kernel_clamped(dst, rx, ry, sum, sw, sh);
        return;
    }

    let kernel_x = 2 * rx;
    let kernel_y = 2 * ry;
    let scale = (1u32 << 24) / ((kernel_x as u32 + 1) * (kernel_y as u32 + 1));
    let dw = sw + kernel_x;
    let dh = sh + kernel_y;
    let stride = sw + 1;

    for (y, out) in dst.chunks_exact_mut(dw).take(dh).enumerate() {
        let py = y.saturating_sub(kernel_y) * stride;
        let ny = (y + 1).min(sh) * stride;

        // Kernel hangs off the left edge.
        for x in 0..kernel_x {
            out[x] = (box_sum(sum, 0, py, x + 1, ny).wrapping_mul(scale) >> 24) as u8;
        }
        for x in kernel_x..sw {
            let px = x - kernel_x;
            out[x] = (box_sum(sum, px, py, x + 1, ny).wrapping_mul(scale) >> 24) as u8;
        }
        // Kernel hangs off the right edge.
        for x in sw..dw {
            let px = x - kernel_x;
            out[x] = (box_sum(sum, px, py, sw, ny).wrapping_mul(scale) >> 24) as u8;
        }
    }
}

/// [`apply_kernel`] for kernels wider than the source, clamping both
/// horizontal corners at every pixel.
pub fn kernel_clamped(dst: &mut [u8], rx: usize, ry: usize, sum: &[u32], sw: usize, sh: usize) {
    let kernel_x = 2 * rx;
    let kernel_y = 2 * ry;
    let scale = (1u32 << 24) / ((kernel_x as u32 + 1) * (kernel_y as u32 + 1));
    let dw = sw + kernel_x;
    let dh = sh + kernel_y;
    let stride = sw + 1;

    for (y, out) in dst.chunks_exact_mut(dw).take(dh).enumerate() {
        let py = y.saturating_sub(kernel_y) * stride;
        let ny = (y + 1).min(sh) * stride;
        for (x, o) in out.iter_mut().enumerate() {
            let px = x.saturating_sub(kernel_x);
            let nx = (x + 1).min(sw);
            *o = (box_sum(sum, px, py, nx, ny).wrapping_mul(scale) >> 24) as u8;
        }
    }
}

// ============================================================================
// Interpolated box kernel
// ============================================================================

/// Fixed-point scales for the outer `(2rx+1) x (2ry+1)` and inner
/// `(2rx-1) x (2ry-1)` boxes.
fn interp_scales(rx: usize, ry: usize, outer_weight: u8) -> (u32, u32) {
    assert!(
        rx > 0 && ry > 0,
        "interpolated kernel needs radii of at least 1"
    );
    let mut outer = outer_weight as u32;
    let mut inner = 255 - outer;
    outer += outer >> 7;
    inner += inner >> 7;
    let (kx, ky) = (2 * rx as u32, 2 * ry as u32);
    (
        (outer << 16) / ((kx + 1) * (ky + 1)),
        (inner << 16) / ((kx - 1) * (ky - 1)),
    )
}

/// Blend of a `(2rx+1) x (2ry+1)` box and a `(2rx-1) x (2ry-1)` box,
/// weighted `outer_weight / 255` toward the larger one.
///
/// Writes `(sw + 2 * rx) * (sh + 2 * ry)` bytes to `dst`.
pub fn apply_kernel_interp(
    dst: &mut [u8],
    rx: usize,
    ry: usize,
    sum: &[u32],
    sw: usize,
    sh: usize,
    outer_weight: u8,
) {
    if 2 * rx > sw {
        kernel_interp_clamped(dst, rx, ry, sum, sw, sh, outer_weight);
        return;
    }

    let (outer_scale, inner_scale) = interp_scales(rx, ry, outer_weight);
    let kernel_x = 2 * rx;
    let kernel_y = 2 * ry;
    let dw = sw + kernel_x;
    let dh = sh + kernel_y;
    let stride = sw + 1;
    let blend = |outer: u32, inner: u32| -> u8 {
        (outer
            .wrapping_mul(outer_scale)
            .wrapping_add(inner.wrapping_mul(inner_scale))
            >> 24) as u8
    };

    for (y, out) in dst.chunks_exact_mut(dw).take(dh).enumerate() {
        let py = y.saturating_sub(kernel_y) * stride;
        let ny = (y + 1).min(sh) * stride;
        let ipy = (y + 1).saturating_sub(kernel_y) * stride;
        let iny = y.min(sh) * stride;

        for x in 0..kernel_x {
            let outer = box_sum(sum, 0, py, x + 1, ny);
            let inner = box_sum(sum, 0, ipy, x, iny);
            out[x] = blend(outer, inner);
        }
        for x in kernel_x..sw {
            let outer = box_sum(sum, x - kernel_x, py, x + 1, ny);
            let inner = box_sum(sum, x + 1 - kernel_x, ipy, x, iny);
            out[x] = blend(outer, inner);
        }
        for x in sw..dw {
            let outer = box_sum(sum, x - kernel_x, py, sw, ny);
            let inner = box_sum(sum, x + 1 - kernel_x, ipy, sw, iny);
            out[x] = blend(outer, inner);
        }
    }
}

/// [`apply_kernel_interp`] for kernels wider than the source.
pub fn kernel_interp_clamped(
    dst: &mut [u8],
    rx: usize,
    ry: usize,
    sum: &[u32],
    sw: usize,
    sh: usize,
    outer_weight: u8,
) {
    let (outer_scale, inner_scale) = interp_scales(rx, ry, outer_weight);
    let kernel_x = 2 * rx;
    let kernel_y = 2 * ry;
    let dw = sw + kernel_x;
    let dh = sh + kernel_y;
    let stride = sw + 1;

    for (y, out) in dst.chunks_exact_mut(dw).take(dh).enumerate() {
        let py = y.saturating_sub(kernel_y) * stride;
        let ny = (y + 1).min(sh) * stride;
        let ipy = (y + 1).saturating_sub(kernel_y) * stride;
        let iny = y.min(sh) * stride;
        for (x, o) in out.iter_mut().enumerate() {
            let outer = box_sum(sum, x.saturating_sub(kernel_x), py, (x + 1).min(sw), ny);
            let inner = box_sum(sum, (x + 1).saturating_sub(kernel_x), ipy, x.min(sw), iny);
            *o = (outer
                .wrapping_mul(outer_scale)
                .wrapping_add(inner.wrapping_mul(inner_scale))
                >> 24) as u8;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct Lcg(u32);

    impl Lcg {
        fn next_u8(&mut self) -> u8 {
            self.0 = self.0.wrapping_mul(1_103_515_245).wrapping_add(12345);
            (self.0 >> 16) as u8
        }
    }

    fn table(src: &[u8], w: usize, h: usize, row_bytes: usize) -> Vec<u32> {
        let mut sum = vec![0xDEAD_BEEF; (w + 1) * (h + 1)];
        build_sum_buffer(&mut sum, w, h, src, row_bytes);
        sum
    }

    /// Sum of source pixels in the inclusive window `[x0, x1] x [y0, y1]`,
    /// treating everything outside the image as zero.
    fn window_sum(src: &[u8], w: usize, h: usize, x0: i64, x1: i64, y0: i64, y1: i64) -> u32 {
        let mut total = 0u32;
        for y in y0.max(0)..=y1.min(h as i64 - 1) {
            for x in x0.max(0)..=x1.min(w as i64 - 1) {
                total += src[y as usize * w + x as usize] as u32;
            }
        }
        total
    }

    #[test]
    fn test_build_sum_buffer() {
        let sum = table(&[1, 2, 3, 4], 2, 2, 2);
        assert_eq!(sum, vec![0, 0, 0, 0, 1, 3, 0, 4, 10]);
    }

    #[test]
    fn test_build_sum_buffer_honours_row_bytes() {
        let sum = table(&[1, 2, 99, 3, 4, 99], 2, 2, 3);
        assert_eq!(sum, vec![0, 0, 0, 0, 1, 3, 0, 4, 10]);
    }

    #[test]
    fn test_apply_kernel_constant_square() {
        let src = [255u8; 16];
        let sum = table(&src, 4, 4, 4);
        let mut dst = vec![0u8; 36];
        apply_kernel(&mut dst, 1, 1, &sum, 4, 4);
        // One ninth of the kernel overlaps at the corner; averages truncate,
        // so full coverage lands on 254.
        assert_eq!(dst[0], 28);
        assert_eq!(dst[7], 113);
        assert_eq!(dst[14], 254);
        assert_eq!(dst[35], 28);
    }

    #[test]
    fn test_apply_kernel_matches_direct_box_sum() {
        let mut rng = Lcg(5);
        for &(w, h) in &[(1usize, 1usize), (2, 5), (5, 2), (7, 7), (12, 4)] {
            let src: Vec<u8> = (0..w * h).map(|_| rng.next_u8()).collect();
            let sum = table(&src, w, h, w);
            for rx in 1..4usize {
                for ry in 1..4usize {
                    let dw = w + 2 * rx;
                    let dh = h + 2 * ry;
                    let mut dst = vec![0u8; dw * dh];
                    apply_kernel(&mut dst, rx, ry, &sum, w, h);
                    let scale = (1u32 << 24) / ((2 * rx as u32 + 1) * (2 * ry as u32 + 1));
                    for y in 0..dh {
                        for x in 0..dw {
                            let (x, y) = (x as i64, y as i64);
                            let (kx, ky) = (2 * rx as i64, 2 * ry as i64);
                            let s = window_sum(&src, w, h, x - kx, x, y - ky, y);
                            let expected = ((s * scale) >> 24) as u8;
                            assert_eq!(
                                dst[(y as usize) * dw + x as usize],
                                expected,
                                "w={w} h={h} rx={rx} ry={ry} at ({x},{y})"
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_apply_kernel_interp_matches_direct_box_sums() {
        let mut rng = Lcg(9);
        for &(w, h) in &[(1usize, 3usize), (3, 3), (6, 5), (10, 2)] {
            let src: Vec<u8> = (0..w * h).map(|_| rng.next_u8()).collect();
            let sum = table(&src, w, h, w);
            for r in 1..4usize {
                for &ow in &[0u8, 64, 200, 255] {
                    let dw = w + 2 * r;
                    let dh = h + 2 * r;
                    let mut dst = vec![0u8; dw * dh];
                    apply_kernel_interp(&mut dst, r, r, &sum, w, h, ow);
                    let (os, is) = interp_scales(r, r, ow);
                    let k = 2 * r as i64;
                    for y in 0..dh as i64 {
                        for x in 0..dw as i64 {
                            let outer = window_sum(&src, w, h, x - k, x, y - k, y);
                            let inner = window_sum(&src, w, h, x - k + 1, x - 1, y - k + 1, y - 1);
                            let expected = ((outer * os + inner * is) >> 24) as u8;
                            assert_eq!(dst[y as usize * dw + x as usize], expected);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_interp_full_outer_weight_matches_plain_kernel() {
        let mut rng = Lcg(21);
        let (w, h) = (8, 6);
        let src: Vec<u8> = (0..w * h).map(|_| rng.next_u8()).collect();
        let sum = table(&src, w, h, w);
        for r in 1..5 {
            let len = (w + 2 * r) * (h + 2 * r);
            let mut a = vec![0u8; len];
            let mut b = vec![0u8; len];
            apply_kernel(&mut a, r, r, &sum, w, h);
            apply_kernel_interp(&mut b, r, r, &sum, w, h, 255);
            assert_eq!(a, b);
        }
    }
}
