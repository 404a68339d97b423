// Mask comparison library for the box-filter blurs vs the Gaussian reference.
//
// Provides test shapes, mask comparison, and PGM output.

use mask_blur::{Mask, RectI};
use std::fs::File;
use std::io::{self, BufWriter, Write as IoWrite};
use std::path::Path;

// ============================================================================
// Test Shapes
// ============================================================================

/// Names accepted by [`make_shape`].
pub fn available_shapes() -> &'static [&'static str] {
    &["square", "disc", "ring", "dot"]
}

/// Build an `size x size` A8 mask at the origin holding the named shape.
pub fn make_shape(name: &str, size: u32) -> Option<Mask> {
    let n = size as i32;
    let c = (n - 1) as f32 / 2.0;
    let r = n as f32 / 3.0;
    let coverage: Box<dyn Fn(i32, i32) -> bool> = match name {
        "square" => {
            let lo = n / 4;
            let hi = n - n / 4;
            Box::new(move |x, y| (lo..hi).contains(&x) && (lo..hi).contains(&y))
        }
        "disc" => Box::new(move |x, y| dist2(x, y, c) <= r * r),
        "ring" => {
            let inner = r * 0.6;
            Box::new(move |x, y| {
                let d = dist2(x, y, c);
                d <= r * r && d >= inner * inner
            })
        }
        "dot" => {
            let m = n / 2;
            Box::new(move |x, y| x == m && y == m)
        }
        _ => return None,
    };

    let mut pixels = Vec::with_capacity((size * size) as usize);
    for y in 0..n {
        for x in 0..n {
            pixels.push(if coverage(x, y) { 255 } else { 0 });
        }
    }
    Mask::from_a8_pixels(RectI::new(0, 0, n, n), size, pixels).ok()
}

fn dist2(x: i32, y: i32, c: f32) -> f32 {
    let dx = x as f32 - c;
    let dy = y as f32 - c;
    dx * dx + dy * dy
}

// ============================================================================
// Comparison Result
// ============================================================================

/// Information about a single pixel difference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffInfo {
    pub x: i32,
    pub y: i32,
    pub value_a: u8,
    pub value_b: u8,
}

/// Result of comparing two masks over the union of their bounds.
#[derive(Debug, Clone)]
pub struct CompareResult {
    /// True if every pixel in both masks is identical.
    pub identical: bool,
    /// Total number of pixels compared.
    pub total_pixels: u64,
    /// Number of pixels that differ.
    pub different_pixels: u64,
    /// Maximum absolute difference of any pixel.
    pub max_diff: u8,
    /// Mean absolute difference across differing pixels.
    pub mean_diff: f64,
    /// The first differing pixel found (scanning left-to-right, top-to-bottom).
    pub first_diff: Option<DiffInfo>,
    /// Index = abs diff, value = count.
    pub diff_histogram: [u64; 256],
}

impl std::fmt::Display for CompareResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.identical {
            write!(f, "IDENTICAL: {} pixels match perfectly", self.total_pixels)
        } else {
            write!(
                f,
                "DIFFERENT: {}/{} pixels differ ({:.2}%), max_diff={}, mean_diff={:.4}",
                self.different_pixels,
                self.total_pixels,
                self.different_pixels as f64 / self.total_pixels as f64 * 100.0,
                self.max_diff,
                self.mean_diff,
            )?;
            if let Some(ref d) = self.first_diff {
                write!(
                    f,
                    "\n  First diff at ({}, {}): A={} B={}",
                    d.x, d.y, d.value_a, d.value_b
                )?;
            }
            Ok(())
        }
    }
}

// ============================================================================
// Mask Comparison
// ============================================================================

fn union(a: RectI, b: RectI) -> RectI {
    RectI::new(a.x1.min(b.x1), a.y1.min(b.y1), a.x2.max(b.x2), a.y2.max(b.y2))
}

/// Compare two masks in device space. Pixels outside a mask's bounds or
/// without an image read as 0.
pub fn compare_masks(a: &Mask, b: &Mask) -> CompareResult {
    let area = union(a.bounds, b.bounds);
    let mut total_pixels = 0u64;
    let mut different_pixels = 0u64;
    let mut max_diff = 0u8;
    let mut diff_sum = 0u64;
    let mut first_diff = None;
    let mut diff_histogram = [0u64; 256];

    for y in area.y1..area.y2 {
        for x in area.x1..area.x2 {
            total_pixels += 1;
            let va = a.pixel(x, y);
            let vb = b.pixel(x, y);
            let diff = va.abs_diff(vb);
            diff_histogram[diff as usize] += 1;
            if diff == 0 {
                continue;
            }
            different_pixels += 1;
            diff_sum += diff as u64;
            max_diff = max_diff.max(diff);
            if first_diff.is_none() {
                first_diff = Some(DiffInfo {
                    x,
                    y,
                    value_a: va,
                    value_b: vb,
                });
            }
        }
    }

    let mean_diff = if different_pixels > 0 {
        diff_sum as f64 / different_pixels as f64
    } else {
        0.0
    };

    CompareResult {
        identical: different_pixels == 0,
        total_pixels,
        different_pixels,
        max_diff,
        mean_diff,
        first_diff,
        diff_histogram,
    }
}

// ============================================================================
// PGM Output (binary, 8-bit gray)
// ============================================================================

/// Save a mask's pixels as a binary PGM. A mask without an image is written
/// as all zeros.
pub fn save_pgm(path: &Path, mask: &Mask) -> io::Result<()> {
    let mut f = BufWriter::new(File::create(path)?);
    write_pgm(&mut f, mask)?;
    f.flush()
}

/// Write `mask` as a binary PGM to any writer.
pub fn write_pgm<W: IoWrite>(out: &mut W, mask: &Mask) -> io::Result<()> {
    let w = mask.width().max(0);
    let h = mask.height().max(0);
    write!(out, "P5\n{} {}\n255\n", w, h)?;
    let mut row = vec![0u8; w as usize];
    for y in 0..h {
        for (x, v) in row.iter_mut().enumerate() {
            *v = mask.pixel(mask.bounds.x1 + x as i32, mask.bounds.y1 + y);
        }
        out.write_all(&row)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes() {
        for name in available_shapes() {
            let m = make_shape(name, 16).unwrap();
            assert_eq!(m.bounds, RectI::new(0, 0, 16, 16));
        }
        assert!(make_shape("star", 16).is_none());
        let dot = make_shape("dot", 9).unwrap();
        assert_eq!(dot.pixels().unwrap().iter().filter(|&&v| v == 255).count(), 1);
        assert_eq!(dot.pixel(4, 4), 255);
    }

    #[test]
    fn test_compare_identical() {
        let a = make_shape("disc", 12).unwrap();
        let r = compare_masks(&a, &a.clone());
        assert!(r.identical);
        assert_eq!(r.total_pixels, 144);
        assert_eq!(r.diff_histogram[0], 144);
    }

    #[test]
    fn test_compare_uses_union_of_bounds() {
        let a = Mask::from_a8_pixels(RectI::new(0, 0, 2, 1), 2, vec![10, 20]).unwrap();
        let b = Mask::from_a8_pixels(RectI::new(1, 0, 3, 1), 2, vec![25, 7]).unwrap();
        let r = compare_masks(&a, &b);
        assert_eq!(r.total_pixels, 3);
        assert_eq!(r.different_pixels, 3);
        assert_eq!(r.max_diff, 10);
        assert_eq!(
            r.first_diff,
            Some(DiffInfo {
                x: 0,
                y: 0,
                value_a: 10,
                value_b: 0
            })
        );
        assert!((r.mean_diff - 22.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_write_pgm() {
        let m = Mask::from_a8_pixels(RectI::new(-1, 0, 1, 2), 3, vec![1, 2, 9, 3, 4, 9]).unwrap();
        let mut out = Vec::new();
        write_pgm(&mut out, &m).unwrap();
        assert_eq!(out, b"P5\n2 2\n255\n\x01\x02\x03\x04");
    }
}
