//! Foundation types, rounding helpers, and 8-bit alpha arithmetic.
//!
//! Everything else in the crate builds on these: the scalar-to-integer
//! conversions used when deriving kernel radii and mask bounds, the
//! fixed-point alpha multiplies used by the style compositing, and the
//! rectangle/point types that describe mask geometry.

use core::ops::{Add, Sub};

// ============================================================================
// Rounding and conversion functions
// ============================================================================

/// Round to the nearest integer, halves rounding toward positive infinity.
/// This is `floor(v + 0.5)`, so `-0.5` rounds to `0` and `2.5` to `3`.
#[inline]
pub fn round_to_int(v: f32) -> i32 {
    (v + 0.5).floor() as i32
}

/// Floor toward negative infinity.
#[inline]
pub fn floor_to_int(v: f32) -> i32 {
    v.floor() as i32
}

/// Ceiling toward positive infinity.
#[inline]
pub fn ceil_to_int(v: f32) -> i32 {
    v.ceil() as i32
}

// ============================================================================
// 8-bit alpha arithmetic
// ============================================================================

/// Widen an alpha in `[0, 255]` to a scale in `[1, 256]`, so that
/// `alpha_mul(x, alpha_255_to_256(255)) == x`.
#[inline]
pub fn alpha_255_to_256(alpha: u32) -> u32 {
    alpha + 1
}

/// Multiply `value` by a `[0, 256]` scale: `(value * scale) >> 8`.
#[inline]
pub fn alpha_mul(value: u32, scale: u32) -> u32 {
    (value * scale) >> 8
}

/// `a * b / 255`, rounded to nearest, for `a, b` in `[0, 255]`.
#[inline]
pub fn mul_div_255_round(a: u32, b: u32) -> u32 {
    let prod = a * b + 128;
    (prod + (prod >> 8)) >> 8
}

// ============================================================================
// Rect
// ============================================================================

/// A rectangle defined by two corner points.
///
/// Mask bounds are half-open: `x1`/`y1` are the left/top edges and
/// `x2`/`y2` lie one past the right/bottom pixel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect<T: Copy> {
    pub x1: T,
    pub y1: T,
    pub x2: T,
    pub y2: T,
}

impl<T: Copy + PartialOrd> Rect<T> {
    pub fn new(x1: T, y1: T, x2: T, y2: T) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Returns `true` if the rectangle covers no area.
    pub fn is_empty(&self) -> bool {
        !(self.x1 < self.x2 && self.y1 < self.y2)
    }
}

impl<T: Copy + PartialOrd + Sub<Output = T> + Add<Output = T>> Rect<T> {
    pub fn width(&self) -> T {
        self.x2 - self.x1
    }

    pub fn height(&self) -> T {
        self.y2 - self.y1
    }

    /// Grow the rectangle by `dx` on the left and right, `dy` on top and bottom.
    pub fn outset(&mut self, dx: T, dy: T) {
        self.x1 = self.x1 - dx;
        self.y1 = self.y1 - dy;
        self.x2 = self.x2 + dx;
        self.y2 = self.y2 + dy;
    }

    /// Copy of the rectangle grown by `dx`, `dy` on every side.
    pub fn outset_by(&self, dx: T, dy: T) -> Self {
        let mut r = *self;
        r.outset(dx, dy);
        r
    }
}

impl RectF {
    /// Round each edge to the nearest integer coordinate.
    pub fn round(&self) -> RectI {
        RectI::new(
            round_to_int(self.x1),
            round_to_int(self.y1),
            round_to_int(self.x2),
            round_to_int(self.y2),
        )
    }
}

/// Rectangle with `i32` coordinates.
pub type RectI = Rect<i32>;
/// Rectangle with `f32` coordinates.
pub type RectF = Rect<f32>;

// ============================================================================
// Point
// ============================================================================

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct PointBase<T: Copy> {
    pub x: T,
    pub y: T,
}

impl<T: Copy> PointBase<T> {
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

/// Integer point; used for the margin a blur adds around its source.
pub type PointI = PointBase<i32>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_int() {
        assert_eq!(round_to_int(0.5), 1);
        assert_eq!(round_to_int(0.49), 0);
        assert_eq!(round_to_int(-0.5), 0);
        assert_eq!(round_to_int(-0.51), -1);
        assert_eq!(round_to_int(2.5), 3);
        assert_eq!(round_to_int(-7.6), -8);
        assert_eq!(round_to_int(0.0), 0);
    }

    #[test]
    fn test_floor_and_ceil() {
        assert_eq!(floor_to_int(1.7), 1);
        assert_eq!(floor_to_int(-1.2), -2);
        assert_eq!(ceil_to_int(1.1), 2);
        assert_eq!(ceil_to_int(1.0), 1);
        assert_eq!(ceil_to_int(-1.1), -1);
    }

    #[test]
    fn test_alpha_mul_identity_at_full_scale() {
        for v in 0..=255 {
            assert_eq!(alpha_mul(v, alpha_255_to_256(255)), v);
            assert_eq!(alpha_mul(v, alpha_255_to_256(0)), 0);
        }
    }

    #[test]
    fn test_mul_div_255_round() {
        assert_eq!(mul_div_255_round(255, 255), 255);
        assert_eq!(mul_div_255_round(255, 128), 128);
        assert_eq!(mul_div_255_round(0, 200), 0);
        // Exhaustively matches a*b/255 rounded to nearest.
        for a in 0..=255u32 {
            for b in 0..=255u32 {
                let exact = (a * b) as f64 / 255.0;
                let got = mul_div_255_round(a, b) as f64;
                assert!(
                    (got - exact).abs() <= 0.5 + 1e-9,
                    "mul_div_255_round({a}, {b}) = {got}, exact {exact}"
                );
            }
        }
    }

    #[test]
    fn test_rect_dimensions() {
        let r = RectI::new(-2, 3, 8, 13);
        assert_eq!(r.width(), 10);
        assert_eq!(r.height(), 10);
        assert!(!r.is_empty());
        assert!(RectI::new(4, 4, 4, 9).is_empty());
    }

    #[test]
    fn test_rect_outset() {
        let mut r = RectI::new(0, 0, 4, 4);
        r.outset(1, 2);
        assert_eq!(r, RectI::new(-1, -2, 5, 6));
        assert_eq!(r.outset_by(1, 0), RectI::new(-2, -2, 6, 6));
    }

    #[test]
    fn test_rectf_round() {
        let r = RectF::new(0.4, 0.5, 10.49, -2.5);
        assert_eq!(r.round(), RectI::new(0, 1, 10, -2));
    }

    #[test]
    fn test_point() {
        let p = PointI::new(3, -4);
        assert_eq!(p.x, 3);
        assert_eq!(p.y, -4);
    }
}
