//! Closed-form edge profile for blurring axis-aligned rectangles.
//!
//! Blurring a rectangle's coverage with a separable kernel factors into the
//! product of two 1-D blurred step functions. The step's blurred shape is
//! the integral of three convolved boxes, a piecewise cubic that reaches
//! zero at `1.5` kernel radii, tabulated once per call into a profile.

use crate::basics::round_to_int;
use crate::error::Result;
use crate::mask::try_alloc;

/// Integral from `x` to infinity of three convolved unit boxes: `1` left of
/// `-1.5`, `0` right of `1.5`, a smooth cubic in between.
pub fn gaussian_integral(x: f32) -> f32 {
    if x > 1.5 {
        return 0.0;
    }
    if x < -1.5 {
        return 1.0;
    }

    let x2 = x * x;
    let x3 = x2 * x;

    if x > 0.5 {
        return 0.5625 - (x3 / 6.0 - 3.0 * x2 * 0.25 + 1.125 * x);
    }
    if x > -0.5 {
        return 0.5 - (0.75 * x - x3 / 3.0);
    }
    0.4375 + (-x3 / 6.0 - 3.0 * x2 * 0.25 - 1.125 * x)
}

/// Number of profile entries for a kernel of `radius`: three radii.
pub fn compute_profile_size(radius: f32) -> i32 {
    round_to_int(radius * 3.0)
}

/// Tabulate the blurred edge for `radius`.
///
/// Entry `0` is fully covered (`255`) and values fall monotonically toward
/// `0` at the far end.
pub fn compute_profile(radius: f32) -> Result<Vec<u8>> {
    let size = compute_profile_size(radius).max(1) as usize;
    let center = (size >> 1) as i32;

    let mut profile = try_alloc(size, 0u8)?;
    profile[0] = 255;
    for (x, p) in profile.iter_mut().enumerate().skip(1) {
        let scaled_x = ((center - x as i32) as f32 - 0.5) / radius;
        let gi = gaussian_integral(scaled_x);
        *p = 255 - (255.0 * gi) as u8;
    }
    Ok(profile)
}

/// Coverage at `loc` along an axis of a blurred rectangle, from the profile.
///
/// `blurred_width` is the output extent along the axis and `sharp_width` the
/// rectangle's extent minus the profile's centre. The lookup is mirrored, so
/// both edges read the same table. Indices past the table's end read its
/// last entry.
pub fn profile_lookup(profile: &[u8], loc: i32, blurred_width: i32, sharp_width: i32) -> u8 {
    let dx = (((loc << 1) + 1) - blurred_width).abs() - sharp_width;
    let ox = (dx >> 1).max(0) as usize;
    match profile.get(ox) {
        Some(&v) => v,
        None => profile.last().copied().unwrap_or(0),
    }
}

/// Coverage at `loc` along an axis whose sharp extent `sharp_len` is too
/// short for the profile table, evaluated directly from the integral.
pub fn integral_coverage(loc: i32, sharp_len: i32, radius: f32) -> u8 {
    let span = sharp_len as f32 / radius;
    let gi_x = 1.5 - (loc as f32 + 0.5) / radius;
    (255.0 * (gaussian_integral(gi_x) - gaussian_integral(gi_x + span))) as u8
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaussian_integral_limits() {
        assert_eq!(gaussian_integral(2.0), 0.0);
        assert_eq!(gaussian_integral(-2.0), 1.0);
        assert!((gaussian_integral(0.0) - 0.5).abs() < 1e-6);
        assert!(gaussian_integral(1.5).abs() < 1e-6);
        assert!((gaussian_integral(-1.5) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_gaussian_integral_is_continuous_and_symmetric() {
        for &knot in &[-1.5f32, -0.5, 0.5, 1.5] {
            let below = gaussian_integral(knot - 1e-4);
            let above = gaussian_integral(knot + 1e-4);
            assert!((below - above).abs() < 1e-3, "jump at {knot}");
        }
        let mut x = -1.6f32;
        while x < 1.6 {
            let sum = gaussian_integral(x) + gaussian_integral(-x);
            assert!((sum - 1.0).abs() < 1e-5, "gi({x}) + gi(-{x}) = {sum}");
            x += 0.05;
        }
    }

    #[test]
    fn test_gaussian_integral_is_monotone() {
        let mut prev = gaussian_integral(-2.0);
        let mut x = -2.0f32;
        while x < 2.0 {
            x += 0.01;
            let v = gaussian_integral(x);
            assert!(v <= prev + 1e-6);
            prev = v;
        }
    }

    #[test]
    fn test_compute_profile() {
        // Effective radius of a 4px rect blur: (4 * 0.57735 + 0.5) * 2.
        let radius = (4.0f32 * 0.57735 + 0.5) * 2.0;
        assert_eq!(compute_profile_size(radius), 17);
        let profile = compute_profile(radius).unwrap();
        assert_eq!(
            profile,
            vec![255, 254, 249, 241, 227, 206, 177, 145, 111, 79, 50, 29, 15, 7, 2, 1, 0]
        );
        assert!(profile.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_profile_lookup_mirrors_and_clamps() {
        let profile = [255u8, 200, 100, 0];
        // Blurred width 10, sharp width 2: locations mirror around the middle.
        for loc in 0..10 {
            assert_eq!(
                profile_lookup(&profile, loc, 10, 2),
                profile_lookup(&profile, 9 - loc, 10, 2)
            );
        }
        assert_eq!(profile_lookup(&profile, 4, 10, 2), 255);
        assert_eq!(profile_lookup(&profile, 2, 10, 2), 200);
        // Far past the table: last entry.
        assert_eq!(profile_lookup(&profile, -40, 10, 2), 0);
    }

    #[test]
    fn test_integral_coverage_peaks_in_the_middle() {
        let radius = (4.0f32 * 0.57735 + 0.5) * 2.0;
        let values: Vec<u8> = (0..20).map(|x| integral_coverage(x, 4, radius)).collect();
        assert_eq!(values[0], 0);
        assert_eq!(values[10], 128);
        assert!(values[..10].windows(2).all(|w| w[0] <= w[1]));
        assert!(values[10..].windows(2).all(|w| w[0] >= w[1]));
    }
}
