//! # mask-blur
//!
//! Gaussian-approximating blur for 8-bit alpha coverage masks — the kind of
//! mask a rasterizer produces for a shape's shadow, glow, or soft edge.
//!
//! It features:
//!
//! - Separable running-sum box blur, one or three passes per axis
//! - Summed-area-table blur with constant cost per pixel at any radius
//! - Fractional radii by blending neighbouring box sizes
//! - Analytic blur of axis-aligned rectangles without a source image
//! - Normal, solid, outer and inner blur styles
//! - A direct Gaussian convolution to check the fast paths against
//!
//! ## Architecture
//!
//! A blur request flows through three stages:
//!
//! 1. **Planning** — radius and quality become an integer box radius, a
//!    blend weight for the fractional part, and the output margin
//! 2. **Passes** — box filters run over the source, either row by row with
//!    transposition between axes or through summed-area tables
//! 3. **Style** — the blurred image is composited with the source
//!
//! ```
//! use mask_blur::{blur, BlurQuality, BlurStyle, Mask, RectI};
//!
//! let src = Mask::from_a8_pixels(RectI::new(0, 0, 4, 4), 4, vec![255; 16]).unwrap();
//! let out = blur(&src, 1.0, BlurStyle::Normal, BlurQuality::Low).unwrap();
//! assert_eq!(out.mask.bounds, RectI::new(-1, -1, 5, 5));
//! assert_eq!(out.margin.x, 1);
//! ```
//!
//! Logging goes through `tracing`; install a subscriber to see it.

// Foundation
pub mod basics;
pub mod error;
pub mod mask;

// Kernels
pub mod box_blur;
pub mod rect_profile;
pub mod sum_table;

// Blurs
pub mod blur;
pub mod ground_truth;
pub mod style;

pub use basics::{PointI, RectF, RectI};
pub use blur::{
    blur, blur_rect, blur_separable, blur_with_path, BlurParams, BlurPath, BlurQuality,
    BlurredMask,
};
pub use error::{BlurError, Result};
pub use ground_truth::blur_ground_truth;
pub use mask::{CreateMode, Mask, MaskFormat, MaskImage};
pub use style::BlurStyle;
