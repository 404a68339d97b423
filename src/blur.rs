//! Mask blur entry points.
//!
//! Blurs an A8 [`Mask`] with a cheap Gaussian approximation and composites
//! the result according to a [`BlurStyle`]:
//!
//! - **Low quality** runs one box pass per axis at the full radius.
//! - **High quality** runs three box passes per axis at `radius / sqrt(3)`,
//!   which converges on a Gaussian. Radii under 3 always use low quality.
//!
//! Two interchangeable engines produce the passes: separable running-sum box
//! filters ([`BlurPath::Separable`], the default) and summed-area tables
//! ([`BlurPath::SummedArea`]). Fractional radii blend two neighbouring box
//! sizes rather than rounding.
//!
//! The output mask grows by the returned margin on every side. With
//! [`BlurStyle::Inner`] it is cropped back to the source's bounds.
//!
//! [`blur_rect`] blurs an axis-aligned rectangle analytically without a
//! source image.

use tracing::{debug, trace, warn};

use crate::basics::{
    ceil_to_int, floor_to_int, mul_div_255_round, round_to_int, PointI, RectF, RectI,
};
use crate::box_blur::{adjusted_radii, box_blur, box_blur_interp};
use crate::error::{BlurError, Result};
use crate::mask::{try_alloc, CreateMode, Mask, MaskFormat, MaskImage};
use crate::rect_profile::{compute_profile, compute_profile_size, integral_coverage, profile_lookup};
use crate::style::{clamp_with_orig, merge_src_with_blur, BlurStyle};
use crate::sum_table::{apply_kernel, apply_kernel_interp, build_sum_buffer};

/// Per-pass radius scale for three-pass blurs, `1 / sqrt(3)`.
pub const PASS_RADIUS_SCALE: f32 = 0.57735;

/// Radii below this always blur at low quality.
const MIN_HIGH_QUALITY_RADIUS: f32 = 3.0;

// ============================================================================
// Request types
// ============================================================================

/// Number of box passes per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BlurQuality {
    /// One pass per axis.
    #[default]
    Low,
    /// Three passes per axis.
    High,
}

impl BlurQuality {
    pub fn pass_count(self) -> usize {
        match self {
            BlurQuality::Low => 1,
            BlurQuality::High => 3,
        }
    }
}

/// Which engine computes the box passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BlurPath {
    /// Running-sum box filters, one axis at a time. Averages round to nearest.
    #[default]
    Separable,
    /// Summed-area tables, both axes at once. Averages truncate.
    ///
    /// Matches [`BlurPath::Separable`] within one level for integer radii.
    /// A fractional radius blends the two box sizes once in 2-D instead of
    /// once per axis, so results can differ by a few levels near edges.
    SummedArea,
}

/// A complete blur request.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BlurParams {
    pub radius: f32,
    pub style: BlurStyle,
    pub quality: BlurQuality,
    pub path: BlurPath,
}

impl Default for BlurParams {
    fn default() -> Self {
        Self {
            radius: 1.0,
            style: BlurStyle::Normal,
            quality: BlurQuality::Low,
            path: BlurPath::Separable,
        }
    }
}

impl BlurParams {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            ..Self::default()
        }
    }

    pub fn with_style(mut self, style: BlurStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_quality(mut self, quality: BlurQuality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_path(mut self, path: BlurPath) -> Self {
        self.path = path;
        self
    }

    /// Blur `src` as described by this request.
    pub fn apply(&self, src: &Mask) -> Result<BlurredMask> {
        blur_with_path(src, self.radius, self.style, self.quality, self.path)
    }
}

/// A blurred mask and how far it grew past its source on each side.
#[derive(Debug, Clone, PartialEq)]
pub struct BlurredMask {
    pub mask: Mask,
    pub margin: PointI,
}

// ============================================================================
// Pass planning
// ============================================================================

fn check_radius(radius: f32) -> Result<()> {
    if radius.is_finite() && radius > 0.0 {
        Ok(())
    } else {
        warn!(radius, "rejecting blur radius");
        Err(BlurError::InvalidRadius(radius))
    }
}

/// Kernel geometry derived from a radius and quality.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PassPlan {
    quality: BlurQuality,
    pass_radius: f32,
    /// Integer radius of each pass, the ceiling of `pass_radius`.
    rx: usize,
    /// Share of the `2 * rx + 1` box, out of 255; 255 means `pass_radius`
    /// is (nearly) an integer.
    outer_weight: u8,
}

impl PassPlan {
    fn new(radius: f32, quality: BlurQuality) -> Result<Self> {
        check_radius(radius)?;
        let quality = if radius < MIN_HIGH_QUALITY_RADIUS {
            BlurQuality::Low
        } else {
            quality
        };
        let pass_radius = match quality {
            BlurQuality::Low => radius,
            BlurQuality::High => radius * PASS_RADIUS_SCALE,
        };
        let rx = ceil_to_int(pass_radius);
        if rx <= 0 {
            warn!(radius, pass_radius, "blur radius rounds to zero");
            return Err(BlurError::InvalidRadius(radius));
        }
        let outer_weight = 255 - round_to_int((rx as f32 - pass_radius) * 255.0);
        Ok(Self {
            quality,
            pass_radius,
            rx: rx as usize,
            outer_weight: outer_weight.clamp(0, 255) as u8,
        })
    }

    fn passes(&self) -> usize {
        self.quality.pass_count()
    }

    fn margin(&self) -> i32 {
        i32::try_from(self.passes() * self.rx).unwrap_or(i32::MAX)
    }
}

/// `r` if its width and height fit in `i32`.
fn checked_extent(r: RectI) -> Option<RectI> {
    r.x2.checked_sub(r.x1)?;
    r.y2.checked_sub(r.y1)?;
    Some(r)
}

/// `r` grown by `m` on every side, or `None` when the result leaves `i32`.
pub(crate) fn checked_outset(r: RectI, m: i32) -> Option<RectI> {
    checked_extent(RectI::new(
        r.x1.checked_sub(m)?,
        r.y1.checked_sub(m)?,
        r.x2.checked_add(m)?,
        r.y2.checked_add(m)?,
    ))
}

/// Error for output geometry that cannot be represented.
pub(crate) fn bounds_overflow(r: RectI, margin: i32) -> BlurError {
    warn!(margin, "blurred bounds overflow");
    let grow = margin.saturating_mul(2);
    let width = r.x2.saturating_sub(r.x1).saturating_add(grow);
    BlurError::TooLarge {
        width,
        height: r.y2.saturating_sub(r.y1).saturating_add(grow),
        row_bytes: width.max(0) as u32,
    }
}

// ============================================================================
// Mask blur
// ============================================================================

/// Blur `src` with the separable engine.
///
/// Equivalent to [`blur_separable`].
pub fn blur(
    src: &Mask,
    radius: f32,
    style: BlurStyle,
    quality: BlurQuality,
) -> Result<BlurredMask> {
    blur_separable(src, radius, style, quality)
}

/// Blur `src` with running-sum box filters.
pub fn blur_separable(
    src: &Mask,
    radius: f32,
    style: BlurStyle,
    quality: BlurQuality,
) -> Result<BlurredMask> {
    blur_with_path(src, radius, style, quality, BlurPath::Separable)
}

/// Blur `src` with the chosen engine.
///
/// A source without an image yields a mask with the output bounds, row bytes
/// and margin but no pixels.
pub fn blur_with_path(
    src: &Mask,
    radius: f32,
    style: BlurStyle,
    quality: BlurQuality,
    path: BlurPath,
) -> Result<BlurredMask> {
    trace!(
        radius,
        ?style,
        ?quality,
        ?path,
        width = src.width(),
        height = src.height(),
        "blur mask"
    );
    if src.format != MaskFormat::A8 {
        warn!(format = ?src.format, "only A8 masks can be blurred");
        return Err(BlurError::UnsupportedFormat(src.format));
    }

    let plan = PassPlan::new(radius, quality)?;
    let margin = plan.margin();
    let bounds =
        checked_outset(src.bounds, margin).ok_or_else(|| bounds_overflow(src.bounds, margin))?;
    let mut dst = Mask::bounds_only(bounds, bounds.width().max(0) as u32, MaskFormat::A8);

    if let Some(sp) = src.checked_pixels()? {
        let dst_size = dst.compute_image_size().ok_or_else(|| {
            warn!(
                width = dst.width(),
                height = dst.height(),
                "blurred mask too large"
            );
            dst.too_large()
        })?;
        let sw = src.width().max(0) as usize;
        let sh = src.height().max(0) as usize;
        let src_rb = src.row_bytes as usize;
        debug!(
            ?path,
            quality = ?plan.quality,
            pass_radius = plan.pass_radius,
            rx = plan.rx,
            outer_weight = plan.outer_weight,
            "blur passes"
        );

        let mut dp = MaskImage::alloc(dst_size)?;
        match path {
            BlurPath::Separable => separable_passes(sp, src_rb, sw, sh, &mut dp, &plan, dst_size)?,
            BlurPath::SummedArea => {
                summed_area_passes(sp, src_rb, sw, sh, &mut dp, &plan, dst_size)?
            }
        }
        dst.image = Some(composite_style(
            src,
            sp,
            dp,
            dst.row_bytes as usize,
            margin as usize,
            style,
        )?);
    }

    restore_inner_bounds(src, &mut dst, style);
    Ok(BlurredMask {
        mask: dst,
        margin: PointI::new(margin, margin),
    })
}

/// Box passes with running sums. Leaves the result in `dp` with rows
/// `sw + 2 * margin` wide.
fn separable_passes(
    sp: &[u8],
    src_rb: usize,
    sw: usize,
    sh: usize,
    dp: &mut [u8],
    plan: &PassPlan,
    dst_size: usize,
) -> Result<()> {
    let mut tmp = try_alloc(dst_size, 0u8)?;
    let tp = &mut tmp[..];
    let (rx, ry) = (plan.rx, plan.rx);
    let ow = plan.outer_weight;
    let high = plan.quality == BlurQuality::High;
    let mut w = sw;
    let mut h = sh;

    // Horizontal passes write rows; the last one transposes so the vertical
    // passes can also run along rows. The final transpose restores the layout.
    if ow == 255 {
        if high {
            let (lo, hi) = adjusted_radii(plan.pass_radius);
            w = box_blur(sp, src_rb, tp, lo, hi, w, h, false);
            w = box_blur(tp, w, dp, hi, lo, w, h, false);
            w = box_blur(dp, w, tp, hi, hi, w, h, true);
            h = box_blur(tp, h, dp, lo, hi, h, w, false);
            h = box_blur(dp, h, tp, hi, lo, h, w, false);
            h = box_blur(tp, h, dp, hi, hi, h, w, true);
        } else {
            w = box_blur(sp, src_rb, tp, rx, rx, w, h, true);
            h = box_blur(tp, h, dp, ry, ry, h, w, true);
        }
    } else if high {
        w = box_blur_interp(sp, src_rb, tp, rx, w, h, false, ow);
        w = box_blur_interp(tp, w, dp, rx, w, h, false, ow);
        w = box_blur_interp(dp, w, tp, rx, w, h, true, ow);
        h = box_blur_interp(tp, h, dp, rx, h, w, false, ow);
        h = box_blur_interp(dp, h, tp, rx, h, w, false, ow);
        h = box_blur_interp(tp, h, dp, rx, h, w, true, ow);
    } else {
        w = box_blur_interp(sp, src_rb, tp, rx, w, h, true, ow);
        h = box_blur_interp(tp, h, dp, ry, h, w, true, ow);
    }

    debug_assert_eq!(w, sw + 2 * plan.passes() * rx);
    debug_assert_eq!(h, sh + 2 * plan.passes() * ry);
    Ok(())
}

fn run_kernel(dst: &mut [u8], sum: &[u32], w: usize, h: usize, plan: &PassPlan) {
    if plan.outer_weight == 255 {
        apply_kernel(dst, plan.rx, plan.rx, sum, w, h);
    } else {
        apply_kernel_interp(dst, plan.rx, plan.rx, sum, w, h, plan.outer_weight);
    }
}

/// Box passes through summed-area tables. Every pass grows the image by
/// `rx` on each side and stores it with tightly packed rows.
fn summed_area_passes(
    sp: &[u8],
    src_rb: usize,
    sw: usize,
    sh: usize,
    dp: &mut [u8],
    plan: &PassPlan,
    dst_size: usize,
) -> Result<()> {
    let (rx, ry) = (plan.rx, plan.rx);
    let grow = 2 * (plan.passes() - 1);
    let storage_w = sw + grow * rx + 1;
    let storage_h = sh + grow * ry + 1;
    let storage = storage_w
        .checked_mul(storage_h)
        .ok_or(BlurError::AllocationFailed(usize::MAX))?;
    let mut sum = try_alloc(storage, 0u32)?;

    build_sum_buffer(&mut sum, sw, sh, sp, src_rb);
    run_kernel(dp, &sum, sw, sh, plan);

    if plan.quality == BlurQuality::High {
        let mut tmp = try_alloc(dst_size, 0u8)?;
        let mut tw = sw + 2 * rx;
        let mut th = sh + 2 * ry;
        build_sum_buffer(&mut sum, tw, th, dp, tw);
        run_kernel(&mut tmp, &sum, tw, th, plan);

        tw += 2 * rx;
        th += 2 * ry;
        build_sum_buffer(&mut sum, tw, th, &tmp, tw);
        run_kernel(dp, &sum, tw, th, plan);
    }
    Ok(())
}

/// Apply `style` to a freshly blurred image whose source sits `margin`
/// pixels in from its top-left corner.
///
/// Returns the image the output mask should own: the blurred image itself,
/// or for [`BlurStyle::Inner`] a new image shaped like the source.
pub(crate) fn composite_style(
    src: &Mask,
    sp: &[u8],
    mut blurred: MaskImage,
    dst_row_bytes: usize,
    margin: usize,
    style: BlurStyle,
) -> Result<MaskImage> {
    let sw = src.width().max(0) as usize;
    let sh = src.height().max(0) as usize;
    let src_rb = src.row_bytes as usize;
    let offset = margin + margin * dst_row_bytes;

    match style {
        BlurStyle::Normal => Ok(blurred),
        BlurStyle::Inner => {
            let src_size = src.compute_image_size().ok_or_else(|| src.too_large())?;
            let mut inner = MaskImage::alloc(src_size)?;
            merge_src_with_blur(
                &mut inner,
                src_rb,
                sp,
                src_rb,
                &blurred[offset..],
                dst_row_bytes,
                sw,
                sh,
            );
            Ok(inner)
        }
        BlurStyle::Solid | BlurStyle::Outer => {
            clamp_with_orig(
                &mut blurred[offset..],
                dst_row_bytes,
                sp,
                src_rb,
                sw,
                sh,
                style,
            );
            Ok(blurred)
        }
    }
}

/// Inner blurs report the source's geometry.
pub(crate) fn restore_inner_bounds(src: &Mask, dst: &mut Mask, style: BlurStyle) {
    if style == BlurStyle::Inner {
        dst.bounds = src.bounds;
        dst.row_bytes = src.row_bytes;
    }
}

// ============================================================================
// Rectangle blur
// ============================================================================

/// Blur the coverage of an axis-aligned rectangle analytically.
///
/// The output is the product of a horizontal and a vertical blurred edge
/// profile. `Normal` and `Solid` produce the same result. `Inner` crops to
/// the rectangle's whole pixels, starting at its rounded top-left corner.
/// `Outer` clears the rectangle's interior.
/// With [`CreateMode::JustComputeBounds`] only the geometry is returned.
pub fn blur_rect(
    rect: RectF,
    radius: f32,
    style: BlurStyle,
    mode: CreateMode,
) -> Result<BlurredMask> {
    trace!(
        x1 = rect.x1,
        y1 = rect.y1,
        x2 = rect.x2,
        y2 = rect.y2,
        radius,
        ?style,
        ?mode,
        "blur rect"
    );
    check_radius(radius)?;

    let radius = (radius * PASS_RADIUS_SCALE + 0.5) * 2.0;
    let profile_size = compute_profile_size(radius);
    let pad = profile_size / 2;
    let margin = PointI::new(pad, pad);
    let padf = pad as f32;

    let bounds = RectI::new(
        round_to_int(rect.x1 - padf),
        round_to_int(rect.y1 - padf),
        round_to_int(rect.x2 + padf),
        round_to_int(rect.y2 + padf),
    );
    let bounds = checked_extent(bounds).ok_or_else(|| bounds_overflow(rect.round(), pad))?;
    let mut dst = Mask::bounds_only(bounds, bounds.width().max(0) as u32, MaskFormat::A8);
    let sw = floor_to_int(rect.width()).max(0);
    let sh = floor_to_int(rect.height()).max(0);

    // Inner blurs keep the whole pixels of the rectangle, anchored at its
    // rounded top-left corner.
    let inner_bounds = || -> Result<RectI> {
        let x1 = round_to_int(rect.x1);
        let y1 = round_to_int(rect.y1);
        x1.checked_add(sw)
            .zip(y1.checked_add(sh))
            .map(|(x2, y2)| RectI::new(x1, y1, x2, y2))
            .ok_or_else(|| bounds_overflow(rect.round(), 0))
    };

    if mode == CreateMode::JustComputeBounds {
        if style == BlurStyle::Inner {
            dst.bounds = inner_bounds()?;
            dst.row_bytes = sw as u32;
        }
        return Ok(BlurredMask { mask: dst, margin });
    }

    let dst_size = dst.compute_image_size().ok_or_else(|| {
        warn!(
            width = dst.width(),
            height = dst.height(),
            "blurred rect too large"
        );
        dst.too_large()
    })?;
    let profile = compute_profile(radius)?;
    let mut dp = MaskImage::alloc(dst_size)?;
    let dw = dst.width();
    let dh = dst.height();

    // Nearest odd number below the profile size: the centre of the
    // profile at twice its resolution.
    let center = (profile_size & !1) - 1;
    let coverage = |loc: i32, extent: i32, sharp_len: i32| -> u8 {
        if profile_size <= sharp_len {
            profile_lookup(&profile, loc, extent, sharp_len - center)
        } else {
            integral_coverage(loc, sharp_len, radius)
        }
    };
    debug!(
        radius,
        profile_size,
        pad,
        analytic_x = profile_size > sw,
        analytic_y = profile_size > sh,
        "rect profile"
    );

    let mut horizontal = try_alloc(dw as usize, 0u8)?;
    for (x, h) in horizontal.iter_mut().enumerate() {
        *h = coverage(x as i32, dw, sw);
    }
    for (y, row) in dp.chunks_exact_mut(dw as usize).enumerate() {
        let vertical = coverage(y as i32, dh, sh) as u32;
        for (out, &h) in row.iter_mut().zip(&horizontal) {
            *out = mul_div_255_round(h as u32, vertical) as u8;
        }
    }

    let (pad, dw, sw, sh) = (pad as usize, dw as usize, sw as usize, sh as usize);
    match style {
        BlurStyle::Inner => {
            let size = sw * sh;
            if size == 0 {
                return Err(BlurError::TooLarge {
                    width: sw as i32,
                    height: sh as i32,
                    row_bytes: sw as u32,
                });
            }
            let mut inner = MaskImage::alloc(size)?;
            for (y, row) in inner.chunks_exact_mut(sw).enumerate() {
                let start = (y + pad) * dw + pad;
                row.copy_from_slice(&dp[start..start + sw]);
            }
            dst.image = Some(inner);
            dst.bounds = inner_bounds()?;
            dst.row_bytes = sw as u32;
        }
        BlurStyle::Outer => {
            for y in pad..dh as usize - pad {
                let start = y * dw + pad;
                dp[start..start + sw].fill(0);
            }
            dst.image = Some(dp);
        }
        BlurStyle::Normal | BlurStyle::Solid => dst.image = Some(dp),
    }

    Ok(BlurredMask { mask: dst, margin })
}

// ============================================================================
// Tests
// ============================================================================
