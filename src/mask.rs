//! Coverage masks — bounds, row stride, format, and owned pixel storage.
//!
//! A [`Mask`] describes a rectangle of coverage values in device space.
//! Its pixels live in a [`MaskImage`], an owned buffer that is released when
//! dropped on every path (including early error returns) and can be handed
//! off to a caller with [`MaskImage::into_vec`].
//!
//! Rows are `row_bytes` apart and may be wider than the mask; only the first
//! `width` bytes of each row are coverage.

use core::fmt;
use core::ops::{Deref, DerefMut};

use crate::basics::RectI;
use crate::error::{BlurError, Result};

/// Largest image, in bytes, a mask may own.
pub const MAX_IMAGE_SIZE: usize = i32::MAX as usize;

// ============================================================================
// Formats and creation modes
// ============================================================================

/// Pixel layout of a mask image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaskFormat {
    /// 1 bit per pixel.
    Bw,
    /// 8 bits of coverage per pixel. The only format the blur engine accepts.
    A8,
    /// Three A8 planes: coverage, multiply, add.
    ThreeD,
    /// 32-bit premultiplied color.
    Argb32,
    /// 16-bit per-subpixel coverage.
    Lcd16,
}

/// Whether a mask-producing call should render pixels or only report bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CreateMode {
    /// Compute the output bounds, margin, and row bytes; allocate nothing.
    JustComputeBounds,
    /// Compute bounds and fill a freshly allocated image.
    #[default]
    ComputeBoundsAndRenderImage,
}

// ============================================================================
// Fallible allocation
// ============================================================================

/// Allocate `len` elements filled with `fill`, reporting allocator refusal
/// as an error rather than aborting.
pub(crate) fn try_alloc<T: Clone>(len: usize, fill: T) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| BlurError::AllocationFailed(len.saturating_mul(core::mem::size_of::<T>())))?;
    v.resize(len, fill);
    Ok(v)
}

// ============================================================================
// MaskImage
// ============================================================================

/// Owned pixel storage for a mask.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct MaskImage {
    pixels: Vec<u8>,
}

impl MaskImage {
    /// Allocate a zero-filled image of `size` bytes.
    pub fn alloc(size: usize) -> Result<Self> {
        Ok(Self {
            pixels: try_alloc(size, 0u8)?,
        })
    }

    /// Take ownership of existing pixels.
    pub fn from_vec(pixels: Vec<u8>) -> Self {
        Self { pixels }
    }

    /// Give up ownership of the pixels to the caller.
    pub fn into_vec(self) -> Vec<u8> {
        self.pixels
    }
}

impl Deref for MaskImage {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.pixels
    }
}

impl DerefMut for MaskImage {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }
}

impl fmt::Debug for MaskImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaskImage")
            .field("len", &self.pixels.len())
            .finish()
    }
}

// ============================================================================
// Mask
// ============================================================================

/// A rectangular coverage mask.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    /// Device-space bounds, half-open.
    pub bounds: RectI,
    /// Distance in bytes between the starts of consecutive rows.
    pub row_bytes: u32,
    pub format: MaskFormat,
    /// Pixels, or `None` for a bounds-only mask.
    pub image: Option<MaskImage>,
}

impl Mask {
    /// A mask that carries geometry but no pixels.
    pub fn bounds_only(bounds: RectI, row_bytes: u32, format: MaskFormat) -> Self {
        Self {
            bounds,
            row_bytes,
            format,
            image: None,
        }
    }

    /// A zero-filled A8 mask with tightly packed rows.
    pub fn new_a8(bounds: RectI) -> Result<Self> {
        let mut mask = Self::bounds_only(bounds, bounds.width().max(0) as u32, MaskFormat::A8);
        mask.image = Some(mask.alloc_image()?);
        Ok(mask)
    }

    /// An A8 mask over existing pixels.
    ///
    /// `row_bytes` must be at least the width and `pixels` must hold
    /// `row_bytes * height` bytes.
    pub fn from_a8_pixels(bounds: RectI, row_bytes: u32, pixels: Vec<u8>) -> Result<Self> {
        let mask = Self::bounds_only(bounds, row_bytes, MaskFormat::A8);
        if (row_bytes as i64) < bounds.width() as i64 {
            return Err(mask.too_large());
        }
        let expected = mask.compute_image_size().ok_or_else(|| mask.too_large())?;
        if pixels.len() < expected {
            return Err(BlurError::ImageSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            image: Some(MaskImage::from_vec(pixels)),
            ..mask
        })
    }

    pub fn width(&self) -> i32 {
        self.bounds.width()
    }

    pub fn height(&self) -> i32 {
        self.bounds.height()
    }

    /// Bytes needed for the image: `row_bytes * height`.
    ///
    /// Returns `None` when that is zero or exceeds [`MAX_IMAGE_SIZE`].
    pub fn compute_image_size(&self) -> Option<usize> {
        let height = self.height();
        if height <= 0 {
            return None;
        }
        let size = height as u64 * self.row_bytes as u64;
        if size == 0 || size > MAX_IMAGE_SIZE as u64 {
            None
        } else {
            Some(size as usize)
        }
    }

    /// Allocate a zeroed image sized for this mask's geometry.
    pub fn alloc_image(&self) -> Result<MaskImage> {
        let size = self.compute_image_size().ok_or_else(|| self.too_large())?;
        MaskImage::alloc(size)
    }

    pub(crate) fn too_large(&self) -> BlurError {
        BlurError::TooLarge {
            width: self.width(),
            height: self.height(),
            row_bytes: self.row_bytes,
        }
    }

    /// All pixel bytes, including any row padding.
    pub fn pixels(&self) -> Option<&[u8]> {
        self.image.as_deref()
    }

    /// The image, checked to cover `row_bytes * height` bytes with rows at
    /// least `width` wide. `None` for a bounds-only mask.
    pub(crate) fn checked_pixels(&self) -> Result<Option<&[u8]>> {
        let Some(image) = self.image.as_deref() else {
            return Ok(None);
        };
        let width = self.width().max(0) as u64;
        let height = self.height().max(0) as u64;
        if height > 0 && (self.row_bytes as u64) < width {
            return Err(self.too_large());
        }
        let expected = (height * self.row_bytes as u64).min(usize::MAX as u64) as usize;
        if image.len() < expected {
            return Err(BlurError::ImageSizeMismatch {
                expected,
                actual: image.len(),
            });
        }
        Ok(Some(image))
    }

    /// Coverage for row `y` (relative to the top of the mask), `width` bytes.
    ///
    /// Panics if the mask has no image or `y` is out of range.
    pub fn row(&self, y: u32) -> &[u8] {
        assert!(
            (y as i64) < self.height() as i64,
            "row {} out of bounds (height={})",
            y,
            self.height()
        );
        let image = self.image.as_deref().expect("mask has no image");
        let start = y as usize * self.row_bytes as usize;
        &image[start..start + self.width() as usize]
    }

    /// Mutable coverage for row `y`.
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        assert!(
            (y as i64) < self.height() as i64,
            "row {} out of bounds (height={})",
            y,
            self.height()
        );
        let start = y as usize * self.row_bytes as usize;
        let width = self.width() as usize;
        let image = self.image.as_deref_mut().expect("mask has no image");
        &mut image[start..start + width]
    }

    /// Coverage at device coordinate `(x, y)`; `0` outside the bounds or
    /// when the mask has no image.
    pub fn pixel(&self, x: i32, y: i32) -> u8 {
        let b = &self.bounds;
        if x < b.x1 || y < b.y1 || x >= b.x2 || y >= b.y2 {
            return 0;
        }
        match self.image.as_deref() {
            Some(image) => {
                image[(y - b.y1) as usize * self.row_bytes as usize + (x - b.x1) as usize]
            }
            None => 0,
        }
    }

    /// Detach the image, leaving a bounds-only mask behind.
    pub fn take_image(&mut self) -> Option<MaskImage> {
        self.image.take()
    }
}

// ============================================================================
// Tests
// ============================================================================
