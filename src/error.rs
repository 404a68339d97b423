//! Error type for blur requests.
//!
//! A blur either produces a fully computed mask or fails with one of these
//! variants; there is no partially blurred result.

use thiserror::Error;

use crate::mask::MaskFormat;

/// Result type alias for blur operations.
pub type Result<T> = std::result::Result<T, BlurError>;

/// Reasons a blur request can fail.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BlurError {
    /// Only 8-bit alpha masks can be blurred.
    #[error("unsupported mask format {0:?}: only 8-bit alpha masks can be blurred")]
    UnsupportedFormat(MaskFormat),

    /// The radius is zero, negative, or not finite.
    #[error("blur radius must be positive and finite, got {0}")]
    InvalidRadius(f32),

    /// The destination size is zero or does not fit the addressable range.
    #[error("mask of {width}x{height} with {row_bytes} bytes per row is too large to allocate")]
    TooLarge {
        width: i32,
        height: i32,
        row_bytes: u32,
    },

    /// The allocator refused the request.
    #[error("failed to allocate {0} bytes of mask storage")]
    AllocationFailed(usize),

    /// A supplied image does not cover the mask's bounds.
    #[error("mask image holds {actual} bytes but its bounds need {expected}")]
    ImageSizeMismatch { expected: usize, actual: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            BlurError::InvalidRadius(-1.5).to_string(),
            "blur radius must be positive and finite, got -1.5"
        );
        assert_eq!(
            BlurError::UnsupportedFormat(MaskFormat::Argb32).to_string(),
            "unsupported mask format Argb32: only 8-bit alpha masks can be blurred"
        );
        let e = BlurError::TooLarge {
            width: 70000,
            height: 70000,
            row_bytes: 70000,
        };
        assert!(e.to_string().contains("70000x70000"));
    }
}
