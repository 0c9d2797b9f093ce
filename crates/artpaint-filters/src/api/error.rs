//! Unified error type for the artpaint-filters public API.
//!
//! [`FilterError`] wraps every error the crate can produce into a single
//! enum for convenient `?` propagation in host code.

use thiserror::Error;

use crate::buffer::BufferError;
use crate::palette::{PaletteError, ParseColorError};

/// Unified error type for the artpaint-filters public API.
///
/// Only construction-time problems and cancellation are reported. Out of
/// range parameters (zero blur radius, oversized candidate counts, empty
/// generated palettes) are clamped or turned into a no-op instead.
///
/// # Example
///
/// ```
/// use artpaint_filters::{FilterError, Palette};
///
/// fn system_palette() -> Result<Palette, FilterError> {
///     let palette = Palette::from_hex(&["#000000", "#FFFFFF"])?;
///     Ok(palette)
/// }
/// # assert_eq!(system_palette().unwrap().len(), 2);
/// ```
#[derive(Debug, Error)]
pub enum FilterError {
    /// Invalid buffer geometry or failed allocation
    #[error("buffer error: {0}")]
    Buffer(#[from] BufferError),

    /// Palette validation error
    #[error("palette error: {0}")]
    Palette(#[from] PaletteError),

    /// Color parsing error (invalid hex string)
    #[error("color parse error: {0}")]
    ParseColor(#[from] ParseColorError),

    /// The operation observed its cancel flag and stopped early
    #[error("operation cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_buffer_error() {
        let err: FilterError = BufferError::OutOfMemory { bytes: 8 }.into();
        assert!(matches!(err, FilterError::Buffer(_)));
        assert_eq!(
            err.to_string(),
            "buffer error: out of memory allocating 8 bytes"
        );
    }

    #[test]
    fn test_from_palette_error() {
        let err: FilterError = PaletteError::Empty.into();
        assert_eq!(err.to_string(), "palette error: palette cannot be empty");
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error;
        let err: FilterError = PaletteError::Empty.into();
        assert!(err.source().is_some());
        assert!(FilterError::Cancelled.source().is_none());
    }
}
