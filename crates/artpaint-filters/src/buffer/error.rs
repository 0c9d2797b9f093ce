//! Errors raised while constructing or allocating pixel buffers.

use thiserror::Error;

/// Construction-time failure of a [`PixelBuffer`](super::PixelBuffer) or of
/// one of the intermediate rasters an operation allocates.
///
/// These are the only errors that abort an operation outright; numeric
/// degeneracies (flat histograms, empty palette buckets) are recovered
/// locally and never surface here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// Width or height is zero, or the stride is narrower than a row.
    #[error("invalid geometry: {width}x{height} with stride {stride}")]
    InvalidGeometry {
        /// Requested width in pixels
        width: u32,
        /// Requested height in pixels
        height: u32,
        /// Requested row stride in pixels
        stride: u32,
    },

    /// Pixel storage does not match `stride * height`.
    #[error("pixel data length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Number of elements required by the geometry
        expected: usize,
        /// Number of elements supplied
        actual: usize,
    },

    /// The allocator refused a buffer of the given size.
    #[error("out of memory allocating {bytes} bytes")]
    OutOfMemory {
        /// Size of the failed allocation
        bytes: usize,
    },
}
