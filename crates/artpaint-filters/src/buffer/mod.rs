//! Raster storage and selection predicates.
//!
//! [`PixelBuffer`] is the only image representation the engine works on:
//! a contiguous BGRA32 raster with an explicit row stride. [`Selection`]
//! restricts which pixels an operation is allowed to write.

mod error;
mod pixel_buffer;
mod selection;

pub use error::BufferError;
pub use pixel_buffer::PixelBuffer;
pub use selection::{AllPixels, Selection, SelectionMask};

pub(crate) use pixel_buffer::try_alloc;
pub(crate) use selection::is_selected;
