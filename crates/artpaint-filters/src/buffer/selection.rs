//! Selection predicates.
//!
//! Filters consult a [`Selection`] before writing a pixel. Passing `None`
//! where an `Option<&dyn Selection>` is expected means "no active
//! selection", i.e. every pixel is writable.

use super::error::BufferError;
use super::pixel_buffer::{try_alloc, PixelBuffer};

/// Membership test over integer pixel coordinates.
///
/// Implementations must be callable from worker threads, hence `Sync`.
/// Coordinates outside the image are legal arguments and should simply
/// answer `false`.
pub trait Selection: Sync {
    /// Whether pixel `(x, y)` is part of the selection.
    fn contains(&self, x: i32, y: i32) -> bool;
}

impl<F> Selection for F
where
    F: Fn(i32, i32) -> bool + Sync,
{
    #[inline]
    fn contains(&self, x: i32, y: i32) -> bool {
        self(x, y)
    }
}

/// The selection that contains every coordinate.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllPixels;

impl Selection for AllPixels {
    #[inline]
    fn contains(&self, _x: i32, _y: i32) -> bool {
        true
    }
}

#[inline]
pub(crate) fn is_selected(selection: Option<&dyn Selection>, x: i32, y: i32) -> bool {
    selection.map_or(true, |s| s.contains(x, y))
}

/// A single-channel membership bitmap.
///
/// Used both as a [`Selection`] for filters and as the input of the
/// [`SelectionTracer`](crate::SelectionTracer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionMask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl SelectionMask {
    /// An empty (nothing selected) mask.
    pub fn new(width: u32, height: u32) -> Result<Self, BufferError> {
        if width == 0 || height == 0 {
            return Err(BufferError::InvalidGeometry {
                width,
                height,
                stride: width,
            });
        }
        let bits = try_alloc(width as usize * height as usize, false)?;
        Ok(Self {
            width,
            height,
            bits,
        })
    }

    /// Rasterize an arbitrary predicate over `width x height`.
    pub fn from_predicate(
        width: u32,
        height: u32,
        selection: &dyn Selection,
    ) -> Result<Self, BufferError> {
        let mut mask = Self::new(width, height)?;
        for y in 0..height {
            for x in 0..width {
                if selection.contains(x as i32, y as i32) {
                    mask.set(x, y, true);
                }
            }
        }
        Ok(mask)
    }

    /// Select every non-transparent pixel whose luminance is at least
    /// `threshold`. This is how a painted mask image becomes a selection.
    pub fn from_luminance(buffer: &PixelBuffer, threshold: u8) -> Result<Self, BufferError> {
        let mut mask = Self::new(buffer.width(), buffer.height())?;
        for y in 0..buffer.height() {
            for x in 0..buffer.width() {
                let color = buffer.get(x, y);
                if color.a > 0 && color.luminance() >= threshold {
                    mask.set(x, y, true);
                }
            }
        }
        Ok(mask)
    }

    /// Mask width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Mask height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Mark `(x, y)` as selected or not.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, selected: bool) {
        debug_assert!(x < self.width && y < self.height);
        self.bits[y as usize * self.width as usize + x as usize] = selected;
    }

    /// Number of selected pixels.
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// True when nothing is selected.
    pub fn is_empty(&self) -> bool {
        !self.bits.iter().any(|&b| b)
    }
}

impl Selection for SelectionMask {
    #[inline]
    fn contains(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return false;
        }
        self.bits[y as usize * self.width as usize + x as usize]
    }
}
