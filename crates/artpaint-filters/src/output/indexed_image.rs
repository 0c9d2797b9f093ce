//! Palette-indexed raster produced by the dither engine.

use crate::buffer::{BufferError, PixelBuffer};
use crate::palette::Palette;

/// One `u8` palette index per pixel plus the palette they refer to.
///
/// The indexed form is canonical; [`to_pixel_buffer`](Self::to_pixel_buffer)
/// expands it back to BGRA for display or export.
///
/// # Example
///
/// ```
/// use artpaint_filters::{Color, IndexedImage, Palette};
///
/// let palette = Palette::new(&[Color::BLACK, Color::WHITE]).unwrap();
/// let image = IndexedImage::new(vec![0, 1, 1, 0], 2, 2, palette);
///
/// let pixels = image.to_pixel_buffer().unwrap();
/// assert_eq!(pixels.get(1, 0), Color::WHITE);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImage {
    indices: Vec<u8>,
    width: u32,
    height: u32,
    palette: Palette,
}

impl IndexedImage {
    /// Wrap row-major indices.
    ///
    /// Debug-asserts that `indices.len() == width * height` and that every
    /// index addresses a palette entry.
    pub fn new(indices: Vec<u8>, width: u32, height: u32, palette: Palette) -> Self {
        debug_assert_eq!(indices.len(), width as usize * height as usize);
        debug_assert!(indices.iter().all(|&i| (i as usize) < palette.len()));
        Self {
            indices,
            width,
            height,
            palette,
        }
    }

    /// Palette indices in row-major order.
    #[inline]
    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The palette the indices refer to.
    #[inline]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Index at `(x, y)`.
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> u8 {
        self.indices[y as usize * self.width as usize + x as usize]
    }

    /// How many pixels use each palette entry.
    pub fn histogram(&self) -> Vec<usize> {
        let mut counts = vec![0; self.palette.len()];
        for &i in &self.indices {
            counts[i as usize] += 1;
        }
        counts
    }

    /// Expand to an opaque BGRA buffer with a tight stride.
    pub fn to_pixel_buffer(&self) -> Result<PixelBuffer, BufferError> {
        let pixels = self
            .indices
            .iter()
            .map(|&i| self.palette.color(i as usize).to_bgra())
            .collect();
        PixelBuffer::from_pixels(self.width, self.height, self.width, pixels)
    }

    /// Consume the image, returning its indices and palette.
    pub fn into_parts(self) -> (Vec<u8>, Palette) {
        (self.indices, self.palette)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    fn sample() -> IndexedImage {
        let palette = Palette::new(&[Color::rgb(255, 0, 0), Color::rgb(0, 0, 255)]).unwrap();
        IndexedImage::new(vec![0, 0, 1, 0, 1, 1], 3, 2, palette)
    }

    #[test]
    fn test_index_is_row_major() {
        let image = sample();
        assert_eq!(image.index(2, 0), 1);
        assert_eq!(image.index(0, 1), 0);
    }

    #[test]
    fn test_histogram_counts_entries() {
        assert_eq!(sample().histogram(), vec![3, 3]);
    }

    #[test]
    fn test_expansion_uses_palette_colors() {
        let pixels = sample().to_pixel_buffer().unwrap();
        assert_eq!(pixels.width(), 3);
        assert_eq!(pixels.get(0, 0), Color::rgb(255, 0, 0));
        assert_eq!(pixels.get(2, 1), Color::rgb(0, 0, 255));
    }
}
