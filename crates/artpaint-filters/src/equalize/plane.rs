//! Single-channel 8-bit raster.

use crate::buffer::{try_alloc, BufferError, PixelBuffer, Selection};

/// A tightly packed single-channel image, the input of histogram
/// equalization and the mask format of the selection tracer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayPlane {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl GrayPlane {
    /// A black plane.
    pub fn new(width: u32, height: u32) -> Result<Self, BufferError> {
        let len = Self::checked_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: try_alloc(len, 0)?,
        })
    }

    /// Wrap row-major samples.
    pub fn from_vec(width: u32, height: u32, data: Vec<u8>) -> Result<Self, BufferError> {
        let expected = Self::checked_len(width, height)?;
        if data.len() != expected {
            return Err(BufferError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// BT.601 luminance of every pixel.
    pub fn from_luminance(buffer: &PixelBuffer) -> Result<Self, BufferError> {
        let mut plane = Self::new(buffer.width(), buffer.height())?;
        for (dst, color) in plane.data.iter_mut().zip(buffer.iter()) {
            *dst = color.luminance();
        }
        Ok(plane)
    }

    fn checked_len(width: u32, height: u32) -> Result<usize, BufferError> {
        if width == 0 || height == 0 {
            return Err(BufferError::InvalidGeometry {
                width,
                height,
                stride: width,
            });
        }
        Ok(width as usize * height as usize)
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

    /// Sample at `(x, y)`.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Overwrite the sample at `(x, y)`.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: u8) {
        let idx = y as usize * self.width as usize + x as usize;
        self.data[idx] = value;
    }

    /// Row `y`.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.width as usize;
        &self.data[start..start + self.width as usize]
    }

    /// All samples, row-major.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn replace_data(&mut self, data: Vec<u8>) {
        debug_assert_eq!(data.len(), self.data.len());
        self.data = data;
    }
}

/// Nonzero samples are selected; outside the plane nothing is.
impl Selection for GrayPlane {
    fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0
            && y >= 0
            && (x as u32) < self.width
            && (y as u32) < self.height
            && self.get(x as u32, y as u32) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn test_from_vec_checks_length() {
        assert!(matches!(
            GrayPlane::from_vec(3, 3, vec![0; 8]),
            Err(BufferError::LengthMismatch { expected: 9, actual: 8 })
        ));
    }

    #[test]
    fn test_from_luminance() {
        let mut buffer = PixelBuffer::filled(2, 1, Color::BLACK).unwrap();
        buffer.set(1, 0, Color::WHITE);
        let plane = GrayPlane::from_luminance(&buffer).unwrap();
        assert_eq!(plane.data(), &[0, 255]);
    }

    #[test]
    fn test_plane_as_selection() {
        let plane = GrayPlane::from_vec(2, 2, vec![0, 1, 0, 0]).unwrap();
        assert!(plane.contains(1, 0));
        assert!(!plane.contains(0, 0));
        assert!(!plane.contains(2, 0));
        assert!(!plane.contains(-1, 0));
    }
}
