//! Contiguous BGRA32 raster with an explicit row stride.

use super::error::BufferError;
use crate::color::Color;

/// Allocate a vector of `len` copies of `value`, reporting allocator
/// refusal as [`BufferError::OutOfMemory`] instead of aborting.
pub(crate) fn try_alloc<T: Clone>(len: usize, value: T) -> Result<Vec<T>, BufferError> {
    let bytes = len.saturating_mul(std::mem::size_of::<T>());
    let mut storage = Vec::new();
    storage
        .try_reserve_exact(len)
        .map_err(|_| BufferError::OutOfMemory { bytes })?;
    storage.resize(len, value);
    Ok(storage)
}

/// A view-owning raster of packed BGRA32 pixels.
///
/// Pixel `(x, y)` lives at `pixels[y * stride + x]`. The stride is counted
/// in pixels (bytes-per-row / 4) and may exceed the width, in which case the
/// trailing elements of each row are padding that no operation reads or
/// writes.
///
/// Each `u32` holds blue in the low byte, then green, red and alpha, which
/// is the in-memory order of a little-endian BGRA32 bitmap.
///
/// # Example
///
/// ```
/// use artpaint_filters::{Color, PixelBuffer};
///
/// let mut buffer = PixelBuffer::new(3, 2).unwrap();
/// buffer.set(2, 1, Color::rgb(10, 20, 30));
///
/// assert_eq!(buffer.get(2, 1), Color::rgb(10, 20, 30));
/// assert_eq!(buffer.get(0, 0), Color::TRANSPARENT);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    stride: u32,
    pixels: Vec<u32>,
}

impl PixelBuffer {
    /// Create a fully transparent buffer with a tight stride.
    pub fn new(width: u32, height: u32) -> Result<Self, BufferError> {
        Self::filled(width, height, Color::TRANSPARENT)
    }

    /// Create a buffer where every pixel is `color`.
    pub fn filled(width: u32, height: u32, color: Color) -> Result<Self, BufferError> {
        Self::with_stride(width, height, width, color)
    }

    /// Create a buffer with an explicit stride, filled with `color`.
    ///
    /// # Errors
    ///
    /// [`BufferError::InvalidGeometry`] when either dimension is zero or
    /// `stride < width`; [`BufferError::OutOfMemory`] when the raster cannot
    /// be allocated.
    pub fn with_stride(
        width: u32,
        height: u32,
        stride: u32,
        color: Color,
    ) -> Result<Self, BufferError> {
        let len = Self::storage_len(width, height, stride)?;
        let pixels = try_alloc(len, color.to_bgra())?;
        Ok(Self {
            width,
            height,
            stride,
            pixels,
        })
    }

    /// Wrap existing packed BGRA storage.
    ///
    /// # Errors
    ///
    /// Fails if the geometry is invalid or `pixels.len() != stride * height`.
    pub fn from_pixels(
        width: u32,
        height: u32,
        stride: u32,
        pixels: Vec<u32>,
    ) -> Result<Self, BufferError> {
        let expected = Self::storage_len(width, height, stride)?;
        if pixels.len() != expected {
            return Err(BufferError::LengthMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            stride,
            pixels,
        })
    }

    /// Build a buffer from tightly packed `[R, G, B, A]` bytes, the layout
    /// image decoders hand out.
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> Result<Self, BufferError> {
        let expected = Self::storage_len(width, height, width)?;
        if bytes.len() != expected * 4 {
            return Err(BufferError::LengthMismatch {
                expected: expected * 4,
                actual: bytes.len(),
            });
        }
        let mut pixels = try_alloc(expected, 0u32)?;
        for (dst, src) in pixels.iter_mut().zip(bytes.chunks_exact(4)) {
            *dst = Color::new(src[0], src[1], src[2], src[3]).to_bgra();
        }
        Ok(Self {
            width,
            height,
            stride: width,
            pixels,
        })
    }

    /// Export as tightly packed `[R, G, B, A]` bytes (stride padding dropped).
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.width as usize * self.height as usize * 4);
        for color in self.iter() {
            bytes.extend_from_slice(&[color.r, color.g, color.b, color.a]);
        }
        bytes
    }

    fn storage_len(width: u32, height: u32, stride: u32) -> Result<usize, BufferError> {
        if width == 0 || height == 0 || stride < width {
            return Err(BufferError::InvalidGeometry {
                width,
                height,
                stride,
            });
        }
        (stride as usize)
            .checked_mul(height as usize)
            .ok_or(BufferError::OutOfMemory { bytes: usize::MAX })
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row stride in pixels.
    #[inline]
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Number of visible pixels (`width * height`).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// True when `other` has the same width and height.
    #[inline]
    pub fn same_size(&self, other: &PixelBuffer) -> bool {
        self.width == other.width && self.height == other.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} buffer",
            self.width,
            self.height
        );
        y as usize * self.stride as usize + x as usize
    }

    /// Packed BGRA value at `(x, y)`.
    #[inline]
    pub fn get_raw(&self, x: u32, y: u32) -> u32 {
        self.pixels[self.index(x, y)]
    }

    /// Overwrite the packed BGRA value at `(x, y)`.
    #[inline]
    pub fn set_raw(&mut self, x: u32, y: u32, value: u32) {
        let idx = self.index(x, y);
        self.pixels[idx] = value;
    }

    /// Color at `(x, y)`.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Color {
        Color::from_bgra(self.get_raw(x, y))
    }

    /// Overwrite the color at `(x, y)`.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.set_raw(x, y, color.to_bgra());
    }

    /// Visible pixels of row `y` (padding excluded).
    #[inline]
    pub fn row(&self, y: u32) -> &[u32] {
        let start = self.index(0, y);
        &self.pixels[start..start + self.width as usize]
    }

    /// Mutable visible pixels of row `y`.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u32] {
        let start = self.index(0, y);
        let width = self.width as usize;
        &mut self.pixels[start..start + width]
    }

    /// Whole backing storage, stride padding included.
    #[inline]
    pub(crate) fn raw(&self) -> &[u32] {
        &self.pixels
    }

    /// Iterate over visible pixels in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = Color> + '_ {
        (0..self.height).flat_map(move |y| self.row(y).iter().map(|&p| Color::from_bgra(p)))
    }

    /// Copy every pixel of `source` into `self`, skipping pixels for which
    /// `keep` returns false. Both buffers must have the same size.
    pub(crate) fn copy_where<F>(&mut self, source: &PixelBuffer, mut keep: F)
    where
        F: FnMut(u32, u32) -> bool,
    {
        debug_assert!(self.same_size(source));
        for y in 0..self.height {
            let src = source.row(y);
            let dst = self.row_mut(y);
            for (x, (d, &s)) in dst.iter_mut().zip(src).enumerate() {
                if keep(x as u32, y) {
                    *d = s;
                }
            }
        }
    }
}
