//! Floyd-Steinberg error diffusion in Q15 fixed point.
//!
//! ```text
//!        X   7
//!    3   5   1      (sixteenths)
//! ```
//!
//! Runs single-threaded and row-major: every pixel depends on the error
//! left behind by the one before it.

use crate::api::FilterError;
use crate::buffer::{try_alloc, BufferError, PixelBuffer};
use crate::color::Color;
use crate::convolve::FIXED_SHIFT;
use crate::palette::Palette;
use crate::progress::scan_rows;

use super::nearest::NearestCache;
use super::{Dither, DitherContext};

/// 255 in Q15.
const MAX_FP: i32 = 255 << FIXED_SHIFT;

/// One sixteenth in Q15.
const SIXTEENTH: i64 = 1 << (FIXED_SHIFT - 4);

/// Pending Q15 error for the row being scanned and the row below.
///
/// Each row array has `width + 2` slots so that the pixel at `x` reads slot
/// `x + 1` and the below-left and below-right neighbours never fall outside
/// the array. The right neighbour's share travels in `carry`.
pub(crate) struct ErrorRows {
    current: [Vec<i32>; 3],
    next: [Vec<i32>; 3],
    carry: [i32; 3],
}

impl ErrorRows {
    pub(crate) fn new(width: usize) -> Result<Self, BufferError> {
        let row = || try_alloc(width + 2, 0i32);
        Ok(Self {
            current: [row()?, row()?, row()?],
            next: [row()?, row()?, row()?],
            carry: [0; 3],
        })
    }

    /// `color` plus the error waiting for pixel `x`, as clamped Q15 RGB.
    #[inline]
    pub(crate) fn adjusted(&self, x: usize, color: Color) -> [i32; 3] {
        let src = [color.r, color.g, color.b];
        std::array::from_fn(|c| {
            ((i32::from(src[c]) << FIXED_SHIFT) + self.current[c][x + 1] + self.carry[c])
                .clamp(0, MAX_FP)
        })
    }

    /// Spread `wanted - chosen` to the unvisited neighbours of pixel `x`.
    /// The below-right share takes the rounding remainder, so the four
    /// shares always add up to the whole residual.
    #[inline]
    pub(crate) fn diffuse(&mut self, x: usize, wanted: [i32; 3], chosen: Color) {
        let got = [chosen.r, chosen.g, chosen.b];
        for c in 0..3 {
            let residual = wanted[c] - (i32::from(got[c]) << FIXED_SHIFT);
            let right = share(residual, 7);
            let below_left = share(residual, 3);
            let below = share(residual, 5);
            self.carry[c] = right;
            self.next[c][x] += below_left;
            self.next[c][x + 1] += below;
            self.next[c][x + 2] += residual - right - below_left - below;
        }
    }

    /// Drop the error that would have reached the next pixel in this row.
    #[inline]
    pub(crate) fn reset(&mut self) {
        self.carry = [0; 3];
    }

    /// Advance to the next row.
    pub(crate) fn next_row(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
        for row in &mut self.next {
            row.fill(0);
        }
        self.carry = [0; 3];
    }

    #[cfg(test)]
    fn pending_total(&self) -> i64 {
        let rows: i64 = self.next.iter().flatten().map(|&e| i64::from(e)).sum();
        rows + self.carry.iter().map(|&e| i64::from(e)).sum::<i64>()
    }
}

#[inline]
fn share(residual: i32, sixteenths: i64) -> i32 {
    ((i64::from(residual) * sixteenths * SIXTEENTH) >> FIXED_SHIFT) as i32
}

/// Round Q15 channels back to a color.
#[inline]
pub(crate) fn to_color(fixed: [i32; 3]) -> Color {
    let round = |v: i32| ((v + (1 << (FIXED_SHIFT - 1))) >> FIXED_SHIFT) as u8;
    Color::rgb(round(fixed[0]), round(fixed[1]), round(fixed[2]))
}

/// Classic four-neighbour error diffusion.
pub(crate) struct FloydSteinberg;

impl Dither for FloydSteinberg {
    fn dither(
        &self,
        source: &PixelBuffer,
        palette: &Palette,
        ctx: &DitherContext<'_>,
    ) -> Result<Vec<u8>, FilterError> {
        let width = source.width() as usize;
        let mut cache = NearestCache::new(ctx.metric, palette)?;
        let mut errors = ErrorRows::new(width)?;
        let mut indices = try_alloc(source.pixel_count(), 0u8)?;

        scan_rows(source.height(), &ctx.monitor, |y| {
            let out = &mut indices[y as usize * width..(y as usize + 1) * width];
            for (x, (dst, &p)) in out.iter_mut().zip(source.row(y)).enumerate() {
                let wanted = errors.adjusted(x, Color::from_bgra(p));
                let index = cache.lookup(to_color(wanted));
                errors.diffuse(x, wanted, palette.color(index as usize));
                *dst = index;
            }
            errors.next_row();
        })?;
        Ok(indices)
    }
}
