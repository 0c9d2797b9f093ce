//! Plain nearest-color mapping with a per-key memo.

use crate::api::FilterError;
use crate::buffer::{try_alloc, PixelBuffer};
use crate::color::{Color, ColorMetric};
use crate::palette::Palette;
use crate::progress::scan_rows;

use super::{Dither, DitherContext};

/// Memoized nearest-palette lookup keyed by the 15-bit quantized color.
///
/// The first color seen for a key does an exact search; later colors with
/// the same key reuse its answer. Photographs repeat quantized colors
/// heavily, so most pixels cost one table read.
pub(crate) struct NearestCache<'a> {
    metric: &'a ColorMetric,
    palette: &'a [Color],
    slots: Vec<Option<u8>>,
}

impl<'a> NearestCache<'a> {
    pub(crate) fn new(metric: &'a ColorMetric, palette: &'a Palette) -> Result<Self, FilterError> {
        Ok(Self {
            metric,
            palette: palette.colors(),
            slots: try_alloc(1 << 15, None)?,
        })
    }

    #[inline]
    pub(crate) fn lookup(&mut self, color: Color) -> u8 {
        let slot = &mut self.slots[color.key15() as usize];
        match *slot {
            Some(index) => index,
            None => {
                let index = self.metric.nearest_index(color, self.palette) as u8;
                *slot = Some(index);
                index
            }
        }
    }
}

/// Map every pixel to its closest palette entry, no error diffusion.
pub(crate) struct Nearest;

impl Dither for Nearest {
    fn dither(
        &self,
        source: &PixelBuffer,
        palette: &Palette,
        ctx: &DitherContext<'_>,
    ) -> Result<Vec<u8>, FilterError> {
        let width = source.width() as usize;
        let mut cache = NearestCache::new(ctx.metric, palette)?;
        let mut indices = try_alloc(source.pixel_count(), 0u8)?;

        scan_rows(source.height(), &ctx.monitor, |y| {
            let out = &mut indices[y as usize * width..(y as usize + 1) * width];
            for (dst, &p) in out.iter_mut().zip(source.row(y)) {
                *dst = cache.lookup(Color::from_bgra(p));
            }
        })?;
        Ok(indices)
    }
}
