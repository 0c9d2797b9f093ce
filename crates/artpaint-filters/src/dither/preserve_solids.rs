//! Error diffusion that leaves flat color fields alone.
//!
//! A 3x3 Sobel gradient of the source luminance decides per pixel: above
//! the edge threshold the pixel is diffused like Floyd-Steinberg, otherwise
//! it takes its plain nearest color and the pending error is discarded.

use crate::api::FilterError;
use crate::buffer::{try_alloc, PixelBuffer};
use crate::color::Color;
use crate::palette::Palette;
use crate::progress::scan_rows;

use super::floyd_steinberg::{to_color, ErrorRows};
use super::nearest::NearestCache;
use super::{Dither, DitherContext};

/// Floyd-Steinberg restricted to pixels on a luminance gradient.
pub(crate) struct PreserveSolids;

impl Dither for PreserveSolids {
    fn dither(
        &self,
        source: &PixelBuffer,
        palette: &Palette,
        ctx: &DitherContext<'_>,
    ) -> Result<Vec<u8>, FilterError> {
        let width = source.width() as usize;
        let luma = luminance_plane(source)?;
        let threshold = ctx.options.edge_threshold;
        let mut cache = NearestCache::new(ctx.metric, palette)?;
        let mut errors = ErrorRows::new(width)?;
        let mut indices = try_alloc(source.pixel_count(), 0u8)?;

        scan_rows(source.height(), &ctx.monitor, |y| {
            let out = &mut indices[y as usize * width..(y as usize + 1) * width];
            for (x, (dst, &p)) in out.iter_mut().zip(source.row(y)).enumerate() {
                let color = Color::from_bgra(p);
                if gradient(&luma, width, source.height() as usize, x, y as usize) > threshold {
                    let wanted = errors.adjusted(x, color);
                    let index = cache.lookup(to_color(wanted));
                    errors.diffuse(x, wanted, palette.color(index as usize));
                    *dst = index;
                } else {
                    errors.reset();
                    *dst = cache.lookup(color);
                }
            }
            errors.next_row();
        })?;
        Ok(indices)
    }
}

fn luminance_plane(source: &PixelBuffer) -> Result<Vec<u8>, FilterError> {
    let mut luma = try_alloc(source.pixel_count(), 0u8)?;
    for (dst, color) in luma.iter_mut().zip(source.iter()) {
        *dst = color.luminance();
    }
    Ok(luma)
}

/// `|Gx| + |Gy|` of the Sobel operator at `(x, y)`, replicating edge pixels.
fn gradient(luma: &[u8], width: usize, height: usize, x: usize, y: usize) -> u32 {
    let at = |dx: isize, dy: isize| -> i32 {
        let sx = (x as isize + dx).clamp(0, width as isize - 1) as usize;
        let sy = (y as isize + dy).clamp(0, height as isize - 1) as usize;
        i32::from(luma[sy * width + sx])
    };
    let gx = (at(1, -1) + 2 * at(1, 0) + at(1, 1)) - (at(-1, -1) + 2 * at(-1, 0) + at(-1, 1));
    let gy = (at(-1, 1) + 2 * at(0, 1) + at(1, 1)) - (at(-1, -1) + 2 * at(0, -1) + at(1, -1));
    gx.unsigned_abs() + gy.unsigned_abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorMetric;
    use crate::dither::floyd_steinberg::FloydSteinberg;
    use crate::progress::Monitor;
    use crate::DitherOptions;

    fn run(algorithm: &dyn Dither, source: &PixelBuffer, options: &DitherOptions) -> Vec<u8> {
        let metric = ColorMetric::new();
        let palette = Palette::new(&[Color::BLACK, Color::WHITE]).unwrap();
        let ctx = DitherContext {
            metric: &metric,
            options,
            monitor: Monitor::new(None, None, 0),
        };
        algorithm.dither(source, &palette, &ctx).unwrap()
    }

    #[test]
    fn test_flat_field_is_not_dithered() {
        let source = PixelBuffer::filled(12, 12, Color::rgb(128, 128, 128)).unwrap();
        let options = DitherOptions::new();

        let solid = run(&PreserveSolids, &source, &options);
        assert!(solid.iter().all(|&i| i == 1));

        let diffused = run(&FloydSteinberg, &source, &options);
        assert!(diffused.contains(&0) && diffused.contains(&1));
    }

    #[test]
    fn test_gradient_is_dithered() {
        let mut source = PixelBuffer::new(32, 4).unwrap();
        for y in 0..4 {
            for x in 0..32u32 {
                let v = (x * 8) as u8;
                source.set(x, y, Color::rgb(v, v, v));
            }
        }
        let indices = run(&PreserveSolids, &source, &DitherOptions::new());
        assert!(indices.contains(&0) && indices.contains(&1));
    }

    #[test]
    fn test_sobel_on_vertical_edge() {
        // 3x3: left column black, rest white.
        let luma = [0, 255, 255, 0, 255, 255, 0, 255, 255];
        assert_eq!(gradient(&luma, 3, 3, 1, 1), 4 * 255);
        assert_eq!(gradient(&luma, 3, 3, 2, 1), 0);
    }

    #[test]
    fn test_high_threshold_behaves_like_nearest() {
        let mut source = PixelBuffer::new(8, 1).unwrap();
        for x in 0..8u32 {
            let v = (x * 30) as u8;
            source.set(x, 0, Color::rgb(v, v, v));
        }
        let options = DitherOptions::new().edge_threshold(u32::MAX);
        let indices = run(&PreserveSolids, &source, &options);
        let expected: Vec<u8> = (0..8u32).map(|x| u8::from(x * 30 > 127)).collect();
        assert_eq!(indices, expected);
    }
}
