//! Equalizing the brightness of a color image.
//!
//! The image is split into BT.601 YCbCr, the Y plane is equalized, and
//! each changed pixel is rebuilt from the new Y and its original chroma.

use super::clahe::equalize_plane;
use super::plane::GrayPlane;
use crate::api::FilterError;
use crate::buffer::{PixelBuffer, Selection};
use crate::color::Color;
use crate::progress::Monitor;

/// Return a copy of `source` whose luminance has been equalized. Alpha is
/// preserved and unselected pixels are untouched.
pub(crate) fn equalize_luminance(
    source: &PixelBuffer,
    tile_size: usize,
    clip_limit: Option<u32>,
    selection: Option<&dyn Selection>,
    monitor: &Monitor<'_>,
) -> Result<PixelBuffer, FilterError> {
    let luma = GrayPlane::from_luminance(source)?;
    let equalized = equalize_plane(&luma, tile_size, clip_limit, selection, monitor)?;

    let mut out = source.clone();
    let width = source.width() as usize;
    for y in 0..source.height() {
        let row = &equalized[y as usize * width..(y as usize + 1) * width];
        for (x, (&new_y, &old_y)) in row.iter().zip(luma.row(y)).enumerate() {
            if new_y != old_y {
                let x = x as u32;
                out.set(x, y, with_luma(source.get(x, y), new_y));
            }
        }
    }
    Ok(out)
}

/// Replace the Y component of `color`, keeping Cb, Cr and alpha.
fn with_luma(color: Color, luma: u8) -> Color {
    let (r, g, b) = (f32::from(color.r), f32::from(color.g), f32::from(color.b));
    let cb = -0.168_736 * r - 0.331_264 * g + 0.5 * b;
    let cr = 0.5 * r - 0.418_688 * g - 0.081_312 * b;
    let y = f32::from(luma);

    let channel = |v: f32| v.round().clamp(0.0, 255.0) as u8;
    Color::new(
        channel(y + 1.402 * cr),
        channel(y - 0.344_136 * cb - 0.714_136 * cr),
        channel(y + 1.772 * cb),
        color.a,
    )
}
