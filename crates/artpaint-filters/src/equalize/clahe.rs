//! Tiled equalization with bilinear blending between tile centres.
//!
//! Only two rows of tile mapping functions exist at any time: the row
//! whose centres lie above the current scanline and the row below it.
//! Crossing a centre line shifts the lower row up and computes a new one.

use super::histogram::{MappingFunction, BINS};
use super::plane::GrayPlane;
use crate::api::FilterError;
use crate::buffer::{is_selected, try_alloc, Selection};
use crate::progress::{scan_rows, Monitor};

/// Tile layout along one axis.
#[derive(Debug, Clone, Copy)]
struct Axis {
    extent: usize,
    tile: usize,
    count: usize,
}

impl Axis {
    fn new(extent: usize, tile: usize) -> Self {
        Self {
            extent,
            tile,
            count: extent.div_ceil(tile),
        }
    }

    /// Pixel range of tile `i`, the last one clipped to the extent.
    fn span(&self, i: usize) -> (usize, usize) {
        (i * self.tile, ((i + 1) * self.tile).min(self.extent))
    }

    fn center(&self, i: usize) -> f32 {
        let (start, end) = self.span(i);
        (start + end) as f32 / 2.0 - 0.5
    }

    /// Interpolation weight of tile `hi` against tile `lo` at `pos`.
    fn weight(&self, lo: usize, hi: usize, pos: usize) -> f32 {
        if lo == hi {
            return 0.0;
        }
        let (a, b) = (self.center(lo), self.center(hi));
        ((pos as f32 - a) / (b - a)).clamp(0.0, 1.0)
    }
}

/// Neighbouring tiles and blend weight for one column.
#[derive(Debug, Clone, Copy)]
struct Blend {
    lo: usize,
    hi: usize,
    weight: f32,
}

fn column_blends(axis: &Axis) -> Vec<Blend> {
    let mut bin = 0;
    (0..axis.extent)
        .map(|x| {
            while bin + 1 < axis.count && x as f32 >= axis.center(bin + 1) {
                bin += 1;
            }
            let hi = (bin + 1).min(axis.count - 1);
            Blend {
                lo: bin,
                hi,
                weight: axis.weight(bin, hi, x),
            }
        })
        .collect()
}

fn tile_row_maps(
    plane: &GrayPlane,
    columns: &Axis,
    rows: &Axis,
    ty: usize,
    clip_limit: Option<u32>,
) -> Vec<MappingFunction> {
    let (y0, y1) = rows.span(ty);
    (0..columns.count)
        .map(|tx| {
            let (x0, x1) = columns.span(tx);
            let mut histogram = [0u32; BINS];
            for y in y0..y1 {
                for &v in &plane.row(y as u32)[x0..x1] {
                    histogram[v as usize] += 1;
                }
            }
            MappingFunction::from_histogram(&histogram, clip_limit)
        })
        .collect()
}

fn grid(plane: &GrayPlane, tile_size: usize) -> (Axis, Axis) {
    let width = plane.width() as usize;
    let height = plane.height() as usize;
    let tile = if tile_size == 0 {
        width.max(height)
    } else {
        tile_size
    };
    (Axis::new(width, tile), Axis::new(height, tile))
}

/// Mapping function of every tile, row-major.
pub(crate) fn tile_mappings(
    plane: &GrayPlane,
    tile_size: usize,
    clip_limit: Option<u32>,
) -> Vec<MappingFunction> {
    let (columns, rows) = grid(plane, tile_size);
    (0..rows.count)
        .flat_map(|ty| tile_row_maps(plane, &columns, &rows, ty, clip_limit))
        .collect()
}

/// Equalize `plane` and return the new samples. Unselected pixels keep
/// their value; `tile_size == 0` means one tile covering everything.
pub(crate) fn equalize_plane(
    plane: &GrayPlane,
    tile_size: usize,
    clip_limit: Option<u32>,
    selection: Option<&dyn Selection>,
    monitor: &Monitor<'_>,
) -> Result<Vec<u8>, FilterError> {
    let width = plane.width() as usize;
    let height = plane.height() as usize;
    let (columns, rows) = grid(plane, tile_size);
    let blends = column_blends(&columns);

    let mut out = try_alloc(width * height, 0u8)?;

    let mut bin = 0;
    let mut upper = tile_row_maps(plane, &columns, &rows, 0, clip_limit);
    let mut lower = if rows.count > 1 {
        tile_row_maps(plane, &columns, &rows, 1, clip_limit)
    } else {
        upper.clone()
    };

    scan_rows(plane.height(), monitor, |y| {
        let yi = y as usize;
        while bin + 1 < rows.count && yi as f32 >= rows.center(bin + 1) {
            bin += 1;
            let next = if bin + 1 < rows.count {
                tile_row_maps(plane, &columns, &rows, bin + 1, clip_limit)
            } else {
                lower.clone()
            };
            upper = std::mem::replace(&mut lower, next);
        }
        let wy = rows.weight(bin, (bin + 1).min(rows.count - 1), yi);

        let src = plane.row(y);
        let dst = &mut out[yi * width..(yi + 1) * width];
        for (x, (d, &v)) in dst.iter_mut().zip(src).enumerate() {
            if !is_selected(selection, x as i32, y as i32) {
                *d = v;
                continue;
            }
            let b = blends[x];
            let top = lerp(upper[b.lo].apply(v), upper[b.hi].apply(v), b.weight);
            let bottom = lerp(lower[b.lo].apply(v), lower[b.hi].apply(v), b.weight);
            *d = (top + (bottom - top) * wy).round() as u8;
        }
    })?;

    Ok(out)
}

#[inline]
fn lerp(a: u8, b: u8, t: f32) -> f32 {
    f32::from(a) + (f32::from(b) - f32::from(a)) * t
}
