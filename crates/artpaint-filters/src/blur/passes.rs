//! Fork/join row filtering with transposed output.
//!
//! One call filters every row of a raster and writes the result rotated
//! by 90 degrees. Running it twice blurs both directions and restores the
//! original orientation.

use std::thread;

use crate::api::FilterError;
use crate::buffer::try_alloc;
use crate::convolve::{convolve_box_with, convolve_with, pad_edges, Kernel};
use crate::progress::{Monitor, REPORT_INTERVAL};

/// What to do with each row.
#[derive(Debug, Clone, Copy)]
pub(crate) enum RowFilter<'k> {
    /// One pass of a weighted Q15 kernel.
    Weighted(&'k Kernel),
    /// `iterations` successive moving-sum box passes.
    Box { radius: usize, iterations: usize },
}

impl RowFilter<'_> {
    fn radius(&self) -> usize {
        match *self {
            RowFilter::Weighted(kernel) => kernel.radius() as usize,
            RowFilter::Box { radius, .. } => radius,
        }
    }
}

/// Borrowed row-major source raster.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Rows<'a> {
    pub data: &'a [u32],
    pub width: usize,
    pub height: usize,
    pub stride: usize,
}

impl<'a> Rows<'a> {
    #[inline]
    fn row(&self, y: usize) -> &'a [u32] {
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }
}

/// A band's filtered rows, stored transposed: pixel `(x, y0 + j)` of the
/// source lands at `tile[x * len + j]`.
struct Band {
    y0: usize,
    len: usize,
    tile: Vec<u32>,
}

/// `ceil(extent / threads)`-sized ranges covering `0..extent`, the last one
/// clipped to the boundary.
pub(crate) fn partition(extent: usize, threads: usize) -> Vec<(usize, usize)> {
    let threads = threads.clamp(1, extent.max(1));
    let band = extent.div_ceil(threads);
    (0..threads)
        .map(|t| (t * band, ((t + 1) * band).min(extent)))
        .filter(|&(start, end)| start < end)
        .collect()
}

/// Filter every row of `src` and return the result transposed
/// (`src.width` rows of `src.height` pixels).
pub(crate) fn filter_transposed(
    src: Rows<'_>,
    filter: RowFilter<'_>,
    threads: usize,
    monitor: &Monitor<'_>,
) -> Result<Vec<u32>, FilterError> {
    let bands = partition(src.height, threads);

    let results: Vec<Result<Band, FilterError>> = if bands.len() == 1 {
        vec![filter_band(src, filter, bands[0], monitor)]
    } else {
        thread::scope(|scope| {
            let handles: Vec<_> = bands
                .iter()
                .map(|&range| scope.spawn(move || filter_band(src, filter, range, monitor)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        })
    };

    let mut out = try_alloc(src.width * src.height, 0u32)?;
    for band in results {
        let band = band?;
        for x in 0..src.width {
            let dst = x * src.height + band.y0;
            out[dst..dst + band.len].copy_from_slice(&band.tile[x * band.len..(x + 1) * band.len]);
        }
    }
    Ok(out)
}

fn filter_band(
    src: Rows<'_>,
    filter: RowFilter<'_>,
    (y0, y1): (usize, usize),
    monitor: &Monitor<'_>,
) -> Result<Band, FilterError> {
    let len = y1 - y0;
    let mut tile = try_alloc(src.width * len, 0u32)?;
    let radius = filter.radius();
    let mut padded = Vec::with_capacity(src.width + 2 * radius);
    let mut scratch = Vec::with_capacity(src.width);

    let mut pending = 0;
    for (j, y) in (y0..y1).enumerate() {
        if pending == 0 {
            monitor.check()?;
        }

        let mut store = |x: usize, p: u32| tile[x * len + j] = p;
        match filter {
            RowFilter::Weighted(kernel) => {
                pad_edges(src.row(y), radius, &mut padded);
                convolve_with(&padded, src.width, kernel, &mut store);
            }
            RowFilter::Box { radius, iterations } => {
                scratch.clear();
                scratch.extend_from_slice(src.row(y));
                for _ in 1..iterations.max(1) {
                    pad_edges(&scratch, radius, &mut padded);
                    scratch.clear();
                    convolve_box_with(&padded, src.width, radius, |_, p| scratch.push(p));
                }
                pad_edges(&scratch, radius, &mut padded);
                convolve_box_with(&padded, src.width, radius, &mut store);
            }
        }

        pending += 1;
        if pending == REPORT_INTERVAL {
            monitor.advance(pending);
            pending = 0;
        }
    }
    monitor.advance(pending);

    Ok(Band { y0, len, tile })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_covers_extent_without_overlap() {
        for extent in 1..40 {
            for threads in 1..9 {
                let bands = partition(extent, threads);
                assert_eq!(bands[0].0, 0);
                assert_eq!(bands.last().unwrap().1, extent);
                for w in bands.windows(2) {
                    assert_eq!(w[0].1, w[1].0);
                }
                assert!(bands.len() <= threads);
            }
        }
    }

    #[test]
    fn test_partition_band_size_is_ceiling() {
        assert_eq!(partition(10, 4), vec![(0, 3), (3, 6), (6, 9), (9, 10)]);
        assert_eq!(partition(3, 8), vec![(0, 1), (1, 2), (2, 3)]);
    }

    #[test]
    fn test_identity_filter_transposes() {
        let data: Vec<u32> = (0..6).collect(); // 3 wide, 2 high
        let src = Rows {
            data: &data,
            width: 3,
            height: 2,
            stride: 3,
        };
        let identity = Kernel::identity();
        let monitor = Monitor::new(None, None, 0);
        let out = filter_transposed(src, RowFilter::Weighted(&identity), 2, &monitor).unwrap();
        assert_eq!(out, vec![0, 3, 1, 4, 2, 5]);
    }

    #[test]
    fn test_thread_count_does_not_change_result() {
        let data: Vec<u32> = (0..64u32).map(|i| 0xff00_0000 | (i * 3)).collect();
        let src = Rows {
            data: &data,
            width: 8,
            height: 8,
            stride: 8,
        };
        let kernel = Kernel::gaussian(2.0).unwrap();
        let monitor = Monitor::new(None, None, 0);
        let single = filter_transposed(src, RowFilter::Weighted(&kernel), 1, &monitor).unwrap();
        let many = filter_transposed(src, RowFilter::Weighted(&kernel), 3, &monitor).unwrap();
        assert_eq!(single, many);
    }
}
