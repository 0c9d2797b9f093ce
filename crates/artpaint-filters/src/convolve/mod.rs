//! One-dimensional convolution over packed BGRA rows.
//!
//! Rows (or, after a transpose, columns) are convolved independently.
//! Callers pad each row on both ends by the kernel radius, replicating
//! the first and last real pixel, so that the image border neither
//! darkens nor wraps around.
//!
//! # Alpha handling
//!
//! The alpha channel is always accumulated. Color channels of pixels whose
//! alpha is zero are skipped, so fully transparent pixels contribute no
//! (meaningless) color to their neighbours.
//!
//! # Transposed output
//!
//! [`convolve_with`] hands each result to a closure instead of writing it
//! to a fixed location. The blur uses this to store the horizontal pass
//! rotated by 90 degrees, which lets the second pass reuse the same
//! horizontal routine for what is really a vertical blur.

mod kernel;

pub use kernel::{Kernel, FIXED_ONE, FIXED_SHIFT, GAUSSIAN_CUTOFF};

const ALPHA_SHIFT: u32 = 24;

#[inline]
fn channels(p: u32) -> [u32; 4] {
    [p & 0xff, (p >> 8) & 0xff, (p >> 16) & 0xff, p >> ALPHA_SHIFT]
}

#[inline]
fn pack(b: u32, g: u32, r: u32, a: u32) -> u32 {
    (a << ALPHA_SHIFT) | (r << 16) | (g << 8) | b
}

/// Fill `out` with `row`, padded by `radius` copies of its first and last
/// pixel on either side.
///
/// # Panics (debug only)
///
/// Debug-asserts that `row` is not empty.
pub fn pad_edges(row: &[u32], radius: usize, out: &mut Vec<u32>) {
    debug_assert!(!row.is_empty());
    out.clear();
    out.reserve(row.len() + 2 * radius);
    out.extend(std::iter::repeat(row[0]).take(radius));
    out.extend_from_slice(row);
    out.extend(std::iter::repeat(row[row.len() - 1]).take(radius));
}

/// Convolve `length` output pixels from a pre-padded `source`.
///
/// `source` must hold at least `length + 2 * kernel.radius()` pixels.
///
/// # Example
///
/// ```
/// use artpaint_filters::convolve::{convolve_1d, pad_edges};
/// use artpaint_filters::{Color, Kernel};
///
/// let kernel = Kernel::gaussian(2.0).unwrap();
/// let row = vec![Color::rgb(9, 9, 9).to_bgra(); 5];
/// let mut padded = Vec::new();
/// pad_edges(&row, kernel.radius() as usize, &mut padded);
///
/// assert_eq!(convolve_1d(&padded, row.len(), &kernel), row);
/// ```
pub fn convolve_1d(source: &[u32], length: usize, kernel: &Kernel) -> Vec<u32> {
    let mut out = Vec::with_capacity(length);
    convolve_with(source, length, kernel, |_, p| out.push(p));
    out
}

/// Convolve `length` output pixels from a pre-padded `source`, passing
/// `(index, pixel)` for each result to `emit` in increasing index order.
#[inline]
pub fn convolve_with<F>(source: &[u32], length: usize, kernel: &Kernel, mut emit: F)
where
    F: FnMut(usize, u32),
{
    let taps = kernel.weights();
    debug_assert!(source.len() >= length + taps.len() - 1);

    for (i, window) in source.windows(taps.len()).take(length).enumerate() {
        let (mut b, mut g, mut r, mut a) = (0u32, 0u32, 0u32, 0u32);
        for (&p, &w) in window.iter().zip(taps) {
            let w = w as u32;
            let [pb, pg, pr, pa] = channels(p);
            a += pa * w;
            if pa != 0 {
                b += pb * w;
                g += pg * w;
                r += pr * w;
            }
        }
        emit(
            i,
            pack(b >> FIXED_SHIFT, g >> FIXED_SHIFT, r >> FIXED_SHIFT, a >> FIXED_SHIFT),
        );
    }
}

/// Box-filter variant of [`convolve_with`] using a moving sum.
///
/// Costs O(1) per output pixel regardless of `radius`. Each channel is the
/// rounded mean over the `2 * radius + 1` window, with the same
/// zero-alpha exclusion as the weighted path.
pub fn convolve_box_with<F>(source: &[u32], length: usize, radius: usize, mut emit: F)
where
    F: FnMut(usize, u32),
{
    let taps = 2 * radius + 1;
    debug_assert!(source.len() >= length + taps - 1);
    if length == 0 {
        return;
    }

    let mut sums = [0u32; 4];
    for &p in &source[..taps] {
        accumulate(&mut sums, p);
    }

    let n = taps as u32;
    let mean = |s: u32| (s + n / 2) / n;
    for i in 0..length {
        emit(
            i,
            pack(mean(sums[0]), mean(sums[1]), mean(sums[2]), mean(sums[3])),
        );
        if i + 1 < length {
            retire(&mut sums, source[i]);
            accumulate(&mut sums, source[i + taps]);
        }
    }
}

#[inline]
fn accumulate(sums: &mut [u32; 4], p: u32) {
    let c = channels(p);
    if c[3] != 0 {
        sums[0] += c[0];
        sums[1] += c[1];
        sums[2] += c[2];
    }
    sums[3] += c[3];
}

#[inline]
fn retire(sums: &mut [u32; 4], p: u32) {
    let c = channels(p);
    if c[3] != 0 {
        sums[0] -= c[0];
        sums[1] -= c[1];
        sums[2] -= c[2];
    }
    sums[3] -= c[3];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    fn padded(row: &[u32], radius: usize) -> Vec<u32> {
        let mut out = Vec::new();
        pad_edges(row, radius, &mut out);
        out
    }

    #[test]
    fn test_pad_edges_replicates_ends() {
        let out = padded(&[1, 2, 3], 2);
        assert_eq!(out, vec![1, 1, 1, 2, 3, 3, 3]);
    }

    #[test]
    fn test_identity_kernel_copies() {
        let row = [0x1122_3344, 0xff00_ff00, 0x0000_0000];
        assert_eq!(convolve_1d(&row, 3, &Kernel::identity()), row.to_vec());
    }

    #[test]
    fn test_flat_row_is_unchanged() {
        let kernel = Kernel::gaussian(7.5).unwrap();
        let row = vec![Color::new(17, 99, 230, 128).to_bgra(); 12];
        let src = padded(&row, kernel.radius() as usize);
        assert_eq!(convolve_1d(&src, row.len(), &kernel), row);
    }

    #[test]
    fn test_transparent_neighbours_contribute_no_color() {
        // Center tap 0.5, neighbours 0.25 each.
        let kernel = Kernel::from_real_weights(&[1.0, 2.0, 1.0]).unwrap();
        let red = Color::rgb(200, 0, 0).to_bgra();
        let ghost = Color::new(0, 0, 255, 0).to_bgra();
        let out = convolve_1d(&[ghost, red, ghost], 1, &kernel);

        let c = Color::from_bgra(out[0]);
        assert_eq!(c.b, 0, "transparent blue must not leak in");
        assert_eq!(c.r, 100);
        assert_eq!(c.a, 127);
    }

    #[test]
    fn test_step_edge_is_smoothed_monotonically() {
        let kernel = Kernel::gaussian(3.0).unwrap();
        let mut row = vec![Color::BLACK.to_bgra(); 8];
        row.extend(vec![Color::WHITE.to_bgra(); 8]);
        let src = padded(&row, kernel.radius() as usize);
        let out = convolve_1d(&src, row.len(), &kernel);

        let reds: Vec<u8> = out.iter().map(|&p| Color::from_bgra(p).r).collect();
        assert!(reds.windows(2).all(|w| w[0] <= w[1]), "{reds:?}");
        assert_eq!(reds[0], 0);
        assert_eq!(reds[15], 255);
    }

    #[test]
    fn test_box_moving_sum_matches_direct_mean() {
        let row: Vec<u32> = (0..10u8)
            .map(|i| Color::rgb(i * 20, 255 - i * 20, 7).to_bgra())
            .collect();
        let radius = 2;
        let src = padded(&row, radius);

        let mut fast = Vec::new();
        convolve_box_with(&src, row.len(), radius, |_, p| fast.push(p));

        for (i, &p) in fast.iter().enumerate() {
            let window = &src[i..i + 2 * radius + 1];
            let sum: u32 = window.iter().map(|&q| Color::from_bgra(q).r as u32).sum();
            let expected = (sum + 2) / 5;
            assert_eq!(Color::from_bgra(p).r as u32, expected, "pixel {i}");
        }
    }

    #[test]
    fn test_box_flat_row_is_unchanged() {
        let row = vec![Color::new(3, 200, 77, 255).to_bgra(); 9];
        let src = padded(&row, 3);
        let mut out = Vec::new();
        convolve_box_with(&src, row.len(), 3, |_, p| out.push(p));
        assert_eq!(out, row);
    }
}
