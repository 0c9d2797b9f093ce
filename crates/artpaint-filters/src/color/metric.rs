//! Table-driven Euclidean color distance.

use super::bgra::Color;

/// Largest possible squared RGB distance (`3 * 255^2`).
pub const MAX_DISTANCE_SQUARED: u32 = 3 * 255 * 255;

/// Euclidean distance in RGB space with precomputed lookup tables.
///
/// Holds a table of squared channel differences (`-255..=255`) and a table
/// of square roots for every reachable squared distance, so neither the
/// nearest-color search nor the candidate weighting in dithering performs
/// a multiplication or a `sqrt` per pixel.
///
/// A metric is an ordinary owned value: build one per operation (or keep
/// one around in the caller) and pass it by reference. Alpha is ignored by
/// every method.
#[derive(Debug, Clone)]
pub struct ColorMetric {
    squares: Vec<u32>,
    roots: Vec<f32>,
}

impl ColorMetric {
    /// Build the square and square-root tables.
    pub fn new() -> Self {
        let squares = (-255i32..=255).map(|d| (d * d) as u32).collect();
        let roots = (0..=MAX_DISTANCE_SQUARED)
            .map(|d| (d as f32).sqrt())
            .collect();
        Self { squares, roots }
    }

    /// Square of a signed channel difference in `-255..=255`.
    #[inline]
    pub fn square(&self, diff: i32) -> u32 {
        self.squares[(diff + 255) as usize]
    }

    /// Squared Euclidean RGB distance.
    #[inline]
    pub fn distance_squared(&self, a: Color, b: Color) -> u32 {
        self.square(a.r as i32 - b.r as i32)
            + self.square(a.g as i32 - b.g as i32)
            + self.square(a.b as i32 - b.b as i32)
    }

    /// Euclidean RGB distance.
    #[inline]
    pub fn distance(&self, a: Color, b: Color) -> f32 {
        self.roots[self.distance_squared(a, b) as usize]
    }

    /// Square root of a squared distance, via the table.
    #[inline]
    pub fn root(&self, distance_squared: u32) -> f32 {
        self.roots[distance_squared.min(MAX_DISTANCE_SQUARED) as usize]
    }

    /// Index of the palette entry closest to `color`.
    ///
    /// Ties resolve to the lowest index. Returns 0 for an empty palette so
    /// that callers holding a validated palette never need to unwrap.
    #[inline]
    pub fn nearest_index(&self, color: Color, palette: &[Color]) -> usize {
        self.nearest_with_distance(color, palette).0
    }

    /// Index of the closest palette entry together with its squared distance.
    pub fn nearest_with_distance(&self, color: Color, palette: &[Color]) -> (usize, u32) {
        let mut best = (0, u32::MAX);
        for (i, &entry) in palette.iter().enumerate() {
            let d = self.distance_squared(color, entry);
            if d < best.1 {
                best = (i, d);
                if d == 0 {
                    break;
                }
            }
        }
        best
    }
}

impl Default for ColorMetric {
    fn default() -> Self {
        Self::new()
    }
}
