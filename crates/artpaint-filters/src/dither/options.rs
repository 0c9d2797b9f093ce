//! Color-reduction options.

use super::DitherAlgorithm;

/// Default number of palette candidates considered by the N-candidate dither.
pub const DEFAULT_CANDIDATES: usize = 4;

/// Gradient magnitude above which the solid-preserving dither treats a pixel
/// as an edge and diffuses error through it.
pub const DEFAULT_EDGE_THRESHOLD: u32 = 0;

/// Configuration for the [`DitherEngine`](super::DitherEngine).
///
/// # Example
///
/// ```
/// use artpaint_filters::{DitherAlgorithm, DitherOptions};
///
/// let options = DitherOptions::new()
///     .algorithm(DitherAlgorithm::NCandidate)
///     .candidates(3)
///     .seed(99);
/// assert_eq!(options.candidates, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DitherOptions {
    /// Reduction strategy.
    ///
    /// Default: [`DitherAlgorithm::FloydSteinberg`]
    pub algorithm: DitherAlgorithm,

    /// How many nearest palette entries the N-candidate dither draws from.
    /// Clamped to the palette size.
    ///
    /// Default: `4`
    pub candidates: usize,

    /// Seed for the N-candidate random draws.
    ///
    /// Default: `0`
    pub seed: u64,

    /// Sobel luminance gradient a pixel must exceed to be dithered by the
    /// solid-preserving variant. Zero dithers every non-flat pixel.
    ///
    /// Default: `0`
    pub edge_threshold: u32,
}

impl Default for DitherOptions {
    fn default() -> Self {
        Self {
            algorithm: DitherAlgorithm::default(),
            candidates: DEFAULT_CANDIDATES,
            seed: 0,
            edge_threshold: DEFAULT_EDGE_THRESHOLD,
        }
    }
}

impl DitherOptions {
    /// Create options with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the reduction strategy.
    #[inline]
    pub fn algorithm(mut self, algorithm: DitherAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the N-candidate candidate count.
    #[inline]
    pub fn candidates(mut self, count: usize) -> Self {
        self.candidates = count;
        self
    }

    /// Set the N-candidate PRNG seed.
    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the solid-preserving edge threshold.
    #[inline]
    pub fn edge_threshold(mut self, threshold: u32) -> Self {
        self.edge_threshold = threshold;
        self
    }
}
