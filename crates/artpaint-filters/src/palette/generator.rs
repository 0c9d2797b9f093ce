//! Iterative palette refinement (Lloyd's algorithm over distinct colors).
//!
//! 1. Collect the distinct RGB colors of the source (or of its selected
//!    pixels), bucketed by their 15-bit quantized key.
//! 2. Seed `k` entries with image colors picked by a seeded PRNG, probing
//!    forward over empty buckets.
//! 3. Repeat: assign each distinct color to its nearest entry, move every
//!    entry to the mean of its members, stop once nothing moves.

use std::collections::{BTreeMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::palette::{Palette, MAX_PALETTE_SIZE};
use crate::buffer::{is_selected, PixelBuffer, Selection};
use crate::color::{Color, ColorMetric};

/// Upper bound on refinement rounds.
pub const MAX_ITERATIONS: usize = 100;

/// Number of 15-bit color keys.
const KEY_SPACE: u32 = 1 << 15;

/// Palette generator configuration.
///
/// # Example
///
/// ```
/// use artpaint_filters::PaletteSettings;
///
/// let settings = PaletteSettings::new().seed(7).max_iterations(20);
/// assert_eq!(settings.seed, 7);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteSettings {
    /// PRNG seed for the initial palette entries.
    ///
    /// Default: `0`
    pub seed: u64,

    /// Refinement rounds before giving up on convergence (capped at
    /// [`MAX_ITERATIONS`]).
    ///
    /// Default: `100`
    pub max_iterations: usize,
}

impl Default for PaletteSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            max_iterations: MAX_ITERATIONS,
        }
    }
}

impl PaletteSettings {
    /// Default settings.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the seeding PRNG seed.
    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the refinement round limit.
    #[inline]
    pub fn max_iterations(mut self, rounds: usize) -> Self {
        self.max_iterations = rounds;
        self
    }
}

/// A generated palette plus how the refinement went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteReport {
    /// The refined palette.
    pub palette: Palette,
    /// Refinement rounds executed.
    pub iterations: usize,
    /// True when the last round moved no entry.
    pub converged: bool,
}

/// Builds a palette of `k` colors from an image.
///
/// The generator borrows a [`ColorMetric`] instead of owning lookup tables,
/// so one metric can serve palette generation and the dither that follows.
/// With a selection only the selected pixels contribute colors; an empty
/// selection falls back to the whole image.
///
/// # Example
///
/// ```
/// use artpaint_filters::{Color, ColorMetric, PaletteGenerator, PaletteSettings, PixelBuffer};
///
/// let mut image = PixelBuffer::filled(4, 1, Color::rgb(0, 0, 0)).unwrap();
/// image.set(3, 0, Color::rgb(255, 255, 255));
///
/// let metric = ColorMetric::new();
/// let palette = PaletteGenerator::new(&metric, PaletteSettings::new()).generate(&image, 2);
/// assert_eq!(palette.len(), 2);
/// ```
#[derive(Clone)]
pub struct PaletteGenerator<'a> {
    metric: &'a ColorMetric,
    settings: PaletteSettings,
    selection: Option<&'a dyn Selection>,
}

impl<'a> PaletteGenerator<'a> {
    /// Create a generator using `metric` for nearest-entry assignment.
    pub fn new(metric: &'a ColorMetric, settings: PaletteSettings) -> Self {
        Self {
            metric,
            settings,
            selection: None,
        }
    }

    /// Only sample colors of pixels the selection contains.
    #[inline]
    pub fn selection(mut self, selection: &'a dyn Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Generate a palette of at most `k` colors.
    ///
    /// `k` is clamped to `1..=256`; an image with fewer than `k` distinct
    /// colors yields a palette of exactly those colors.
    pub fn generate(&self, source: &PixelBuffer, k: usize) -> Palette {
        self.generate_with_report(source, k).palette
    }

    /// Generate a palette and report the number of rounds it took.
    pub fn generate_with_report(&self, source: &PixelBuffer, k: usize) -> PaletteReport {
        let k = k.clamp(1, MAX_PALETTE_SIZE);
        let mut buckets = distinct_colors(source, self.selection);
        if buckets.is_empty() {
            tracing::debug!("Selection is empty, sampling the whole image");
            buckets = distinct_colors(source, None);
        }
        let distinct: Vec<Color> = buckets.values().flatten().copied().collect();

        let mut entries = if distinct.len() <= k {
            distinct.clone()
        } else {
            seed_entries(&buckets, k, self.settings.seed)
        };

        let limit = self.settings.max_iterations.clamp(1, MAX_ITERATIONS);
        let mut iterations = 0;
        let mut converged = false;
        while iterations < limit {
            iterations += 1;
            let movement = self.refine(&distinct, &mut entries);
            if movement == 0.0 {
                converged = true;
                break;
            }
        }

        if !converged {
            tracing::warn!(
                k,
                iterations,
                "Palette refinement stopped before converging"
            );
        }
        tracing::debug!(
            k,
            distinct = distinct.len(),
            iterations,
            "Palette generated"
        );

        PaletteReport {
            palette: Palette::from_vec_unchecked(entries),
            iterations,
            converged,
        }
    }

    /// One assignment/update round. Returns the summed distance the
    /// entries moved.
    fn refine(&self, distinct: &[Color], entries: &mut [Color]) -> f32 {
        let mut sums = vec![[0u64; 3]; entries.len()];
        let mut counts = vec![0u64; entries.len()];

        for &color in distinct {
            let nearest = self.metric.nearest_index(color, entries);
            let sum = &mut sums[nearest];
            sum[0] += u64::from(color.r);
            sum[1] += u64::from(color.g);
            sum[2] += u64::from(color.b);
            counts[nearest] += 1;
        }

        let mut movement = 0.0;
        for ((entry, sum), &count) in entries.iter_mut().zip(&sums).zip(&counts) {
            if count == 0 {
                continue;
            }
            let mean = |s: u64| ((s + count / 2) / count) as u8;
            let updated = Color::rgb(mean(sum[0]), mean(sum[1]), mean(sum[2]));
            movement += self.metric.distance(*entry, updated);
            *entry = updated;
        }
        movement
    }
}

/// Distinct opaque RGB colors of the selected pixels of `source`, grouped
/// by 15-bit key. Each bucket keeps first-seen order so the result is
/// deterministic.
fn distinct_colors(
    source: &PixelBuffer,
    selection: Option<&dyn Selection>,
) -> BTreeMap<u16, Vec<Color>> {
    let mut seen = HashSet::new();
    let mut buckets: BTreeMap<u16, Vec<Color>> = BTreeMap::new();
    for y in 0..source.height() {
        for (x, &pixel) in source.row(y).iter().enumerate() {
            if !is_selected(selection, x as i32, y as i32) {
                continue;
            }
            let color = Color::from_bgra(pixel).opaque();
            if seen.insert(color) {
                buckets.entry(color.key15()).or_default().push(color);
            }
        }
    }
    buckets
}

/// Pick `k` distinct colors: draw a random key, walk forward (wrapping)
/// to the first bucket holding a color not yet chosen.
///
/// Requires more than `k` distinct colors in `buckets`.
fn seed_entries(buckets: &BTreeMap<u16, Vec<Color>>, k: usize, seed: u64) -> Vec<Color> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut chosen = HashSet::with_capacity(k);
    let mut entries = Vec::with_capacity(k);

    while entries.len() < k {
        let start = rng.gen_range(0..KEY_SPACE) as u16;
        let probe = buckets
            .range(start..)
            .chain(buckets.range(..start))
            .flat_map(|(_, colors)| colors.iter())
            .find(|color| !chosen.contains(*color));
        match probe {
            Some(&color) => {
                chosen.insert(color);
                entries.push(color);
            }
            None => break,
        }
    }
    entries
}
