//! Stochastic reduction among the N nearest palette entries.
//!
//! For each quantized color the closest `candidates` entries are ranked and
//! given inverse-distance probabilities; every pixel then draws one of them.
//! The result is a noise-like texture instead of the banding of a
//! deterministic mapping.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::api::FilterError;
use crate::buffer::{try_alloc, PixelBuffer};
use crate::color::{Color, ColorMetric};
use crate::palette::Palette;
use crate::progress::scan_rows;

use super::{Dither, DitherContext};

/// Entries further than this multiple of the nearest distance are never
/// candidates.
pub const CANDIDATE_DISTANCE_FACTOR: f32 = 5.0;

/// Palette entries and cumulative probabilities for one quantized color.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Candidates {
    indices: Vec<u8>,
    cumulative: Vec<f32>,
}

impl Candidates {
    /// Rank the `count` entries nearest to `color`.
    pub(crate) fn rank(metric: &ColorMetric, palette: &[Color], color: Color, count: usize) -> Self {
        let mut ranked: Vec<(u32, usize)> = palette
            .iter()
            .enumerate()
            .map(|(i, &entry)| (metric.distance_squared(color, entry), i))
            .collect();
        ranked.sort_unstable();
        ranked.truncate(count.clamp(1, palette.len()));

        let nearest = metric.root(ranked[0].0);
        if ranked[0].0 == 0 {
            return Self {
                indices: vec![ranked[0].1 as u8],
                cumulative: vec![1.0],
            };
        }

        let limit = nearest * CANDIDATE_DISTANCE_FACTOR;
        let (indices, weights): (Vec<u8>, Vec<f32>) = ranked
            .iter()
            .map(|&(d, i)| (i as u8, metric.root(d)))
            .filter(|&(_, distance)| distance <= limit)
            .map(|(i, distance)| (i, 1.0 / distance))
            .unzip();

        let total: f32 = weights.iter().sum();
        let mut running = 0.0;
        let mut cumulative: Vec<f32> = weights
            .iter()
            .map(|w| {
                running += w / total;
                running
            })
            .collect();
        if let Some(last) = cumulative.last_mut() {
            *last = 1.0;
        }
        Self {
            indices,
            cumulative,
        }
    }

    /// Candidate whose cumulative probability first reaches `draw`.
    #[inline]
    pub(crate) fn pick(&self, draw: f32) -> u8 {
        let slot = self
            .cumulative
            .iter()
            .position(|&p| draw < p)
            .unwrap_or(self.cumulative.len() - 1);
        self.indices[slot]
    }
}

/// Inverse-distance weighted random choice among the nearest entries.
pub(crate) struct NCandidate;

impl Dither for NCandidate {
    fn dither(
        &self,
        source: &PixelBuffer,
        palette: &Palette,
        ctx: &DitherContext<'_>,
    ) -> Result<Vec<u8>, FilterError> {
        let width = source.width() as usize;
        let count = ctx.options.candidates.clamp(1, palette.len());
        let mut table: Vec<Option<Candidates>> = try_alloc(1 << 15, None)?;
        let mut rng = StdRng::seed_from_u64(ctx.options.seed);
        let mut indices = try_alloc(source.pixel_count(), 0u8)?;

        scan_rows(source.height(), &ctx.monitor, |y| {
            let out = &mut indices[y as usize * width..(y as usize + 1) * width];
            for (dst, &p) in out.iter_mut().zip(source.row(y)) {
                let color = Color::from_bgra(p);
                let candidates = table[color.key15() as usize].get_or_insert_with(|| {
                    Candidates::rank(ctx.metric, palette.colors(), color, count)
                });
                *dst = candidates.pick(rng.gen::<f32>());
            }
        })?;
        Ok(indices)
    }
}
