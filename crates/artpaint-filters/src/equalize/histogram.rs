//! Tile histograms, contrast limiting and the resulting 8-bit remap.

/// Number of histogram bins.
pub const BINS: usize = 256;

/// A monotone brightness remap produced by equalizing one tile.
///
/// # Example
///
/// ```
/// use artpaint_filters::MappingFunction;
///
/// let mut histogram = [0u32; 256];
/// histogram[10] = 50;
/// histogram[20] = 50;
///
/// let map = MappingFunction::from_histogram(&histogram, None);
/// assert_eq!(map.apply(10), 128);
/// assert_eq!(map.apply(20), 255);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingFunction {
    table: [u8; BINS],
}

impl MappingFunction {
    /// The remap that changes nothing.
    pub fn identity() -> Self {
        Self {
            table: std::array::from_fn(|v| v as u8),
        }
    }

    /// Build the remap from a 256-bin histogram, optionally clipping every
    /// bin to at most `clip_limit` counts first.
    ///
    /// An empty histogram divides by one instead of zero and maps everything
    /// to 0.
    pub fn from_histogram(histogram: &[u32; BINS], clip_limit: Option<u32>) -> Self {
        let mut bins = *histogram;
        if let Some(limit) = clip_limit {
            clip(&mut bins, limit.max(1));
        }

        let mut cumulative = [0u64; BINS];
        let mut running = 0u64;
        for (c, &count) in cumulative.iter_mut().zip(&bins) {
            running += u64::from(count);
            *c = running;
        }

        let total = cumulative[BINS - 1].max(1);
        Self {
            table: std::array::from_fn(|v| ((cumulative[v] * 255 + total / 2) / total) as u8),
        }
    }

    /// Remapped value of `v`.
    #[inline]
    pub fn apply(&self, v: u8) -> u8 {
        self.table[v as usize]
    }

    /// The full lookup table.
    #[inline]
    pub fn table(&self) -> &[u8; BINS] {
        &self.table
    }

    /// True when the table never decreases.
    pub fn is_monotone(&self) -> bool {
        self.table.windows(2).all(|w| w[0] <= w[1])
    }
}

/// Counts above `threshold`, summed over all bins.
fn excess(bins: &[u32; BINS], threshold: u32) -> u64 {
    bins.iter()
        .map(|&b| u64::from(b.saturating_sub(threshold)))
        .sum()
}

/// Contrast limiting.
///
/// Finds the largest threshold `T` such that cutting every bin at `T` and
/// spreading the cut-off counts evenly over all bins leaves no bin above
/// `limit`, then performs that cut and redistribution. Counts that do not
/// divide evenly go one each to the lowest bins, so the total is unchanged;
/// the threshold already accounts for that extra count.
///
/// A histogram holding more than `BINS * limit` samples cannot satisfy the
/// limit at all and ends up flat.
pub(crate) fn clip(bins: &mut [u32; BINS], limit: u32) {
    let peak = bins.iter().copied().max().unwrap_or(0);
    if peak <= limit {
        return;
    }

    // T + ceil(excess(T) / BINS) never decreases with T, so bisect on it.
    let original = *bins;
    let fits = |t: u32| {
        u64::from(t) + excess(&original, t).div_ceil(BINS as u64) <= u64::from(limit)
    };
    let (mut lo, mut hi) = (0u32, limit);
    if !fits(lo) {
        hi = 0;
    }
    while lo < hi {
        let mid = lo + (hi - lo).div_ceil(2);
        if fits(mid) {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    let threshold = lo;

    let cut = excess(&original, threshold);
    let per_bin = (cut / BINS as u64) as u32;
    let remainder = (cut % BINS as u64) as usize;
    for (i, bin) in bins.iter_mut().enumerate() {
        *bin = (*bin).min(threshold) + per_bin + u32::from(i < remainder);
    }
}
