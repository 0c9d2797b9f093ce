//! Color reduction against an arbitrary palette.
//!
//! # Algorithms
//!
//! - **Nearest**: every pixel takes its closest palette entry.
//! - **Floyd-Steinberg**: classic error diffusion, 100% propagation.
//! - **Preserve solids**: Floyd-Steinberg on gradients, plain nearest on
//!   flat regions, so solid fills stay solid.
//! - **N-candidate**: random draw among the nearest entries weighted by
//!   inverse distance.
//!
//! All four produce an [`IndexedImage`] and share the same signature. The
//! error-diffusion variants are sequential and run on the calling thread.

mod floyd_steinberg;
mod n_candidate;
mod nearest;
mod options;
mod preserve_solids;

pub use n_candidate::CANDIDATE_DISTANCE_FACTOR;
pub use options::{DitherOptions, DEFAULT_CANDIDATES, DEFAULT_EDGE_THRESHOLD};

use crate::api::FilterError;
use crate::buffer::PixelBuffer;
use crate::color::ColorMetric;
use crate::output::IndexedImage;
use crate::palette::Palette;
use crate::progress::{CancelFlag, Monitor, ProgressSink};

use floyd_steinberg::FloydSteinberg;
use n_candidate::NCandidate;
use nearest::Nearest;
use preserve_solids::PreserveSolids;

/// Color-reduction strategy.
///
/// # Example
///
/// ```
/// use artpaint_filters::DitherAlgorithm;
///
/// assert_eq!(DitherAlgorithm::default(), DitherAlgorithm::FloydSteinberg);
/// assert_eq!("n-candidate".parse::<DitherAlgorithm>(), Ok(DitherAlgorithm::NCandidate));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DitherAlgorithm {
    /// Closest palette entry, memoized per quantized color.
    Nearest,
    /// Floyd-Steinberg error diffusion.
    #[default]
    FloydSteinberg,
    /// Error diffusion on edges only; flat areas map to their nearest entry.
    PreserveSolids,
    /// Inverse-distance weighted random choice among the nearest entries.
    NCandidate,
}

impl DitherAlgorithm {
    /// All variants, in declaration order.
    pub const ALL: [DitherAlgorithm; 4] = [
        DitherAlgorithm::Nearest,
        DitherAlgorithm::FloydSteinberg,
        DitherAlgorithm::PreserveSolids,
        DitherAlgorithm::NCandidate,
    ];

    /// Kebab-case name, as accepted by [`FromStr`](std::str::FromStr).
    pub fn name(self) -> &'static str {
        match self {
            DitherAlgorithm::Nearest => "nearest",
            DitherAlgorithm::FloydSteinberg => "floyd-steinberg",
            DitherAlgorithm::PreserveSolids => "preserve-solids",
            DitherAlgorithm::NCandidate => "n-candidate",
        }
    }

    fn implementation(self) -> &'static dyn Dither {
        match self {
            DitherAlgorithm::Nearest => &Nearest,
            DitherAlgorithm::FloydSteinberg => &FloydSteinberg,
            DitherAlgorithm::PreserveSolids => &PreserveSolids,
            DitherAlgorithm::NCandidate => &NCandidate,
        }
    }
}

impl std::fmt::Display for DitherAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for DitherAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DitherAlgorithm::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| format!("unknown dither algorithm: {s}"))
    }
}

/// Everything an algorithm needs besides the image and palette.
pub(crate) struct DitherContext<'a> {
    pub metric: &'a ColorMetric,
    pub options: &'a DitherOptions,
    pub monitor: Monitor<'a>,
}

/// One color-reduction algorithm.
pub(crate) trait Dither {
    /// Reduce `source` to row-major palette indices.
    fn dither(
        &self,
        source: &PixelBuffer,
        palette: &Palette,
        ctx: &DitherContext<'_>,
    ) -> Result<Vec<u8>, FilterError>;
}

/// Builder-style color reducer.
///
/// # Example
///
/// ```
/// use artpaint_filters::{Color, ColorMetric, DitherAlgorithm, DitherEngine, DitherOptions, Palette, PixelBuffer};
///
/// let metric = ColorMetric::new();
/// let palette = Palette::new(&[Color::BLACK, Color::WHITE]).unwrap();
/// let source = PixelBuffer::filled(2, 2, Color::rgb(200, 200, 200)).unwrap();
///
/// let engine = DitherEngine::new(&metric, DitherOptions::new().algorithm(DitherAlgorithm::Nearest));
/// let image = engine.reduce(&source, &palette).unwrap();
/// assert!(image.indices().iter().all(|&i| i == 1));
/// ```
#[derive(Clone)]
pub struct DitherEngine<'a> {
    metric: &'a ColorMetric,
    options: DitherOptions,
    progress: Option<&'a dyn ProgressSink>,
    cancel: Option<&'a CancelFlag>,
}

impl<'a> DitherEngine<'a> {
    /// Create an engine using `metric` for every distance computation.
    pub fn new(metric: &'a ColorMetric, options: DitherOptions) -> Self {
        Self {
            metric,
            options,
            progress: None,
            cancel: None,
        }
    }

    /// Report progress to `sink`.
    #[inline]
    pub fn progress(mut self, sink: &'a dyn ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Poll `flag` between rows.
    #[inline]
    pub fn cancel(mut self, flag: &'a CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// The options this engine runs with.
    pub fn options(&self) -> &DitherOptions {
        &self.options
    }

    /// Reduce `source` to `palette`.
    ///
    /// Alpha is ignored; the result is always fully indexed.
    pub fn reduce(&self, source: &PixelBuffer, palette: &Palette) -> Result<IndexedImage, FilterError> {
        let algorithm = self.options.algorithm;
        tracing::debug!(
            width = source.width(),
            height = source.height(),
            colors = palette.len(),
            %algorithm,
            "Dither started"
        );

        let ctx = DitherContext {
            metric: self.metric,
            options: &self.options,
            monitor: Monitor::new(self.progress, self.cancel, source.height() as usize),
        };
        let indices = match algorithm.implementation().dither(source, palette, &ctx) {
            Ok(indices) => indices,
            Err(FilterError::Cancelled) => {
                tracing::info!(%algorithm, "Dither cancelled");
                return Err(FilterError::Cancelled);
            }
            Err(e) => return Err(e),
        };

        Ok(IndexedImage::new(
            indices,
            source.width(),
            source.height(),
            palette.clone(),
        ))
    }
}
