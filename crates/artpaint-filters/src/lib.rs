#![allow(clippy::needless_range_loop, clippy::module_inception)]

//! artpaint-filters: the pixel-processing engine behind ArtPaint's effects.
//!
//! Every algorithm here operates directly on packed 32-bit BGRA rasters
//! ([`PixelBuffer`]) and knows nothing about windows, menus or add-on
//! loading. A host application hands in a buffer, an optional
//! [`Selection`] and a settings value, and gets back either a mutated
//! buffer, a newly allocated one, an [`IndexedImage`], or a list of
//! selection [`Polygon`]s.
//!
//! # Quick Start
//!
//! ```
//! use artpaint_filters::{BlurEngine, BlurSettings, Color, PixelBuffer};
//!
//! let mut buffer = PixelBuffer::filled(4, 4, Color::rgb(255, 0, 0)).unwrap();
//! BlurEngine::new(BlurSettings::new(3.0)).apply(&mut buffer).unwrap();
//!
//! // A flat field stays flat: the fixed-point kernel sums to exactly 1.0.
//! assert!(buffer.iter().all(|c| c == Color::rgb(255, 0, 0)));
//! ```
//!
//! # Components
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`buffer`] | [`PixelBuffer`] raster, geometry validation, [`Selection`] predicates |
//! | [`color`] | [`Color`] packing and the table-driven [`ColorMetric`] |
//! | [`convolve`] | Q15 [`Kernel`]s and the 1-D edge-replicating convolution |
//! | [`blur`] | Separable Gaussian / box blur, fork/join over scoped threads |
//! | [`dither`] | Nearest, Floyd-Steinberg, solid-preserving FS and N-candidate reduction |
//! | [`palette`] | [`Palette`] storage and the iterative [`PaletteGenerator`] |
//! | [`equalize`] | Contrast-limited adaptive histogram equalization |
//! | [`selection`] | Boundary-following [`SelectionTracer`] producing winding-tagged polygons |
//! | [`api`] | [`Manipulation`] dispatcher and the unified [`FilterError`] |
//!
//! # Fixed-point arithmetic
//!
//! Convolution weights and error-diffusion residuals use Q15 integers
//! (scale 2^15 = 32768). Kernels are quantized so their weights sum to
//! exactly 32768, which is what keeps a flat image bit-identical after any
//! number of blur passes.
//!
//! # Threading
//!
//! Only the blur is multi-threaded. Each pass splits the image into
//! `ceil(extent / threads)` bands and runs them on [`std::thread::scope`]
//! workers; every worker owns a disjoint output tile, so no locking is
//! involved. Error diffusion and contour tracing run on the calling thread
//! because each step depends on the previous one.

pub mod api;
pub mod blur;
pub mod buffer;
pub mod color;
pub mod convolve;
pub mod dither;
pub mod equalize;
pub mod output;
pub mod palette;
pub mod progress;
pub mod selection;


pub use api::{
    ApplyContext, FilterError, Manipulation, ManipulationOutput, PaletteSource, RenderMode,
};
pub use blur::{BlurEngine, BlurSettings};
pub use buffer::{AllPixels, BufferError, PixelBuffer, Selection, SelectionMask};
pub use color::{Color, ColorMetric};
pub use convolve::Kernel;
pub use dither::{DitherAlgorithm, DitherEngine, DitherOptions};
pub use equalize::{AdaptiveHistogramEqualizer, EqualizeSettings, GrayPlane, MappingFunction};
pub use output::IndexedImage;
pub use palette::{
    Palette, PaletteError, PaletteGenerator, PaletteReport, PaletteSettings, ParseColorError,
};
pub use progress::{CancelFlag, NoProgress, ProgressSink};
pub use selection::{Polygon, SelectionTracer, TraceSettings, Winding};
