//! A closed set of image manipulations dispatched by variant.

use crate::blur::{BlurEngine, BlurSettings};
use crate::buffer::{BufferError, PixelBuffer, Selection, SelectionMask};
use crate::color::ColorMetric;
use crate::dither::{DitherEngine, DitherOptions};
use crate::equalize::{AdaptiveHistogramEqualizer, EqualizeSettings};
use crate::output::IndexedImage;
use crate::palette::{Palette, PaletteGenerator, PaletteSettings};
use crate::progress::{CancelFlag, ProgressSink};
use crate::selection::{Polygon, SelectionTracer, TraceSettings};

use super::FilterError;

/// How much quality an invocation may trade for speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Interactive feedback: blurs use the box approximation and no
    /// progress is reported.
    Preview,
    /// Final result with exact kernels.
    #[default]
    Commit,
}

/// Where a dither gets its palette from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteSource {
    /// A caller-supplied palette, e.g. a fixed system palette.
    Fixed(Palette),
    /// Generate `colors` entries from the image being dithered.
    Generated {
        colors: usize,
        settings: PaletteSettings,
    },
}

/// Collaborators shared by every manipulation.
///
/// # Example
///
/// ```
/// use artpaint_filters::{ApplyContext, ColorMetric, RenderMode};
///
/// let metric = ColorMetric::new();
/// let ctx = ApplyContext::new(&metric).mode(RenderMode::Preview);
/// assert_eq!(ctx.render_mode(), RenderMode::Preview);
/// ```
#[derive(Clone, Copy)]
pub struct ApplyContext<'a> {
    metric: &'a ColorMetric,
    selection: Option<&'a dyn Selection>,
    progress: Option<&'a dyn ProgressSink>,
    cancel: Option<&'a CancelFlag>,
    mode: RenderMode,
}

impl<'a> ApplyContext<'a> {
    /// A context with no selection, progress sink or cancel flag, in
    /// [`RenderMode::Commit`].
    pub fn new(metric: &'a ColorMetric) -> Self {
        Self {
            metric,
            selection: None,
            progress: None,
            cancel: None,
            mode: RenderMode::Commit,
        }
    }

    /// Restrict writes to `selection`.
    #[inline]
    pub fn selection(mut self, selection: &'a dyn Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Report progress to `sink` (ignored in preview mode).
    #[inline]
    pub fn progress(mut self, sink: &'a dyn ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Poll `flag` during long operations.
    #[inline]
    pub fn cancel(mut self, flag: &'a CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Set the render mode.
    #[inline]
    pub fn mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    #[inline]
    pub fn render_mode(&self) -> RenderMode {
        self.mode
    }

    fn sink(&self) -> Option<&'a dyn ProgressSink> {
        match self.mode {
            RenderMode::Preview => None,
            RenderMode::Commit => self.progress,
        }
    }
}

/// What a manipulation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ManipulationOutput {
    /// A new buffer the size of the source.
    Pixels(PixelBuffer),
    /// A palette-indexed image.
    Indexed(IndexedImage),
    /// Selection outlines.
    Polygons(Vec<Polygon>),
    /// The settings made this a no-op; the source stands.
    Unchanged,
}

impl ManipulationOutput {
    /// The result as pixels: indexed images are expanded, polygons and
    /// no-ops yield `None`.
    pub fn into_pixel_buffer(self) -> Result<Option<PixelBuffer>, BufferError> {
        match self {
            ManipulationOutput::Pixels(buffer) => Ok(Some(buffer)),
            ManipulationOutput::Indexed(image) => image.to_pixel_buffer().map(Some),
            ManipulationOutput::Polygons(_) | ManipulationOutput::Unchanged => Ok(None),
        }
    }
}

/// One of the engine operations, with its settings.
///
/// # Example
///
/// ```
/// use artpaint_filters::{
///     ApplyContext, BlurSettings, Color, ColorMetric, Manipulation, ManipulationOutput, PixelBuffer,
/// };
///
/// let metric = ColorMetric::new();
/// let source = PixelBuffer::filled(4, 4, Color::rgb(255, 0, 0)).unwrap();
///
/// let output = Manipulation::Blur(BlurSettings::new(0.5))
///     .apply(&source, &ApplyContext::new(&metric))
///     .unwrap();
/// assert_eq!(output, ManipulationOutput::Unchanged);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Manipulation {
    /// Gaussian (or, in preview, box) blur.
    Blur(BlurSettings),
    /// Color reduction.
    Dither {
        options: DitherOptions,
        palette: PaletteSource,
    },
    /// Adaptive equalization of the image luminance.
    Equalize(EqualizeSettings),
    /// Outline extraction. Traces the context's selection if it has one,
    /// otherwise every pixel with nonzero alpha and luminance of at least
    /// `threshold`.
    Trace {
        settings: TraceSettings,
        threshold: u8,
    },
}

impl Manipulation {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Manipulation::Blur(_) => "blur",
            Manipulation::Dither { .. } => "dither",
            Manipulation::Equalize(_) => "equalize",
            Manipulation::Trace { .. } => "trace",
        }
    }

    /// Run on `source`. The source is never modified.
    pub fn apply(
        &self,
        source: &PixelBuffer,
        ctx: &ApplyContext<'_>,
    ) -> Result<ManipulationOutput, FilterError> {
        tracing::debug!(manipulation = self.name(), mode = ?ctx.mode, "Applying");
        match self {
            Manipulation::Blur(settings) => blur(settings, source, ctx),
            Manipulation::Dither { options, palette } => dither(options, palette, source, ctx),
            Manipulation::Equalize(settings) => equalize(settings, source, ctx),
            Manipulation::Trace {
                settings,
                threshold,
            } => trace(settings, *threshold, source, ctx),
        }
    }
}

fn blur(
    settings: &BlurSettings,
    source: &PixelBuffer,
    ctx: &ApplyContext<'_>,
) -> Result<ManipulationOutput, FilterError> {
    let settings = match ctx.mode {
        RenderMode::Preview => settings.clone().fast(true),
        RenderMode::Commit => settings.clone(),
    };
    if settings.is_noop() {
        return Ok(ManipulationOutput::Unchanged);
    }

    let mut engine = BlurEngine::new(settings);
    if let Some(selection) = ctx.selection {
        engine = engine.selection(selection);
    }
    if let Some(sink) = ctx.sink() {
        engine = engine.progress(sink);
    }
    if let Some(flag) = ctx.cancel {
        engine = engine.cancel(flag);
    }
    engine.blurred(source).map(ManipulationOutput::Pixels)
}

fn dither(
    options: &DitherOptions,
    source_palette: &PaletteSource,
    source: &PixelBuffer,
    ctx: &ApplyContext<'_>,
) -> Result<ManipulationOutput, FilterError> {
    let palette = match source_palette {
        PaletteSource::Fixed(palette) => palette.clone(),
        PaletteSource::Generated { colors, settings } => {
            let mut generator = PaletteGenerator::new(ctx.metric, settings.clone());
            if let Some(selection) = ctx.selection {
                generator = generator.selection(selection);
            }
            generator.generate(source, *colors)
        }
    };

    let mut engine = DitherEngine::new(ctx.metric, options.clone());
    if let Some(sink) = ctx.sink() {
        engine = engine.progress(sink);
    }
    if let Some(flag) = ctx.cancel {
        engine = engine.cancel(flag);
    }
    let image = engine.reduce(source, &palette)?;

    // An indexed image cannot leave pixels alone, so a selection turns the
    // result back into pixels composited over the source.
    match ctx.selection {
        None => Ok(ManipulationOutput::Indexed(image)),
        Some(selection) => {
            let reduced = image.to_pixel_buffer()?;
            let mut out = source.clone();
            out.copy_where(&reduced, |x, y| selection.contains(x as i32, y as i32));
            Ok(ManipulationOutput::Pixels(out))
        }
    }
}

fn equalize(
    settings: &EqualizeSettings,
    source: &PixelBuffer,
    ctx: &ApplyContext<'_>,
) -> Result<ManipulationOutput, FilterError> {
    let mut equalizer = AdaptiveHistogramEqualizer::new(settings.clone());
    if let Some(selection) = ctx.selection {
        equalizer = equalizer.selection(selection);
    }
    if let Some(sink) = ctx.sink() {
        equalizer = equalizer.progress(sink);
    }
    if let Some(flag) = ctx.cancel {
        equalizer = equalizer.cancel(flag);
    }
    let mut out = source.clone();
    equalizer.equalize_luminance(&mut out)?;
    Ok(ManipulationOutput::Pixels(out))
}

fn trace(
    settings: &TraceSettings,
    threshold: u8,
    source: &PixelBuffer,
    ctx: &ApplyContext<'_>,
) -> Result<ManipulationOutput, FilterError> {
    let mut tracer = SelectionTracer::new(settings.clone());
    if let Some(sink) = ctx.sink() {
        tracer = tracer.progress(sink);
    }
    if let Some(flag) = ctx.cancel {
        tracer = tracer.cancel(flag);
    }
    let polygons = match ctx.selection {
        Some(selection) => tracer.trace_predicate(selection, source.width(), source.height())?,
        None => tracer.trace(&SelectionMask::from_luminance(source, threshold)?)?,
    };
    Ok(ManipulationOutput::Polygons(polygons))
}
