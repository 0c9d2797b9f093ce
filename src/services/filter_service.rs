use std::borrow::Cow;
use std::sync::Mutex;

use artpaint_filters::{
    ApplyContext, ColorMetric, IndexedImage, Manipulation, ManipulationOutput, PixelBuffer,
    Polygon, ProgressSink, RenderMode, SelectionMask,
};

use crate::error::AppError;
use crate::rendering::{encode_indexed_png, encode_png};

/// Image produced by the last pixel-changing step of a pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineImage {
    Pixels(PixelBuffer),
    Indexed(IndexedImage),
}

impl PipelineImage {
    pub fn width(&self) -> u32 {
        match self {
            PipelineImage::Pixels(buffer) => buffer.width(),
            PipelineImage::Indexed(image) => image.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            PipelineImage::Pixels(buffer) => buffer.height(),
            PipelineImage::Indexed(image) => image.height(),
        }
    }

    /// Expand to BGRA for the next step
    pub fn to_pixels(&self) -> Result<PixelBuffer, AppError> {
        match self {
            PipelineImage::Pixels(buffer) => Ok(buffer.clone()),
            PipelineImage::Indexed(image) => Ok(image.to_pixel_buffer()?),
        }
    }

    /// PNG bytes: palette PNG for indexed images, RGBA otherwise
    pub fn encode(&self) -> Result<Vec<u8>, AppError> {
        match self {
            PipelineImage::Pixels(buffer) => encode_png(buffer),
            PipelineImage::Indexed(image) => encode_indexed_png(image),
        }
    }
}

/// Result from running a filter pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResult {
    pub image: PipelineImage,
    /// Outlines from the last trace step, if any ran
    pub polygons: Option<Vec<Polygon>>,
    /// Steps that changed the image
    pub changed: usize,
}

/// Logs progress of a single step at every quarter
struct ProgressLog {
    step: &'static str,
    done: Mutex<(f32, u32)>,
}

impl ProgressLog {
    fn new(step: &'static str) -> Self {
        Self {
            step,
            done: Mutex::new((0.0, 0)),
        }
    }
}

impl ProgressSink for ProgressLog {
    fn report(&self, percent_delta: f32) {
        let Ok(mut done) = self.done.lock() else {
            return;
        };
        done.0 += percent_delta;
        let quarter = (done.0 / 25.0) as u32;
        if quarter > done.1 {
            done.1 = quarter;
            tracing::debug!(step = self.step, percent = done.0.min(100.0), "Progress");
        }
    }
}

/// Runs manipulations against images with a shared color metric
pub struct FilterService {
    metric: ColorMetric,
    mode: RenderMode,
}

impl FilterService {
    pub fn new(mode: RenderMode) -> Self {
        Self {
            metric: ColorMetric::new(),
            mode,
        }
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Apply one manipulation, optionally restricted to a selection
    pub fn apply(
        &self,
        source: &PixelBuffer,
        manipulation: &Manipulation,
        selection: Option<&SelectionMask>,
    ) -> Result<ManipulationOutput, AppError> {
        let progress = ProgressLog::new(manipulation.name());
        let mut ctx = ApplyContext::new(&self.metric)
            .mode(self.mode)
            .progress(&progress);
        if let Some(mask) = selection {
            ctx = ctx.selection(mask);
        }

        let start = std::time::Instant::now();
        let output = manipulation.apply(source, &ctx)?;
        tracing::info!(
            step = manipulation.name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            unchanged = output == ManipulationOutput::Unchanged,
            "Step finished"
        );
        Ok(output)
    }

    /// Apply `steps` in order, each one to the previous step's image
    pub fn run_pipeline(
        &self,
        source: PixelBuffer,
        steps: &[Manipulation],
        selection: Option<&SelectionMask>,
    ) -> Result<PipelineResult, AppError> {
        let mut image = PipelineImage::Pixels(source);
        let mut polygons = None;
        let mut changed = 0;

        for step in steps {
            let output = {
                let input = match &image {
                    PipelineImage::Pixels(buffer) => Cow::Borrowed(buffer),
                    PipelineImage::Indexed(_) => Cow::Owned(image.to_pixels()?),
                };
                self.apply(&input, step, selection)?
            };
            match output {
                ManipulationOutput::Pixels(buffer) => {
                    image = PipelineImage::Pixels(buffer);
                    changed += 1;
                }
                ManipulationOutput::Indexed(indexed) => {
                    image = PipelineImage::Indexed(indexed);
                    changed += 1;
                }
                ManipulationOutput::Polygons(traced) => {
                    tracing::info!(polygons = traced.len(), "Traced selection");
                    polygons = Some(traced);
                }
                ManipulationOutput::Unchanged => {}
            }
        }

        Ok(PipelineResult {
            image,
            polygons,
            changed,
        })
    }
}

impl Default for FilterService {
    fn default() -> Self {
        Self::new(RenderMode::Commit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artpaint_filters::{
        BlurSettings, Color, DitherOptions, Palette, PaletteSource, TraceSettings,
    };

    fn two_tone() -> PixelBuffer {
        let mut buffer = PixelBuffer::filled(6, 4, Color::BLACK).unwrap();
        for y in 1..3 {
            for x in 1..4 {
                buffer.set(x, y, Color::WHITE);
            }
        }
        buffer
    }

    fn dither_bw() -> Manipulation {
        Manipulation::Dither {
            options: DitherOptions::new(),
            palette: PaletteSource::Fixed(Palette::from_hex(&["#000", "#fff"]).unwrap()),
        }
    }

    #[test]
    fn test_pipeline_chains_steps() {
        let service = FilterService::default();
        let steps = vec![
            Manipulation::Blur(BlurSettings::new(0.0)),
            dither_bw(),
            Manipulation::Trace {
                settings: TraceSettings::new(),
                threshold: 128,
            },
        ];
        let result = service.run_pipeline(two_tone(), &steps, None).unwrap();

        assert_eq!(result.changed, 1);
        match &result.image {
            PipelineImage::Indexed(image) => assert_eq!(image.index(2, 1), 1),
            other => panic!("Expected indexed image, got {other:?}"),
        }
        let polygons = result.polygons.unwrap();
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].bounds(), Some((1, 1, 3, 2)));
    }

    #[test]
    fn test_selection_limits_changes() {
        let service = FilterService::default();
        let mut mask = SelectionMask::new(6, 4).unwrap();
        mask.set(0, 0, true);
        let source = PixelBuffer::filled(6, 4, Color::rgb(100, 100, 100)).unwrap();

        let output = service.apply(&source, &dither_bw(), Some(&mask)).unwrap();
        let pixels = output.into_pixel_buffer().unwrap().unwrap();
        assert_eq!(pixels.get(0, 0), Color::BLACK);
        assert_eq!(pixels.get(5, 3), Color::rgb(100, 100, 100));
    }

    #[test]
    fn test_progress_log_tracks_quarters() {
        let log = ProgressLog::new("blur");
        for _ in 0..10 {
            log.report(10.0);
        }
        let done = log.done.lock().unwrap();
        assert!((done.0 - 100.0).abs() < 1e-3);
        assert_eq!(done.1, 4);
    }

    #[test]
    fn test_encode_picks_format() {
        let image = PipelineImage::Pixels(two_tone());
        let bytes = image.encode().unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        assert_eq!((image.width(), image.height()), (6, 4));
    }
}
