//! Separable Gaussian blur and its box-filter preview variant.
//!
//! A 2-D blur is two 1-D passes. Each pass filters rows and stores the
//! result transposed, so the second pass, which again filters rows, is
//! really filtering the original columns and writes them back in the
//! original orientation:
//!
//! ```text
//! source (w x h) --rows, transpose--> tmp (h x w) --rows, transpose--> out (w x h)
//! ```
//!
//! Both passes split their rows into `ceil(rows / threads)` bands handled
//! by scoped worker threads and joined before the next pass starts.

mod passes;

use crate::api::FilterError;
use crate::buffer::{is_selected, PixelBuffer, Selection};
use crate::convolve::{Kernel, GAUSSIAN_CUTOFF};
use crate::progress::{CancelFlag, Monitor, ProgressSink};

use passes::{filter_transposed, RowFilter, Rows};

/// Number of box passes the fast blur stacks to approximate a Gaussian.
pub const FAST_BOX_ITERATIONS: usize = 3;

/// Blur configuration.
///
/// # Example
///
/// ```
/// use artpaint_filters::BlurSettings;
///
/// let preview = BlurSettings::new(12.0).fast(true).threads(2);
/// assert!(preview.fast);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BlurSettings {
    /// Blur radius in pixels. Radii below 1 make the blur a no-op.
    pub radius: f32,

    /// Use stacked box filters instead of true Gaussian weights.
    ///
    /// Default: `false`
    pub fast: bool,

    /// Worker thread count; `None` uses the available parallelism.
    ///
    /// Default: `None`
    pub threads: Option<usize>,
}

impl Default for BlurSettings {
    fn default() -> Self {
        Self {
            radius: 2.0,
            fast: false,
            threads: None,
        }
    }
}

impl BlurSettings {
    /// Settings for a Gaussian blur of `radius` pixels.
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            ..Self::default()
        }
    }

    /// Select the box-filter approximation.
    #[inline]
    pub fn fast(mut self, enabled: bool) -> Self {
        self.fast = enabled;
        self
    }

    /// Pin the worker thread count.
    #[inline]
    pub fn threads(mut self, count: usize) -> Self {
        self.threads = Some(count);
        self
    }

    /// True when these settings leave every image unchanged.
    pub fn is_noop(&self) -> bool {
        if self.fast {
            fast_box_radius(self.radius) == 0
        } else {
            self.radius.is_nan() || self.radius < 1.0
        }
    }

    /// Thread count to actually use.
    pub fn resolved_threads(&self) -> usize {
        self.threads
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
            .max(1)
    }
}

/// Radius of each of the [`FAST_BOX_ITERATIONS`] box passes that together
/// approximate a Gaussian reaching [`GAUSSIAN_CUTOFF`] at `radius`.
///
/// Returns 0 (no-op) for radii below 1.
pub fn fast_box_radius(radius: f32) -> usize {
    if radius.is_nan() || radius < 1.0 {
        return 0;
    }
    let sigma = radius as f64 / (2.0 * (1.0 / GAUSSIAN_CUTOFF).ln()).sqrt();
    let n = FAST_BOX_ITERATIONS as f64;
    let width = (12.0 * sigma * sigma / n + 1.0).sqrt();
    (((width - 1.0) / 2.0).round() as usize).max(1)
}

/// Builder-style blur runner.
///
/// The engine borrows its optional collaborators (selection, progress
/// sink, cancel flag) and is reusable across buffers.
///
/// # Example
///
/// ```
/// use artpaint_filters::{BlurEngine, BlurSettings, Color, PixelBuffer};
///
/// let mut buffer = PixelBuffer::filled(8, 8, Color::rgb(0, 128, 255)).unwrap();
/// let only_left = |x: i32, _y: i32| x < 4;
///
/// BlurEngine::new(BlurSettings::new(2.0))
///     .selection(&only_left)
///     .apply(&mut buffer)
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct BlurEngine<'a> {
    settings: BlurSettings,
    selection: Option<&'a dyn Selection>,
    progress: Option<&'a dyn ProgressSink>,
    cancel: Option<&'a CancelFlag>,
}

impl<'a> BlurEngine<'a> {
    /// Create an engine with no selection, progress sink or cancel flag.
    pub fn new(settings: BlurSettings) -> Self {
        Self {
            settings,
            selection: None,
            progress: None,
            cancel: None,
        }
    }

    /// Only write pixels the selection contains.
    #[inline]
    pub fn selection(mut self, selection: &'a dyn Selection) -> Self {
        self.selection = Some(selection);
        self
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

    /// The settings this engine runs with.
    pub fn settings(&self) -> &BlurSettings {
        &self.settings
    }

    /// Blur `buffer` in place.
    ///
    /// On error (including cancellation) `buffer` is left untouched.
    pub fn apply(&self, buffer: &mut PixelBuffer) -> Result<(), FilterError> {
        if let Some(blurred) = self.run(buffer)? {
            buffer.copy_where(&blurred, |x, y| {
                is_selected(self.selection, x as i32, y as i32)
            });
        }
        Ok(())
    }

    /// Return a blurred copy of `source`; pixels outside the selection keep
    /// their original value.
    pub fn blurred(&self, source: &PixelBuffer) -> Result<PixelBuffer, FilterError> {
        let mut out = source.clone();
        self.apply(&mut out)?;
        Ok(out)
    }

    /// Run both passes. `Ok(None)` means the settings make this a no-op.
    fn run(&self, buffer: &PixelBuffer) -> Result<Option<PixelBuffer>, FilterError> {
        let width = buffer.width() as usize;
        let height = buffer.height() as usize;
        let threads = self.settings.resolved_threads();
        // Taps past the far edge only ever read replicated border pixels.
        let reach = width.max(height);

        let kernel;
        let filter = if self.settings.fast {
            let radius = fast_box_radius(self.settings.radius).min(reach);
            if radius == 0 {
                tracing::debug!(radius = self.settings.radius, "Blur radius below 1, skipping");
                return Ok(None);
            }
            RowFilter::Box {
                radius,
                iterations: FAST_BOX_ITERATIONS,
            }
        } else {
            kernel = Kernel::gaussian_within(self.settings.radius, reach)?;
            if kernel.is_identity() {
                tracing::debug!(radius = self.settings.radius, "Blur radius below 1, skipping");
                return Ok(None);
            }
            RowFilter::Weighted(&kernel)
        };

        tracing::debug!(
            width,
            height,
            radius = self.settings.radius,
            fast = self.settings.fast,
            threads,
            "Blur started"
        );

        let monitor = Monitor::new(self.progress, self.cancel, width + height);
        let source = Rows {
            data: buffer.raw(),
            width,
            height,
            stride: buffer.stride() as usize,
        };
        let rotated = filter_transposed(source, filter, threads, &monitor)?;

        let rotated = Rows {
            data: &rotated,
            width: height,
            height: width,
            stride: height,
        };
        let restored = filter_transposed(rotated, filter, threads, &monitor)?;

        let out = PixelBuffer::from_pixels(buffer.width(), buffer.height(), buffer.width(), restored)?;
        tracing::debug!(width, height, "Blur finished");
        Ok(Some(out))
    }
}

/// Gaussian-blur `buffer` in place using `thread_count` workers.
///
/// Shorthand for [`BlurEngine`] without selection, progress or cancel.
pub fn blur(buffer: &mut PixelBuffer, radius: f32, thread_count: usize) -> Result<(), FilterError> {
    BlurEngine::new(BlurSettings::new(radius).threads(thread_count)).apply(buffer)
}

/// Box-filter approximation of [`blur`], for interactive previews.
pub fn fast_blur(
    buffer: &mut PixelBuffer,
    radius: f32,
    thread_count: usize,
) -> Result<(), FilterError> {
    BlurEngine::new(BlurSettings::new(radius).fast(true).threads(thread_count)).apply(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use std::sync::Mutex;

    fn gradient(width: u32, height: u32) -> PixelBuffer {
        let mut buffer = PixelBuffer::new(width, height).unwrap();
        for y in 0..height {
            for x in 0..width {
                let v = ((x * 255) / (width - 1).max(1)) as u8;
                let w = ((y * 255) / (height - 1).max(1)) as u8;
                buffer.set(x, y, Color::rgb(v, w, v / 2 + w / 2));
            }
        }
        buffer
    }

    fn mirrored(buffer: &PixelBuffer) -> PixelBuffer {
        let mut out = buffer.clone();
        for y in 0..buffer.height() {
            for x in 0..buffer.width() {
                out.set(buffer.width() - 1 - x, y, buffer.get(x, y));
            }
        }
        out
    }

    #[test]
    fn test_uniform_red_4x4_radius_3_unchanged() {
        let red = Color::new(255, 0, 0, 255);
        let mut buffer = PixelBuffer::filled(4, 4, red).unwrap();
        blur(&mut buffer, 3.0, 2).unwrap();
        assert!(buffer.iter().all(|c| c == red));
    }

    #[test]
    fn test_uniform_field_survives_any_radius() {
        let color = Color::new(13, 170, 99, 201);
        for radius in [1.0, 2.5, 7.0, 20.0] {
            let mut buffer = PixelBuffer::filled(9, 5, color).unwrap();
            blur(&mut buffer, radius, 3).unwrap();
            assert!(buffer.iter().all(|c| c == color), "radius {radius}");

            let mut buffer = PixelBuffer::filled(9, 5, color).unwrap();
            fast_blur(&mut buffer, radius, 3).unwrap();
            assert!(buffer.iter().all(|c| c == color), "fast radius {radius}");
        }
    }

    #[test]
    fn test_radius_below_one_is_identity() {
        let original = gradient(6, 6);
        let mut buffer = original.clone();
        blur(&mut buffer, 0.5, 4).unwrap();
        assert_eq!(buffer, original);
    }

    #[test]
    fn test_blur_commutes_with_horizontal_mirror() {
        let original = gradient(13, 7);
        let mut direct = original.clone();
        blur(&mut direct, 3.0, 3).unwrap();

        let mut flipped = mirrored(&original);
        blur(&mut flipped, 3.0, 3).unwrap();

        assert_eq!(mirrored(&flipped), direct);
    }

    #[test]
    fn test_thread_count_is_deterministic() {
        let original = gradient(17, 11);
        let mut one = original.clone();
        blur(&mut one, 4.0, 1).unwrap();
        let mut many = original.clone();
        blur(&mut many, 4.0, 5).unwrap();
        assert_eq!(one, many);
    }

    #[test]
    fn test_blur_handles_stride_padding() {
        let mut padded = PixelBuffer::with_stride(5, 4, 9, Color::rgb(40, 40, 40)).unwrap();
        padded.set(2, 2, Color::WHITE);
        let mut tight = PixelBuffer::filled(5, 4, Color::rgb(40, 40, 40)).unwrap();
        tight.set(2, 2, Color::WHITE);

        blur(&mut padded, 2.0, 2).unwrap();
        blur(&mut tight, 2.0, 2).unwrap();

        assert_eq!(padded.iter().collect::<Vec<_>>(), tight.iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_selection_limits_written_pixels() {
        let original = gradient(10, 10);
        let mut buffer = original.clone();
        let top = |_x: i32, y: i32| y < 5;
        BlurEngine::new(BlurSettings::new(3.0).threads(2))
            .selection(&top)
            .apply(&mut buffer)
            .unwrap();

        for x in 0..10 {
            for y in 5..10 {
                assert_eq!(buffer.get(x, y), original.get(x, y));
            }
        }
        assert_ne!(buffer.row(0), original.row(0));
    }

    #[test]
    fn test_cancelled_blur_leaves_buffer_untouched() {
        let original = gradient(12, 12);
        let mut buffer = original.clone();
        let flag = CancelFlag::new();
        flag.cancel();

        let result = BlurEngine::new(BlurSettings::new(3.0))
            .cancel(&flag)
            .apply(&mut buffer);

        assert!(matches!(result, Err(FilterError::Cancelled)));
        assert_eq!(buffer, original);
    }

    #[test]
    fn test_progress_adds_up_to_hundred() {
        let total = Mutex::new(0.0f32);
        let sink = |d: f32| *total.lock().unwrap() += d;
        let mut buffer = gradient(45, 30);

        BlurEngine::new(BlurSettings::new(2.0).threads(3))
            .progress(&sink)
            .apply(&mut buffer)
            .unwrap();

        let total = *total.lock().unwrap();
        assert!((total - 100.0).abs() < 0.01, "total {total}");
    }

    #[test]
    fn test_fast_blur_is_close_to_gaussian() {
        let original = gradient(32, 32);
        let mut exact = original.clone();
        blur(&mut exact, 6.0, 2).unwrap();
        let mut approx = original.clone();
        fast_blur(&mut approx, 6.0, 2).unwrap();

        for (a, b) in exact.iter().zip(approx.iter()) {
            assert!((a.r as i32 - b.r as i32).abs() <= 12, "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn test_huge_radius_is_bounded_by_image_extent() {
        let original = gradient(4, 4);
        for radius in [1.0e9, f32::INFINITY] {
            let mut exact = original.clone();
            blur(&mut exact, radius, 2).unwrap();
            let mut approx = original.clone();
            fast_blur(&mut approx, radius, 2).unwrap();

            // Everything collapses towards the mean, but alpha stays put.
            assert!(exact.iter().all(|c| c.a == 255));
            assert!(approx.iter().all(|c| c.a == 255));
            assert_ne!(exact, original);
        }
    }

    #[test]
    fn test_fast_box_radius_grows_with_radius() {
        assert_eq!(fast_box_radius(0.5), 0);
        assert!(fast_box_radius(1.0) >= 1);
        assert!(fast_box_radius(30.0) > fast_box_radius(10.0));
    }
}
