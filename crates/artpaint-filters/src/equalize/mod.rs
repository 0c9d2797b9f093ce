//! Contrast-limited adaptive histogram equalization (CLAHE).
//!
//! The image is cut into `tile_size x tile_size` tiles. Each tile's
//! histogram, optionally clip-limited, becomes a [`MappingFunction`]; each
//! output pixel blends the mappings of the four tiles whose centres
//! surround it.
//!
//! [`AdaptiveHistogramEqualizer::equalize`] works on a single-channel
//! [`GrayPlane`]; [`AdaptiveHistogramEqualizer::equalize_luminance`]
//! applies the same to the brightness of a color [`PixelBuffer`].

mod clahe;
mod histogram;
mod luminance;
mod plane;

pub use histogram::MappingFunction;
pub use plane::GrayPlane;

use crate::api::FilterError;
use crate::buffer::{is_selected, PixelBuffer, Selection};
use crate::progress::{CancelFlag, Monitor, ProgressSink};

/// Equalizer configuration.
///
/// # Example
///
/// ```
/// use artpaint_filters::EqualizeSettings;
///
/// let settings = EqualizeSettings::new(32).clip_limit(Some(40));
/// assert_eq!(settings.tile_size, 32);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EqualizeSettings {
    /// Tile edge in pixels. `0` equalizes the whole image as one tile.
    ///
    /// Default: `64`
    pub tile_size: u32,

    /// Highest count any histogram bin may keep before the excess is
    /// spread over all bins. `None` disables contrast limiting.
    ///
    /// Default: `None`
    pub clip_limit: Option<u32>,
}

impl Default for EqualizeSettings {
    fn default() -> Self {
        Self {
            tile_size: 64,
            clip_limit: None,
        }
    }
}

impl EqualizeSettings {
    /// Settings with the given tile size and no clip limit.
    pub fn new(tile_size: u32) -> Self {
        Self {
            tile_size,
            clip_limit: None,
        }
    }

    /// Set the per-bin clip limit.
    #[inline]
    pub fn clip_limit(mut self, limit: Option<u32>) -> Self {
        self.clip_limit = limit;
        self
    }
}

/// Builder-style CLAHE runner.
///
/// # Example
///
/// ```
/// use artpaint_filters::{AdaptiveHistogramEqualizer, EqualizeSettings, GrayPlane};
///
/// let data: Vec<u8> = (0..64).map(|v| 100 + (v % 8) as u8).collect();
/// let mut plane = GrayPlane::from_vec(8, 8, data).unwrap();
///
/// AdaptiveHistogramEqualizer::new(EqualizeSettings::new(4))
///     .equalize(&mut plane)
///     .unwrap();
///
/// // Eight neighbouring grey levels get stretched over the full range.
/// assert!(plane.data().iter().any(|&v| v > 200));
/// ```
#[derive(Clone)]
pub struct AdaptiveHistogramEqualizer<'a> {
    settings: EqualizeSettings,
    selection: Option<&'a dyn Selection>,
    progress: Option<&'a dyn ProgressSink>,
    cancel: Option<&'a CancelFlag>,
}

impl<'a> AdaptiveHistogramEqualizer<'a> {
    /// Create an equalizer with no selection, progress sink or cancel flag.
    pub fn new(settings: EqualizeSettings) -> Self {
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

    /// The settings this equalizer runs with.
    pub fn settings(&self) -> &EqualizeSettings {
        &self.settings
    }

    fn monitor(&self, rows: u32) -> Monitor<'_> {
        Monitor::new(self.progress, self.cancel, rows as usize)
    }

    /// Equalize a single-channel plane in place.
    ///
    /// On error (including cancellation) `plane` is left untouched.
    pub fn equalize(&self, plane: &mut GrayPlane) -> Result<(), FilterError> {
        tracing::debug!(
            width = plane.width(),
            height = plane.height(),
            tile_size = self.settings.tile_size,
            clip_limit = ?self.settings.clip_limit,
            "Equalize started"
        );
        let out = clahe::equalize_plane(
            plane,
            self.settings.tile_size as usize,
            self.settings.clip_limit,
            self.selection,
            &self.monitor(plane.height()),
        )
        .inspect_err(log_cancel)?;
        plane.replace_data(out);
        Ok(())
    }

    /// Equalize the BT.601 luminance of `buffer` in place, keeping chroma
    /// and alpha.
    pub fn equalize_luminance(&self, buffer: &mut PixelBuffer) -> Result<(), FilterError> {
        tracing::debug!(
            width = buffer.width(),
            height = buffer.height(),
            tile_size = self.settings.tile_size,
            "Luminance equalize started"
        );
        let out = luminance::equalize_luminance(
            buffer,
            self.settings.tile_size as usize,
            self.settings.clip_limit,
            self.selection,
            &self.monitor(buffer.height()),
        )
        .inspect_err(log_cancel)?;
        buffer.copy_where(&out, |x, y| {
            is_selected(self.selection, x as i32, y as i32)
        });
        Ok(())
    }

    /// Mapping function of every tile of `plane`, row-major.
    pub fn tile_mappings(&self, plane: &GrayPlane) -> Vec<MappingFunction> {
        clahe::tile_mappings(
            plane,
            self.settings.tile_size as usize,
            self.settings.clip_limit,
        )
    }
}

fn log_cancel(err: &FilterError) {
    if matches!(err, FilterError::Cancelled) {
        tracing::info!("Equalize cancelled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::progress::CancelFlag;

    fn noisy_plane() -> GrayPlane {
        let data: Vec<u8> = (0..40 * 30u32)
            .map(|i| ((i * 7919 + i / 40 * 31) % 97 + (i % 40) * 3) as u8)
            .collect();
        GrayPlane::from_vec(40, 30, data).unwrap()
    }

    #[test]
    fn test_every_tile_mapping_is_monotone() {
        let plane = noisy_plane();
        for clip in [None, Some(2), Some(30)] {
            let equalizer = AdaptiveHistogramEqualizer::new(EqualizeSettings::new(8).clip_limit(clip));
            let maps = equalizer.tile_mappings(&plane);
            assert_eq!(maps.len(), 5 * 4);
            assert!(maps.iter().all(MappingFunction::is_monotone));
        }
    }

    #[test]
    fn test_cancel_leaves_plane_untouched() {
        let mut plane = noisy_plane();
        let original = plane.clone();
        let flag = CancelFlag::new();
        flag.cancel();

        let result = AdaptiveHistogramEqualizer::new(EqualizeSettings::new(8))
            .cancel(&flag)
            .equalize(&mut plane);
        assert!(matches!(result, Err(FilterError::Cancelled)));
        assert_eq!(plane, original);
    }

    #[test]
    fn test_luminance_respects_selection() {
        let mut buffer = PixelBuffer::filled(6, 6, Color::rgb(90, 90, 90)).unwrap();
        for x in 0..6 {
            buffer.set(x, 5, Color::rgb(140, 140, 140));
        }
        let original = buffer.clone();
        let top_half = |_x: i32, y: i32| y < 3;

        AdaptiveHistogramEqualizer::new(EqualizeSettings::new(0))
            .selection(&top_half)
            .equalize_luminance(&mut buffer)
            .unwrap();

        assert_ne!(buffer.get(0, 0), original.get(0, 0));
        for y in 3..6 {
            for x in 0..6 {
                assert_eq!(buffer.get(x, y), original.get(x, y));
            }
        }
    }
}
