//! Ordered color palette addressed by 8-bit indices.

use super::error::PaletteError;
use crate::color::Color;

/// Maximum number of entries an 8-bit index can address.
pub const MAX_PALETTE_SIZE: usize = 256;

/// An ordered list of 1 to 256 colors.
///
/// Produced by the [`PaletteGenerator`](super::PaletteGenerator) or supplied
/// directly (for example a fixed system palette) and consumed read-only by
/// the [`DitherEngine`](crate::DitherEngine). Entries are stored opaque;
/// palette matching only concerns RGB.
///
/// # Example
///
/// ```
/// use artpaint_filters::{Color, Palette};
///
/// let palette = Palette::new(&[Color::BLACK, Color::WHITE]).unwrap();
/// assert_eq!(palette.len(), 2);
/// assert_eq!(palette.color(1), Color::WHITE);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    /// Create a palette from a list of colors.
    ///
    /// Alpha is forced to 255. Duplicates are allowed (a generated palette
    /// may legitimately converge two entries onto the same color); the
    /// nearest-color search resolves ties to the lowest index.
    ///
    /// # Errors
    ///
    /// [`PaletteError::Empty`] for no colors, [`PaletteError::TooManyColors`]
    /// for more than 256.
    pub fn new(colors: &[Color]) -> Result<Self, PaletteError> {
        if colors.is_empty() {
            return Err(PaletteError::Empty);
        }
        if colors.len() > MAX_PALETTE_SIZE {
            return Err(PaletteError::TooManyColors {
                count: colors.len(),
            });
        }
        Ok(Self {
            colors: colors.iter().map(|c| c.opaque()).collect(),
        })
    }

    /// Parse a palette from hex strings (`#RRGGBB`, `#RGB`, with or without `#`).
    ///
    /// ```
    /// use artpaint_filters::{Color, Palette};
    ///
    /// let palette = Palette::from_hex(&["#000", "#FF0000"]).unwrap();
    /// assert_eq!(palette.color(1), Color::rgb(255, 0, 0));
    /// ```
    pub fn from_hex(hex: &[&str]) -> Result<Self, PaletteError> {
        let colors = hex
            .iter()
            .map(|s| s.parse::<Color>())
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(&colors)
    }

    /// Wrap colors already known to be 1..=256 opaque entries.
    pub(crate) fn from_vec_unchecked(colors: Vec<Color>) -> Self {
        debug_assert!(!colors.is_empty() && colors.len() <= MAX_PALETTE_SIZE);
        Self { colors }
    }

    /// Evenly spaced grey ramp with `levels` entries (clamped to 2..=256).
    pub fn grayscale(levels: usize) -> Self {
        let levels = levels.clamp(2, MAX_PALETTE_SIZE);
        let colors = (0..levels)
            .map(|i| {
                let v = ((i * 255 + (levels - 1) / 2) / (levels - 1)) as u8;
                Color::rgb(v, v, v)
            })
            .collect();
        Self { colors }
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false; empty palettes are rejected at construction time.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Entry at `index`.
    #[inline]
    pub fn color(&self, index: usize) -> Color {
        self.colors[index]
    }

    /// All entries in index order.
    #[inline]
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// True when every entry has equal R, G and B.
    pub fn is_grayscale(&self) -> bool {
        self.colors.iter().all(|c| c.r == c.g && c.g == c.b)
    }
}
