//! Palette storage and generation.
//!
//! A [`Palette`] is an ordered list of up to 256 opaque colors addressed by
//! `u8` indices. Palettes are either supplied directly (for example a fixed
//! system palette parsed from hex strings) or built from an image's color
//! population by the [`PaletteGenerator`].

mod error;
mod generator;
mod palette;

pub use error::{PaletteError, ParseColorError};
pub use generator::{PaletteGenerator, PaletteReport, PaletteSettings, MAX_ITERATIONS};
pub use palette::{Palette, MAX_PALETTE_SIZE};
