//! Public API for the artpaint-filters crate.
//!
//! This module provides the [`Manipulation`] dispatcher that runs one of
//! the engines on a buffer, and the [`FilterError`] unified error type.

mod error;
mod manipulation;

pub use error::FilterError;
pub use manipulation::{ApplyContext, Manipulation, ManipulationOutput, PaletteSource, RenderMode};
