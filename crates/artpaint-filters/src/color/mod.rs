//! Color representation and color-distance lookup.
//!
//! - [`Color`]: unpacked 8-bit RGBA with BGRA32 packing helpers
//! - [`ColorMetric`]: Euclidean RGB distance backed by square / square-root
//!   tables, plus nearest-palette-entry search
//!
//! # Example
//!
//! ```
//! use artpaint_filters::{Color, ColorMetric};
//!
//! let metric = ColorMetric::new();
//! let palette = [Color::BLACK, Color::WHITE];
//!
//! let nearest = metric.nearest_index(Color::rgb(200, 200, 200), &palette);
//! assert_eq!(nearest, 1);
//! ```

mod bgra;
mod metric;

pub use bgra::Color;
pub use metric::ColorMetric;
