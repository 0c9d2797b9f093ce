//! ArtPaint command-line host
//!
//! Loads PNG images into [`artpaint_filters::PixelBuffer`]s, runs filter
//! manipulations on them and writes the results back out.
//! This library exposes modules for integration testing.

pub mod error;
pub mod models;
pub mod rendering;
pub mod services;
