//! Test images and pipeline files.

use std::path::{Path, PathBuf};

use artpaint::rendering::{encode_png, save_png};
use artpaint_filters::{Color, PixelBuffer};

/// Horizontal red ramp over a vertical green ramp, blue constant.
pub fn gradient(width: u32, height: u32) -> PixelBuffer {
    let mut buffer = PixelBuffer::new(width, height).unwrap();
    for y in 0..height {
        for x in 0..width {
            let r = (x * 255 / (width - 1).max(1)) as u8;
            let g = (y * 255 / (height - 1).max(1)) as u8;
            buffer.set(x, y, Color::rgb(r, g, 96));
        }
    }
    buffer
}

/// Black canvas with a white `w`x`h` rectangle whose top-left is `(x0, y0)`.
pub fn rectangle(width: u32, height: u32, x0: u32, y0: u32, w: u32, h: u32) -> PixelBuffer {
    let mut buffer = PixelBuffer::filled(width, height, Color::BLACK).unwrap();
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            buffer.set(x, y, Color::WHITE);
        }
    }
    buffer
}

/// Encode `buffer` to `dir/name` and return the path.
pub fn write_image(dir: &Path, name: &str, buffer: &PixelBuffer) -> PathBuf {
    let path = dir.join(name);
    save_png(&path, &encode_png(buffer).unwrap()).unwrap();
    path
}

/// Write a pipeline YAML file to `dir/name` and return the path.
pub fn write_pipeline(dir: &Path, name: &str, yaml: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, yaml).unwrap();
    path
}

/// Blur, reduce to a fixed black/white palette, then trace the white areas.
pub const BLUR_DITHER_TRACE: &str = r##"
steps:
  - filter: blur
    radius: 1.5
  - filter: dither
    algorithm: nearest
    colors: ["#000000", "#ffffff"]
  - filter: trace
    threshold: 128
"##;
