//! Assertion helpers for tests.

use std::path::Path;

use artpaint::rendering::load_png;
use artpaint_filters::{Color, PixelBuffer};
use pretty_assertions::assert_eq;

/// Assert `path` holds a decodable PNG of the given size and return it
pub fn assert_png(path: &Path, width: u32, height: u32) -> PixelBuffer {
    let bytes = std::fs::read(path).unwrap();
    assert!(
        bytes.starts_with(b"\x89PNG"),
        "Expected PNG at {}, got {} bytes starting with {:?}",
        path.display(),
        bytes.len(),
        &bytes[..8.min(bytes.len())]
    );
    let image = load_png(path).unwrap();
    assert_eq!((image.width(), image.height()), (width, height));
    image
}

/// Assert every pixel of `image` is one of `palette`
pub fn assert_only_colors(image: &PixelBuffer, palette: &[Color]) {
    for (i, color) in image.iter().enumerate() {
        assert!(
            palette.contains(&color),
            "Pixel {i} is {color:?}, not in palette {palette:?}"
        );
    }
}

/// Assert two images agree everywhere except where `changed` is true
pub fn assert_same_outside<F>(before: &PixelBuffer, after: &PixelBuffer, changed: F)
where
    F: Fn(u32, u32) -> bool,
{
    for y in 0..before.height() {
        for x in 0..before.width() {
            if !changed(x, y) {
                assert_eq!(before.get(x, y), after.get(x, y), "pixel ({x}, {y}) changed");
            }
        }
    }
}
