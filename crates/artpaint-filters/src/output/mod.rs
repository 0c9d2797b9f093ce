//! Output types produced by color reduction.

mod indexed_image;

pub use indexed_image::IndexedImage;
