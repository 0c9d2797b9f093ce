use std::io::Cursor;
use std::path::Path;

use artpaint_filters::{IndexedImage, PixelBuffer, SelectionMask};

use crate::error::AppError;

/// Decode a PNG of any color type into a BGRA pixel buffer.
///
/// Palette and low-bit-depth images are expanded, 16-bit channels are
/// stripped to 8 bits, and missing alpha is filled with 255.
pub fn decode_png(bytes: &[u8]) -> Result<PixelBuffer, AppError> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;

    let (color_type, bit_depth) = reader.output_color_type();
    if bit_depth != png::BitDepth::Eight {
        return Err(AppError::UnsupportedPng(format!(
            "{bit_depth:?} bit depth after expansion"
        )));
    }

    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;
    let data = &buf[..info.buffer_size()];
    let pixels = info.width as usize * info.height as usize;

    let rgba: Vec<u8> = match color_type {
        png::ColorType::Rgba => data.to_vec(),
        png::ColorType::Rgb => data
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        png::ColorType::GrayscaleAlpha => data
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        png::ColorType::Grayscale => data.iter().flat_map(|&v| [v, v, v, 255]).collect(),
        png::ColorType::Indexed => {
            return Err(AppError::UnsupportedPng(
                "palette was not expanded".to_string(),
            ))
        }
    };
    debug_assert_eq!(rgba.len(), pixels * 4);

    tracing::debug!(
        width = info.width,
        height = info.height,
        ?color_type,
        "Decoded PNG"
    );
    Ok(PixelBuffer::from_rgba8(info.width, info.height, &rgba)?)
}

/// Read and decode a PNG file.
pub fn load_png(path: &Path) -> Result<PixelBuffer, AppError> {
    let bytes = std::fs::read(path)?;
    let buffer = decode_png(&bytes)?;
    tracing::info!(
        path = %path.display(),
        width = buffer.width(),
        height = buffer.height(),
        "Loaded image"
    );
    Ok(buffer)
}

/// Load a mask image and select every pixel with luminance at or above
/// `threshold`. The mask must match the image it will be applied to.
pub fn load_mask(
    path: &Path,
    threshold: u8,
    width: u32,
    height: u32,
) -> Result<SelectionMask, AppError> {
    let image = load_png(path)?;
    if image.width() != width || image.height() != height {
        return Err(AppError::MaskSize {
            path: path.to_path_buf(),
            mask_width: image.width(),
            mask_height: image.height(),
            width,
            height,
        });
    }
    let mask = SelectionMask::from_luminance(&image, threshold)?;
    tracing::debug!(selected = mask.count(), "Loaded selection mask");
    Ok(mask)
}

/// Encode a pixel buffer as an 8-bit RGBA PNG.
pub fn encode_png(buffer: &PixelBuffer) -> Result<Vec<u8>, AppError> {
    write_png(
        buffer.width(),
        buffer.height(),
        png::ColorType::Rgba,
        png::BitDepth::Eight,
        None,
        &buffer.to_rgba8(),
    )
}

/// Encode an indexed image as a palette PNG, packing indices at the
/// smallest bit depth the palette size allows.
pub fn encode_indexed_png(image: &IndexedImage) -> Result<Vec<u8>, AppError> {
    let colors = image.palette().colors();
    let (depth, bits) = match colors.len() {
        0..=2 => (png::BitDepth::One, 1),
        3..=4 => (png::BitDepth::Two, 2),
        5..=16 => (png::BitDepth::Four, 4),
        _ => (png::BitDepth::Eight, 8),
    };
    let plte: Vec<u8> = colors.iter().flat_map(|c| [c.r, c.g, c.b]).collect();
    let packed = if bits == 8 {
        image.indices().to_vec()
    } else {
        pack_nbits(image.indices(), image.width(), bits)
    };
    write_png(
        image.width(),
        image.height(),
        png::ColorType::Indexed,
        depth,
        Some(&plte),
        &packed,
    )
}

/// Write PNG bytes to `path`.
pub fn save_png(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    std::fs::write(path, bytes)?;
    tracing::info!(path = %path.display(), size = bytes.len(), "Wrote image");
    Ok(())
}

fn write_png(
    width: u32,
    height: u32,
    color_type: png::ColorType,
    bit_depth: png::BitDepth,
    plte: Option<&[u8]>,
    data: &[u8],
) -> Result<Vec<u8>, AppError> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = png::Encoder::new(&mut buf, width, height);
        encoder.set_color(color_type);
        encoder.set_depth(bit_depth);
        if let Some(plte) = plte {
            encoder.set_palette(plte);
        }
        let mut writer = encoder.write_header()?;
        writer.write_image_data(data)?;
    }
    Ok(buf.into_inner())
}

/// Pack indices into 1, 2 or 4 bit PNG rows, most significant bits first.
fn pack_nbits(indices: &[u8], width: u32, bits: u8) -> Vec<u8> {
    let per_byte = 8 / bits as usize;
    let row_bytes = (width as usize).div_ceil(per_byte);
    let mask = (1u8 << bits) - 1;
    let mut packed = Vec::with_capacity(row_bytes * indices.len() / width as usize);

    for row in indices.chunks(width as usize) {
        for group in row.chunks(per_byte) {
            let byte = group.iter().enumerate().fold(0u8, |byte, (i, &idx)| {
                byte | ((idx & mask) << (8 - bits - i as u8 * bits))
            });
            packed.push(byte);
        }
    }
    packed
}

#[cfg(test)]
mod tests {
    use super::*;
    use artpaint_filters::{Color, Palette};

    #[test]
    fn test_rgba_round_trip() {
        let mut buffer = PixelBuffer::filled(3, 2, Color::rgb(10, 20, 30)).unwrap();
        buffer.set(2, 1, Color::new(200, 100, 50, 128));

        let decoded = decode_png(&encode_png(&buffer).unwrap()).unwrap();
        assert_eq!(decoded, buffer);
    }

    #[test]
    fn test_indexed_png_expands_to_palette_colors() {
        let palette = Palette::from_hex(&["#000", "#f00", "#0f0"]).unwrap();
        let image = IndexedImage::new(vec![0, 1, 2, 1, 0, 2, 2, 2, 1, 0], 5, 2, palette);

        let decoded = decode_png(&encode_indexed_png(&image).unwrap()).unwrap();
        assert_eq!(decoded, image.to_pixel_buffer().unwrap());
    }

    #[test]
    fn test_pack_nbits() {
        assert_eq!(
            pack_nbits(&[1, 0, 1, 1, 0, 0, 0, 0, 1], 9, 1),
            vec![0b1011_0000, 0b1000_0000]
        );
        assert_eq!(pack_nbits(&[3, 2, 1], 3, 2), vec![0b1110_0100]);
        assert_eq!(pack_nbits(&[0xf, 0x1, 0x2, 0x3], 2, 4), vec![0xf1, 0x23]);
    }

    #[test]
    fn test_garbage_is_a_decode_error() {
        assert!(matches!(
            decode_png(b"not a png"),
            Err(AppError::PngDecode(_))
        ));
    }

    #[test]
    fn test_mask_size_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mask.png");
        let mask = PixelBuffer::filled(2, 2, Color::WHITE).unwrap();
        save_png(&path, &encode_png(&mask).unwrap()).unwrap();

        assert!(matches!(
            load_mask(&path, 128, 4, 4),
            Err(AppError::MaskSize { .. })
        ));
        assert_eq!(load_mask(&path, 128, 2, 2).unwrap().count(), 4);
    }
}
