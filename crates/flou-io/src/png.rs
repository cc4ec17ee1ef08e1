use std::path::Path;

use flou_image::Image;
use image::{codecs::png::PngEncoder, ExtendedColorType, ImageEncoder};

use crate::error::IoError;

/// Encodes a RGB image (rgb8) as PNG bytes.
pub fn encode_image_png_rgb8(image: &Image<u8, 3>) -> Result<Vec<u8>, IoError> {
    encode_png_impl(image.as_slice(), image.width(), image.height(), ExtendedColorType::Rgb8)
}

/// Encodes a RGBA image (rgba8) as PNG bytes.
pub fn encode_image_png_rgba8(image: &Image<u8, 4>) -> Result<Vec<u8>, IoError> {
    encode_png_impl(image.as_slice(), image.width(), image.height(), ExtendedColorType::Rgba8)
}

/// Writes a RGBA image (rgba8) to a PNG file.
///
/// # Arguments
///
/// * `file_path` - The path to the PNG file.
/// * `image` - The image with four channels.
pub fn write_image_png_rgba8(
    file_path: impl AsRef<Path>,
    image: &Image<u8, 4>,
) -> Result<(), IoError> {
    let bytes = encode_image_png_rgba8(image)?;
    std::fs::write(file_path, bytes)?;
    Ok(())
}

fn encode_png_impl(
    buf: &[u8],
    width: usize,
    height: usize,
    color_type: ExtendedColorType,
) -> Result<Vec<u8>, IoError> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(buf, width as u32, height as u32, color_type)
        .map_err(|e| IoError::ImageEncodeError(e.to_string()))?;
    Ok(out)
}
