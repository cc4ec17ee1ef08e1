use std::path::Path;

use flou_image::Image;
use image::{codecs::jpeg::JpegEncoder, ExtendedColorType};

use crate::error::IoError;

/// Quality used by the blur drivers when writing JPEG output.
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Encodes a RGB image (rgb8) as JPEG bytes.
///
/// # Arguments
///
/// * `image` - The image with three channels.
/// * `quality` - The JPEG quality, from 1 to 100.
pub fn encode_image_jpeg_rgb8(image: &Image<u8, 3>, quality: u8) -> Result<Vec<u8>, IoError> {
    encode_jpeg_impl(image.as_slice(), image.width(), image.height(), quality)
}

/// Encodes a RGBA image (rgba8) as JPEG bytes.
///
/// JPEG has no alpha channel, so the fourth channel is dropped.
pub fn encode_image_jpeg_rgba8(image: &Image<u8, 4>, quality: u8) -> Result<Vec<u8>, IoError> {
    let rgb = image
        .as_slice()
        .chunks_exact(4)
        .flat_map(|p| [p[0], p[1], p[2]])
        .collect::<Vec<_>>();
    encode_jpeg_impl(&rgb, image.width(), image.height(), quality)
}

/// Writes a RGB image (rgb8) to a JPEG file.
///
/// # Arguments
///
/// * `file_path` - The path to the JPEG file.
/// * `image` - The image with three channels.
/// * `quality` - The JPEG quality, from 1 to 100.
pub fn write_image_jpeg_rgb8(
    file_path: impl AsRef<Path>,
    image: &Image<u8, 3>,
    quality: u8,
) -> Result<(), IoError> {
    let bytes = encode_image_jpeg_rgb8(image, quality)?;
    std::fs::write(file_path, bytes)?;
    Ok(())
}

/// Writes a RGBA image (rgba8) to a JPEG file, dropping the alpha channel.
pub fn write_image_jpeg_rgba8(
    file_path: impl AsRef<Path>,
    image: &Image<u8, 4>,
    quality: u8,
) -> Result<(), IoError> {
    let bytes = encode_image_jpeg_rgba8(image, quality)?;
    std::fs::write(file_path, bytes)?;
    Ok(())
}

fn encode_jpeg_impl(
    buf: &[u8],
    width: usize,
    height: usize,
    quality: u8,
) -> Result<Vec<u8>, IoError> {
    if !(1..=100).contains(&quality) {
        return Err(IoError::ImageEncodeError(format!(
            "jpeg quality must be in 1..=100, got {quality}"
        )));
    }

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode(buf, width as u32, height as u32, ExtendedColorType::Rgb8)
        .map_err(|e| IoError::ImageEncodeError(e.to_string()))?;

    log::debug!("encoded {width}x{height} jpeg at quality {quality}: {} bytes", out.len());
    Ok(out)
}
