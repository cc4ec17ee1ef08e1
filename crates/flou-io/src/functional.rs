use std::path::Path;

use flou_image::{Image, ImageSize};

use crate::error::IoError;

/// Reads an image of any supported format as three channels (rgb8).
///
/// The format is guessed from the file content, not from its extension.
///
/// # Arguments
///
/// * `file_path` - The path to the image file.
///
/// # Returns
///
/// A RGB image with three channels (rgb8).
pub fn read_image_any_rgb8(file_path: impl AsRef<Path>) -> Result<Image<u8, 3>, IoError> {
    let bytes = read_file_impl(file_path)?;
    decode_image_any_rgb8(&bytes)
}

/// Reads an image of any supported format as four channels (rgba8).
///
/// Images without an alpha channel come back fully opaque.
///
/// # Arguments
///
/// * `file_path` - The path to the image file.
///
/// # Returns
///
/// A RGBA image with four channels (rgba8).
pub fn read_image_any_rgba8(file_path: impl AsRef<Path>) -> Result<Image<u8, 4>, IoError> {
    let bytes = read_file_impl(file_path)?;
    decode_image_any_rgba8(&bytes)
}

/// Decodes an in-memory encoded image as three channels (rgb8).
pub fn decode_image_any_rgb8(bytes: &[u8]) -> Result<Image<u8, 3>, IoError> {
    let img = image::load_from_memory(bytes)?.into_rgb8();
    let size = ImageSize {
        width: img.width() as usize,
        height: img.height() as usize,
    };
    Ok(Image::new(size, img.into_raw())?)
}

/// Decodes an in-memory encoded image as four channels (rgba8).
///
/// # Example
///
/// ```
/// use flou_image::Image;
/// use flou_io::{functional::decode_image_any_rgba8, png::encode_image_png_rgb8};
///
/// let rgb = Image::<u8, 3>::new([2, 1].into(), vec![10, 20, 30, 40, 50, 60]).unwrap();
/// let bytes = encode_image_png_rgb8(&rgb).unwrap();
///
/// let rgba = decode_image_any_rgba8(&bytes).unwrap();
/// assert_eq!(rgba.as_slice(), &[10, 20, 30, 255, 40, 50, 60, 255]);
/// ```
pub fn decode_image_any_rgba8(bytes: &[u8]) -> Result<Image<u8, 4>, IoError> {
    let img = image::load_from_memory(bytes)?.into_rgba8();
    let size = ImageSize {
        width: img.width() as usize,
        height: img.height() as usize,
    };
    Ok(Image::new(size, img.into_raw())?)
}

fn read_file_impl(file_path: impl AsRef<Path>) -> Result<Vec<u8>, IoError> {
    let file_path = file_path.as_ref();
    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path.to_path_buf()));
    }
    let bytes = std::fs::read(file_path)?;
    log::debug!("read {} bytes from {}", bytes.len(), file_path.display());
    Ok(bytes)
}
