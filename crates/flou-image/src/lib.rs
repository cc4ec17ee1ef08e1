#![deny(missing_docs)]
//! Image types for the flou raster filters.

/// image representation for raster filtering.
pub mod image;

/// Error types for the image module.
pub mod error;

pub use crate::error::ImageError;
pub use crate::image::{Image, ImageSize};
