use flou_image::{ImageError, ImageSize};

use crate::parallel::ParallelError;

/// An error type for the filter module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum FilterError {
    /// The kernel size must be at least one.
    #[error("Invalid kernel size: {0} (must be > 0)")]
    InvalidKernelSize(usize),

    /// The Gaussian spread must be a finite, strictly positive number.
    #[error("Invalid sigma: {0} (must be finite and > 0)")]
    InvalidSigma(f64),

    /// The destination raster does not have the size of the source.
    #[error("Source size ({src}) does not match destination size ({dst})")]
    DimensionMismatch {
        /// size of the source image
        src: ImageSize,
        /// size of the destination image
        dst: ImageSize,
    },

    /// The filter only handles RGB and RGBA rasters.
    #[error("Unsupported number of channels: {0} (expected 3 or 4)")]
    UnsupportedChannels(usize),

    /// The convolution was abandoned before every row was written.
    #[error("Convolution cancelled")]
    Cancelled,

    /// Error from the row scheduler.
    #[error(transparent)]
    Parallel(#[from] ParallelError),

    /// Error from the image container.
    #[error(transparent)]
    Image(#[from] ImageError),
}
