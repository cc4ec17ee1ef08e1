//! Filter operations
//!
//! This module provides the Gaussian kernel builder and the row-parallel
//! 2D convolution that applies it to RGB and RGBA rasters.

/// Filter kernels
pub mod kernels;

/// Filter errors
mod error;
pub use error::FilterError;

/// 2D convolution
mod convolution;
pub use convolution::*;

/// Filter operations
mod ops;
pub use ops::*;
