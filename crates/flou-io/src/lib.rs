#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for I/O operations.
///
/// Defines [`IoError`] variants for file access and encoding/decoding failures.
pub mod error;

/// High-level image reading functions.
///
/// Decodes any format supported by the `image` crate into RGB8 or RGBA8 rasters.
/// See [`functional::read_image_any_rgba8`].
pub mod functional;

/// JPEG image encoding.
///
/// Lossy output format of the blur drivers.
pub mod jpeg;

/// PNG image encoding.
pub mod png;

/// Wall-clock and memory measurement of a unit of work.
pub mod perf;

pub use crate::error::IoError;
