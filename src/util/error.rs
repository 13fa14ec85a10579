//! Error types for wircpol-masks.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for wircpol-masks operations.
pub type MaskResult<T> = std::result::Result<T, MaskError>;

/// Errors that can occur while building masks, loading templates or scanning.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MaskError {
    /// Width or height is zero or overflows the address space.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is smaller than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// Backing buffer is shorter than the declared shape requires.
    #[error("buffer too small: needed {needed} elements, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Requested region does not fit in the image.
    #[error(
        "roi {width}x{height} at ({x}, {y}) out of bounds for {img_width}x{img_height} image"
    )]
    RoiOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// Two arrays that must share a shape do not.
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },
    /// A runtime parameter is out of its valid domain.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: &'static str,
    },
    /// The installation-root environment variable is not set.
    #[error("environment variable {var} is not set")]
    MissingEnvironment { var: String },
    /// A required calibration file does not exist or cannot be opened.
    #[error("resource not found: {}: {reason}", path.display())]
    ResourceNotFound { path: PathBuf, reason: String },
    /// A calibration file exists but its content is unusable.
    #[error("corrupt resource: {}: {reason}", path.display())]
    CorruptResource { path: PathBuf, reason: String },
    /// Raster encode or decode failure.
    #[error("image io: {reason}")]
    ImageIo { reason: String },
    /// Configuration could not be read or is inconsistent.
    #[error("config: {reason}")]
    Config { reason: String },
    /// Correlation template cannot be normalized.
    #[error("degenerate template: {reason}")]
    DegenerateTemplate { reason: &'static str },
}
