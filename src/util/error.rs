//! Error types for headmatch.

use crate::template::{Anchor, Shape};
use thiserror::Error;

/// Result alias for headmatch operations.
pub type HeadMatchResult<T> = std::result::Result<T, HeadMatchError>;

/// Errors that can occur when binarizing, measuring distances or matching.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum HeadMatchError {
    /// Width or height is zero, or their product overflows.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is smaller than the row width.
    #[error("stride {stride} is smaller than width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// Backing buffer cannot hold the declared image.
    #[error("buffer too small: needed {needed} elements, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A sub-region does not fit inside its parent grid.
    #[error(
        "region ({x},{y}) {width}x{height} is outside a {img_width}x{img_height} grid"
    )]
    RoiOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// The renderer has no glyph for this shape.
    #[error("no glyph available for shape {shape:?} (code {code})")]
    MissingGlyph { shape: Shape, code: u32 },
    /// The renderer produced an unusable raster.
    #[error("rendering {shape:?} at size {point_size} failed: {reason}")]
    RenderFailed {
        shape: Shape,
        point_size: u32,
        reason: String,
    },
    /// The template defines no offset for the requested anchor.
    #[error("anchor {anchor:?} is not defined for shape {shape:?}")]
    UndefinedAnchor { anchor: Anchor, shape: Shape },
    /// Template and distance table were built with different kernels.
    #[error("normalizer mismatch: template uses {template}, table uses {table}")]
    NormalizerMismatch { template: i32, table: i32 },
    /// Image decoding or encoding failed.
    #[error("image i/o failed: {reason}")]
    ImageIo { reason: String },
}
