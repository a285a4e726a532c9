//! Raster access, image views and owned buffers.
//!
//! `RasterSource` is the read-only gray-level contract every filter and
//! transform consumes. `ImageView` is a borrowed 2D view into a 1D buffer with
//! an explicit stride. The stride counts elements between the starts of
//! consecutive rows, so a stride larger than the width represents padded rows.
//! ROI slices are zero-copy views into the same backing slice and retain the
//! original stride.

use crate::util::{HeadMatchError, HeadMatchResult};

mod buffer;
#[cfg(feature = "image-io")]
pub mod io;

pub use buffer::{OwnedImage, RgbImage};

/// Read-only rectangular grid of gray values in `0..=255`.
pub trait RasterSource {
    /// Width in pixels.
    fn width(&self) -> usize;

    /// Height in pixels.
    fn height(&self) -> usize;

    /// Gray value at `(x, y)`. Callers keep coordinates inside the raster.
    fn value(&self, x: usize, y: usize) -> u8;
}

impl<R: RasterSource + ?Sized> RasterSource for &R {
    fn width(&self) -> usize {
        (**self).width()
    }

    fn height(&self) -> usize {
        (**self).height()
    }

    fn value(&self, x: usize, y: usize) -> u8 {
        (**self).value(x, y)
    }
}

/// Integer rectangle in pixel units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Geometric center, possibly fractional.
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// Returns a copy shifted by `(dx, dy)`.
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }
}

/// Borrowed 2D image view with an explicit stride.
#[derive(Copy, Clone)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> HeadMatchResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride.
    pub fn new(data: &'a [T], width: usize, height: usize, stride: usize) -> HeadMatchResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(HeadMatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Wraps parts that the caller has already validated.
    pub(crate) fn from_raw_parts(
        data: &'a [T],
        width: usize,
        height: usize,
        stride: usize,
    ) -> Self {
        debug_assert!(required_len(width, height, stride).is_ok_and(|n| n <= data.len()));
        Self {
            data,
            width,
            height,
            stride,
        }
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the backing slice including any row padding.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Returns the element at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y.checked_mul(self.stride)?.checked_add(x)?;
        self.data.get(idx)
    }

    /// Returns a contiguous slice for row `y` with length `width`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width)?;
        self.data.get(start..end)
    }

    /// Returns a zero-copy ROI view into the same backing buffer.
    pub fn roi(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> HeadMatchResult<ImageView<'a, T>> {
        if width == 0 || height == 0 {
            return Err(HeadMatchError::InvalidDimensions { width, height });
        }

        let out_of_bounds = HeadMatchError::RoiOutOfBounds {
            x,
            y,
            width,
            height,
            img_width: self.width,
            img_height: self.height,
        };
        let end_x = x.checked_add(width).ok_or_else(|| out_of_bounds.clone())?;
        let end_y = y.checked_add(height).ok_or_else(|| out_of_bounds.clone())?;
        if end_x > self.width || end_y > self.height {
            return Err(out_of_bounds);
        }

        let start = y
            .checked_mul(self.stride)
            .and_then(|v| v.checked_add(x))
            .ok_or(HeadMatchError::InvalidDimensions {
                width: self.width,
                height: self.height,
            })?;
        let data = self
            .data
            .get(start..)
            .ok_or(HeadMatchError::BufferTooSmall {
                needed: start.saturating_add(1),
                got: self.data.len(),
            })?;

        ImageView::new(data, width, height, self.stride)
    }
}

impl RasterSource for ImageView<'_, u8> {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn value(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.stride + x]
    }
}

pub(crate) fn required_len(width: usize, height: usize, stride: usize) -> HeadMatchResult<usize> {
    if width == 0 || height == 0 {
        return Err(HeadMatchError::InvalidDimensions { width, height });
    }
    if stride < width {
        return Err(HeadMatchError::InvalidStride { width, stride });
    }
    let needed = (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .ok_or(HeadMatchError::InvalidDimensions { width, height })?;
    Ok(needed)
}
