//! Owned contiguous pixel buffers.

use crate::image::{ImageView, RasterSource};
use crate::util::{HeadMatchError, HeadMatchResult};

/// Owned contiguous grayscale image buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct OwnedImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl OwnedImage {
    /// Wraps a row-major buffer of exactly `width * height` bytes.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> HeadMatchResult<Self> {
        let needed = checked_area(width, height)?;
        if data.len() < needed {
            return Err(HeadMatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(HeadMatchError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Creates an image with every pixel set to `value`.
    pub fn filled(width: usize, height: usize, value: u8) -> HeadMatchResult<Self> {
        let len = checked_area(width, height)?;
        Self::new(vec![value; len], width, height)
    }

    /// Copies a (possibly strided) view into a contiguous buffer.
    pub fn from_view(view: ImageView<'_, u8>) -> HeadMatchResult<Self> {
        let width = view.width();
        let height = view.height();
        let mut data = Vec::with_capacity(checked_area(width, height)?);
        for y in 0..height {
            let row = view.row(y).ok_or(HeadMatchError::BufferTooSmall {
                needed: (y + 1) * view.stride(),
                got: view.as_slice().len(),
            })?;
            data.extend_from_slice(row);
        }
        Self::new(data, width, height)
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> ImageView<'_, u8> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the row-major pixel data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Sets the pixel at `(x, y)`.
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.data[y * self.width + x] = value;
    }
}

impl RasterSource for OwnedImage {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn value(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }
}

/// Owned RGB raster used for visualizations and debug dumps.
#[derive(Clone, Debug, PartialEq)]
pub struct RgbImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl RgbImage {
    /// Creates an image filled with one color.
    pub fn filled(width: usize, height: usize, color: [u8; 3]) -> HeadMatchResult<Self> {
        let len = checked_area(width, height)?
            .checked_mul(3)
            .ok_or(HeadMatchError::InvalidDimensions { width, height })?;
        let mut data = Vec::with_capacity(len);
        for _ in 0..width * height {
            data.extend_from_slice(&color);
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns interleaved RGB bytes, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the color at `(x, y)` if it is within bounds.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) * 3;
        Some([self.data[idx], self.data[idx + 1], self.data[idx + 2]])
    }

    /// Sets one pixel; coordinates outside the image are ignored.
    pub fn put(&mut self, x: i64, y: i64, color: [u8; 3]) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = (y as usize * self.width + x as usize) * 3;
        self.data[idx..idx + 3].copy_from_slice(&color);
    }

    /// Fills a rectangle, clipped to the image.
    pub fn fill_rect(&mut self, x: i64, y: i64, width: i64, height: i64, color: [u8; 3]) {
        for py in y..y + height {
            for px in x..x + width {
                self.put(px, py, color);
            }
        }
    }

    /// Draws the one-pixel outline of a rectangle, clipped to the image.
    pub fn stroke_rect(&mut self, x: i64, y: i64, width: i64, height: i64, color: [u8; 3]) {
        if width <= 0 || height <= 0 {
            return;
        }
        for px in x..x + width {
            self.put(px, y, color);
            self.put(px, y + height - 1, color);
        }
        for py in y..y + height {
            self.put(x, py, color);
            self.put(x + width - 1, py, color);
        }
    }
}

fn checked_area(width: usize, height: usize) -> HeadMatchResult<usize> {
    if width == 0 || height == 0 {
        return Err(HeadMatchError::InvalidDimensions { width, height });
    }
    width
        .checked_mul(height)
        .ok_or(HeadMatchError::InvalidDimensions { width, height })
}
