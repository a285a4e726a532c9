//! Typed distance grids and zero-copy views over them.

use crate::distance::palette::{TOO_FAR_COLOR, UNASSIGNED_COLOR};
use crate::distance::{Distances, UNASSIGNED};
use crate::image::{ImageView, RgbImage};
use crate::util::{HeadMatchError, HeadMatchResult};
use std::fmt::Write;

/// Storage cell of a distance table.
///
/// `i16` halves the memory of `i32` at the price of a lower largest
/// distance; values beyond `MAX` saturate.
pub trait DistanceCell: Copy + Send + Sync + 'static {
    /// Largest storable raw value.
    const MAX: i32;

    fn from_raw(value: i32) -> Self;

    fn to_raw(self) -> i32;
}

impl DistanceCell for i16 {
    const MAX: i32 = i16::MAX as i32;

    #[inline]
    fn from_raw(value: i32) -> Self {
        value.clamp(i32::from(i16::MIN), <i16 as DistanceCell>::MAX) as i16
    }

    #[inline]
    fn to_raw(self) -> i32 {
        i32::from(self)
    }
}

impl DistanceCell for i32 {
    const MAX: i32 = i32::MAX;

    #[inline]
    fn from_raw(value: i32) -> Self {
        value
    }

    #[inline]
    fn to_raw(self) -> i32 {
        self
    }
}

/// Owned row-major grid of raw distances.
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceTable<C = i32> {
    data: Vec<C>,
    width: usize,
    height: usize,
    normalizer: i32,
}

impl<C: DistanceCell> DistanceTable<C> {
    /// Creates a table with every cell `UNASSIGNED`.
    pub fn new(width: usize, height: usize, normalizer: i32) -> HeadMatchResult<Self> {
        if width == 0 || height == 0 {
            return Err(HeadMatchError::InvalidDimensions { width, height });
        }
        if normalizer <= 0 {
            return Err(HeadMatchError::InvalidInput("normalizer must be positive"));
        }
        let len = width
            .checked_mul(height)
            .ok_or(HeadMatchError::InvalidDimensions { width, height })?;
        Ok(Self {
            data: vec![C::from_raw(UNASSIGNED); len],
            width,
            height,
            normalizer,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn normalizer(&self) -> i32 {
        self.normalizer
    }

    /// Raw value at `(x, y)`; panics outside the grid.
    #[inline]
    pub fn value(&self, x: usize, y: usize) -> i32 {
        assert!(x < self.width && y < self.height, "({x},{y}) outside table");
        self.data[y * self.width + x].to_raw()
    }

    /// Raw value at `(x, y)` if it lies inside the grid.
    pub fn get(&self, x: usize, y: usize) -> Option<i32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[y * self.width + x].to_raw())
    }

    /// Stores a raw value, saturating to the cell range.
    #[inline]
    pub fn set_value(&mut self, x: usize, y: usize, value: i32) {
        assert!(x < self.width && y < self.height, "({x},{y}) outside table");
        self.data[y * self.width + x] = C::from_raw(value);
    }

    /// Sets every cell to `value`.
    pub fn fill(&mut self, value: i32) {
        self.data.fill(C::from_raw(value));
    }

    /// Borrowed view of the whole table.
    pub fn as_view(&self) -> DistanceView<'_, C> {
        DistanceView {
            cells: ImageView::from_raw_parts(&self.data, self.width, self.height, self.width),
            normalizer: self.normalizer,
        }
    }

    /// Zero-copy view of a sub-rectangle, keeping the normalizer.
    pub fn view(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> HeadMatchResult<DistanceView<'_, C>> {
        self.as_view().view(x, y, width, height)
    }

    /// Deep copy of a sub-rectangle, keeping the normalizer.
    pub fn copy(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> HeadMatchResult<DistanceTable<C>> {
        self.view(x, y, width, height)?.to_table()
    }

    /// Renders the table for visual checks.
    ///
    /// Raw values up to `max_distance * normalizer` map onto a black-to-white
    /// ramp (target cells are black), larger values use `TOO_FAR_COLOR` and
    /// unassigned cells `UNASSIGNED_COLOR`.
    pub fn to_image(&self, max_distance: f64) -> HeadMatchResult<RgbImage> {
        if !max_distance.is_finite() || max_distance < 0.0 {
            return Err(HeadMatchError::InvalidInput(
                "max distance must be finite and non-negative",
            ));
        }
        let max_raw = (max_distance * f64::from(self.normalizer))
            .round()
            .min(f64::from(i32::MAX)) as i64;
        // The ramp spans max_raw but only needs slots up to the largest value.
        let largest = self.data.iter().map(|c| c.to_raw()).max().unwrap_or(UNASSIGNED);
        let last = i64::from(largest.max(0)).min(max_raw);
        // Slot 0 is reserved for UNASSIGNED, raw value v lives in slot v + 1.
        let mut lut = Vec::with_capacity(last as usize + 2);
        lut.push(UNASSIGNED_COLOR);
        for v in 0..=last {
            let level = if max_raw == 0 {
                0
            } else {
                (255 * v / max_raw) as u8
            };
            lut.push([level, level, level]);
        }

        let mut img = RgbImage::filled(self.width, self.height, TOO_FAR_COLOR)?;
        for y in 0..self.height {
            for x in 0..self.width {
                let raw = self.value(x, y);
                if i64::from(raw) > last {
                    continue;
                }
                let slot = (raw.max(UNASSIGNED) + 1) as usize;
                img.put(x as i64, y as i64, lut[slot]);
            }
        }
        Ok(img)
    }

    /// Text rendering of the raw values, one row per line.
    pub fn dump(&self, title: &str) -> String {
        self.as_view().dump(title)
    }
}

impl<C: DistanceCell> Distances for DistanceTable<C> {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn value(&self, x: usize, y: usize) -> i32 {
        self.data[y * self.width + x].to_raw()
    }

    fn normalizer(&self) -> i32 {
        self.normalizer
    }
}

/// Borrowed sub-rectangle of a distance table.
#[derive(Clone, Copy)]
pub struct DistanceView<'a, C = i32> {
    cells: ImageView<'a, C>,
    normalizer: i32,
}

impl<'a, C: DistanceCell> DistanceView<'a, C> {
    pub fn width(&self) -> usize {
        self.cells.width()
    }

    pub fn height(&self) -> usize {
        self.cells.height()
    }

    pub fn normalizer(&self) -> i32 {
        self.normalizer
    }

    /// Raw value at `(x, y)` if it lies inside the view.
    pub fn get(&self, x: usize, y: usize) -> Option<i32> {
        self.cells.get(x, y).map(|c| c.to_raw())
    }

    /// Nested zero-copy view, coordinates relative to this view.
    pub fn view(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> HeadMatchResult<DistanceView<'a, C>> {
        Ok(DistanceView {
            cells: self.cells.roi(x, y, width, height)?,
            normalizer: self.normalizer,
        })
    }

    /// Copies the viewed cells into an owned table.
    pub fn to_table(&self) -> HeadMatchResult<DistanceTable<C>> {
        let width = self.width();
        let height = self.height();
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            let row = self.cells.row(y).ok_or(HeadMatchError::BufferTooSmall {
                needed: (y + 1) * self.cells.stride(),
                got: self.cells.as_slice().len(),
            })?;
            data.extend_from_slice(row);
        }
        Ok(DistanceTable {
            data,
            width,
            height,
            normalizer: self.normalizer,
        })
    }

    /// Text rendering of the raw values, one row per line.
    pub fn dump(&self, title: &str) -> String {
        let width = self.width();
        let height = self.height();
        let cell = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| Distances::value(self, x, y).to_string().len())
            .chain(std::iter::once(width.to_string().len()))
            .max()
            .unwrap_or(1)
            + 1;
        let margin = height.to_string().len();

        let mut out = String::new();
        let _ = writeln!(out, "{title}");
        let _ = write!(out, "{:margin$}", "");
        for x in 0..width {
            let _ = write!(out, "{x:>cell$}");
        }
        out.push('\n');
        for y in 0..height {
            let _ = write!(out, "{y:>margin$}");
            for x in 0..width {
                match Distances::value(self, x, y) {
                    UNASSIGNED => {
                        let _ = write!(out, "{:>cell$}", ".");
                    }
                    v => {
                        let _ = write!(out, "{v:>cell$}");
                    }
                }
            }
            out.push('\n');
        }
        out
    }
}

impl<C: DistanceCell> Distances for DistanceView<'_, C> {
    fn width(&self) -> usize {
        self.cells.width()
    }

    fn height(&self) -> usize {
        self.cells.height()
    }

    #[inline]
    fn value(&self, x: usize, y: usize) -> i32 {
        self.cells.as_slice()[y * self.cells.stride() + x].to_raw()
    }

    fn normalizer(&self) -> i32 {
        self.normalizer
    }
}
