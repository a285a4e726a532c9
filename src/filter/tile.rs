//! Integral tiles: O(1) windowed sums of gray values and squared gray values.
//!
//! Both tiles store inclusive-exclusive prefix sums, so the sum over the
//! window `[x1, x2) x [y1, y2)` is `D + A - B - C` with `A = P(x1, y1)`,
//! `B = P(x2, y1)`, `C = P(x1, y2)` and `D = P(x2, y2)`. Windows are clamped
//! to the raster and the reported count is the clipped area.

use crate::image::RasterSource;
use crate::util::{HeadMatchError, HeadMatchResult};
use std::cell::RefCell;

/// Sums over one clipped square window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WindowSums {
    /// Sum of gray values.
    pub sum: u64,
    /// Sum of squared gray values.
    pub sum_sq: u64,
    /// Number of pixels in the clipped window.
    pub count: u64,
}

impl WindowSums {
    /// Returns the window mean and standard deviation.
    pub fn mean_std_dev(&self) -> (f64, f64) {
        if self.count == 0 {
            return (0.0, 0.0);
        }
        let count = self.count as f64;
        let mean = self.sum as f64 / count;
        let mean_sq = self.sum_sq as f64 / count;
        (mean, (mean_sq - mean * mean).abs().sqrt())
    }
}

/// Source of windowed sums for the adaptive filter.
pub trait IntegralTile {
    /// Width of the covered raster.
    fn width(&self) -> usize;

    /// Height of the covered raster.
    fn height(&self) -> usize;

    /// Half-width of the square window.
    fn half_window(&self) -> usize;

    /// Returns the sums over the window centered on `(x, y)`.
    fn window_sums(&self, x: usize, y: usize) -> WindowSums;
}

/// Clipped window bounds `[x1, x2) x [y1, y2)` around `(x, y)`.
fn window_bounds(
    x: usize,
    y: usize,
    half: usize,
    width: usize,
    height: usize,
) -> (usize, usize, usize, usize) {
    (
        x.saturating_sub(half),
        x.saturating_add(half).saturating_add(1).min(width),
        y.saturating_sub(half),
        y.saturating_add(half).saturating_add(1).min(height),
    )
}

fn check_dims(width: usize, height: usize) -> HeadMatchResult<()> {
    if width == 0 || height == 0 {
        return Err(HeadMatchError::InvalidDimensions { width, height });
    }
    Ok(())
}

/// Prefix sums for the whole raster, computed once.
///
/// Immutable after construction and therefore safe to query from several
/// threads at once.
pub struct FullTile {
    width: usize,
    height: usize,
    half: usize,
    sums: Vec<u64>,
    squares: Vec<u64>,
}

impl FullTile {
    /// Precomputes the `(width + 1) x (height + 1)` prefix tables.
    pub fn new<S: RasterSource>(source: &S, half_window: usize) -> HeadMatchResult<Self> {
        let width = source.width();
        let height = source.height();
        check_dims(width, height)?;
        let stride = width + 1;
        let len = stride
            .checked_mul(height + 1)
            .ok_or(HeadMatchError::InvalidDimensions { width, height })?;
        let mut sums = vec![0u64; len];
        let mut squares = vec![0u64; len];

        for y in 0..height {
            let mut row_sum = 0u64;
            let mut row_sq = 0u64;
            for x in 0..width {
                let v = u64::from(source.value(x, y));
                row_sum += v;
                row_sq += v * v;
                let above = y * stride + x + 1;
                let here = (y + 1) * stride + x + 1;
                sums[here] = sums[above] + row_sum;
                squares[here] = squares[above] + row_sq;
            }
        }

        Ok(Self {
            width,
            height,
            half: half_window,
            sums,
            squares,
        })
    }

    fn at(&self, x: usize, y: usize) -> (u64, u64) {
        let idx = y * (self.width + 1) + x;
        (self.sums[idx], self.squares[idx])
    }
}

impl IntegralTile for FullTile {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn half_window(&self) -> usize {
        self.half
    }

    fn window_sums(&self, x: usize, y: usize) -> WindowSums {
        let (x1, x2, y1, y2) = window_bounds(x, y, self.half, self.width, self.height);
        let a = self.at(x1, y1);
        let b = self.at(x2, y1);
        let c = self.at(x1, y2);
        let d = self.at(x2, y2);
        WindowSums {
            sum: (d.0 + a.0) - (b.0 + c.0),
            sum_sq: (d.1 + a.1) - (b.1 + c.1),
            count: ((x2 - x1) * (y2 - y1)) as u64,
        }
    }
}

struct SlidingState {
    /// Highest prefix column currently held.
    last_column: usize,
    /// Abscissa of the latest query.
    last_x: Option<usize>,
    sums: Vec<u64>,
    squares: Vec<u64>,
}

/// Prefix sums over a circular band of `2 * half_window + 2` columns.
///
/// Each query advances the band so that it covers the queried window.
/// Queries must come with non-decreasing abscissa; a backward query, or a
/// query issued while another one is in progress, panics. The tile is not
/// `Sync` and serves exactly one forward scan at a time (see
/// [`SlidingTile::rewind`] to start over).
pub struct SlidingTile<S> {
    source: S,
    width: usize,
    height: usize,
    half: usize,
    columns: usize,
    state: RefCell<SlidingState>,
}

impl<S: RasterSource> SlidingTile<S> {
    pub fn new(source: S, half_window: usize) -> HeadMatchResult<Self> {
        let width = source.width();
        let height = source.height();
        check_dims(width, height)?;
        let columns = half_window
            .checked_mul(2)
            .and_then(|v| v.checked_add(2))
            .ok_or(HeadMatchError::InvalidInput("half window too large"))?;
        let len = columns
            .checked_mul(height + 1)
            .ok_or(HeadMatchError::InvalidDimensions { width, height })?;
        Ok(Self {
            source,
            width,
            height,
            half: half_window,
            columns,
            state: RefCell::new(SlidingState {
                last_column: 0,
                last_x: None,
                sums: vec![0; len],
                squares: vec![0; len],
            }),
        })
    }

    /// Number of columns kept in the circular band.
    pub fn band_columns(&self) -> usize {
        self.columns
    }

    /// Forgets all materialized columns so a new scan can start at column 0.
    pub fn rewind(&mut self) {
        let state = self.state.get_mut();
        state.last_column = 0;
        state.last_x = None;
        state.sums.fill(0);
        state.squares.fill(0);
    }

    fn slot(&self, column: usize) -> usize {
        (column % self.columns) * (self.height + 1)
    }

    /// Derives prefix column `column` from column `column - 1`.
    fn materialize(&self, state: &mut SlidingState, column: usize) {
        let prev = self.slot(column - 1);
        let cur = self.slot(column);
        let mut acc_sum = 0u64;
        let mut acc_sq = 0u64;
        state.sums[cur] = 0;
        state.squares[cur] = 0;
        for y in 0..self.height {
            let v = u64::from(self.source.value(column - 1, y));
            acc_sum += v;
            acc_sq += v * v;
            state.sums[cur + y + 1] = state.sums[prev + y + 1] + acc_sum;
            state.squares[cur + y + 1] = state.squares[prev + y + 1] + acc_sq;
        }
        state.last_column = column;
    }
}

impl<S: RasterSource> IntegralTile for SlidingTile<S> {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn half_window(&self) -> usize {
        self.half
    }

    fn window_sums(&self, x: usize, y: usize) -> WindowSums {
        let mut guard = self
            .state
            .try_borrow_mut()
            .unwrap_or_else(|_| panic!("sliding tile queried re-entrantly at column {x}"));
        let state = &mut *guard;
        if let Some(last_x) = state.last_x {
            assert!(
                x >= last_x,
                "sliding tile queried at column {x} after column {last_x}; columns must not decrease"
            );
        }
        state.last_x = Some(x);

        let (x1, x2, y1, y2) = window_bounds(x, y, self.half, self.width, self.height);
        while state.last_column < x2 {
            let next = state.last_column + 1;
            self.materialize(state, next);
        }
        debug_assert!(x1 + self.columns > state.last_column);

        let (s1, s2) = (self.slot(x1), self.slot(x2));
        let a = (state.sums[s1 + y1], state.squares[s1 + y1]);
        let b = (state.sums[s2 + y1], state.squares[s2 + y1]);
        let c = (state.sums[s1 + y2], state.squares[s1 + y2]);
        let d = (state.sums[s2 + y2], state.squares[s2 + y2]);
        WindowSums {
            sum: (d.0 + a.0) - (b.0 + c.0),
            sum_sq: (d.1 + a.1) - (b.1 + c.1),
            count: ((x2 - x1) * (y2 - y1)) as u64,
        }
    }
}
