//! Two-pass chamfer distance transform.
//!
//! A kernel lists `(dx, dy, weight)` steps with `0 <= dy <= dx`; each step is
//! expanded to its eight mirrored and transposed variants. The forward pass
//! walks the grid from top-left to bottom-right and pushes `value + weight`
//! from every assigned cell to the variants lying ahead in raster order; the
//! backward pass walks back and pushes to the remaining variants. A cell is
//! overwritten only when it is unassigned or the proposed value is strictly
//! smaller.

use crate::distance::table::{DistanceCell, DistanceTable};
use crate::distance::{TARGET, UNASSIGNED};
use crate::filter::PixelFilter;
use crate::image::{ImageView, RasterSource};
use crate::trace::{trace_event, trace_span};
use crate::util::{HeadMatchError, HeadMatchResult};

/// Gray values at or below this level count as ink in `compute_to_fore`.
pub const INK_MAX: u8 = 127;

/// Propagation kernels, named after the side of their square footprint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChamferKernel {
    /// 3x3 footprint, weights 3 and 4.
    #[default]
    Chamfer3,
    /// 5x5 footprint, weights 5, 7 and 11.
    Chamfer5,
    /// 7x7 footprint, normalizer 14.
    Chamfer7,
    /// 13x13 footprint, normalizer 68.
    Chamfer13,
}

const CHAMFER_3: &[(i32, i32, i32)] = &[(1, 0, 3), (1, 1, 4)];
const CHAMFER_5: &[(i32, i32, i32)] = &[(1, 0, 5), (1, 1, 7), (2, 1, 11)];
const CHAMFER_7: &[(i32, i32, i32)] = &[(1, 0, 14), (1, 1, 20), (2, 1, 31), (3, 1, 44)];
const CHAMFER_13: &[(i32, i32, i32)] = &[
    (1, 0, 68),
    (1, 1, 96),
    (2, 1, 152),
    (3, 1, 215),
    (3, 2, 245),
    (4, 1, 280),
    (4, 3, 340),
    (5, 1, 347),
    (5, 2, 366),
    (5, 3, 397),
    (5, 4, 435),
    (6, 1, 414),
    (6, 5, 531),
];

impl ChamferKernel {
    /// Kernel entries `(dx, dy, weight)`; the first one is the axial step.
    pub fn entries(&self) -> &'static [(i32, i32, i32)] {
        match self {
            ChamferKernel::Chamfer3 => CHAMFER_3,
            ChamferKernel::Chamfer5 => CHAMFER_5,
            ChamferKernel::Chamfer7 => CHAMFER_7,
            ChamferKernel::Chamfer13 => CHAMFER_13,
        }
    }

    /// Weight of one axial step, i.e. the scale of raw distances.
    pub fn normalizer(&self) -> i32 {
        self.entries()[0].2
    }

    /// All symmetric variants of the kernel steps, without duplicates.
    pub fn symmetric_steps(&self) -> Vec<(i32, i32, i32)> {
        let mut steps: Vec<(i32, i32, i32)> = Vec::new();
        for &(dx, dy, w) in self.entries() {
            for (a, b) in [(dx, dy), (dy, dx)] {
                for (sx, sy) in [(1, 1), (-1, 1), (1, -1), (-1, -1)] {
                    let step = (a * sx, b * sy, w);
                    if !steps.contains(&step) {
                        steps.push(step);
                    }
                }
            }
        }
        steps
    }

    /// Steps pointing ahead in raster order (down, or right on the same row).
    fn forward_steps(&self) -> Vec<(i32, i32, i32)> {
        self.symmetric_steps()
            .into_iter()
            .filter(|&(dx, dy, _)| dy > 0 || (dy == 0 && dx > 0))
            .collect()
    }
}

/// Chamfer distance transform over boolean reference masks.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChamferDistance {
    kernel: ChamferKernel,
}

impl ChamferDistance {
    pub fn new(kernel: ChamferKernel) -> Self {
        Self { kernel }
    }

    pub fn kernel(&self) -> ChamferKernel {
        self.kernel
    }

    pub fn normalizer(&self) -> i32 {
        self.kernel.normalizer()
    }

    /// Distances to the `true` cells of `reference`.
    pub fn compute<C: DistanceCell>(
        &self,
        reference: ImageView<'_, bool>,
    ) -> HeadMatchResult<DistanceTable<C>> {
        self.compute_with(reference.width(), reference.height(), |x, y| {
            reference.get(x, y).copied().unwrap_or(false)
        })
    }

    /// Distances to the ink pixels (gray `<= INK_MAX`) of a raster.
    pub fn compute_to_fore<C: DistanceCell, S: RasterSource + ?Sized>(
        &self,
        raster: &S,
    ) -> HeadMatchResult<DistanceTable<C>> {
        self.compute_with(raster.width(), raster.height(), |x, y| {
            raster.value(x, y) <= INK_MAX
        })
    }

    /// Distances to the background pixels (gray `> INK_MAX`) of a raster.
    pub fn compute_to_back<C: DistanceCell, S: RasterSource + ?Sized>(
        &self,
        raster: &S,
    ) -> HeadMatchResult<DistanceTable<C>> {
        self.compute_with(raster.width(), raster.height(), |x, y| {
            raster.value(x, y) > INK_MAX
        })
    }

    /// Distances to the foreground decisions of a pixel filter.
    ///
    /// The filter is queried column by column, so sliding tiles are fine.
    pub fn compute_filtered<C: DistanceCell, F: PixelFilter + ?Sized>(
        &self,
        filter: &F,
    ) -> HeadMatchResult<DistanceTable<C>> {
        self.compute_with(filter.width(), filter.height(), |x, y| filter.is_fore(x, y))
    }

    /// Runs the transform with an arbitrary reference predicate.
    ///
    /// The predicate is evaluated once per cell, column by column.
    pub fn compute_with<C, P>(
        &self,
        width: usize,
        height: usize,
        is_reference: P,
    ) -> HeadMatchResult<DistanceTable<C>>
    where
        C: DistanceCell,
        P: Fn(usize, usize) -> bool,
    {
        if width > i32::MAX as usize || height > i32::MAX as usize {
            return Err(HeadMatchError::InvalidDimensions { width, height });
        }
        let _span = trace_span!("chamfer", width = width, height = height).entered();
        let mut table = DistanceTable::<C>::new(width, height, self.normalizer())?;
        let mut targets = 0usize;
        for x in 0..width {
            for y in 0..height {
                if is_reference(x, y) {
                    table.set_value(x, y, TARGET);
                    targets += 1;
                }
            }
        }

        let forward = self.kernel.forward_steps();
        let backward: Vec<_> = forward.iter().map(|&(dx, dy, w)| (-dx, -dy, w)).collect();

        for y in 0..height {
            for x in 0..width {
                propagate(&mut table, x, y, &forward);
            }
        }
        for y in (0..height).rev() {
            for x in (0..width).rev() {
                propagate(&mut table, x, y, &backward);
            }
        }

        trace_event!("chamfer_done", targets = targets);
        Ok(table)
    }
}

#[inline]
fn propagate<C: DistanceCell>(
    table: &mut DistanceTable<C>,
    x: usize,
    y: usize,
    steps: &[(i32, i32, i32)],
) {
    let value = table.value(x, y);
    if value == UNASSIGNED {
        return;
    }
    let width = table.width() as i64;
    let height = table.height() as i64;
    for &(dx, dy, w) in steps {
        let nx = x as i64 + i64::from(dx);
        let ny = y as i64 + i64::from(dy);
        if nx < 0 || ny < 0 || nx >= width || ny >= height {
            continue;
        }
        let (nx, ny) = (nx as usize, ny as usize);
        let proposed = value.saturating_add(w).min(C::MAX);
        let current = table.value(nx, ny);
        if current == UNASSIGNED || proposed < current {
            table.set_value(nx, ny, proposed);
        }
    }
}
