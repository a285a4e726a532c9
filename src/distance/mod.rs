//! Distance-to-reference tables and the chamfer transform that fills them.
//!
//! Cells hold `UNASSIGNED` (-1), `TARGET` (0) or a positive distance scaled
//! by the table normalizer: the real distance in pixels is
//! `value / normalizer`. The normalizer is the axial step weight of the
//! chamfer kernel that produced the table.

mod chamfer;
mod table;

pub use chamfer::{ChamferDistance, ChamferKernel, INK_MAX};
pub use table::{DistanceCell, DistanceTable, DistanceView};

/// Cell not reached by any propagation (or neutralized by the caller).
pub const UNASSIGNED: i32 = -1;
/// Cell belonging to the reference set.
pub const TARGET: i32 = 0;

/// Colors used by [`DistanceTable::to_image`].
pub mod palette {
    /// Cells still `UNASSIGNED`.
    pub const UNASSIGNED_COLOR: [u8; 3] = [255, 0, 0];
    /// Cells farther than the visualized maximum.
    pub const TOO_FAR_COLOR: [u8; 3] = [176, 224, 255];
}

/// Read access shared by owned tables and borrowed views.
pub trait Distances {
    fn width(&self) -> usize;

    fn height(&self) -> usize;

    /// Raw (scaled) value at `(x, y)`, which must lie inside the grid.
    fn value(&self, x: usize, y: usize) -> i32;

    /// Scale factor between raw values and pixel distances.
    fn normalizer(&self) -> i32;

    /// Raw value at signed coordinates, `None` outside the grid.
    fn value_at(&self, x: i64, y: i64) -> Option<i32> {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return None;
        }
        Some(self.value(x as usize, y as usize))
    }
}

impl<D: Distances + ?Sized> Distances for &D {
    fn width(&self) -> usize {
        (**self).width()
    }

    fn height(&self) -> usize {
        (**self).height()
    }

    fn value(&self, x: usize, y: usize) -> i32 {
        (**self).value(x, y)
    }

    fn normalizer(&self) -> i32 {
        (**self).normalizer()
    }
}
