//! Precomputed radial distances from a kernel's center.

use sylva_grid::Grid;

use crate::error::KernelError;

/// Metric distance of every cell offset `(dx, dy)` from the origin.
///
/// Built once per library and shared by every kernel through an
/// `Arc`. Entry `(dx, dy)` holds `cell_size * sqrt(dx² + dy²)`.
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceTable {
    values: Grid<f32>,
}

impl DistanceTable {
    /// A `size x size` table for cells of `cell_size` metres.
    pub fn new(size: usize, cell_size: f64) -> Result<Self, KernelError> {
        let mut values: Grid<f32> = Grid::new(cell_size, size, size)?;
        for i in 0..values.count() {
            let (x, y) = values.index_of(i);
            let cells = ((x * x + y * y) as f64).sqrt();
            values[i] = (cells * cell_size) as f32;
        }
        Ok(Self { values })
    }

    /// Side length of the table.
    pub fn size(&self) -> usize {
        self.values.size_x()
    }

    /// Cell size the distances are expressed in.
    pub fn cell_size(&self) -> f64 {
        self.values.cell_size()
    }

    /// Distance for offset `(dx, dy)`; both must be non-negative and
    /// smaller than [`size`](Self::size).
    pub fn get(&self, dx: usize, dy: usize) -> Option<f32> {
        if dx >= self.size() || dy >= self.size() {
            return None;
        }
        self.values.get(dx as i32, dy as i32).copied()
    }
}
