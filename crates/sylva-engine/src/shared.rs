//! Grids that many tasks may write through a shared reference.
//!
//! Cells are `f32` values stored as bits in an `AtomicU32`. Updates use
//! a compare-exchange loop, so concurrent writes to one cell never lose
//! an update; the partitioned scheduler makes such overlaps rare, not
//! impossible. Relaxed ordering suffices because the scheduler's phase
//! barrier orders everything between phases.

use std::sync::atomic::{AtomicU32, Ordering};

use sylva_grid::{Grid, GridGeometry};
use sylva_stamp::{EdgePolicy, Footprint, FootprintCell, InfluenceKernel, KernelError};

/// An `f32` with atomic load, store and read-modify-write.
#[derive(Debug, Default)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    /// A new cell holding `v`.
    pub fn new(v: f32) -> Self {
        Self(AtomicU32::new(v.to_bits()))
    }

    /// Current value.
    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    /// Overwrite the value.
    #[inline]
    pub fn store(&self, v: f32) {
        self.0.store(v.to_bits(), Ordering::Relaxed);
    }

    /// Replace the value with `f(current)`, retrying on contention.
    /// Returns the new value.
    #[inline]
    pub fn update(&self, mut f: impl FnMut(f32) -> f32) -> f32 {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            let next = f(f32::from_bits(current)).to_bits();
            match self
                .0
                .compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return f32::from_bits(next),
                Err(actual) => current = actual,
            }
        }
    }
}

/// A light grid that tasks update through `&self`.
#[derive(Debug)]
pub struct SharedGrid {
    geometry: GridGeometry,
    cells: Vec<AtomicF32>,
}

impl SharedGrid {
    /// A grid shaped like `geometry` with every cell set to `value`.
    pub fn new_with(geometry: GridGeometry, value: f32) -> Self {
        Self {
            cells: (0..geometry.count()).map(|_| AtomicF32::new(value)).collect(),
            geometry,
        }
    }

    /// Copy a plain grid.
    pub fn from_grid(grid: &Grid<f32>) -> Self {
        Self {
            geometry: *grid.geometry(),
            cells: grid.iter().map(|&v| AtomicF32::new(v)).collect(),
        }
    }

    /// Snapshot into a plain grid.
    pub fn to_grid(&self) -> Grid<f32> {
        let values = self.cells.iter().map(AtomicF32::load).collect();
        Grid::from_vec(self.geometry, values).expect("cell count matches geometry")
    }

    /// The grid's shape.
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Number of cells.
    pub fn count(&self) -> usize {
        self.cells.len()
    }

    /// Value at a linear index. Panics out of range.
    pub fn get(&self, index: usize) -> f32 {
        self.cells[index].load()
    }

    /// Value at `(x, y)`, or `None` outside the grid.
    pub fn get_xy(&self, x: i32, y: i32) -> Option<f32> {
        self.geometry
            .is_index_valid(x, y)
            .then(|| self.get(self.geometry.index(x, y)))
    }

    /// Overwrite a cell. Panics out of range.
    pub fn set(&self, index: usize, v: f32) {
        self.cells[index].store(v);
    }

    /// Set every cell to `v`.
    pub fn fill(&self, v: f32) {
        for c in &self.cells {
            c.store(v);
        }
    }

    /// Apply `kernel` at `anchor`; see [`sylva_stamp::accumulate`].
    pub fn accumulate<F>(
        &self,
        kernel: &InfluenceKernel,
        anchor: (i32, i32),
        policy: EdgePolicy,
        combine: F,
    ) -> Result<usize, KernelError>
    where
        F: Fn(f32, &FootprintCell) -> f32,
    {
        let mut written = 0;
        for cell in Footprint::new(kernel, &self.geometry, anchor, policy)? {
            self.cells[cell.target_index].update(|current| combine(current, &cell));
            written += 1;
        }
        Ok(written)
    }

    /// Weighted sum of the grid under `kernel`; see [`sylva_stamp::sample`].
    pub fn sample(
        &self,
        kernel: &InfluenceKernel,
        anchor: (i32, i32),
        policy: EdgePolicy,
    ) -> Result<f64, KernelError> {
        Ok(Footprint::new(kernel, &self.geometry, anchor, policy)?
            .map(|c| self.get(c.target_index) as f64 * c.value as f64)
            .sum())
    }
}

impl From<Grid<f32>> for SharedGrid {
    fn from(grid: Grid<f32>) -> Self {
        let geometry = *grid.geometry();
        Self {
            cells: grid.into_vec().into_iter().map(AtomicF32::new).collect(),
            geometry,
        }
    }
}

impl From<SharedGrid> for Grid<f32> {
    fn from(shared: SharedGrid) -> Self {
        let values = shared
            .cells
            .into_iter()
            .map(|c| f32::from_bits(c.0.into_inner()))
            .collect();
        Grid::from_vec(shared.geometry, values).expect("cell count matches geometry")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sylva_stamp::{combine, SizeClass};

    #[test]
    fn atomic_update_returns_new_value() {
        let a = AtomicF32::new(2.0);
        assert_eq!(a.update(|v| v * 0.5), 1.0);
        assert_eq!(a.load(), 1.0);
        a.store(-3.5);
        assert_eq!(a.load(), -3.5);
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let a = AtomicF32::new(0.0);
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..1000 {
                        a.update(|v| v + 1.0);
                    }
                });
            }
        });
        assert_eq!(a.load(), 4000.0);
    }

    #[test]
    fn grid_round_trip_preserves_values() {
        let geo = GridGeometry::new(2.0, 3, 2).unwrap();
        let g = Grid::from_vec(geo, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let shared = SharedGrid::from_grid(&g);
        assert_eq!(shared.get_xy(2, 1), Some(6.0));
        assert_eq!(shared.get_xy(3, 0), None);
        assert_eq!(shared.to_grid(), g);
        let back: Grid<f32> = SharedGrid::from(g.clone()).into();
        assert_eq!(back, g);
    }

    #[test]
    fn accumulate_matches_plain_grid() {
        let k = InfluenceKernel::from_values(SizeClass::Px4, 1, vec![0.5; 16]).unwrap();
        let geo = GridGeometry::new(2.0, 10, 10).unwrap();
        let mut plain = Grid::new_with(geo, 1.0f32);
        let shared = SharedGrid::new_with(geo, 1.0);
        for anchor in [(0, 0), (1, 1), (9, 4)] {
            sylva_stamp::accumulate(&mut plain, &k, anchor, EdgePolicy::Torus, combine::multiply)
                .unwrap();
            shared
                .accumulate(&k, anchor, EdgePolicy::Torus, combine::multiply)
                .unwrap();
        }
        assert_eq!(shared.to_grid(), plain);
        assert_eq!(
            shared.sample(&k, (5, 5), EdgePolicy::Clip).unwrap(),
            sylva_stamp::sample(&plain, &k, (5, 5), EdgePolicy::Clip).unwrap()
        );
    }
}
