//! Dense row-major grid storage.

use std::ops::{Index, IndexMut};

use sylva_core::{GridError, PointF, RectF};

use crate::geometry::GridGeometry;

/// A dense 2D array of `T` with metric addressing.
///
/// Values are stored row by row starting at the south-west cell.
/// Indexing with `grid[i]` or `grid[(x, y)]` panics on out-of-range
/// input, mirroring slice indexing; use [`get`](Self::get) and
/// [`value_at`](Self::value_at) for checked access.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    geometry: GridGeometry,
    data: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    /// A grid of default values anchored at the metric origin.
    pub fn new(cell_size: f64, size_x: usize, size_y: usize) -> Result<Self, GridError> {
        Ok(Self::new_with(
            GridGeometry::new(cell_size, size_x, size_y)?,
            T::default(),
        ))
    }

    /// A grid of default values covering `rect`.
    pub fn from_rect(rect: RectF, cell_size: f64) -> Result<Self, GridError> {
        Ok(Self::new_with(
            GridGeometry::from_rect(rect, cell_size)?,
            T::default(),
        ))
    }

    /// Re-shape the grid to `size_x * size_y` cells at the metric origin.
    ///
    /// The existing allocation is kept when the new cell count fits in
    /// it and the cell size is unchanged. Every cell is reset to
    /// `T::default()` either way.
    pub fn setup(&mut self, cell_size: f64, size_x: usize, size_y: usize) -> Result<(), GridError> {
        let geometry = GridGeometry::new(cell_size, size_x, size_y)?;
        self.reshape(geometry);
        Ok(())
    }

    /// Re-shape the grid to cover `rect`. See [`setup`](Self::setup).
    pub fn setup_rect(&mut self, rect: RectF, cell_size: f64) -> Result<(), GridError> {
        let geometry = GridGeometry::from_rect(rect, cell_size)?;
        self.reshape(geometry);
        Ok(())
    }

    fn reshape(&mut self, geometry: GridGeometry) {
        let count = geometry.count();
        let same_cell = geometry.cell_size() == self.geometry.cell_size();
        if same_cell && count <= self.data.capacity() {
            self.data.clear();
            self.data.resize(count, T::default());
        } else {
            self.data = vec![T::default(); count];
        }
        self.geometry = geometry;
    }
}

impl<T: Clone> Grid<T> {
    /// A grid with the given shape, every cell set to `value`.
    pub fn new_with(geometry: GridGeometry, value: T) -> Self {
        Self {
            data: vec![value; geometry.count()],
            geometry,
        }
    }

    /// Set every cell to `value`.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Overwrite every cell with the corresponding cell of `source`.
    ///
    /// Only the cell counts must agree; the geometry of `self` is kept.
    pub fn copy_from(&mut self, source: &Grid<T>) -> Result<(), GridError> {
        if source.count() != self.count() {
            return Err(GridError::SizeMismatch {
                expected: self.count(),
                found: source.count(),
            });
        }
        self.data.clone_from_slice(&source.data);
        Ok(())
    }
}

impl<T> Grid<T> {
    /// Wrap existing row-major data.
    pub fn from_vec(geometry: GridGeometry, data: Vec<T>) -> Result<Self, GridError> {
        if data.len() != geometry.count() {
            return Err(GridError::SizeMismatch {
                expected: geometry.count(),
                found: data.len(),
            });
        }
        Ok(Self { geometry, data })
    }

    /// Release the storage. The grid keeps its cell size and origin but
    /// has zero cells afterwards.
    pub fn clear(&mut self) {
        self.data = Vec::new();
        self.geometry = GridGeometry::empty(self.geometry.cell_size(), self.geometry.origin());
    }

    /// The grid's shape.
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Side length of one cell in metres.
    pub fn cell_size(&self) -> f64 {
        self.geometry.cell_size()
    }

    /// Number of columns.
    pub fn size_x(&self) -> usize {
        self.geometry.size_x()
    }

    /// Number of rows.
    pub fn size_y(&self) -> usize {
        self.geometry.size_y()
    }

    /// Total number of cells.
    pub fn count(&self) -> usize {
        self.data.len()
    }

    /// `true` after [`clear`](Self::clear).
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Cells the current allocation can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// The metric rectangle covered by the grid.
    pub fn metric_rect(&self) -> RectF {
        self.geometry.metric_rect()
    }

    /// Linear index of `(x, y)`.
    #[inline]
    pub fn index(&self, x: i32, y: i32) -> usize {
        self.geometry.index(x, y)
    }

    /// Cell coordinates of a linear index.
    #[inline]
    pub fn index_of(&self, index: usize) -> (i32, i32) {
        self.geometry.index_of(index)
    }

    /// Cell containing metric point `p`.
    #[inline]
    pub fn index_at(&self, p: PointF) -> (i32, i32) {
        self.geometry.index_at(p)
    }

    /// Whether `(x, y)` addresses a cell.
    #[inline]
    pub fn is_index_valid(&self, x: i32, y: i32) -> bool {
        self.geometry.is_index_valid(x, y)
    }

    /// Whether `p` lies inside the grid's metric extent.
    pub fn coord_valid(&self, p: PointF) -> bool {
        self.geometry.coord_valid(p)
    }

    /// Metric center of cell `(x, y)`.
    pub fn cell_center(&self, x: i32, y: i32) -> PointF {
        self.geometry.cell_center(x, y)
    }

    /// Metric center of the cell at a linear index.
    pub fn cell_center_of(&self, index: usize) -> PointF {
        self.geometry.cell_center_of(index)
    }

    // ── Access ──────────────────────────────────────────────────

    /// Checked access by cell coordinates.
    pub fn get(&self, x: i32, y: i32) -> Option<&T> {
        if self.is_index_valid(x, y) {
            self.data.get(self.index(x, y))
        } else {
            None
        }
    }

    /// Checked mutable access by cell coordinates.
    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut T> {
        if self.is_index_valid(x, y) {
            let i = self.index(x, y);
            self.data.get_mut(i)
        } else {
            None
        }
    }

    /// Checked access by linear index.
    pub fn get_linear(&self, index: usize) -> Option<&T> {
        self.data.get(index)
    }

    /// Value of the cell containing metric point `p`.
    pub fn value_at(&self, p: PointF) -> Option<&T> {
        let (x, y) = self.index_at(p);
        self.get(x, y)
    }

    /// Mutable value of the cell containing metric point `p`.
    pub fn value_at_mut(&mut self, p: PointF) -> Option<&mut T> {
        let (x, y) = self.index_at(p);
        self.get_mut(x, y)
    }

    /// All cells in row-major order.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// All cells in row-major order, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Iterate cells in row-major order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Iterate cells mutably in row-major order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.data.iter_mut()
    }

    /// Consume the grid, returning its row-major storage.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl Grid<f32> {
    /// Sum of all cells, accumulated in `f64`.
    pub fn sum(&self) -> f64 {
        self.data.iter().map(|&v| v as f64).sum()
    }

    /// Largest cell value, or `None` for an empty grid.
    pub fn max_value(&self) -> Option<f32> {
        self.data.iter().copied().reduce(f32::max)
    }

    /// Multiply every cell by `factor`.
    pub fn scale(&mut self, factor: f32) {
        for v in &mut self.data {
            *v *= factor;
        }
    }
}

impl<T> Index<usize> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        &self.data[index]
    }
}

impl<T> IndexMut<usize> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.data[index]
    }
}

impl<T> Index<(i32, i32)> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, (x, y): (i32, i32)) -> &T {
        assert!(self.is_index_valid(x, y), "cell ({x}, {y}) outside grid");
        &self.data[self.geometry.index(x, y)]
    }
}

impl<T> IndexMut<(i32, i32)> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, (x, y): (i32, i32)) -> &mut T {
        assert!(self.is_index_valid(x, y), "cell ({x}, {y}) outside grid");
        let i = self.geometry.index(x, y);
        &mut self.data[i]
    }
}

impl<'a, T> IntoIterator for &'a Grid<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}
