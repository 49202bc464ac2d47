//! Index and metric arithmetic shared by every grid layout.

use sylva_core::{GridError, IndexRect, PointF, RectF};

/// Tolerance used when comparing cell sizes and origins across grids.
const METRIC_EPSILON: f64 = 1e-9;

/// The shape of a grid: cell size, metric origin and dimensions.
///
/// Linear index of cell `(x, y)` is `y * size_x + x`. Coordinates are
/// signed so that metric points west or south of the origin map to
/// negative (invalid) cells instead of wrapping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridGeometry {
    cell_size: f64,
    origin: PointF,
    size_x: usize,
    size_y: usize,
}

impl GridGeometry {
    /// A grid of `size_x * size_y` cells anchored at the metric origin.
    pub fn new(cell_size: f64, size_x: usize, size_y: usize) -> Result<Self, GridError> {
        Self::with_origin(PointF::default(), cell_size, size_x, size_y)
    }

    /// A grid of `size_x * size_y` cells anchored at `origin`.
    pub fn with_origin(
        origin: PointF,
        cell_size: f64,
        size_x: usize,
        size_y: usize,
    ) -> Result<Self, GridError> {
        validate_cell_size(cell_size)?;
        if size_x == 0 || size_y == 0 {
            return Err(GridError::EmptyGrid { size_x, size_y });
        }
        if size_x > i32::MAX as usize || size_y > i32::MAX as usize {
            return Err(GridError::TooLarge { size_x, size_y });
        }
        Ok(Self {
            cell_size,
            origin,
            size_x,
            size_y,
        })
    }

    /// The smallest grid covering `rect`.
    ///
    /// Partial trailing cells are included in full, so the grid's metric
    /// extent may exceed `rect` on the east and north sides.
    pub fn from_rect(rect: RectF, cell_size: f64) -> Result<Self, GridError> {
        validate_cell_size(cell_size)?;
        if rect.is_empty() {
            return Err(GridError::EmptyExtent);
        }
        let size_x = (rect.width / cell_size).ceil() as usize;
        let size_y = (rect.height / cell_size).ceil() as usize;
        Self::with_origin(rect.origin(), cell_size, size_x, size_y)
    }

    /// A zero-sized geometry, used by cleared grids.
    pub(crate) fn empty(cell_size: f64, origin: PointF) -> Self {
        Self {
            cell_size,
            origin,
            size_x: 0,
            size_y: 0,
        }
    }

    /// Side length of one cell in metres.
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// South-west corner of cell `(0, 0)`.
    pub fn origin(&self) -> PointF {
        self.origin
    }

    /// Number of columns.
    pub fn size_x(&self) -> usize {
        self.size_x
    }

    /// Number of rows.
    pub fn size_y(&self) -> usize {
        self.size_y
    }

    /// Total number of cells.
    pub fn count(&self) -> usize {
        self.size_x * self.size_y
    }

    /// `true` for a cleared grid.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// The metric rectangle covered by all cells.
    pub fn metric_rect(&self) -> RectF {
        RectF::new(
            self.origin.x,
            self.origin.y,
            self.size_x as f64 * self.cell_size,
            self.size_y as f64 * self.cell_size,
        )
    }

    /// The whole grid as an index rectangle.
    pub fn index_rect(&self) -> IndexRect {
        IndexRect::new(0, 0, self.size_x as i32, self.size_y as i32)
    }

    // ── Index arithmetic ────────────────────────────────────────

    /// Linear index of `(x, y)`. The pair must be valid.
    #[inline]
    pub fn index(&self, x: i32, y: i32) -> usize {
        debug_assert!(self.is_index_valid(x, y), "cell ({x}, {y}) outside grid");
        y as usize * self.size_x + x as usize
    }

    /// Cell coordinates of a linear index. Inverse of [`index`](Self::index).
    #[inline]
    pub fn index_of(&self, index: usize) -> (i32, i32) {
        ((index % self.size_x) as i32, (index / self.size_x) as i32)
    }

    /// Whether `(x, y)` addresses a cell of this grid.
    #[inline]
    pub fn is_index_valid(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.size_x && (y as usize) < self.size_y
    }

    /// Whether a linear index addresses a cell of this grid.
    #[inline]
    pub fn is_linear_valid(&self, index: usize) -> bool {
        index < self.count()
    }

    /// Clamp `(x, y)` onto the nearest cell of the grid.
    pub fn clamp_index(&self, x: i32, y: i32) -> (i32, i32) {
        (
            x.clamp(0, self.size_x as i32 - 1),
            y.clamp(0, self.size_y as i32 - 1),
        )
    }

    // ── Metric mapping ──────────────────────────────────────────

    /// Cell containing metric point `p` (may be out of range).
    #[inline]
    pub fn index_at(&self, p: PointF) -> (i32, i32) {
        (
            ((p.x - self.origin.x) / self.cell_size).floor() as i32,
            ((p.y - self.origin.y) / self.cell_size).floor() as i32,
        )
    }

    /// Half-open test of `p` against [`metric_rect`](Self::metric_rect).
    pub fn coord_valid(&self, p: PointF) -> bool {
        self.metric_rect().contains(p)
    }

    /// Metric center of cell `(x, y)`.
    #[inline]
    pub fn cell_center(&self, x: i32, y: i32) -> PointF {
        PointF::new(
            self.origin.x + (x as f64 + 0.5) * self.cell_size,
            self.origin.y + (y as f64 + 0.5) * self.cell_size,
        )
    }

    /// Metric center of the cell at a linear index.
    pub fn cell_center_of(&self, index: usize) -> PointF {
        let (x, y) = self.index_of(index);
        self.cell_center(x, y)
    }

    /// Metric extent of cell `(x, y)`.
    pub fn cell_rect(&self, x: i32, y: i32) -> RectF {
        RectF::new(
            self.origin.x + x as f64 * self.cell_size,
            self.origin.y + y as f64 * self.cell_size,
            self.cell_size,
            self.cell_size,
        )
    }

    /// Metric distance between the centers of two cells.
    pub fn center_to_center_distance(&self, a: (i32, i32), b: (i32, i32)) -> f64 {
        let dx = (a.0 - b.0) as f64;
        let dy = (a.1 - b.1) as f64;
        (dx * dx + dy * dy).sqrt() * self.cell_size
    }

    /// Cells whose area intersects `rect`, clipped to the grid.
    ///
    /// The result may be empty (zero width or height) if `rect` lies
    /// entirely outside.
    pub fn index_rect_of(&self, rect: RectF) -> IndexRect {
        let x0 = ((rect.min_x() - self.origin.x) / self.cell_size).floor();
        let y0 = ((rect.min_y() - self.origin.y) / self.cell_size).floor();
        let x1 = ((rect.max_x() - self.origin.x) / self.cell_size).ceil();
        let y1 = ((rect.max_y() - self.origin.y) / self.cell_size).ceil();
        let clamp_x = |v: f64| v.clamp(0.0, self.size_x as f64) as i32;
        let clamp_y = |v: f64| v.clamp(0.0, self.size_y as f64) as i32;
        let (x0, x1) = (clamp_x(x0), clamp_x(x1));
        let (y0, y1) = (clamp_y(y0), clamp_y(y1));
        IndexRect::new(x0, y0, (x1 - x0).max(0), (y1 - y0).max(0))
    }

    // ── Aliasing ────────────────────────────────────────────────

    /// Linear index in a grid `factor` times coarser that shares this
    /// grid's origin.
    ///
    /// No bounds or compatibility checks are made here; validate the
    /// pair once with [`check_alias`](Self::check_alias).
    #[inline]
    pub fn alias(&self, index: usize, factor: usize) -> usize {
        ((index / self.size_x) / factor) * (self.size_x / factor) + (index % self.size_x) / factor
    }

    /// [`alias`](Self::alias) for a 2x coarser grid.
    #[inline]
    pub fn alias2(&self, index: usize) -> usize {
        self.alias(index, 2)
    }

    /// [`alias`](Self::alias) for a 5x coarser grid.
    #[inline]
    pub fn alias5(&self, index: usize) -> usize {
        self.alias(index, 5)
    }

    /// [`alias`](Self::alias) for a 10x coarser grid.
    #[inline]
    pub fn alias10(&self, index: usize) -> usize {
        self.alias(index, 10)
    }

    /// Confirm that `coarse` can be addressed through [`alias`](Self::alias)
    /// with `factor`.
    ///
    /// Requires a shared origin, `size_x` divisible by `factor`, a coarse
    /// cell size of `factor * cell_size`, and a coarse grid large enough
    /// to hold every aliased index.
    pub fn check_alias(&self, coarse: &GridGeometry, factor: usize) -> Result<(), GridError> {
        let fail = |reason: String| Err(GridError::IncompatibleAlias { factor, reason });
        if factor == 0 {
            return fail("factor must be positive".into());
        }
        if self.size_x % factor != 0 {
            return fail(format!("size_x {} not divisible by {factor}", self.size_x));
        }
        if (self.origin.x - coarse.origin.x).abs() > METRIC_EPSILON
            || (self.origin.y - coarse.origin.y).abs() > METRIC_EPSILON
        {
            return fail(format!(
                "origins differ: {} vs {}",
                self.origin, coarse.origin
            ));
        }
        let expected_cell = self.cell_size * factor as f64;
        if (coarse.cell_size - expected_cell).abs() > METRIC_EPSILON * expected_cell.max(1.0) {
            return fail(format!(
                "coarse cell size {} is not {factor} x {}",
                coarse.cell_size, self.cell_size
            ));
        }
        if coarse.size_x != self.size_x / factor {
            return fail(format!(
                "coarse size_x {} should be {}",
                coarse.size_x,
                self.size_x / factor
            ));
        }
        if coarse.size_y < self.size_y.div_ceil(factor) {
            return fail(format!(
                "coarse size_y {} cannot hold {} fine rows",
                coarse.size_y, self.size_y
            ));
        }
        Ok(())
    }
}

fn validate_cell_size(cell_size: f64) -> Result<(), GridError> {
    if cell_size.is_finite() && cell_size > 0.0 {
        Ok(())
    } else {
        Err(GridError::InvalidCellSize { cell_size })
    }
}
