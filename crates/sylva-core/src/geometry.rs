//! Metric and index-space geometry.
//!
//! All grids share one orientation: the origin is the south-west corner,
//! x grows east and y grows north.
//!
//! ```text
//!           N
//!   (0,2) (1,2) (2,2)
//! W (0,1) (1,1) (2,1) E
//!   (0,0) (1,0) (2,0)
//!           S
//! ```

use std::fmt;

/// A point in metric (world) coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointF {
    /// Easting.
    pub x: f64,
    /// Northing.
    pub y: f64,
}

impl PointF {
    /// Create a point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: PointF) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl fmt::Display for PointF {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An axis-aligned metric rectangle anchored at its south-west corner.
///
/// Containment is half-open: `min <= p < max` on both axes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RectF {
    /// Western edge.
    pub x: f64,
    /// Southern edge.
    pub y: f64,
    /// Extent along x (metres).
    pub width: f64,
    /// Extent along y (metres).
    pub height: f64,
}

impl RectF {
    /// Create a rectangle from its south-west corner and size.
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Western edge.
    pub fn min_x(&self) -> f64 {
        self.x
    }

    /// Southern edge.
    pub fn min_y(&self) -> f64 {
        self.y
    }

    /// Eastern edge (exclusive).
    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    /// Northern edge (exclusive).
    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    /// The south-west corner.
    pub fn origin(&self) -> PointF {
        PointF::new(self.x, self.y)
    }

    /// Geometric center.
    pub fn center(&self) -> PointF {
        PointF::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// `true` if either side is zero, negative or NaN.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Half-open containment test.
    pub fn contains(&self, p: PointF) -> bool {
        p.x >= self.min_x() && p.x < self.max_x() && p.y >= self.min_y() && p.y < self.max_y()
    }
}

impl fmt::Display for RectF {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}) x [{}, {})",
            self.min_x(),
            self.max_x(),
            self.min_y(),
            self.max_y()
        )
    }
}

/// A rectangle of cells in index space.
///
/// `x`/`y` may be negative: windows and torus extents are expressed in
/// signed cell coordinates and validated against a grid separately.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IndexRect {
    /// First column.
    pub x: i32,
    /// First row.
    pub y: i32,
    /// Number of columns.
    pub width: i32,
    /// Number of rows.
    pub height: i32,
}

impl IndexRect {
    /// Create an index rectangle.
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// One past the last column.
    pub fn end_x(&self) -> i32 {
        self.x + self.width
    }

    /// One past the last row.
    pub fn end_y(&self) -> i32 {
        self.y + self.height
    }

    /// Number of cells covered; zero for degenerate rectangles.
    pub fn cell_count(&self) -> usize {
        if self.width <= 0 || self.height <= 0 {
            0
        } else {
            self.width as usize * self.height as usize
        }
    }

    /// `true` if the rectangle covers no cells.
    pub fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }

    /// Whether cell `(x, y)` lies inside.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.end_x() && y >= self.y && y < self.end_y()
    }
}

impl fmt::Display for IndexRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}) x [{}, {})",
            self.x,
            self.end_x(),
            self.y,
            self.end_y()
        )
    }
}
