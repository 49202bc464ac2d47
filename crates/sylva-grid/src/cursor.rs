//! Windowed row-major traversal with neighbour lookups.
//!
//! A [`GridCursor`] holds only a copy of the grid's [`GridGeometry`] and
//! a few integers, so it does not borrow the grid. Neighbour queries
//! take the grid explicitly.
//!
//! ```
//! use sylva_core::IndexRect;
//! use sylva_grid::{Grid, GridCursor};
//!
//! let grid: Grid<f32> = Grid::new(1.0, 6, 6).unwrap();
//! let cursor = GridCursor::new(grid.geometry(), IndexRect::new(1, 1, 2, 2)).unwrap();
//! let visited: Vec<usize> = cursor.collect();
//! assert_eq!(visited, vec![7, 8, 13, 14]);
//! ```

use sylva_core::{GridError, IndexRect, PointF, RectF};

use crate::geometry::GridGeometry;
use crate::grid::Grid;

/// Offsets in neighbour order: N, E, W, S, NE, NW, SE, SW.
const OFFSETS_8: [(i32, i32); 8] = [
    (0, 1),
    (1, 0),
    (-1, 0),
    (0, -1),
    (1, 1),
    (-1, 1),
    (1, -1),
    (-1, -1),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Position {
    BeforeFirst,
    At(usize),
    Finished,
    Invalid,
}

/// Iterates the linear indices of a rectangular window, row by row.
///
/// After construction or [`reset`](Self::reset) the cursor sits one
/// step before the first cell; the first [`advance`](Self::advance)
/// yields `first`.
#[derive(Clone, Debug)]
pub struct GridCursor {
    geometry: GridGeometry,
    window: IndexRect,
    first: usize,
    last: usize,
    columns: usize,
    line_stride: usize,
    current_column: usize,
    position: Position,
}

impl GridCursor {
    /// A cursor over `window`, which must lie inside the grid and be
    /// non-empty.
    pub fn new(geometry: &GridGeometry, window: IndexRect) -> Result<Self, GridError> {
        let inside = !window.is_empty()
            && geometry.is_index_valid(window.x, window.y)
            && geometry.is_index_valid(window.end_x() - 1, window.end_y() - 1);
        if !inside {
            return Err(GridError::WindowOutOfBounds {
                window: window.to_string(),
                bounds: geometry.index_rect().to_string(),
            });
        }
        let columns = window.width as usize;
        Ok(Self {
            geometry: *geometry,
            window,
            first: geometry.index(window.x, window.y),
            last: geometry.index(window.end_x() - 1, window.end_y() - 1),
            columns,
            line_stride: geometry.size_x() - columns,
            current_column: 0,
            position: Position::BeforeFirst,
        })
    }

    /// A cursor over every cell touched by metric rectangle `rect`,
    /// clipped to the grid.
    pub fn from_rect(geometry: &GridGeometry, rect: RectF) -> Result<Self, GridError> {
        Self::new(geometry, geometry.index_rect_of(rect))
    }

    /// A cursor over the whole grid.
    pub fn whole(geometry: &GridGeometry) -> Result<Self, GridError> {
        Self::new(geometry, geometry.index_rect())
    }

    /// Linear index of the window's first cell.
    pub fn first_index(&self) -> usize {
        self.first
    }

    /// Linear index of the window's last cell.
    pub fn last_index(&self) -> usize {
        self.last
    }

    /// Window width in cells.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Cells skipped at the end of each window row.
    pub fn line_stride(&self) -> usize {
        self.line_stride
    }

    /// Column of the current cell relative to the window.
    pub fn current_column(&self) -> usize {
        self.current_column
    }

    /// The window being traversed.
    pub fn window(&self) -> IndexRect {
        self.window
    }

    /// Shape of the grid this cursor addresses.
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Move to the next cell of the window.
    ///
    /// Returns `None` once the window is exhausted or the cursor is
    /// invalid; stays exhausted until [`reset`](Self::reset).
    pub fn advance(&mut self) -> Option<usize> {
        let next = match self.position {
            Position::BeforeFirst => {
                self.current_column = 0;
                self.first
            }
            Position::At(current) => {
                let mut next = current + 1;
                self.current_column += 1;
                if self.current_column >= self.columns {
                    next += self.line_stride;
                    self.current_column = 0;
                }
                next
            }
            Position::Finished | Position::Invalid => return None,
        };
        if next > self.last {
            self.position = Position::Finished;
            return None;
        }
        self.position = Position::At(next);
        Some(next)
    }

    /// Re-prime the cursor to one step before the first cell.
    pub fn reset(&mut self) {
        self.position = Position::BeforeFirst;
        self.current_column = 0;
    }

    /// Jump to cell `(x, y)` anywhere on the grid.
    ///
    /// An out-of-grid cell leaves the cursor invalid: [`current`] returns
    /// `None` and [`advance`] yields nothing until [`reset`].
    ///
    /// [`current`]: Self::current
    /// [`advance`]: Self::advance
    /// [`reset`]: Self::reset
    pub fn set_position(&mut self, x: i32, y: i32) -> bool {
        if self.geometry.is_index_valid(x, y) {
            self.position = Position::At(self.geometry.index(x, y));
            self.current_column = (x - self.window.x).clamp(0, self.columns as i32 - 1) as usize;
            true
        } else {
            self.position = Position::Invalid;
            false
        }
    }

    /// Linear index of the current cell.
    pub fn current(&self) -> Option<usize> {
        match self.position {
            Position::At(i) => Some(i),
            _ => None,
        }
    }

    /// Cell coordinates of the current cell.
    pub fn current_xy(&self) -> Option<(i32, i32)> {
        self.current().map(|i| self.geometry.index_of(i))
    }

    /// Metric center of the current cell.
    pub fn current_center(&self) -> Option<PointF> {
        self.current().map(|i| self.geometry.cell_center_of(i))
    }

    /// `false` after an out-of-grid [`set_position`](Self::set_position).
    pub fn is_valid(&self) -> bool {
        self.position != Position::Invalid
    }

    // ── Neighbours ──────────────────────────────────────────────

    /// Linear indices of the 8 neighbours of the current cell in the
    /// order N, E, W, S, NE, NW, SE, SW.
    ///
    /// Neighbours outside the grid (not the window) are `None`.
    pub fn neighbour_indices8(&self) -> [Option<usize>; 8] {
        let mut out = [None; 8];
        if let Some((x, y)) = self.current_xy() {
            for (slot, (dx, dy)) in out.iter_mut().zip(OFFSETS_8) {
                let (nx, ny) = (x + dx, y + dy);
                if self.geometry.is_index_valid(nx, ny) {
                    *slot = Some(self.geometry.index(nx, ny));
                }
            }
        }
        out
    }

    /// Linear indices of the 4 neighbours in the order N, E, W, S.
    pub fn neighbour_indices4(&self) -> [Option<usize>; 4] {
        let n8 = self.neighbour_indices8();
        [n8[0], n8[1], n8[2], n8[3]]
    }

    /// Values of the 4 neighbours (N, E, W, S); `None` outside the grid.
    pub fn neighbours4<'g, T>(&self, grid: &'g Grid<T>) -> [Option<&'g T>; 4] {
        debug_assert_eq!(grid.geometry(), &self.geometry, "cursor used on another grid");
        self.neighbour_indices4()
            .map(|i| i.and_then(|i| grid.get_linear(i)))
    }

    /// Values of the 8 neighbours (N, E, W, S, NE, NW, SE, SW); `None`
    /// outside the grid.
    pub fn neighbours8<'g, T>(&self, grid: &'g Grid<T>) -> [Option<&'g T>; 8] {
        debug_assert_eq!(grid.geometry(), &self.geometry, "cursor used on another grid");
        self.neighbour_indices8()
            .map(|i| i.and_then(|i| grid.get_linear(i)))
    }
}

impl Iterator for GridCursor {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        self.advance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(size_x: usize, size_y: usize) -> Grid<i32> {
        let geo = GridGeometry::new(1.0, size_x, size_y).unwrap();
        Grid::from_vec(geo, (0..(size_x * size_y) as i32).collect()).unwrap()
    }

    // ── Traversal tests ─────────────────────────────────────────

    #[test]
    fn window_bookkeeping() {
        let g = grid(10, 10);
        let c = GridCursor::new(g.geometry(), IndexRect::new(2, 3, 4, 2)).unwrap();
        assert_eq!(c.first_index(), 32);
        assert_eq!(c.last_index(), 45);
        assert_eq!(c.columns(), 4);
        assert_eq!(c.line_stride(), 6);
        // Iterator::last walks the window and agrees with the accessor.
        assert_eq!(c.clone().last(), Some(c.last_index()));
        assert_eq!(c.clone().next(), Some(c.first_index()));
    }

    #[test]
    fn advance_skips_to_next_row() {
        let g = grid(10, 10);
        let c = GridCursor::new(g.geometry(), IndexRect::new(2, 3, 4, 2)).unwrap();
        let visited: Vec<usize> = c.collect();
        assert_eq!(visited, vec![32, 33, 34, 35, 42, 43, 44, 45]);
    }

    #[test]
    fn whole_grid_visits_every_cell_once() {
        let g = grid(7, 5);
        let c = GridCursor::whole(g.geometry()).unwrap();
        let visited: Vec<usize> = c.collect();
        assert_eq!(visited, (0..35).collect::<Vec<_>>());
    }

    #[test]
    fn finished_cursor_stays_finished_until_reset() {
        let g = grid(3, 3);
        let mut c = GridCursor::new(g.geometry(), IndexRect::new(1, 1, 1, 1)).unwrap();
        assert_eq!(c.advance(), Some(4));
        assert_eq!(c.advance(), None);
        assert_eq!(c.advance(), None);
        c.reset();
        assert_eq!(c.current(), None);
        assert_eq!(c.advance(), Some(4));
    }

    #[test]
    fn window_outside_grid_is_rejected() {
        let g = grid(5, 5);
        for w in [
            IndexRect::new(-1, 0, 2, 2),
            IndexRect::new(4, 4, 2, 1),
            IndexRect::new(0, 0, 0, 3),
        ] {
            assert!(matches!(
                GridCursor::new(g.geometry(), w),
                Err(GridError::WindowOutOfBounds { .. })
            ));
        }
    }

    #[test]
    fn from_rect_clips_metric_window() {
        let geo = GridGeometry::new(10.0, 10, 10).unwrap();
        let c = GridCursor::from_rect(&geo, RectF::new(85.0, -20.0, 50.0, 35.0)).unwrap();
        assert_eq!(c.window(), IndexRect::new(8, 0, 2, 2));
        assert_eq!(c.count(), 4);
    }

    #[test]
    fn set_position_in_and_out_of_grid() {
        let g = grid(4, 4);
        let mut c = GridCursor::whole(g.geometry()).unwrap();
        assert!(c.set_position(3, 2));
        assert_eq!(c.current(), Some(11));
        assert_eq!(c.current_center(), Some(PointF::new(3.5, 2.5)));
        assert!(!c.set_position(4, 0));
        assert!(!c.is_valid());
        assert_eq!(c.current(), None);
        assert_eq!(c.advance(), None);
        c.reset();
        assert!(c.is_valid());
        assert_eq!(c.advance(), Some(0));
    }

    #[test]
    fn advance_after_jump_continues_row_major() {
        let g = grid(4, 4);
        let mut c = GridCursor::whole(g.geometry()).unwrap();
        c.set_position(3, 1);
        assert_eq!(c.advance(), Some(8));
        assert_eq!(c.current_xy(), Some((0, 2)));
    }

    // ── Neighbour tests ─────────────────────────────────────────

    #[test]
    fn neighbours4_interior() {
        let g = grid(5, 5);
        let mut c = GridCursor::whole(g.geometry()).unwrap();
        c.set_position(2, 2);
        let n = c.neighbours4(&g);
        assert_eq!(n, [Some(&17), Some(&13), Some(&11), Some(&7)]);
    }

    #[test]
    fn neighbours8_are_distinct_in_interior() {
        let g = grid(5, 5);
        let mut c = GridCursor::whole(g.geometry()).unwrap();
        c.set_position(2, 2);
        let n = c.neighbours8(&g);
        assert_eq!(
            n,
            [
                Some(&17),
                Some(&13),
                Some(&11),
                Some(&7),
                Some(&18),
                Some(&16),
                Some(&8),
                Some(&6)
            ]
        );
    }

    #[test]
    fn neighbours_at_corner_use_sentinels() {
        let g = grid(5, 5);
        let mut c = GridCursor::whole(g.geometry()).unwrap();
        c.set_position(0, 0);
        let n = c.neighbours8(&g);
        assert_eq!(n[0], Some(&5));
        assert_eq!(n[1], Some(&1));
        assert_eq!(n[2], None);
        assert_eq!(n[3], None);
        assert_eq!(n[4], Some(&6));
        assert!(n[5..].iter().all(Option::is_none));
    }

    #[test]
    fn neighbours_reach_outside_window_but_not_grid() {
        let g = grid(6, 6);
        let mut c = GridCursor::new(g.geometry(), IndexRect::new(2, 2, 2, 2)).unwrap();
        c.advance();
        // (2,2): every neighbour lies outside the window but inside the grid.
        assert!(c.neighbours8(&g).iter().all(Option::is_some));
        assert_eq!(c.neighbours4(&g)[3], Some(&8));
    }

    #[test]
    fn wrapped_rows_do_not_leak_into_east_west() {
        let g = grid(4, 4);
        let mut c = GridCursor::whole(g.geometry()).unwrap();
        c.set_position(3, 1);
        let n = c.neighbours4(&g);
        assert_eq!(n[1], None, "east of the last column");
        c.set_position(0, 2);
        assert_eq!(c.neighbours4(&g)[2], None, "west of the first column");
    }
}
