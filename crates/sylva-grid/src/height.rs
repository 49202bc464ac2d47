//! Dominant-height cells and landscape edge flags.
//!
//! The height grid is typically 10x coarser than the light grid. Cells
//! outside the simulated landscape never hold trees; those bordering it
//! are flagged as *radiating* so that shading from outside can be
//! approximated at the edge.

use sylva_core::{GridError, IndexRect};

use crate::cursor::GridCursor;
use crate::grid::Grid;

/// Per-cell dominant height and landscape flags.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeightCell {
    /// Dominant tree height in the cell (metres).
    pub height: f32,
    /// Number of trees registered in the cell.
    pub count: u16,
    /// Whether the cell belongs to the simulated landscape.
    pub on_landscape: bool,
    /// Off-landscape cell adjacent to the landscape.
    pub radiating: bool,
}

impl Default for HeightCell {
    fn default() -> Self {
        Self {
            height: 0.0,
            count: 0,
            on_landscape: true,
            radiating: false,
        }
    }
}

impl HeightCell {
    /// An off-landscape cell.
    pub fn outside() -> Self {
        Self {
            on_landscape: false,
            ..Self::default()
        }
    }

    /// Register a tree of the given height.
    ///
    /// The count saturates at `u16::MAX`.
    pub fn add_tree(&mut self, height: f32) {
        self.count = self.count.saturating_add(1);
        if height > self.height {
            self.height = height;
        }
    }

    /// Forget all registered trees, keeping the landscape flags.
    pub fn reset_trees(&mut self) {
        self.height = 0.0;
        self.count = 0;
    }
}

/// Flag every off-landscape cell that has at least one on-landscape
/// 8-neighbour as radiating. Returns the number of flagged cells.
///
/// Flags set by an earlier call are cleared first.
pub fn mark_radiating_edges(grid: &mut Grid<HeightCell>) -> Result<usize, GridError> {
    let mut cursor = GridCursor::whole(grid.geometry())?;
    let mut edges = Vec::new();
    while let Some(i) = cursor.advance() {
        if grid[i].on_landscape {
            continue;
        }
        let touches_landscape = cursor
            .neighbours8(grid)
            .iter()
            .flatten()
            .any(|n| n.on_landscape);
        if touches_landscape {
            edges.push(i);
        }
    }
    for cell in grid.iter_mut() {
        cell.radiating = false;
    }
    for &i in &edges {
        grid[i].radiating = true;
    }
    Ok(edges.len())
}

/// Number of on-landscape cells inside `window`.
pub fn stockable_cells(grid: &Grid<HeightCell>, window: IndexRect) -> Result<usize, GridError> {
    let cursor = GridCursor::new(grid.geometry(), window)?;
    Ok(cursor.filter(|&i| grid[i].on_landscape).count())
}
