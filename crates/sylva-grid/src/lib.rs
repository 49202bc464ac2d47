//! Addressable grids for the Sylva spatial substrate.
//!
//! [`Grid<T>`] is a dense row-major 2D array with a metric coordinate
//! system (south-west origin, y increasing northward). All addressing
//! arithmetic lives on the `Copy` type [`GridGeometry`], so other
//! storage layouts can share it without owning a `Grid`.
//!
//! # Aliasing
//!
//! A coarse grid with the same origin and a cell size `k` times larger
//! can be addressed from a fine linear index without resampling, via
//! [`GridGeometry::alias`]. Use [`GridGeometry::check_alias`] once at
//! setup to confirm the pair is compatible.
//!
//! # Traversal
//!
//! [`GridCursor`] walks a rectangular window in row-major order and
//! answers 4- and 8-neighbour queries against the whole grid.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cursor;
pub mod geometry;
pub mod grid;
pub mod height;

pub use cursor::GridCursor;
pub use geometry::GridGeometry;
pub use grid::Grid;
pub use height::{mark_radiating_edges, stockable_cells, HeightCell};
