//! Sylva: the spatial computation substrate of a forest stand simulator.
//!
//! This is the facade crate that re-exports the public API of every
//! Sylva sub-crate. For most users, adding `sylva` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use sylva::prelude::*;
//!
//! // A 3-wide kernel that halves the light at its center.
//! let mut values = vec![1.0f32; 16];
//! values[4 + 1] = 0.5;
//! let kernel = InfluenceKernel::from_values(SizeClass::Px4, 1, values).unwrap();
//!
//! let mut library = KernelLibrary::default();
//! library.add_kernel(SpeciesId(0), kernel, 20.0, 80.0, 1.5).unwrap();
//! library.finalize().unwrap();
//!
//! // Two resource units side by side on a 40x40 light grid.
//! let geometry = GridGeometry::new(2.0, 40, 40).unwrap();
//! let mut units = vec![
//!     LightUnit::new(UnitId(0), IndexRect::new(0, 0, 20, 40)).at(0, 0),
//!     LightUnit::new(UnitId(1), IndexRect::new(20, 0, 20, 40)).at(1, 0),
//! ];
//! units[0].plant(&library, SpeciesId(0), (5, 5), 20.0, 16.0).unwrap();
//!
//! let mut scheduler = PartitionedScheduler::new(SchedulerConfig::default()).unwrap();
//! scheduler.configure(&units);
//! let light = SharedGrid::new_with(geometry, 1.0);
//! LightPass::new(&library, LightEdge::Clip)
//!     .stamp(&scheduler, &mut units, &light, combine::multiply)
//!     .unwrap();
//! assert_eq!(light.get_xy(5, 5), Some(0.5));
//! assert_eq!(light.get_xy(7, 7), Some(1.0));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `sylva-core` | Metric geometry, ids, `ErrorKind`, `GridError` |
//! | [`grid`] | `sylva-grid` | `Grid<T>`, `GridGeometry`, `GridCursor`, height cells |
//! | [`stamp`] | `sylva-stamp` | Influence kernels, kernel library, accumulation |
//! | [`engine`] | `sylva-engine` | Partitioned scheduler, shared grids, light pass |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Geometry, ids and the error taxonomy (`sylva-core`).
pub use sylva_core as types;

/// Addressable grids and windowed traversal (`sylva-grid`).
///
/// [`grid::Grid`] stores cells; [`grid::GridGeometry`] carries the
/// addressing arithmetic, including multi-resolution aliasing.
pub use sylva_grid as grid;

/// Influence kernels and their accumulation (`sylva-stamp`).
pub use sylva_stamp as stamp;

/// Phased parallel execution (`sylva-engine`).
///
/// [`engine::PartitionedScheduler`] runs unit operations phase by phase;
/// [`engine::LightPass`] stamps tree kernels through it.
pub use sylva_engine as engine;

/// Common imports for typical Sylva usage.
///
/// ```rust
/// use sylva::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use sylva_core::{ErrorKind, GridError, IndexRect, KernelId, PointF, RectF, SpeciesId, UnitId};

    // Grids
    pub use sylva_grid::{Grid, GridCursor, GridGeometry, HeightCell};

    // Kernels
    pub use sylva_stamp::{
        accumulate, combine, EdgePolicy, InfluenceKernel, KernelError, KernelLibrary, SizeClass,
    };

    // Engine
    pub use sylva_engine::{
        LightEdge, LightPass, LightUnit, PartitionStrategy, PartitionedScheduler, ScheduleError,
        SchedulerConfig, SharedGrid, SpatialUnit,
    };
}
