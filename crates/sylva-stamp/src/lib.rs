//! Influence kernels ("stamps") for the Sylva spatial substrate.
//!
//! An [`InfluenceKernel`] is a small square array of precomputed
//! attenuation values describing one tree's footprint on the light
//! field. Kernels come in a fixed ladder of internal sizes
//! ([`SizeClass`]) and are addressed by an odd logical width and a
//! center offset.
//!
//! # Libraries
//!
//! A [`KernelLibrary`] owns every kernel in an arena and hands out
//! [`KernelId`](sylva_core::KernelId)s. Species kernels are looked up by
//! tree diameter and height; each may link to a lower-resolution reader
//! kernel by id. [`KernelLibrary::finalize`] builds the shared
//! [`DistanceTable`].
//!
//! # Accumulation
//!
//! [`accumulate`] applies a kernel at an anchor cell of a
//! [`Grid<f32>`](sylva_grid::Grid) with a caller-supplied combine
//! operator. [`EdgePolicy`] selects between clipping at the grid edge
//! and wrapping (torus). [`Footprint`] exposes the underlying cell
//! mapping so other storage (e.g. shared atomic grids) can reuse it.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod distance;
pub mod error;
pub mod footprint;
pub mod kernel;
pub mod library;
pub mod size;

pub use codec::{encode_kernel, read_kernel, write_kernel};
pub use distance::DistanceTable;
pub use error::KernelError;
pub use footprint::{accumulate, combine, sample, EdgePolicy, Footprint, FootprintCell};
pub use kernel::InfluenceKernel;
pub use library::{KernelEntry, KernelLibrary, SpeciesKernels};
pub use size::{SizeClass, MAX_LOGICAL_WIDTH};
