//! Core types for the Sylva spatial substrate.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the metric geometry shared by every grid, the strongly typed
//! identifiers handed between subsystems, and the error taxonomy
//! used throughout the workspace.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod geometry;
pub mod id;

pub use error::{ErrorKind, GridError};
pub use geometry::{IndexRect, PointF, RectF};
pub use id::{KernelId, SpeciesId, UnitId};
