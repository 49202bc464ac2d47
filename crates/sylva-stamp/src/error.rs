//! Error types for kernels, kernel libraries and accumulation.

use std::error::Error;
use std::fmt;
use std::io;

use sylva_core::{ErrorKind, GridError, KernelId, SpeciesId};

/// Errors raised while building, loading or applying influence kernels.
#[derive(Debug)]
pub enum KernelError {
    /// An I/O error other than a short read.
    Io(io::Error),
    /// The stream ended before a complete kernel was read.
    Truncated {
        /// Bytes a complete kernel occupies.
        expected: usize,
    },
    /// The stream held a structurally invalid kernel.
    Malformed {
        /// What was wrong.
        detail: String,
    },
    /// A logical width or source grid side is even.
    EvenWidth {
        /// Requested logical width.
        width: usize,
        /// Side length of the source grid, when extracting from one.
        grid_size: Option<usize>,
    },
    /// A value buffer does not match the kernel's internal size.
    ValueCountMismatch {
        /// `internal_size²`.
        expected: usize,
        /// Length supplied.
        found: usize,
    },
    /// The center offset does not fit inside the internal array.
    InvalidOffset {
        /// The rejected offset.
        offset: usize,
        /// Internal side length of the kernel.
        internal_size: usize,
    },
    /// Tree dimensions map outside the class table.
    StampOutOfRange {
        /// Diameter at breast height (cm).
        dbh: f32,
        /// Height/diameter ratio.
        hd: f32,
    },
    /// A torus extent is smaller than the kernel, so one application
    /// would visit a cell twice.
    TorusTooSmall {
        /// Wrap extent along x.
        width: i32,
        /// Wrap extent along y.
        height: i32,
        /// Internal side length of the kernel.
        internal_size: usize,
    },
    /// An underlying grid operation failed.
    Grid(GridError),
    /// A distance query was made before a distance table was attached.
    DistanceTableMissing,
    /// The attached distance table does not cover the kernel.
    DistanceTableTooSmall {
        /// Side length of the table.
        table_size: usize,
        /// Side length needed.
        required: usize,
    },
    /// A kernel id not issued by this library.
    UnknownKernel {
        /// The rejected id.
        id: KernelId,
    },
    /// No kernel is registered for a species/dimension combination.
    NoKernelFor {
        /// Requested species.
        species: SpeciesId,
        /// Diameter at breast height (cm).
        dbh: f32,
        /// Tree height (m).
        height: f32,
    },
}

impl KernelError {
    /// The taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) | Self::Truncated { .. } | Self::Malformed { .. } => ErrorKind::Format,
            Self::EvenWidth { .. }
            | Self::ValueCountMismatch { .. }
            | Self::InvalidOffset { .. }
            | Self::StampOutOfRange { .. }
            | Self::TorusTooSmall { .. } => ErrorKind::Configuration,
            Self::Grid(e) => e.kind(),
            Self::DistanceTableMissing
            | Self::DistanceTableTooSmall { .. }
            | Self::UnknownKernel { .. }
            | Self::NoKernelFor { .. } => ErrorKind::Precondition,
        }
    }
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Truncated { expected } => {
                write!(f, "kernel stream truncated: expected {expected} bytes")
            }
            Self::Malformed { detail } => write!(f, "malformed kernel: {detail}"),
            Self::EvenWidth {
                width,
                grid_size: Some(side),
            } => write!(
                f,
                "source grid size ({side}) and width ({width}) must both be odd"
            ),
            Self::EvenWidth {
                width,
                grid_size: None,
            } => write!(f, "kernel width {width} must be odd"),
            Self::ValueCountMismatch { expected, found } => {
                write!(f, "kernel needs {expected} values, got {found}")
            }
            Self::InvalidOffset {
                offset,
                internal_size,
            } => write!(
                f,
                "offset {offset} does not fit a {internal_size}x{internal_size} kernel"
            ),
            Self::StampOutOfRange { dbh, hd } => {
                write!(f, "kernel class out of range: dbh={dbh} hd={hd}")
            }
            Self::TorusTooSmall {
                width,
                height,
                internal_size,
            } => write!(
                f,
                "torus extent {width}x{height} is smaller than kernel size {internal_size}"
            ),
            Self::Grid(e) => write!(f, "grid error: {e}"),
            Self::DistanceTableMissing => {
                write!(f, "distance table not initialized before distance query")
            }
            Self::DistanceTableTooSmall {
                table_size,
                required,
            } => write!(
                f,
                "distance table of size {table_size} cannot serve kernels of size {required}"
            ),
            Self::UnknownKernel { id } => write!(f, "unknown kernel id {id}"),
            Self::NoKernelFor {
                species,
                dbh,
                height,
            } => write!(
                f,
                "no kernel for species {species} with dbh={dbh} height={height}"
            ),
        }
    }
}

impl Error for KernelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Grid(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for KernelError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<GridError> for KernelError {
    fn from(e: GridError) -> Self {
        Self::Grid(e)
    }
}
