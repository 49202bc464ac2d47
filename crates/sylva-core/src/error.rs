//! Error taxonomy for the Sylva substrate.
//!
//! Every error in the workspace falls into one of four [`ErrorKind`]s.
//! None of them is transient: configuration, format and precondition
//! errors indicate a setup bug, and a task fault aborts the phase it
//! occurred in. Callers may log and give up; nothing retries.

use std::error::Error;
use std::fmt;

/// Classification shared by all Sylva error types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid sizes, cell sizes or mismatched grids.
    Configuration,
    /// Truncated or malformed serialized data.
    Format,
    /// An operation was invoked before its prerequisites were met.
    Precondition,
    /// A scheduled operation failed while running.
    TaskFault,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configuration => "configuration",
            Self::Format => "format",
            Self::Precondition => "precondition",
            Self::TaskFault => "task fault",
        };
        f.write_str(name)
    }
}

/// Errors from grid setup and cross-grid operations.
#[derive(Clone, Debug, PartialEq)]
pub enum GridError {
    /// Cell size is zero, negative or not finite.
    InvalidCellSize {
        /// The rejected cell size.
        cell_size: f64,
    },
    /// The requested dimensions produce zero cells.
    EmptyGrid {
        /// Requested column count.
        size_x: usize,
        /// Requested row count.
        size_y: usize,
    },
    /// A dimension exceeds the `i32` coordinate range.
    TooLarge {
        /// Requested column count.
        size_x: usize,
        /// Requested row count.
        size_y: usize,
    },
    /// A metric extent has zero or negative area.
    EmptyExtent,
    /// Two grids that must have equal cell counts do not.
    SizeMismatch {
        /// Cell count of the destination.
        expected: usize,
        /// Cell count of the source.
        found: usize,
    },
    /// A coarse grid cannot be addressed through the alias arithmetic.
    IncompatibleAlias {
        /// The downsampling factor.
        factor: usize,
        /// What went wrong.
        reason: String,
    },
    /// A window reaches outside the grid it iterates.
    WindowOutOfBounds {
        /// Human-readable description of the window.
        window: String,
        /// Human-readable description of the grid bounds.
        bounds: String,
    },
}

impl GridError {
    /// The taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IncompatibleAlias { .. } => ErrorKind::Precondition,
            _ => ErrorKind::Configuration,
        }
    }
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCellSize { cell_size } => {
                write!(f, "cell size must be finite and positive, got {cell_size}")
            }
            Self::EmptyGrid { size_x, size_y } => {
                write!(f, "grid of {size_x}x{size_y} cells has no cells")
            }
            Self::TooLarge { size_x, size_y } => write!(
                f,
                "grid of {size_x}x{size_y} cells exceeds the addressable range of {} per axis",
                i32::MAX
            ),
            Self::EmptyExtent => write!(f, "metric extent has no area"),
            Self::SizeMismatch { expected, found } => {
                write!(f, "grid size mismatch: expected {expected} cells, found {found}")
            }
            Self::IncompatibleAlias { factor, reason } => {
                write!(f, "grids are not alias-compatible for factor {factor}: {reason}")
            }
            Self::WindowOutOfBounds { window, bounds } => {
                write!(f, "window {window} extends beyond grid {bounds}")
            }
        }
    }
}

impl Error for GridError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_errors_are_preconditions() {
        let e = GridError::IncompatibleAlias {
            factor: 5,
            reason: "size_x 12 not divisible by 5".into(),
        };
        assert_eq!(e.kind(), ErrorKind::Precondition);
        assert!(e.to_string().contains("factor 5"));
    }

    #[test]
    fn setup_errors_are_configuration() {
        assert_eq!(
            GridError::InvalidCellSize { cell_size: 0.0 }.kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            GridError::EmptyGrid {
                size_x: 0,
                size_y: 3
            }
            .kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            GridError::SizeMismatch {
                expected: 4,
                found: 9
            }
            .kind(),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn display_mentions_values() {
        let msg = GridError::SizeMismatch {
            expected: 100,
            found: 25,
        }
        .to_string();
        assert!(msg.contains("100"));
        assert!(msg.contains("25"));
    }
}
