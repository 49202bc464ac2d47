//! Scheduler error types.

use std::error::Error;
use std::fmt;

use sylva_core::ErrorKind;

/// Errors from scheduler construction and phased execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScheduleError {
    /// A task failed or panicked; the phase was abandoned and later
    /// phases were not started.
    TaskFault {
        /// Zero-based phase in which the fault occurred.
        phase: usize,
        /// The task's error message or panic payload.
        message: String,
    },
    /// The scheduler configuration is invalid.
    InvalidConfig {
        /// What was wrong.
        reason: String,
    },
    /// Arguments to `run_over_range` are inconsistent.
    InvalidRange {
        /// Range start.
        begin: usize,
        /// Range end (exclusive).
        end: usize,
        /// Minimum chunk length.
        min_chunk: usize,
        /// Maximum number of chunks.
        max_chunks: usize,
    },
    /// The worker pool could not be started.
    PoolBuild {
        /// Underlying error message.
        reason: String,
    },
    /// Units were run against a partition plan built for a different
    /// collection.
    PlanMismatch {
        /// Units the plan was built for (`None` if never configured).
        planned: Option<usize>,
        /// Units supplied.
        units: usize,
    },
}

impl ScheduleError {
    /// The taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TaskFault { .. } => ErrorKind::TaskFault,
            Self::InvalidConfig { .. } | Self::InvalidRange { .. } | Self::PoolBuild { .. } => {
                ErrorKind::Configuration
            }
            Self::PlanMismatch { .. } => ErrorKind::Precondition,
        }
    }
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TaskFault { phase, message } => {
                write!(f, "task fault in phase {phase}: {message}")
            }
            Self::InvalidConfig { reason } => write!(f, "invalid scheduler config: {reason}"),
            Self::InvalidRange {
                begin,
                end,
                min_chunk,
                max_chunks,
            } => write!(
                f,
                "invalid range [{begin}, {end}) with min_chunk={min_chunk} max_chunks={max_chunks}"
            ),
            Self::PoolBuild { reason } => write!(f, "failed to build worker pool: {reason}"),
            Self::PlanMismatch {
                planned: Some(planned),
                units,
            } => write!(
                f,
                "partition plan covers {planned} units but {units} were supplied"
            ),
            Self::PlanMismatch {
                planned: None,
                units,
            } => write!(f, "scheduler not configured before running {units} units"),
        }
    }
}

impl Error for ScheduleError {}
