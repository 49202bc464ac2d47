//! Partitioned parallel execution for the Sylva spatial substrate.
//!
//! Simulation work is grouped into spatial units (resource units) that
//! each write the light grid around their own trees. Neighbouring units'
//! footprints overlap, so the [`PartitionedScheduler`] splits units into
//! phases such that no two units of one phase are neighbours, runs each
//! phase on a worker pool, and waits for it to finish before the next.
//!
//! # Shared writes
//!
//! Tasks write the light grid through a [`SharedGrid`], whose cells are
//! atomic `f32`s updated with compare-exchange. Phase partitioning keeps
//! concurrent writes to one cell rare; the atomics keep them correct
//! when the partition cannot rule them out.
//!
//! # Faults
//!
//! An error or panic inside a task becomes
//! [`ScheduleError::TaskFault`]. The failing phase is abandoned and no
//! later phase starts.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod light;
pub mod partition;
pub mod scheduler;
pub mod shared;

pub use config::SchedulerConfig;
pub use error::ScheduleError;
pub use light::{LightEdge, LightPass, LightUnit, TreeInfluence};
pub use partition::{PartitionPlan, PartitionStrategy, SpatialUnit};
pub use scheduler::{chunk_bounds, ExecutionMode, PartitionedScheduler, RunReport};
pub use shared::{AtomicF32, SharedGrid};
