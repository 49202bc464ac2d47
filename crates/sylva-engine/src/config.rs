//! Scheduler configuration.

use crate::error::ScheduleError;
use crate::partition::PartitionStrategy;

/// Configuration for a [`PartitionedScheduler`](crate::PartitionedScheduler).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Global switch for parallel execution. Default: `true`.
    pub parallel: bool,
    /// Worker threads. `None` = auto-detect (available parallelism,
    /// clamped to `[1, 64]`).
    pub worker_count: Option<usize>,
    /// Collections of at most this many units run sequentially.
    /// Default: 3.
    pub min_parallel_units: usize,
    /// How units are split into phases. Default: [`PartitionStrategy::Auto`].
    pub strategy: PartitionStrategy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            worker_count: None,
            min_parallel_units: 3,
            strategy: PartitionStrategy::Auto,
        }
    }
}

impl SchedulerConfig {
    /// A configuration that never spawns workers.
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Resolve the actual worker count, applying auto-detection if `None`.
    pub fn resolved_worker_count(&self) -> usize {
        match self.worker_count {
            Some(n) => n.clamp(1, 64),
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
                .clamp(1, 64),
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.worker_count == Some(0) {
            return Err(ScheduleError::InvalidConfig {
                reason: "worker_count must be at least 1".into(),
            });
        }
        Ok(())
    }
}
