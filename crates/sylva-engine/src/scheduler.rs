//! Two-phase (or four-phase) partitioned execution.
//!
//! Every phase runs to completion before the next starts. Within a
//! phase, tasks run concurrently on the scheduler's worker pool and may
//! finish in any order. A failing or panicking task aborts the run:
//! the remaining tasks of its phase may or may not execute, and no later
//! phase starts.

use std::convert::Infallible;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, warn};

use crate::config::SchedulerConfig;
use crate::error::ScheduleError;
use crate::partition::{PartitionPlan, SpatialUnit};

/// Whether a run used the worker pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Everything ran on the calling thread.
    Sequential,
    /// Tasks were spread over the worker pool.
    Parallel,
}

/// Summary of one completed run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunReport {
    /// How the run executed.
    pub mode: ExecutionMode,
    /// Number of phases (barriers + 1).
    pub phases: usize,
    /// Tasks executed: units, entities or range chunks.
    pub tasks: usize,
}

/// Runs operations over spatial units, entities and index ranges.
pub struct PartitionedScheduler {
    config: SchedulerConfig,
    pool: Option<ThreadPool>,
    plan: Option<PartitionPlan>,
}

impl fmt::Debug for PartitionedScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartitionedScheduler")
            .field("config", &self.config)
            .field("workers", &self.worker_count())
            .field("plan", &self.plan)
            .finish()
    }
}

impl PartitionedScheduler {
    /// Validate `config` and start a worker pool if parallelism is on.
    pub fn new(config: SchedulerConfig) -> Result<Self, ScheduleError> {
        config.validate()?;
        let pool = if config.parallel {
            let workers = config.resolved_worker_count();
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("sylva-worker-{i}"))
                .build()
                .map_err(|e| ScheduleError::PoolBuild {
                    reason: e.to_string(),
                })?;
            debug!(workers, "scheduler pool started");
            Some(pool)
        } else {
            None
        };
        Ok(Self {
            config,
            pool,
            plan: None,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Worker threads in the pool (0 when sequential).
    pub fn worker_count(&self) -> usize {
        self.pool
            .as_ref()
            .map_or(0, |p| p.current_num_threads())
    }

    /// Compute phases for `units`. Call again whenever the collection
    /// changes.
    pub fn configure<U: SpatialUnit>(&mut self, units: &[U]) -> &PartitionPlan {
        let plan = PartitionPlan::build(units, self.config.strategy);
        debug!(
            units = units.len(),
            strategy = ?plan.strategy(),
            phase_sizes = ?plan.phases().iter().map(Vec::len).collect::<Vec<_>>(),
            "partition plan computed"
        );
        self.plan.insert(plan)
    }

    /// The current plan, if [`configure`](Self::configure) has run.
    pub fn plan(&self) -> Option<&PartitionPlan> {
        self.plan.as_ref()
    }

    fn use_pool(&self, tasks: usize, threshold: usize) -> Option<&ThreadPool> {
        if self.config.parallel && tasks > threshold {
            self.pool.as_ref()
        } else {
            None
        }
    }

    // ── Units ───────────────────────────────────────────────────

    /// Run `op` once per unit, phase by phase.
    pub fn run_over_units<U, F>(&self, units: &mut [U], op: F) -> Result<RunReport, ScheduleError>
    where
        U: Send,
        F: Fn(&mut U) + Sync,
    {
        self.try_run_over_units(units, |u| {
            op(u);
            Ok::<(), Infallible>(())
        })
    }

    /// Like [`run_over_units`](Self::run_over_units) for fallible
    /// operations. The first error becomes a [`ScheduleError::TaskFault`].
    pub fn try_run_over_units<U, F, E>(
        &self,
        units: &mut [U],
        op: F,
    ) -> Result<RunReport, ScheduleError>
    where
        U: Send,
        F: Fn(&mut U) -> Result<(), E> + Sync,
        E: fmt::Display,
    {
        let plan = match &self.plan {
            Some(plan) if plan.unit_count() == units.len() => plan,
            other => {
                return Err(ScheduleError::PlanMismatch {
                    planned: other.as_ref().map(PartitionPlan::unit_count),
                    units: units.len(),
                })
            }
        };
        let pool = self.use_pool(units.len(), self.config.min_parallel_units);
        debug!(
            units = units.len(),
            phases = plan.phases().len(),
            parallel = pool.is_some(),
            "running units"
        );

        let mut slots: Vec<Option<&mut U>> = units.iter_mut().map(Some).collect();
        for (phase, members) in plan.phases().iter().enumerate() {
            let batch: Vec<&mut U> = members.iter().filter_map(|&i| slots[i].take()).collect();
            let outcome = match pool {
                Some(pool) => pool.install(|| {
                    batch
                        .into_par_iter()
                        .try_for_each(|u| guarded(phase, || op(u)))
                }),
                None => batch
                    .into_iter()
                    .try_for_each(|u| guarded(phase, || op(u))),
            };
            outcome.map_err(log_fault)?;
        }
        Ok(RunReport {
            mode: mode(pool),
            phases: plan.phases().len(),
            tasks: units.len(),
        })
    }

    // ── Entities ────────────────────────────────────────────────

    /// Run `op` once per entity in a single phase.
    ///
    /// Entities are assumed not to interfere, so no partitioning is
    /// applied.
    pub fn run_over_entities<T, F>(
        &self,
        entities: &mut [T],
        op: F,
    ) -> Result<RunReport, ScheduleError>
    where
        T: Send,
        F: Fn(&mut T) + Sync,
    {
        let pool = self.use_pool(entities.len(), self.config.min_parallel_units);
        let outcome = match pool {
            Some(pool) => pool.install(|| {
                entities
                    .par_iter_mut()
                    .try_for_each(|e| guarded(0, infallible(|| op(e))))
            }),
            None => entities
                .iter_mut()
                .try_for_each(|e| guarded(0, infallible(|| op(e)))),
        };
        outcome.map_err(log_fault)?;
        Ok(RunReport {
            mode: mode(pool),
            phases: 1,
            tasks: entities.len(),
        })
    }

    // ── Ranges ──────────────────────────────────────────────────

    /// Run `op(chunk_begin, chunk_end)` over `[begin, end)` split into
    /// chunks of `max(min_chunk, (end - begin) / max_chunks)` elements.
    ///
    /// Chunks run concurrently with no ordering guarantee when the range
    /// is longer than `3 * min_chunk`; otherwise `op(begin, end)` runs
    /// once on the calling thread. An empty range runs nothing.
    pub fn run_over_range<F>(
        &self,
        begin: usize,
        end: usize,
        min_chunk: usize,
        max_chunks: usize,
        op: F,
    ) -> Result<RunReport, ScheduleError>
    where
        F: Fn(usize, usize) + Sync,
    {
        if begin > end || min_chunk == 0 || max_chunks == 0 {
            return Err(ScheduleError::InvalidRange {
                begin,
                end,
                min_chunk,
                max_chunks,
            });
        }
        let len = end - begin;
        if len == 0 {
            return Ok(RunReport {
                mode: ExecutionMode::Sequential,
                phases: 1,
                tasks: 0,
            });
        }
        let pool = self.use_pool(len, min_chunk.saturating_mul(3));
        let Some(pool) = pool else {
            guarded(0, infallible(|| op(begin, end))).map_err(log_fault)?;
            return Ok(RunReport {
                mode: ExecutionMode::Sequential,
                phases: 1,
                tasks: 1,
            });
        };

        let chunks = chunk_bounds(begin, end, min_chunk, max_chunks);
        pool.install(|| {
            chunks
                .par_iter()
                .try_for_each(|&(b, e)| guarded(0, infallible(|| op(b, e))))
        })
        .map_err(log_fault)?;
        Ok(RunReport {
            mode: ExecutionMode::Parallel,
            phases: 1,
            tasks: chunks.len(),
        })
    }
}

/// Chunk boundaries covering `[begin, end)`.
pub fn chunk_bounds(begin: usize, end: usize, min_chunk: usize, max_chunks: usize) -> Vec<(usize, usize)> {
    let len = end.saturating_sub(begin);
    let chunk = min_chunk.max(len / max_chunks.max(1)).max(1);
    (begin..end)
        .step_by(chunk)
        .map(|b| (b, b.saturating_add(chunk).min(end)))
        .collect()
}

fn mode(pool: Option<&ThreadPool>) -> ExecutionMode {
    if pool.is_some() {
        ExecutionMode::Parallel
    } else {
        ExecutionMode::Sequential
    }
}

/// Run one task, turning errors and panics into a task fault.
fn guarded<E: fmt::Display>(
    phase: usize,
    task: impl FnOnce() -> Result<(), E>,
) -> Result<(), ScheduleError> {
    match catch_unwind(AssertUnwindSafe(task)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ScheduleError::TaskFault {
            phase,
            message: e.to_string(),
        }),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "task panicked".to_string());
            Err(ScheduleError::TaskFault { phase, message })
        }
    }
}

fn infallible(task: impl FnOnce()) -> impl FnOnce() -> Result<(), Infallible> {
    move || {
        task();
        Ok(())
    }
}

fn log_fault(e: ScheduleError) -> ScheduleError {
    warn!(error = %e, "scheduled task failed, phase aborted");
    e
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::PartitionStrategy;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct Unit {
        pos: Option<(i32, i32)>,
        hits: usize,
        order: usize,
    }

    impl SpatialUnit for Unit {
        fn grid_position(&self) -> Option<(i32, i32)> {
            self.pos
        }
    }

    fn units(n: usize) -> Vec<Unit> {
        (0..n).map(|_| Unit::default()).collect()
    }

    fn parallel(workers: usize) -> PartitionedScheduler {
        PartitionedScheduler::new(SchedulerConfig {
            worker_count: Some(workers),
            ..SchedulerConfig::default()
        })
        .unwrap()
    }

    // ── Units ───────────────────────────────────────────────────

    #[test]
    fn every_unit_runs_exactly_once() {
        let mut s = parallel(4);
        let mut us = units(37);
        s.configure(&us);
        let report = s.run_over_units(&mut us, |u| u.hits += 1).unwrap();
        assert_eq!(report.mode, ExecutionMode::Parallel);
        assert_eq!(report.phases, 2);
        assert!(us.iter().all(|u| u.hits == 1));
    }

    #[test]
    fn threshold_forces_sequential() {
        let mut s = parallel(4);
        let mut us = units(3);
        s.configure(&us);
        let report = s.run_over_units(&mut us, |u| u.hits += 1).unwrap();
        assert_eq!(report.mode, ExecutionMode::Sequential);
        let mut us = units(4);
        s.configure(&us);
        let report = s.run_over_units(&mut us, |u| u.hits += 1).unwrap();
        assert_eq!(report.mode, ExecutionMode::Parallel);
    }

    #[test]
    fn disabled_parallelism_runs_sequentially() {
        let mut s = PartitionedScheduler::new(SchedulerConfig::sequential()).unwrap();
        assert_eq!(s.worker_count(), 0);
        let mut us = units(100);
        s.configure(&us);
        let report = s.run_over_units(&mut us, |u| u.hits += 1).unwrap();
        assert_eq!(report.mode, ExecutionMode::Sequential);
    }

    #[test]
    fn sequential_order_is_phase_a_then_b() {
        let mut s = PartitionedScheduler::new(SchedulerConfig::sequential()).unwrap();
        let mut us = units(5);
        s.configure(&us);
        let counter = AtomicUsize::new(0);
        s.run_over_units(&mut us, |u| u.order = counter.fetch_add(1, Ordering::SeqCst))
            .unwrap();
        let order: Vec<usize> = us.iter().map(|u| u.order).collect();
        assert_eq!(order, vec![0, 3, 1, 4, 2]);
    }

    #[test]
    fn phase_b_starts_after_phase_a_finishes() {
        let mut s = parallel(4);
        let mut us = units(40);
        s.configure(&us);
        let finished_a = AtomicUsize::new(0);
        let violations = AtomicUsize::new(0);
        // Even indices form phase A.
        for (i, u) in us.iter_mut().enumerate() {
            u.order = i;
        }
        s.run_over_units(&mut us, |u| {
            if u.order % 2 == 0 {
                std::thread::sleep(std::time::Duration::from_millis(1));
                finished_a.fetch_add(1, Ordering::SeqCst);
            } else if finished_a.load(Ordering::SeqCst) != 20 {
                violations.fetch_add(1, Ordering::SeqCst);
            }
        })
        .unwrap();
        assert_eq!(violations.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unconfigured_run_is_rejected() {
        let s = parallel(2);
        let mut us = units(4);
        assert_eq!(
            s.run_over_units(&mut us, |_| {}),
            Err(ScheduleError::PlanMismatch {
                planned: None,
                units: 4
            })
        );
    }

    #[test]
    fn stale_plan_is_rejected() {
        let mut s = parallel(2);
        s.configure(&units(4));
        let mut us = units(5);
        assert!(matches!(
            s.run_over_units(&mut us, |_| {}),
            Err(ScheduleError::PlanMismatch {
                planned: Some(4),
                units: 5
            })
        ));
    }

    #[test]
    fn panic_in_phase_a_skips_phase_b() {
        let mut s = parallel(4);
        let mut us = units(10);
        s.configure(&us);
        for (i, u) in us.iter_mut().enumerate() {
            u.order = i;
        }
        let err = s
            .run_over_units(&mut us, |u| {
                if u.order == 4 {
                    panic!("unit 4 exploded");
                }
                u.hits += 1;
            })
            .unwrap_err();
        assert_eq!(
            err,
            ScheduleError::TaskFault {
                phase: 0,
                message: "unit 4 exploded".into()
            }
        );
        assert!(us.iter().filter(|u| u.order % 2 == 1).all(|u| u.hits == 0));
    }

    #[test]
    fn task_error_becomes_fault() {
        let mut s = PartitionedScheduler::new(SchedulerConfig::sequential()).unwrap();
        let mut us = units(4);
        s.configure(&us);
        let err = s
            .try_run_over_units(&mut us, |u| {
                u.hits += 1;
                if u.hits > 0 {
                    Err("no light")
                } else {
                    Ok(())
                }
            })
            .unwrap_err();
        assert_eq!(err.kind(), sylva_core::ErrorKind::TaskFault);
        assert!(err.to_string().contains("no light"));
        assert_eq!(us.iter().map(|u| u.hits).sum::<usize>(), 1);
    }

    #[test]
    fn quadrant_plan_runs_four_phases() {
        let mut s = parallel(4);
        let mut us: Vec<Unit> = (0..16)
            .map(|i| Unit {
                pos: Some((i % 4, i / 4)),
                ..Unit::default()
            })
            .collect();
        assert_eq!(s.configure(&us).strategy(), PartitionStrategy::Quadrants);
        let report = s.run_over_units(&mut us, |u| u.hits += 1).unwrap();
        assert_eq!(report.phases, 4);
        assert_eq!(report.tasks, 16);
    }

    // ── Entities ────────────────────────────────────────────────

    #[test]
    fn entities_run_in_one_phase() {
        let s = parallel(4);
        let mut names = vec![String::from("abies"), "fagus".into(), "picea".into(), "pinus".into()];
        let report = s.run_over_entities(&mut names, |n| n.make_ascii_uppercase()).unwrap();
        assert_eq!(report.phases, 1);
        assert_eq!(report.mode, ExecutionMode::Parallel);
        assert_eq!(names[1], "FAGUS");
    }

    #[test]
    fn entity_panic_is_fault() {
        let s = parallel(2);
        let mut xs = vec![1, 2, 3, 4, 5];
        let err = s
            .run_over_entities(&mut xs, |x| {
                if *x == 3 {
                    panic!("bad entity {x}");
                }
            })
            .unwrap_err();
        assert!(matches!(err, ScheduleError::TaskFault { phase: 0, ref message } if message == "bad entity 3"));
    }

    // ── Ranges ──────────────────────────────────────────────────

    #[test]
    fn chunk_size_honours_minimum() {
        assert_eq!(
            chunk_bounds(0, 10, 4, 10),
            vec![(0, 4), (4, 8), (8, 10)]
        );
        assert_eq!(chunk_bounds(5, 105, 1, 4).len(), 4);
        assert_eq!(chunk_bounds(5, 105, 1, 4)[0], (5, 30));
    }

    #[test]
    fn chunks_at_the_top_of_usize_do_not_overflow() {
        let m = usize::MAX;
        assert_eq!(
            chunk_bounds(m - 10, m, 3, 4),
            vec![(m - 10, m - 7), (m - 7, m - 4), (m - 4, m - 1), (m - 1, m)]
        );

        let s = parallel(2);
        let seen = Mutex::new(Vec::new());
        let report = s
            .run_over_range(m - 10, m, 3, 4, |b, e| seen.lock().unwrap().push((b, e)))
            .unwrap();
        assert_eq!(report.mode, ExecutionMode::Parallel);
        let mut seen = seen.into_inner().unwrap();
        seen.sort_unstable();
        assert_eq!(seen.first(), Some(&(m - 10, m - 7)));
        assert_eq!(seen.last(), Some(&(m - 1, m)));
    }

    #[test]
    fn range_covers_every_index_once() {
        let s = parallel(4);
        let seen = Mutex::new(vec![0u8; 1024]);
        let report = s
            .run_over_range(0, 1024, 10, 16, |b, e| {
                let mut seen = seen.lock().unwrap();
                for i in b..e {
                    seen[i] += 1;
                }
            })
            .unwrap();
        assert_eq!(report.mode, ExecutionMode::Parallel);
        assert_eq!(report.tasks, 16);
        assert!(seen.into_inner().unwrap().iter().all(|&n| n == 1));
    }

    #[test]
    fn short_range_runs_once_inline() {
        let s = parallel(4);
        let calls = Mutex::new(Vec::new());
        let report = s
            .run_over_range(10, 25, 5, 8, |b, e| calls.lock().unwrap().push((b, e)))
            .unwrap();
        assert_eq!(report.mode, ExecutionMode::Sequential);
        assert_eq!(calls.into_inner().unwrap(), vec![(10, 25)]);
    }

    #[test]
    fn bad_range_arguments_are_rejected() {
        let s = parallel(1);
        assert!(matches!(
            s.run_over_range(5, 4, 1, 1, |_, _| {}),
            Err(ScheduleError::InvalidRange { .. })
        ));
        assert!(matches!(
            s.run_over_range(0, 4, 0, 1, |_, _| {}),
            Err(ScheduleError::InvalidRange { .. })
        ));
        let report = s.run_over_range(3, 3, 1, 1, |_, _| panic!("empty")).unwrap();
        assert_eq!(report.tasks, 0);
    }
}
