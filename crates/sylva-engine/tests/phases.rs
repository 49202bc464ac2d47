//! Integration test: phase barriers, thresholds and fault handling.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use sylva_core::ErrorKind;
use sylva_engine::{
    ExecutionMode, PartitionStrategy, PartitionedScheduler, ScheduleError, SchedulerConfig,
    SpatialUnit,
};

// ── Test unit ───────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Plot {
    index: usize,
    /// Phase-A completions observed when this unit ran.
    seen_a: usize,
    runs: usize,
}

impl SpatialUnit for Plot {}

fn plots(n: usize) -> Vec<Plot> {
    (0..n)
        .map(|index| Plot {
            index,
            ..Plot::default()
        })
        .collect()
}

fn scheduler(workers: usize) -> PartitionedScheduler {
    PartitionedScheduler::new(SchedulerConfig {
        worker_count: Some(workers),
        strategy: PartitionStrategy::IndexParity,
        ..SchedulerConfig::default()
    })
    .unwrap()
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn five_units_split_into_alternating_phases() {
    let mut s = scheduler(4);
    let mut units = plots(5);
    let plan = s.configure(&units);
    assert_eq!(plan.phases(), &[vec![0, 2, 4], vec![1, 3]]);

    let done_a = AtomicUsize::new(0);
    let report = s
        .run_over_units(&mut units, |p| {
            p.runs += 1;
            if p.index % 2 == 0 {
                std::thread::sleep(std::time::Duration::from_millis(5));
                done_a.fetch_add(1, Ordering::SeqCst);
            } else {
                p.seen_a = done_a.load(Ordering::SeqCst);
            }
        })
        .unwrap();
    assert_eq!(report.mode, ExecutionMode::Parallel);
    assert_eq!(report.phases, 2);
    assert!(units.iter().all(|p| p.runs == 1));
    assert!(units.iter().filter(|p| p.index % 2 == 1).all(|p| p.seen_a == 3));
}

#[test]
fn three_units_run_sequentially_in_list_order() {
    let mut s = scheduler(4);
    let mut units = plots(3);
    s.configure(&units);
    let order = Mutex::new(Vec::new());
    let report = s
        .run_over_units(&mut units, |p| order.lock().unwrap().push(p.index))
        .unwrap();
    assert_eq!(report.mode, ExecutionMode::Sequential);
    assert_eq!(order.into_inner().unwrap(), vec![0, 2, 1]);
}

#[test]
fn fault_in_first_phase_stops_second() {
    let mut s = scheduler(4);
    let mut units = plots(8);
    s.configure(&units);
    let err = s
        .try_run_over_units(&mut units, |p| {
            p.runs += 1;
            if p.index == 2 {
                Err(format!("plot {} has no soil", p.index))
            } else {
                Ok(())
            }
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TaskFault);
    assert_eq!(
        err,
        ScheduleError::TaskFault {
            phase: 0,
            message: "plot 2 has no soil".into()
        }
    );
    assert!(units.iter().filter(|p| p.index % 2 == 1).all(|p| p.runs == 0));
}

#[test]
fn scheduler_is_reusable_after_a_fault() {
    let mut s = scheduler(2);
    let mut units = plots(6);
    s.configure(&units);
    assert!(s
        .run_over_units(&mut units, |p| assert!(p.index != 0, "boom"))
        .is_err());
    let report = s.run_over_units(&mut units, |p| p.runs += 1).unwrap();
    assert_eq!(report.tasks, 6);
    assert!(units.iter().all(|p| p.runs >= 1));
}

#[test]
fn range_chunks_partition_the_range() {
    let s = scheduler(4);
    let chunks = Mutex::new(Vec::new());
    let report = s
        .run_over_range(100, 400, 50, 4, |b, e| chunks.lock().unwrap().push((b, e)))
        .unwrap();
    let mut chunks = chunks.into_inner().unwrap();
    chunks.sort_unstable();
    assert_eq!(report.mode, ExecutionMode::Parallel);
    assert_eq!(chunks, vec![(100, 175), (175, 250), (250, 325), (325, 400)]);
}

#[test]
fn zero_workers_is_a_configuration_error() {
    let err = PartitionedScheduler::new(SchedulerConfig {
        worker_count: Some(0),
        ..SchedulerConfig::default()
    })
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}
