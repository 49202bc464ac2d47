//! End-to-end light pass example.
//!
//! Demonstrates: build a profile → configure the scheduler → stamp
//! kernels onto a shared light grid → read light back per tree →
//! compare with a sequential run.
//!
//! Run with `RUST_LOG=debug` to see scheduler and library events.

use std::time::Instant;

use sylva_bench::reference_profile;
use sylva_engine::{LightEdge, LightPass, PartitionedScheduler, SchedulerConfig, SharedGrid};
use sylva_grid::Grid;
use sylva_stamp::combine;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Sylva Light Pass Example ===\n");

    let mut results: Vec<Grid<f32>> = Vec::new();
    for (label, config) in [
        ("sequential", SchedulerConfig::sequential()),
        ("parallel", SchedulerConfig::default()),
    ] {
        let mut profile = reference_profile(42);
        let mut scheduler = PartitionedScheduler::new(config).unwrap();
        let workers = scheduler.worker_count();
        let plan = scheduler.configure(&profile.units);
        println!(
            "{label}: {} units in {} phases ({:?}), {} workers",
            plan.unit_count(),
            plan.phases().len(),
            plan.strategy(),
            workers,
        );

        let grid = SharedGrid::new_with(profile.geometry, 1.0);
        let pass = LightPass::new(&profile.library, LightEdge::Clip);

        let start = Instant::now();
        let report = pass
            .stamp(&scheduler, &mut profile.units, &grid, combine::multiply)
            .unwrap();
        pass.read_back(&scheduler, &mut profile.units, &grid).unwrap();
        let elapsed = start.elapsed();
        info!(label, ?elapsed, "light pass finished");

        let readings: Vec<f64> = profile
            .units
            .iter()
            .flat_map(|u| u.trees.iter().filter_map(|t| t.reading))
            .collect();
        let mean = readings.iter().sum::<f64>() / readings.len().max(1) as f64;
        let light: Grid<f32> = grid.into();
        let min = light.iter().copied().fold(f32::INFINITY, f32::min);

        println!(
            "  mode={:?} tasks={} time={:>8.2?} mean_tree_light={:.4} min_cell={:.4} mean_cell={:.4}\n",
            report.mode,
            report.tasks,
            elapsed,
            mean,
            min,
            light.sum() / light.count() as f64,
        );
        results.push(light);
    }

    let identical = results[0]
        .iter()
        .zip(results[1].iter())
        .all(|(a, b)| a.to_bits() == b.to_bits());
    println!("sequential and parallel grids identical: {identical}");
}
