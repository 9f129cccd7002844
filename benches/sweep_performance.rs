//! Performance benchmarks for the column solvers
//!
//! # What We're Measuring
//!
//! 1. **Counter-current sweep**:
//!    - One or two oracle calls per stage per sweep
//!    - Sweeps grow roughly with the stage count, so time ∝ N²
//!
//! 2. **Stage-count search**:
//!    - Two bracket trials plus ⌈log₂(upper − lower)⌉ bisection trials
//!
//! 3. **Sequential vs parallel** (feature `parallel`):
//!    - Stage evaluations of a sweep spread over rayon's pool
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench --bench sweep_performance
//!
//! # Only the sweep
//! cargo bench --bench sweep_performance "Counter-current"
//!
//! # Parallel comparison
//! cargo bench --bench sweep_performance --features parallel threshold
//! ```

use std::hint::black_box;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use strip_rs::chemistry::WaterChemistry;
use strip_rs::models::{Application, HenrySpeciationOracle};
use strip_rs::solver::{
    ColumnBoundaries,
    CounterCurrentSolver,
    EfficiencyPolicy,
    Scenario,
    Solver,
    SolverConfiguration,
    StageCountSearch,
};

// =================================================================================================
// Scenarios
// =================================================================================================

/// TCE on pure water
fn voc_scenario() -> Scenario {
    Scenario::new(
        Box::new(HenrySpeciationOracle::default()),
        Application::Voc,
        ColumnBoundaries::new(10.0, 7.0).with_provisional_outlet(0.01),
    )
    .with_water(WaterChemistry::pure())
    .with_air_water_ratio(25.0)
}

/// CO2 in municipal water, pH solved at every stage
fn co2_scenario() -> Scenario {
    Scenario::new(
        Box::new(HenrySpeciationOracle::default()),
        Application::Co2,
        ColumnBoundaries::new(100.0, 7.5).with_provisional_outlet(10.0),
    )
    .with_air_water_ratio(30.0)
}

// =================================================================================================
// Sweep
// =================================================================================================

fn benchmark_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("Counter-current sweep");
    group.measurement_time(Duration::from_secs(10));

    let solver = CounterCurrentSolver::new();
    let voc = voc_scenario();
    let co2 = co2_scenario();
    let config = SolverConfiguration::default();

    for stages in [5, 10, 20, 40] {
        group.throughput(Throughput::Elements(stages as u64));

        group.bench_with_input(BenchmarkId::new("VOC", stages), &stages, |b, &stages| {
            b.iter(|| solver.solve(black_box(&voc), black_box(&config), stages).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("CO2", stages), &stages, |b, &stages| {
            b.iter(|| solver.solve(black_box(&co2), black_box(&config), stages).unwrap())
        });
    }

    group.finish();
}

// =================================================================================================
// Stage-count search
// =================================================================================================

fn benchmark_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("Stage-count search");
    group.sample_size(20);

    let scenario = voc_scenario();
    let config = SolverConfiguration::default().with_efficiency(EfficiencyPolicy::uniform(0.85));
    let search = StageCountSearch::new();

    for upper in [16, 64] {
        group.bench_with_input(BenchmarkId::new("VOC to 1e-4 mg/L", upper), &upper, |b, &upper| {
            b.iter(|| {
                search
                    .find_minimal_stages(black_box(&scenario), black_box(&config), 1e-4, 1, upper)
                    .unwrap()
            })
        });
    }

    group.finish();
}

// =================================================================================================
// Parallel threshold
// =================================================================================================

/// Same column evaluated below and above the parallel threshold
fn benchmark_threshold(c: &mut Criterion) {
    let mut group = c.benchmark_group("Parallel threshold");
    group.sample_size(20);

    let solver = CounterCurrentSolver::new();
    let scenario = co2_scenario();
    let config = SolverConfiguration::default();
    let default_threshold = strip_rs::solver::parallel_threshold();

    for (label, threshold) in [("sequential", usize::MAX), ("parallel", 1)] {
        strip_rs::solver::set_parallel_threshold(threshold);
        group.bench_function(format!("CO2 40 stages, {label}"), |b| {
            b.iter(|| solver.solve(black_box(&scenario), black_box(&config), 40).unwrap())
        });
    }
    strip_rs::solver::set_parallel_threshold(default_threshold);

    group.finish();
}

criterion_group!(benches, benchmark_sweep, benchmark_search, benchmark_threshold);
criterion_main!(benches);
