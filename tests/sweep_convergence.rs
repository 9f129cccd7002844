//! Convergence tests for the counter-current sweep
//!
//! Reference columns with the built-in oracle, an analytical check against
//! the Kremser equation, and oracle failures surfacing with their location.

use approx::assert_relative_eq;

use strip_rs::error::StrippingError;
use strip_rs::models::Application;
use strip_rs::solver::{
    ColumnBoundaries,
    CounterCurrentSolver,
    DEFAULT_TOLERANCE,
    EfficiencyPolicy,
    Scenario,
    Solver,
    SolverConfiguration,
    SweepStatus,
    validate_mass_balance,
};

mod common;
use common::{
    CountingOracle,
    Fault,
    FaultyOracle,
    LinearPartitionOracle,
    assert_profiles_close,
    co2_scenario,
    kremser_outlet,
    relative_error,
    voc_scenario,
};

fn partition_scenario(oracle: Box<dyn strip_rs::chemistry::EquilibriumOracle>) -> Scenario {
    Scenario::new(
        oracle,
        Application::General,
        ColumnBoundaries::new(10.0, 7.0).with_provisional_outlet(0.1),
    )
}

// =================================================================================================
// Reference columns
// =================================================================================================

#[test]
fn test_voc_reference_column() {
    // TCE 10 mg/L, 15 stages, A/W 25, E = 0.85
    let scenario = voc_scenario(10.0, 25.0);
    let outcome = CounterCurrentSolver::new()
        .solve(&scenario, &SolverConfiguration::default(), 15)
        .unwrap();

    assert!(outcome.converged(), "status {}", outcome.tracker.status);
    assert!(outcome.iterations() <= 80, "{} sweeps", outcome.iterations());
    assert!(outcome.outlet_mg_l() < 1e-6);
    assert!(!outcome.efficiency_adapted);

    let report = validate_mass_balance(&outcome.profile, &scenario);
    assert!(report.passed);
    assert!(report.error_fraction < 0.01, "error {:.3} %", report.error_percent());
}

#[test]
fn test_co2_reference_column() {
    // CO2 100 mg/L at pH 7.5, 15 stages, A/W 30, adaptive efficiency
    let scenario = co2_scenario();
    let outcome = CounterCurrentSolver::new()
        .solve(&scenario, &SolverConfiguration::default(), 15)
        .unwrap();

    assert!(outcome.converged(), "status {}", outcome.tracker.status);
    assert!(outcome.iterations() <= 100, "{} sweeps", outcome.iterations());
    assert!(outcome.efficiency_adapted);
    assert!(outcome.outlet_mg_l() < 100.0);

    // pH rises as CO2 leaves the water
    let profile = &outcome.profile;
    assert!(profile.stage(1).ph > profile.stage(profile.stages()).ph);

    let report = validate_mass_balance(profile, &scenario);
    assert!(report.error_fraction < 0.05, "error {:.3} %", report.error_percent());
}

#[test]
fn test_top_stage_is_solved() {
    let scenario = voc_scenario(10.0, 25.0);
    let outcome = CounterCurrentSolver::new()
        .solve(&scenario, &SolverConfiguration::default(), 8)
        .unwrap();

    let top = outcome.profile.top_liquid_mg_l();
    assert!(top < 5.0, "top stage liquid {top} mg/L");
    assert!(top != scenario.boundaries.provisional_outlet_mg_l);
    assert!(outcome.profile.gas_outlet() > 0.0);
}

#[test]
fn test_boundaries_and_monotonic_profile() {
    for (scenario, stages) in [(voc_scenario(10.0, 25.0), 10), (co2_scenario(), 12)] {
        let outcome = CounterCurrentSolver::new()
            .solve(&scenario, &SolverConfiguration::default(), stages)
            .unwrap();
        let profile = &outcome.profile;

        assert!(profile.boundaries_intact(scenario.feed_mg_l()));
        assert_eq!(profile.stage(0).gas_mole_fraction, 0.0);
        assert_eq!(profile.outlet_mg_l(), profile.stage(1).liquid_mg_l);
        assert!(profile.is_monotonic(1e-6), "{:?}", scenario.application);
        assert!(profile.first_non_physical().is_none());
    }
}

#[test]
fn test_repeated_runs_are_identical() {
    let scenario = co2_scenario();
    let config = SolverConfiguration::default();
    let first = CounterCurrentSolver::new().solve(&scenario, &config, 10).unwrap();
    let second = CounterCurrentSolver::new().solve(&scenario, &config, 10).unwrap();

    assert_eq!(first.profile, second.profile);
    assert_eq!(first.tracker.history, second.tracker.history);
}

#[test]
fn test_more_stages_strip_more() {
    let scenario = voc_scenario(10.0, 25.0);
    let config = SolverConfiguration::default();
    let outlets: Vec<f64> = [2, 4, 6]
        .iter()
        .map(|&n| CounterCurrentSolver::new().solve(&scenario, &config, n).unwrap().outlet_mg_l())
        .collect();
    assert!(outlets.windows(2).all(|w| w[1] < w[0]), "{outlets:?}");
}

#[test]
fn test_default_tolerance_settles_the_outlet() {
    // The outlet of a tall column is orders of magnitude below the feed, so
    // it must converge on its own scale, whatever the relaxation
    let scenario = voc_scenario(10.0, 25.0);
    let solver = CounterCurrentSolver::new();

    for stages in [6, 10, 15] {
        let reference = solver
            .solve(&scenario, &SolverConfiguration::iterative(1e-12, 2_000), stages)
            .unwrap();
        assert!(reference.converged(), "N = {stages}: tight reference did not converge");

        for omega in [1.0, 0.2] {
            let config = SolverConfiguration::iterative(DEFAULT_TOLERANCE, 2_000).with_relaxation(omega);
            let outcome = solver.solve(&scenario, &config, stages).unwrap();
            assert!(outcome.converged());

            let error = relative_error(outcome.outlet_mg_l(), reference.outlet_mg_l());
            assert!(
                error < 1e-2,
                "N = {stages}, ω = {omega}: outlet {:.4e} vs {:.4e}",
                outcome.outlet_mg_l(),
                reference.outlet_mg_l()
            );

            let report = validate_mass_balance(&outcome.profile, &scenario);
            assert!(report.passed, "N = {stages}, ω = {omega}: error {:.3} %", report.error_percent());
        }
    }
}

// =================================================================================================
// Analytical reference
// =================================================================================================

#[test]
fn test_ideal_stages_match_kremser() {
    let config = SolverConfiguration::iterative(1e-10, 2_000).with_efficiency(EfficiencyPolicy::uniform(1.0));

    for (s, stages) in [(2.0, 5), (4.0, 3), (1.5, 8)] {
        let scenario = partition_scenario(Box::new(LinearPartitionOracle::new("General", s)));
        let outcome = CounterCurrentSolver::new().solve(&scenario, &config, stages).unwrap();
        assert!(outcome.converged());

        let expected = kremser_outlet(10.0, s, stages);
        let error = relative_error(outcome.outlet_mg_l(), expected);
        assert!(error < 1e-6, "S = {s}, N = {stages}: {} vs {expected}", outcome.outlet_mg_l());

        let report = validate_mass_balance(&outcome.profile, &scenario);
        assert!(report.error_fraction < 1e-6);
    }
}

#[test]
fn test_relaxation_reaches_the_same_column() {
    let base = SolverConfiguration::iterative(1e-10, 4_000).with_efficiency(EfficiencyPolicy::uniform(1.0));
    let scenario = partition_scenario(Box::new(LinearPartitionOracle::new("General", 2.0)));

    let plain = CounterCurrentSolver::new().solve(&scenario, &base, 5).unwrap();
    let relaxed = CounterCurrentSolver::new()
        .solve(&scenario, &base.clone().with_relaxation(0.5), 5)
        .unwrap();

    assert!(relaxed.converged());
    assert!(relaxed.iterations() > plain.iterations());
    assert_profiles_close(&plain.profile, &relaxed.profile, 1e-5, "relaxed vs plain");
}

#[test]
fn test_oracle_calls_per_sweep() {
    let stages = 4;
    for (efficiency, calls_per_stage) in [(0.5, 2), (1.0, 1)] {
        let (oracle, calls) = CountingOracle::new(Box::new(LinearPartitionOracle::new("General", 2.0)));
        let scenario = partition_scenario(Box::new(oracle));
        let config = SolverConfiguration::iterative(1e-14, 3).with_efficiency(EfficiencyPolicy::uniform(efficiency));

        let outcome = CounterCurrentSolver::new().solve(&scenario, &config, stages).unwrap();
        assert_eq!(outcome.tracker.status, SweepStatus::NotConverged);

        // One feed calibration, then every stage of every sweep
        let expected = 1 + 3 * stages * calls_per_stage;
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), expected);
    }
}

// =================================================================================================
// Oracle failures
// =================================================================================================

#[test]
fn test_non_physical_oracle_output_is_located() {
    for fault in [Fault::NanLiquid, Fault::NegativeGas] {
        let scenario = partition_scenario(Box::new(FaultyOracle::new("General", fault)));
        let err = CounterCurrentSolver::new()
            .solve(&scenario, &SolverConfiguration::default(), 4)
            .unwrap_err();

        match err {
            StrippingError::NumericalInstability {
                stage,
                iteration,
                liquid_in_mg_l,
                gas_in_mole_fraction,
                ..
            } => {
                assert_eq!((stage, iteration), (2, 2), "{fault:?}");
                assert!(liquid_in_mg_l > 0.0);
                assert!(gas_in_mole_fraction > 0.0);
            }
            other => panic!("{fault:?}: unexpected error {other}"),
        }
    }
}

#[test]
fn test_mixed_basis_is_a_unit_mismatch() {
    let scenario = partition_scenario(Box::new(FaultyOracle::new("General", Fault::MixedBasis)));
    let err = CounterCurrentSolver::new()
        .solve(&scenario, &SolverConfiguration::default(), 4)
        .unwrap_err();
    assert!(matches!(err, StrippingError::OracleUnitMismatch { .. }), "{err}");
}

#[test]
fn test_unknown_contaminant_is_refused() {
    let scenario = voc_scenario(10.0, 25.0).with_contaminant(
        strip_rs::models::ContaminantProperties::new("Pce", "Pce", 0.72, 165.83),
    );
    let err = CounterCurrentSolver::new()
        .solve(&scenario, &SolverConfiguration::default(), 4)
        .unwrap_err();
    assert!(matches!(err, StrippingError::Oracle(_)), "{err}");
}

#[test]
fn test_budget_exhaustion_is_reported() {
    let scenario = voc_scenario(10.0, 25.0);
    let outcome = CounterCurrentSolver::new()
        .solve(&scenario, &SolverConfiguration::iterative(1e-12, 2), 10)
        .unwrap();
    assert!(!outcome.converged());
    assert_eq!(outcome.tracker.history.len(), 2);
    assert_relative_eq!(outcome.tracker.last_change, outcome.tracker.history[1]);
    assert!(outcome.require_converged().is_err());
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_sweep_matches_sequential() {
    let scenario = co2_scenario();
    let config = SolverConfiguration::default();
    let sequential = CounterCurrentSolver::new().solve(&scenario, &config, 20).unwrap();

    let previous = strip_rs::solver::parallel_threshold();
    strip_rs::solver::set_parallel_threshold(1);
    let parallel = CounterCurrentSolver::new().solve(&scenario, &config, 20);
    strip_rs::solver::set_parallel_threshold(previous);

    assert_eq!(sequential.profile, parallel.unwrap().profile);
}
