//! Counter-current stage sweep
//!
//! # Mathematical Background
//!
//! With liquid flowing down and gas flowing up, stage *i* exchanges with the
//! liquid leaving stage *i+1* and the gas leaving stage *i−1*:
//!
//! ```text
//!            liquid ↓        ↑ gas
//!   feed ──▶ [ stage N ] ──▶ off-gas
//!              ...
//!            [ stage i ]   L_in = L[i+1]  (feed when i = N)
//!              ...         G_in = G[i−1]  (clean air when i = 1)
//!            [ stage 1 ]
//!   outlet ◀─ boundary 0 ◀── clean air
//! ```
//!
//! Both boundary values are known, but at opposite ends, so the profile is
//! the fixed point of the map "evaluate every stage from the current
//! profile". The sweep applies that map (Jacobi style) until the largest
//! per-entry relative residual of liquid and gas drops below tolerance:
//!
//! ```text
//! P_{k+1} = P_k + ω · (F(P_k) − P_k)
//! Δ_k     = max_i |F(P_k)_i − P_k,i| / (|P_k,i| + ε)
//! ```
//!
//! The residual is the full step `F(P) − P`, recovered from the relaxed step
//! by dividing by ω, so the relaxation factor decides how fast the column
//! settles but not where the sweep stops.
//!
//! Because no stage reads a value produced in the same sweep, stages can be
//! evaluated concurrently and the result does not depend on the order.
//!
//! # Boundary handling
//!
//! - The feed is stored apart from the stage vectors and only ever read.
//! - The top stage is evaluated like every other stage; its liquid is never
//!   pinned to a target value.
//! - The bottom boundary entry receives the liquid leaving stage 1 after each
//!   sweep, and its gas stays zero.

use crate::chemistry::data::{R_GAS_L_ATM, mg_per_l_to_mol_per_kgw};
use crate::error::{StrippingError, StrippingResult};
use crate::solver::profile::{Profile, StageState};
use crate::solver::scenario::Scenario;
use crate::solver::traits::{
    ConvergenceTracker,
    InitialGuess,
    Solver,
    SolverConfiguration,
    SweepOutcome,
};

/// Mole-fraction cap of the equilibrium starting profile
const MAX_INITIAL_GAS_FRACTION: f64 = 0.5;

// =================================================================================================
// Counter-current solver
// =================================================================================================

/// Fixed-point solver for an N-stage counter-current column
///
/// # Example
///
/// ```rust
/// use strip_rs::models::{Application, HenrySpeciationOracle};
/// use strip_rs::solver::{ColumnBoundaries, CounterCurrentSolver, Scenario, Solver, SolverConfiguration};
///
/// let scenario = Scenario::new(
///     Box::new(HenrySpeciationOracle::default()),
///     Application::Voc,
///     ColumnBoundaries::new(10.0, 7.0).with_provisional_outlet(0.005),
/// )
/// .with_air_water_ratio(25.0);
///
/// let outcome = CounterCurrentSolver::new()
///     .solve(&scenario, &SolverConfiguration::default(), 10)
///     .unwrap();
///
/// assert!(outcome.converged());
/// assert!(outcome.outlet_mg_l() < 0.005);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterCurrentSolver;

impl CounterCurrentSolver {
    pub fn new() -> Self {
        Self
    }

    /// Starting profile for a column of `stages` stages
    fn initial_profile(
        scenario: &Scenario,
        config: &SolverConfiguration,
        stages: usize,
        feed_ph: f64,
        feed_alpha0: f64,
    ) -> Profile {
        let boundaries = &scenario.boundaries;
        let mut profile = Profile::linear(
            stages,
            boundaries.feed_mg_l,
            boundaries.provisional_outlet_mg_l,
            feed_ph,
            feed_alpha0,
            scenario.temperature_k,
        );

        if config.initial_guess == InitialGuess::Equilibrium {
            let henry = scenario.contaminant.henry_at(scenario.temperature_k);
            let molar_mass = scenario.contaminant.molar_mass;
            for stage in 1..=stages {
                let mut state = profile.stage(stage);
                let c = mg_per_l_to_mol_per_kgw(state.liquid_mg_l, molar_mass);
                state.gas_mole_fraction = (henry * state.alpha0 * c * R_GAS_L_ATM * scenario.temperature_k)
                    .min(MAX_INITIAL_GAS_FRACTION);
                profile.set_stage(stage, &state);
            }
        }

        profile
    }
}

impl Solver for CounterCurrentSolver {
    fn solve(
        &self,
        scenario: &Scenario,
        config: &SolverConfiguration,
        stages: usize,
    ) -> StrippingResult<SweepOutcome> {
        // ====== Step 1: Validation ======

        config.validate()?;
        scenario.validate()?;
        if stages == 0 {
            return Err(StrippingError::InvalidConfiguration(
                "A column needs at least 1 stage".to_string(),
            ));
        }

        // ====== Step 2: Setup ======

        let calibration = scenario.calibrate_feed()?;
        let evaluator = scenario.stage_evaluator();
        let background = &calibration.background;
        let contaminant = &scenario.contaminant;
        let application = scenario.application;
        let policy = &config.efficiency;
        let omega = config.relaxation;

        let mut profile = Self::initial_profile(
            scenario,
            config,
            stages,
            calibration.feed_ph,
            calibration.feed_alpha0,
        );
        let mut tracker = ConvergenceTracker::new(config.tolerance, config.max_iterations);
        let efficiency_adapted;

        log::debug!(
            "{}: {} stages, feed {} mg/L, tolerance {:.1e}, budget {}",
            self.name(),
            stages,
            scenario.feed_mg_l(),
            config.tolerance,
            config.max_iterations
        );

        // ====== Step 3: Fixed-point iteration ======

        loop {
            let iteration = tracker.iteration + 1;

            // Every stage reads the previous iterate only
            let evaluate_stage = |stage: usize| -> StrippingResult<(StageState, bool)> {
                let liquid_in = profile.liquid_inflow(stage);
                let gas_in = profile.gas_inflow(stage);
                let ph = profile.stage(stage).ph;
                let efficiency = policy.efficiency(application, ph);

                let state = evaluator
                    .evaluate(liquid_in, gas_in, efficiency, contaminant, background)
                    .map_err(|fault| fault.locate(stage, iteration, liquid_in, gas_in))?;
                Ok((state, policy.is_reduced(application, ph)))
            };

            let evaluated = evaluate_stages(stages, evaluate_stage)?;

            let mut next = profile.clone();
            let mut adapted = false;
            for (stage, (state, reduced)) in (1..=stages).zip(evaluated) {
                let previous = profile.stage(stage);
                next.set_stage(stage, &relax(&previous, &state, omega));
                adapted |= reduced;
            }
            next.close_bottom();
            crate::solver::validate_profile(&next, iteration)?;

            let change = next.relative_change(&profile) / omega;
            profile = next;

            log::debug!("sweep {iteration}: relative residual {change:.3e}");

            if !tracker.record(change) {
                efficiency_adapted = adapted;
                break;
            }
        }

        // ====== Step 4: Diagnostics ======

        if !tracker.is_converged() {
            log::warn!(
                "{}: no convergence after {} sweeps (last change {:.3e}, tolerance {:.1e}); returning last profile",
                self.name(),
                tracker.iteration,
                tracker.last_change,
                tracker.tolerance
            );
        }
        if efficiency_adapted {
            log::warn!(
                "{}: stage efficiency lowered below the declared {} for high-pH {} stages",
                self.name(),
                policy.declared(application),
                application
            );
        }
        log::debug!(
            "{}: {} after {} sweeps, outlet {:.4e} mg/L",
            self.name(),
            tracker.status,
            tracker.iteration,
            profile.outlet_mg_l()
        );

        Ok(SweepOutcome {
            profile,
            tracker,
            efficiency_adapted,
        })
    }

    fn name(&self) -> &str {
        "Counter-current sweep"
    }
}

/// Under-relaxed update of one stage
///
/// Liquid and gas are relaxed; pH and α₀ are taken from the evaluation.
fn relax(previous: &StageState, evaluated: &StageState, omega: f64) -> StageState {
    if omega == 1.0 {
        return *evaluated;
    }
    StageState {
        liquid_mg_l: previous.liquid_mg_l + omega * (evaluated.liquid_mg_l - previous.liquid_mg_l),
        gas_mole_fraction: previous.gas_mole_fraction
            + omega * (evaluated.gas_mole_fraction - previous.gas_mole_fraction),
        ..*evaluated
    }
}

/// Evaluate stages 1..=N bottom-up
///
/// Results come back in stage order; on failure the lowest failing stage is
/// reported, whichever path ran.
fn evaluate_stages<F>(stages: usize, evaluate_stage: F) -> StrippingResult<Vec<(StageState, bool)>>
where
    F: Fn(usize) -> StrippingResult<(StageState, bool)> + Sync + Send,
{
    if stages >= crate::solver::parallel_threshold() {
        // Above threshold, parallel when the feature is enabled
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            let results: Vec<StrippingResult<(StageState, bool)>> =
                (1..=stages).into_par_iter().map(&evaluate_stage).collect();
            return results.into_iter().collect();
        }
    }
    (1..=stages).map(evaluate_stage).collect()
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chemistry::WaterChemistry;
    use crate::models::{Application, HenrySpeciationOracle};
    use crate::solver::{ColumnBoundaries, EfficiencyPolicy, SweepStatus, ThresholdGuard};
    use approx::assert_relative_eq;

    fn voc_scenario() -> Scenario {
        Scenario::new(
            Box::new(HenrySpeciationOracle::default()),
            Application::Voc,
            ColumnBoundaries::new(10.0, 7.0).with_provisional_outlet(0.005),
        )
        .with_air_water_ratio(25.0)
    }

    fn co2_scenario() -> Scenario {
        Scenario::new(
            Box::new(HenrySpeciationOracle::default()),
            Application::Co2,
            ColumnBoundaries::new(100.0, 7.5).with_provisional_outlet(50.0),
        )
        .with_water(WaterChemistry::pure())
        .with_air_water_ratio(30.0)
    }

    #[test]
    fn test_zero_stages_rejected() {
        let err = CounterCurrentSolver::new()
            .solve(&voc_scenario(), &SolverConfiguration::default(), 0)
            .unwrap_err();
        assert!(matches!(err, StrippingError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_single_stage_matches_direct_evaluation() {
        let scenario = voc_scenario();
        let config = SolverConfiguration::default().with_efficiency(EfficiencyPolicy::uniform(0.85));
        let outcome = CounterCurrentSolver::new().solve(&scenario, &config, 1).unwrap();

        // One stage fed by the feed and clean air is solved in one evaluation
        let calibration = scenario.calibrate_feed().unwrap();
        let direct = scenario
            .stage_evaluator()
            .evaluate(10.0, 0.0, 0.85, &scenario.contaminant, &calibration.background)
            .unwrap();
        assert!(outcome.converged());
        assert_relative_eq!(outcome.outlet_mg_l(), direct.liquid_mg_l, max_relative = 1e-12);
        assert_relative_eq!(outcome.profile.gas_outlet(), direct.gas_mole_fraction, max_relative = 1e-12);
    }

    #[test]
    fn test_feed_and_clean_gas_survive_sweeps() {
        let scenario = voc_scenario();
        let outcome = CounterCurrentSolver::new()
            .solve(&scenario, &SolverConfiguration::default(), 8)
            .unwrap();
        assert!(outcome.profile.boundaries_intact(10.0));
        assert_eq!(outcome.profile.stage(0).gas_mole_fraction, 0.0);
        assert_relative_eq!(outcome.profile.outlet_mg_l(), outcome.profile.stage(1).liquid_mg_l);
    }

    #[test]
    fn test_budget_exhaustion_returns_last_profile() {
        let config = SolverConfiguration::iterative(1e-12, 3);
        let outcome = CounterCurrentSolver::new().solve(&voc_scenario(), &config, 10).unwrap();
        assert_eq!(outcome.tracker.status, SweepStatus::NotConverged);
        assert_eq!(outcome.iterations(), 3);
        assert_eq!(outcome.profile.stages(), 10);
        assert!(matches!(
            outcome.require_converged(),
            Err(StrippingError::ConvergenceFailure { iterations: 3, .. })
        ));
    }

    #[test]
    fn test_relaxation_keeps_fixed_point() {
        let scenario = voc_scenario();
        let base = SolverConfiguration::iterative(1e-9, 400).with_efficiency(EfficiencyPolicy::uniform(0.85));
        let plain = CounterCurrentSolver::new().solve(&scenario, &base, 6).unwrap();
        let relaxed = CounterCurrentSolver::new()
            .solve(&scenario, &base.clone().with_relaxation(0.6), 6)
            .unwrap();

        assert!(plain.converged() && relaxed.converged());
        assert!(relaxed.iterations() > plain.iterations());
        assert_relative_eq!(
            plain.profile.top_liquid_mg_l(),
            relaxed.profile.top_liquid_mg_l(),
            max_relative = 1e-6
        );
    }

    #[test]
    fn test_equilibrium_guess_reaches_same_profile() {
        let scenario = voc_scenario();
        let config = SolverConfiguration::iterative(1e-9, 400).with_efficiency(EfficiencyPolicy::uniform(0.85));
        let clean = CounterCurrentSolver::new().solve(&scenario, &config, 6).unwrap();
        let seeded = CounterCurrentSolver::new()
            .solve(&scenario, &config.with_initial_guess(InitialGuess::Equilibrium), 6)
            .unwrap();
        assert_relative_eq!(
            clean.profile.gas_outlet(),
            seeded.profile.gas_outlet(),
            max_relative = 1e-6
        );
    }

    #[test]
    fn test_adaptive_efficiency_is_flagged() {
        let outcome = CounterCurrentSolver::new()
            .solve(&co2_scenario(), &SolverConfiguration::default(), 15)
            .unwrap();
        assert!(outcome.efficiency_adapted);

        let voc = CounterCurrentSolver::new()
            .solve(&voc_scenario(), &SolverConfiguration::default(), 5)
            .unwrap();
        assert!(!voc.efficiency_adapted);
    }

    #[test]
    fn test_parallel_path_matches_sequential() {
        let scenario = voc_scenario();
        let config = SolverConfiguration::default();
        let sequential = CounterCurrentSolver::new().solve(&scenario, &config, 12).unwrap();
        let parallel = {
            let _guard = ThresholdGuard::save(1);
            CounterCurrentSolver::new().solve(&scenario, &config, 12).unwrap()
        };
        assert_eq!(sequential.profile, parallel.profile);
        assert_eq!(sequential.tracker.history, parallel.tracker.history);
    }

    #[test]
    fn test_relax() {
        let previous = StageState {
            liquid_mg_l: 4.0,
            gas_mole_fraction: 0.0,
            ph: 7.0,
            alpha0: 1.0,
            temperature_k: 298.15,
        };
        let evaluated = StageState { liquid_mg_l: 2.0, gas_mole_fraction: 1e-4, ph: 7.4, ..previous };
        let relaxed = relax(&previous, &evaluated, 0.5);
        assert_relative_eq!(relaxed.liquid_mg_l, 3.0);
        assert_relative_eq!(relaxed.gas_mole_fraction, 5e-5);
        assert_relative_eq!(relaxed.ph, 7.4);
    }
}
