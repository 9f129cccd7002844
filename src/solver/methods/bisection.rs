//! Minimal stage count by bisection
//!
//! The outlet concentration of a converged column decreases with the number
//! of stages, so the smallest N meeting a target is found by bisection on
//! the integer interval `[lower, upper]`:
//!
//! ```text
//! feasible(N)  ⇔  sweep(N) converged  ∧  outlet(N) ≤ target
//! ```
//!
//! A trial that runs out of sweeps counts as infeasible whatever its last
//! outlet. The upper bound is only tried once the lower bound has failed.
//! Each trial is an independent sweep, so under the `parallel` feature the
//! two bound trials run concurrently instead.

use serde::{Deserialize, Serialize};

use crate::error::{StrippingError, StrippingResult};
use crate::solver::methods::sweep::CounterCurrentSolver;
use crate::solver::scenario::Scenario;
use crate::solver::traits::{Solver, SolverConfiguration, SweepOutcome};

/// Default bisection step budget
pub const DEFAULT_MAX_STEPS: usize = 32;

/// One trial of the search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub stages: usize,
    pub outlet_mg_l: f64,
    pub converged: bool,
    pub iterations: usize,
    pub feasible: bool,
}

/// Result of a stage-count search
#[derive(Debug, Clone)]
pub struct StageSearchOutcome {
    /// Smallest feasible stage count found
    pub stages: usize,

    /// Converged sweep at `stages`
    pub outcome: SweepOutcome,

    /// Every trial, in evaluation order
    pub trials: Vec<TrialRecord>,

    /// Bisection steps after the two bracket trials
    pub bisection_steps: usize,
}

/// Bisection on the stage count
///
/// # Example
///
/// ```rust
/// use strip_rs::models::{Application, HenrySpeciationOracle};
/// use strip_rs::solver::{ColumnBoundaries, Scenario, SolverConfiguration, StageCountSearch};
///
/// let scenario = Scenario::new(
///     Box::new(HenrySpeciationOracle::default()),
///     Application::Voc,
///     ColumnBoundaries::new(10.0, 7.0).with_provisional_outlet(0.005),
/// );
///
/// let found = StageCountSearch::new()
///     .find_minimal_stages(&scenario, &SolverConfiguration::default(), 0.005, 1, 40)
///     .unwrap();
///
/// assert!(found.outcome.outlet_mg_l() <= 0.005);
/// assert!(found.stages > 1);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct StageCountSearch {
    solver: CounterCurrentSolver,
    max_steps: usize,
}

impl Default for StageCountSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl StageCountSearch {
    pub fn new() -> Self {
        Self {
            solver: CounterCurrentSolver::new(),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Override the bisection step budget
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    fn trial(
        &self,
        scenario: &Scenario,
        config: &SolverConfiguration,
        stages: usize,
        target_mg_l: f64,
    ) -> StrippingResult<(SweepOutcome, TrialRecord)> {
        let outcome = self.solver.solve(scenario, config, stages)?;
        let record = TrialRecord {
            stages,
            outlet_mg_l: outcome.outlet_mg_l(),
            converged: outcome.converged(),
            iterations: outcome.iterations(),
            feasible: outcome.converged() && outcome.outlet_mg_l() <= target_mg_l,
        };
        log::debug!(
            "trial N = {}: outlet {:.4e} mg/L, {} after {} sweeps",
            stages,
            record.outlet_mg_l,
            outcome.tracker.status,
            record.iterations
        );
        Ok((outcome, record))
    }

    /// Smallest N in `[lower, upper]` whose converged outlet meets `target_mg_l`
    ///
    /// Returns at once when `lower` is already feasible, and fails with
    /// [`StrippingError::BisectionBoundsExhausted`] when `upper` is not.
    pub fn find_minimal_stages(
        &self,
        scenario: &Scenario,
        config: &SolverConfiguration,
        target_mg_l: f64,
        lower: usize,
        upper: usize,
    ) -> StrippingResult<StageSearchOutcome> {
        // ====== Step 1: Validation ======

        if lower == 0 || lower > upper {
            return Err(StrippingError::InvalidConfiguration(format!(
                "stage bounds must satisfy 1 <= lower <= upper, got [{lower}, {upper}]"
            )));
        }
        if !(target_mg_l.is_finite() && target_mg_l > 0.0) {
            return Err(StrippingError::InvalidConfiguration(format!(
                "target outlet must be positive, got {target_mg_l}"
            )));
        }

        // ====== Step 2: Bracket ======

        let (low_record, (high_outcome, high_record)) =
            match self.bracket(scenario, config, target_mg_l, lower, upper)? {
                Bracket::Lower(outcome, record) => {
                    log::info!("lower bound N = {lower} already meets {target_mg_l} mg/L");
                    return Ok(StageSearchOutcome {
                        stages: lower,
                        outcome,
                        trials: vec![record],
                        bisection_steps: 0,
                    });
                }
                // lower == upper and infeasible
                Bracket::Span(low_record, None) => {
                    return Err(bounds_exhausted(target_mg_l, lower, upper, &[low_record]));
                }
                Bracket::Span(low_record, Some(high)) => (low_record, high),
            };

        let mut trials = vec![low_record, high_record];
        if !high_record.feasible {
            return Err(bounds_exhausted(target_mg_l, lower, upper, &trials));
        }

        // ====== Step 3: Bisection ======

        let (mut lo, mut hi) = (lower, upper);
        let mut best = high_outcome;
        let mut steps = 0;

        while hi - lo > 1 && steps < self.max_steps {
            let mid = lo + (hi - lo) / 2;
            let (outcome, record) = self.trial(scenario, config, mid, target_mg_l)?;
            trials.push(record);
            steps += 1;

            if record.feasible {
                hi = mid;
                best = outcome;
            } else {
                lo = mid;
            }
            log::debug!("bisection step {steps}: bracket [{lo}, {hi}]");
        }

        if hi - lo > 1 {
            log::warn!(
                "stage search stopped after {steps} steps with bracket [{lo}, {hi}]; N = {hi} may not be minimal"
            );
        }
        log::info!(
            "minimal stage count {hi} (outlet {:.4e} mg/L, target {target_mg_l} mg/L, {} trials)",
            best.outlet_mg_l(),
            trials.len()
        );

        Ok(StageSearchOutcome {
            stages: hi,
            outcome: best,
            trials,
            bisection_steps: steps,
        })
    }

    /// Run the lower bound trial, then the upper one if still needed
    ///
    /// With `parallel` both run at once, but the lower bound is judged first:
    /// a feasible lower bound wins even when the upper trial failed.
    fn bracket(
        &self,
        scenario: &Scenario,
        config: &SolverConfiguration,
        target_mg_l: f64,
        lower: usize,
        upper: usize,
    ) -> StrippingResult<Bracket> {
        #[cfg(feature = "parallel")]
        {
            if lower < upper {
                let (low, high) = rayon::join(
                    || self.trial(scenario, config, lower, target_mg_l),
                    || self.trial(scenario, config, upper, target_mg_l),
                );
                let (low_outcome, low_record) = low?;
                if low_record.feasible {
                    return Ok(Bracket::Lower(low_outcome, low_record));
                }
                return Ok(Bracket::Span(low_record, Some(high?)));
            }
        }

        let (low_outcome, low_record) = self.trial(scenario, config, lower, target_mg_l)?;
        if low_record.feasible {
            return Ok(Bracket::Lower(low_outcome, low_record));
        }
        if lower == upper {
            return Ok(Bracket::Span(low_record, None));
        }
        Ok(Bracket::Span(low_record, Some(self.trial(scenario, config, upper, target_mg_l)?)))
    }
}

/// Result of the bound trials
enum Bracket {
    /// The lower bound already meets the target
    Lower(SweepOutcome, TrialRecord),

    /// Infeasible lower bound, with the upper trial unless both bounds coincide
    Span(TrialRecord, Option<(SweepOutcome, TrialRecord)>),
}

fn bounds_exhausted(target_mg_l: f64, lower: usize, upper: usize, trials: &[TrialRecord]) -> StrippingError {
    let best_outlet_mg_l = trials
        .iter()
        .map(|t| t.outlet_mg_l)
        .fold(f64::INFINITY, f64::min);
    log::warn!(
        "no stage count in [{lower}, {upper}] reaches {target_mg_l} mg/L (best outlet {best_outlet_mg_l:.4e} mg/L)"
    );
    StrippingError::BisectionBoundsExhausted {
        target_mg_l,
        lower,
        upper,
        best_outlet_mg_l,
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Application, HenrySpeciationOracle};
    use crate::solver::ColumnBoundaries;

    fn voc_scenario(target: f64) -> Scenario {
        Scenario::new(
            Box::new(HenrySpeciationOracle::default()),
            Application::Voc,
            ColumnBoundaries::new(10.0, 7.0).with_provisional_outlet(target),
        )
        .with_air_water_ratio(25.0)
    }

    #[test]
    fn test_invalid_bounds() {
        let search = StageCountSearch::new();
        let config = SolverConfiguration::default();
        let scenario = voc_scenario(0.005);
        assert!(search.find_minimal_stages(&scenario, &config, 0.005, 0, 10).is_err());
        assert!(search.find_minimal_stages(&scenario, &config, 0.005, 10, 5).is_err());
        assert!(search.find_minimal_stages(&scenario, &config, 0.0, 1, 5).is_err());
    }

    #[test]
    fn test_feasible_lower_bound_returns_immediately() {
        let found = StageCountSearch::new()
            .find_minimal_stages(&voc_scenario(5.0), &SolverConfiguration::default(), 5.0, 2, 30)
            .unwrap();
        assert_eq!(found.stages, 2);
        assert_eq!(found.trials.len(), 1);
        assert_eq!(found.bisection_steps, 0);
    }

    #[test]
    fn test_found_count_is_minimal() {
        let scenario = voc_scenario(1e-4);
        let config = SolverConfiguration::default();
        let found = StageCountSearch::new()
            .find_minimal_stages(&scenario, &config, 1e-4, 1, 30)
            .unwrap();

        assert!(found.outcome.converged());
        assert!(found.outcome.outlet_mg_l() <= 1e-4);

        let below = CounterCurrentSolver::new()
            .solve(&scenario, &config, found.stages - 1)
            .unwrap();
        assert!(below.outlet_mg_l() > 1e-4);
    }

    #[test]
    fn test_infeasible_upper_bound() {
        let err = StageCountSearch::new()
            .find_minimal_stages(&voc_scenario(1e-30), &SolverConfiguration::default(), 1e-30, 1, 3)
            .unwrap_err();
        match err {
            StrippingError::BisectionBoundsExhausted { lower, upper, best_outlet_mg_l, .. } => {
                assert_eq!((lower, upper), (1, 3));
                assert!(best_outlet_mg_l > 1e-30);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_step_budget_is_honoured() {
        let found = StageCountSearch::new()
            .with_max_steps(1)
            .find_minimal_stages(&voc_scenario(1e-4), &SolverConfiguration::default(), 1e-4, 1, 30)
            .unwrap();
        assert_eq!(found.bisection_steps, 1);
        assert_eq!(found.trials.len(), 3);
        assert!(found.outcome.outlet_mg_l() <= 1e-4);
    }
}
