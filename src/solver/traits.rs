//! Solver traits and types
//!
//! # Design Philosophy
//!
//! - `SolverConfiguration` carries HOW to iterate (tolerance, budget,
//!   relaxation, starting profile, efficiency policy)
//! - `ConvergenceTracker` records how the iteration went
//! - `SweepOutcome` always carries the last profile: running out of budget is
//!   reported through its status, never by discarding the result
//! - `Solver` is the stable entry point implemented by column methods

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{StrippingError, StrippingResult};
use crate::solver::efficiency::EfficiencyPolicy;
use crate::solver::profile::Profile;
use crate::solver::scenario::Scenario;

/// Default relative-change tolerance
pub const DEFAULT_TOLERANCE: f64 = 1e-3;

/// Default sweep budget
pub const DEFAULT_MAX_ITERATIONS: usize = 200;

// =================================================================================================
// Initial Guess
// =================================================================================================

/// Starting gas profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialGuess {
    /// Gas free of contaminant on every stage
    #[default]
    CleanAir,

    /// Gas at equilibrium with the starting liquid of its stage
    ///
    /// y = H·α₀·C·R·T (C in mol/L), capped at 0.5.
    Equilibrium,
}

// =================================================================================================
// Solver configuration
// =================================================================================================

/// Numerical settings of a sweep
///
/// # Examples
///
/// ```rust
/// use strip_rs::solver::{EfficiencyPolicy, InitialGuess, SolverConfiguration};
///
/// let config = SolverConfiguration::iterative(1e-4, 300)
///     .with_relaxation(0.8)
///     .with_initial_guess(InitialGuess::Equilibrium)
///     .with_efficiency(EfficiencyPolicy::uniform(0.75));
/// assert!(config.validate().is_ok());
///
/// // Missing fields take their defaults
/// let config: SolverConfiguration = serde_json::from_str(r#"{"tolerance": 1e-5}"#).unwrap();
/// assert_eq!(config.max_iterations, 200);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfiguration {
    /// Relative-change threshold below which the sweep stops
    pub tolerance: f64,

    /// Maximum number of sweeps
    pub max_iterations: usize,

    /// Under-relaxation ω of sweep updates, in ]0, 1]
    ///
    /// Changes the path to the fixed point, not the fixed point itself.
    pub relaxation: f64,

    /// Starting gas profile
    pub initial_guess: InitialGuess,

    /// Murphree efficiency per stage
    pub efficiency: EfficiencyPolicy,
}

impl Default for SolverConfiguration {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            relaxation: 1.0,
            initial_guess: InitialGuess::CleanAir,
            efficiency: EfficiencyPolicy::adaptive(),
        }
    }
}

impl SolverConfiguration {
    /// Create an iterative configuration with default policy and relaxation
    pub fn iterative(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            tolerance,
            max_iterations,
            ..Self::default()
        }
    }

    pub fn with_relaxation(mut self, relaxation: f64) -> Self {
        self.relaxation = relaxation;
        self
    }

    pub fn with_initial_guess(mut self, initial_guess: InitialGuess) -> Self {
        self.initial_guess = initial_guess;
        self
    }

    pub fn with_efficiency(mut self, efficiency: EfficiencyPolicy) -> Self {
        self.efficiency = efficiency;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> StrippingResult<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(StrippingError::InvalidConfiguration(format!(
                "Tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(StrippingError::InvalidConfiguration(
                "Maximum iterations must be positive".to_string(),
            ));
        }
        if !(self.relaxation > 0.0 && self.relaxation <= 1.0) {
            return Err(StrippingError::InvalidConfiguration(format!(
                "Relaxation must be in ]0, 1], got {}",
                self.relaxation
            )));
        }
        self.efficiency.validate().map_err(StrippingError::InvalidConfiguration)
    }
}

// =================================================================================================
// Convergence tracking
// =================================================================================================

/// Where a sweep stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepStatus {
    Initialized,
    Sweeping,
    Converged,
    NotConverged,
}

impl fmt::Display for SweepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SweepStatus::Initialized => "initialized",
            SweepStatus::Sweeping => "sweeping",
            SweepStatus::Converged => "converged",
            SweepStatus::NotConverged => "not converged",
        };
        f.write_str(label)
    }
}

/// Iteration counter and change history
///
/// ```rust
/// use strip_rs::solver::{ConvergenceTracker, SweepStatus};
///
/// let mut tracker = ConvergenceTracker::new(1e-3, 3);
/// tracker.record(0.5);
/// tracker.record(1e-4);
/// assert_eq!(tracker.status, SweepStatus::Converged);
/// assert_eq!(tracker.iteration, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceTracker {
    /// Sweeps performed
    pub iteration: usize,

    /// Change metric of the last sweep
    pub last_change: f64,

    /// Change metric of every sweep
    pub history: Vec<f64>,

    pub tolerance: f64,
    pub max_iterations: usize,
    pub status: SweepStatus,
}

impl ConvergenceTracker {
    pub fn new(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            iteration: 0,
            last_change: f64::INFINITY,
            history: Vec::with_capacity(max_iterations),
            tolerance,
            max_iterations,
            status: SweepStatus::Initialized,
        }
    }

    /// Record one sweep and update the status
    ///
    /// Returns `true` while another sweep is allowed.
    pub fn record(&mut self, change: f64) -> bool {
        self.iteration += 1;
        self.last_change = change;
        self.history.push(change);
        self.status = if change < self.tolerance {
            SweepStatus::Converged
        } else if self.iteration >= self.max_iterations {
            SweepStatus::NotConverged
        } else {
            SweepStatus::Sweeping
        };
        self.status == SweepStatus::Sweeping
    }

    pub fn is_converged(&self) -> bool {
        self.status == SweepStatus::Converged
    }
}

// =================================================================================================
// Sweep outcome
// =================================================================================================

/// Result of one sweep run
#[derive(Debug, Clone)]
pub struct SweepOutcome {
    /// Last profile (converged or not)
    pub profile: Profile,

    /// Iteration diagnostics
    pub tracker: ConvergenceTracker,

    /// Whether any stage ran below the declared efficiency in the final sweep
    pub efficiency_adapted: bool,
}

impl SweepOutcome {
    pub fn converged(&self) -> bool {
        self.tracker.is_converged()
    }

    pub fn iterations(&self) -> usize {
        self.tracker.iteration
    }

    pub fn outlet_mg_l(&self) -> f64 {
        self.profile.outlet_mg_l()
    }

    /// Turn a non-converged outcome into an error
    pub fn require_converged(self) -> StrippingResult<Self> {
        if self.converged() {
            Ok(self)
        } else {
            Err(StrippingError::ConvergenceFailure {
                iterations: self.tracker.iteration,
                last_change: self.tracker.last_change,
                tolerance: self.tracker.tolerance,
            })
        }
    }
}

// =================================================================================================
// Solver trait
// =================================================================================================

/// Column solver
///
/// Implementors resolve the stage profile of `scenario` with `stages`
/// theoretical stages.
pub trait Solver {
    fn solve(
        &self,
        scenario: &Scenario,
        config: &SolverConfiguration,
        stages: usize,
    ) -> StrippingResult<SweepOutcome>;

    fn name(&self) -> &str;
}

// =================================================================================================
// Tests
// =================================================================================================
