//! Column solvers
//!
//! This module resolves the liquid and gas profiles of a counter-current
//! stripping column and decides how many stages a design needs.
//!
//! # Core Concepts
//!
//! ## The Architecture (WHAT vs HOW)
//!
//! 1. **Scenario** (`Scenario`) - WHAT to solve
//!    - Chemistry engine (oracle) and contaminant
//!    - Background water, flows, temperature
//!    - Boundaries (feed at the top, clean gas at the bottom)
//!
//! 2. **Configuration** (`SolverConfiguration`) - HOW to solve
//!    - Tolerance and sweep budget
//!    - Relaxation and starting profile
//!    - Stage efficiency policy
//!
//! 3. **Solver** (`Solver` trait) - The numerical method
//!    - `CounterCurrentSolver`: fixed-point sweep for a given stage count
//!    - `StageCountSearch`: bisection on the stage count, built on the sweep
//!
//! # Module Organization
//!
//! - **`profile`**: `Profile` (N+1 entries, bottom to top) and `StageState`
//! - **`boundary`**: `ColumnBoundaries`
//! - **`scenario`**: `Scenario`, feed calibration
//! - **`traits`**: `Solver`, `SolverConfiguration`, `ConvergenceTracker`, `SweepOutcome`
//! - **`efficiency`**: `EfficiencyPolicy`
//! - **`mass_balance`**: `validate_mass_balance`
//! - **`methods`**: `CounterCurrentSolver`, `StageCountSearch`
//!
//! # Quick Start Example
//!
//! ```rust
//! use strip_rs::models::{Application, HenrySpeciationOracle};
//! use strip_rs::solver::{
//!     validate_mass_balance, ColumnBoundaries, CounterCurrentSolver, Scenario, Solver,
//!     SolverConfiguration,
//! };
//!
//! // 1. Scenario (WHAT to solve)
//! let scenario = Scenario::new(
//!     Box::new(HenrySpeciationOracle::default()),
//!     Application::Voc,
//!     ColumnBoundaries::new(10.0, 7.0).with_provisional_outlet(0.005),
//! );
//!
//! // 2. Configuration (HOW to solve)
//! let config = SolverConfiguration::iterative(1e-3, 200);
//!
//! // 3. Solve with 12 stages
//! let outcome = CounterCurrentSolver::new().solve(&scenario, &config, 12).unwrap();
//!
//! // 4. Trust the profile only once the mass balance closes
//! let report = validate_mass_balance(&outcome.profile, &scenario);
//! assert!(outcome.converged());
//! assert!(report.passed);
//! ```
//!
//! # Workflow Diagram
//!
//! ```text
//! ┌─────────────────┐   ┌─────────────────┐
//! │ Equilibrium     │   │ Column          │
//! │ Oracle          │   │ Boundaries      │
//! └────────┬────────┘   └────────┬────────┘
//!          └───────────┬─────────┘
//!             ┌────────▼────────┐
//!             │ Scenario        │ ← WHAT to solve
//!             └────────┬────────┘
//!             ┌────────▼─────────────┐
//!             │ Solver Configuration │ ← HOW to solve
//!             └────────┬─────────────┘
//!             ┌────────▼─────────┐
//!             │ Counter-current  │ ← one N
//!             │ sweep            │◀─── Stage-count search (many N)
//!             └────────┬─────────┘
//!             ┌────────▼─────────┐
//!             │ Profile +        │
//!             │ mass balance     │
//!             └──────────────────┘
//! ```
//!
//! # Error Handling
//!
//! Solver methods return [`StrippingResult`](crate::error::StrippingResult).
//! Running out of sweeps is not an error: the outcome carries its status and
//! the last profile. A non-physical stage aborts the sweep with the stage
//! index, iteration and inflows that produced it.

// =================================================================================================
// Module Declarations
// =================================================================================================

mod boundary;
pub mod efficiency;
pub mod mass_balance;
mod methods;
pub mod profile;
mod scenario;
mod traits;

// =================================================================================================
// Parallel Execution Threshold
// =================================================================================================
//
// The threshold is stored in an AtomicUsize so that it can be changed at
// runtime (useful in benchmarks and tests) without a mutex on every sweep.
// Relaxed ordering is sufficient: the value is a performance hint, not a
// synchronisation point.
// =================================================================================================

use std::sync::atomic::{AtomicUsize, Ordering};

/// Default stage count from which a sweep evaluates its stages in parallel.
///
/// Each stage costs one or two oracle calls, so the crossover is far lower
/// than for plain arithmetic.
const DEFAULT_PARALLEL_THRESHOLD: usize = 16;

/// Runtime-configurable parallel-execution threshold.
///
/// Read via [`parallel_threshold()`], written via [`set_parallel_threshold()`].
static PARALLEL_THRESHOLD: AtomicUsize = AtomicUsize::new(DEFAULT_PARALLEL_THRESHOLD);

/// Return the current parallel-execution threshold.
///
/// A sweep over N stages runs sequentially when N is below this value, and
/// with Rayon otherwise, but only when the crate is compiled with the
/// `parallel` feature.
///
/// # Example
///
/// ```rust
/// use strip_rs::solver::parallel_threshold;
///
/// assert!(parallel_threshold() > 0);
/// ```
pub fn parallel_threshold() -> usize {
    PARALLEL_THRESHOLD.load(Ordering::Relaxed)
}

/// Set the parallel-execution threshold to a new value.
///
/// # Panics
///
/// Panics when `threshold == 0`.
///
/// # Example
///
/// ```rust
/// use strip_rs::solver::{parallel_threshold, set_parallel_threshold};
///
/// let previous = parallel_threshold();
/// set_parallel_threshold(64);
/// assert_eq!(parallel_threshold(), 64);
///
/// // Restore so other tests are not affected.
/// set_parallel_threshold(previous);
/// ```
pub fn set_parallel_threshold(threshold: usize) {
    assert!(threshold > 0, "parallel threshold must be at least 1");
    PARALLEL_THRESHOLD.store(threshold, Ordering::Relaxed);
}

/// RAII guard that saves the current threshold on construction and restores
/// it on drop.
///
/// Only compiled in test builds.
///
/// ```rust,ignore
/// let _guard = crate::solver::ThresholdGuard::save(4);
/// // threshold is now 4 …
/// // … and is automatically restored when _guard is dropped.
/// ```
#[cfg(test)]
pub(crate) struct ThresholdGuard {
    previous: usize,
}

#[cfg(test)]
impl ThresholdGuard {
    /// Set the threshold to `new_value` and return a guard that will
    /// restore the previous value on drop.
    pub(crate) fn save(new_value: usize) -> Self {
        let previous = parallel_threshold();
        set_parallel_threshold(new_value);
        Self { previous }
    }
}

#[cfg(test)]
impl Drop for ThresholdGuard {
    fn drop(&mut self) {
        // Bypass the public setter so that restoring never panics.
        PARALLEL_THRESHOLD.store(self.previous, Ordering::Relaxed);
    }
}

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use traits::{
    ConvergenceTracker,
    DEFAULT_MAX_ITERATIONS,
    DEFAULT_TOLERANCE,
    InitialGuess,
    Solver,
    SolverConfiguration,
    SweepOutcome,
    SweepStatus,
};

pub use boundary::{CLEAN_GAS_INLET, ColumnBoundaries};
pub use efficiency::{EfficiencyPolicy, EfficiencyRule, PhRegime};
pub use mass_balance::{MassBalanceReport, validate_mass_balance};
pub use profile::{Profile, ProfileQuantity, StageState};
pub use scenario::{FeedCalibration, Scenario};

pub use methods::{CounterCurrentSolver, StageCountSearch, StageSearchOutcome, TrialRecord};

// =================================================================================================
// Helper Functions
// =================================================================================================

use crate::error::{StrippingError, StrippingResult};

/// Validate a profile for numerical issues
///
/// Every entry must be finite and non-negative, with α₀ in [0, 1]. The first
/// offending entry is reported with the inflows it received.
///
/// # Example
///
/// ```rust,ignore
/// validate_profile(&profile, 42)?;  // Validates the profile after sweep 42
/// ```
pub(crate) fn validate_profile(profile: &Profile, iteration: usize) -> StrippingResult<()> {
    let Some(index) = profile.first_non_physical() else {
        return Ok(());
    };
    // The boundary entry mirrors stage 1
    let stage = index.max(1);
    let state = profile.stage(index);
    Err(StrippingError::NumericalInstability {
        stage,
        iteration,
        liquid_in_mg_l: profile.liquid_inflow(stage),
        gas_in_mole_fraction: profile.gas_inflow(stage),
        reason: format!(
            "non-physical stage exit (liquid {:e} mg/L, y {:e}, pH {}, alpha0 {})",
            state.liquid_mg_l, state.gas_mole_fraction, state.ph, state.alpha0
        ),
    })
}

// =================================================================================================
// Tests
// =================================================================================================
