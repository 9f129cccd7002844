//! Error types
//!
//! Two layers of failure are distinguished:
//!
//! - [`OracleError`]: raised by an [`EquilibriumOracle`](crate::chemistry::EquilibriumOracle)
//!   when it is handed input it cannot equilibrate (duplicate components,
//!   unsupported unit basis, non-physical amounts).
//! - [`StrippingError`]: raised by the column solver. Carries enough context
//!   (stage index, iteration, last inflow values) for a caller to decide
//!   whether to retry with a lower efficiency, relax the tolerance or give up.
//!
//! Convergence failure is *not* an error of the sweep itself: the sweep always
//! returns its last profile. [`StrippingError::ConvergenceFailure`] is produced
//! only when a caller explicitly requires a converged outcome.

use crate::chemistry::UnitBasis;

/// Failures reported by an equilibrium oracle
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OracleError {
    /// A component was declared twice in the same solution
    #[error("component `{0}` is already declared in this solution")]
    DuplicateComponent(String),

    /// The oracle has no definition for a component
    #[error("unknown component `{0}`")]
    UnknownComponent(String),

    /// The composition is expressed in a basis the oracle does not accept
    #[error("unsupported unit basis {found}, oracle works in {expected}")]
    UnsupportedBasis {
        expected: UnitBasis,
        found: UnitBasis,
    },

    /// Negative, non-finite or otherwise non-physical input
    #[error("non-physical input: {0}")]
    NonPhysicalInput(String),

    /// The internal equilibrium search failed
    #[error("equilibrium search did not converge: {0}")]
    NoConvergence(String),
}

/// Failures reported by the column solver
#[derive(Debug, thiserror::Error)]
pub enum StrippingError {
    /// Iteration budget exhausted before the change metric dropped below tolerance
    #[error(
        "sweep did not converge after {iterations} iterations \
         (last change {last_change:.3e}, tolerance {tolerance:.1e})"
    )]
    ConvergenceFailure {
        iterations: usize,
        last_change: f64,
        tolerance: f64,
    },

    /// A stage produced (or was fed) a non-physical state
    #[error(
        "numerical instability at stage {stage}, iteration {iteration}: {reason} \
         (liquid in {liquid_in_mg_l:.6e} mg/L, gas in y = {gas_in_mole_fraction:.6e})"
    )]
    NumericalInstability {
        stage: usize,
        iteration: usize,
        liquid_in_mg_l: f64,
        gas_in_mole_fraction: f64,
        reason: String,
    },

    /// Totals and species came back in a different basis than requested
    #[error("oracle unit mismatch: requested {expected}, totals in {totals}, species in {species}")]
    OracleUnitMismatch {
        expected: UnitBasis,
        totals: UnitBasis,
        species: UnitBasis,
    },

    /// No stage count within the search bounds reaches the target outlet
    #[error(
        "no stage count in [{lower}, {upper}] reaches {target_mg_l} mg/L \
         (best outlet {best_outlet_mg_l:.4e} mg/L)"
    )]
    BisectionBoundsExhausted {
        target_mg_l: f64,
        lower: usize,
        upper: usize,
        best_outlet_mg_l: f64,
    },

    /// Scenario, configuration or request parameters are invalid
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Oracle failure outside a stage evaluation (e.g. feed calibration)
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// Simulation request could not be parsed
    #[error("failed to parse simulation request: {0}")]
    Request(#[from] serde_json::Error),

    /// Simulation request could not be read
    #[error("failed to read simulation request: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for column-solver operations
pub type StrippingResult<T> = Result<T, StrippingError>;
