//! Numerical methods for counter-current columns
//!
//! This module contains the concrete column methods.
//!
//! # Available Methods
//!
//! - **[`CounterCurrentSolver`]**: implements [`Solver`](crate::solver::Solver).
//!   Fixed-point sweep resolving the liquid and gas profiles of a column
//!   with a given number of stages.
//!   - Cost: one or two oracle calls per stage per sweep
//!   - Bounded by the sweep budget; returns its last profile either way
//!
//! - **[`StageCountSearch`]**: bisection on the stage count, one sweep per
//!   trial, to find the smallest column meeting an outlet target.
//!   - Cost: two bracket trials plus ⌈log₂(upper − lower)⌉ trials
//!   - Bounded by its step budget
//!
//! # Performance Considerations
//!
//! Both methods benefit from:
//! - **Rayon parallelization** (feature `parallel`): stages of one sweep, and
//!   the two bracket trials of a search, are evaluated concurrently
//! - **Configurable threshold** via `set_parallel_threshold()`
//!
//! Parallel and sequential runs give identical profiles.

mod bisection;
mod sweep;

// Re-exports for convenience
pub use bisection::{StageCountSearch, StageSearchOutcome, TrialRecord};
pub use sweep::CounterCurrentSolver;
