//! strip-rs: Staged simulation of packed-tower air strippers
//!
//! Resolves a counter-current stripping column as a cascade of equilibrium
//! stages: water flows down from the top, clean air enters at the bottom, and
//! every stage hands its liquid to the stage below and its gas to the stage
//! above. Chemistry (Henry partitioning, weak-acid speciation, pH) is
//! delegated to an equilibrium oracle behind a trait, so the column numerics
//! never depend on one chemistry engine.
//!
//! # Architecture
//!
//! 1. **Separation of Chemistry and Numerics**
//!    - The oracle answers "what is at equilibrium" for one stage
//!    - The solver decides which stage to ask and when the column has settled
//!
//! 2. **Design on top of simulation**
//!    - `solver` resolves the profile of a column with N stages
//!    - `design` searches N, checks the mass balance and converts stages to
//!      packed height
//!
//! # Quick Start
//!
//! ```rust
//! use strip_rs::prelude::*;
//!
//! # fn main() -> StrippingResult<()> {
//! // 1. Describe the case
//! let mut request = SimulationRequest::new(Application::Voc, 50.0, 1.0, 0.005);
//! request.min_stages = 1;
//! request.max_stages = 30;
//!
//! // 2. Heuristic sizing to refine
//! let preliminary = PreliminaryDesign::new(1.2, 4.0).with_htu(0.6);
//!
//! // 3. Staged simulation
//! let design = simulate_column(&request, &preliminary)?;
//!
//! // 4. Results
//! println!("{} stages, {:.2} m packed", design.theoretical_stages, design.tower_height_m);
//! assert!(design.outlet_mg_l <= 0.005);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`chemistry`]: Oracle contract, physical data, background water
//! - [`models`]: Contaminants, the built-in oracle, single-stage evaluation
//! - [`solver`]: Column profile and its solvers
//! - [`design`]: Requests, stage-count search, packed height, warnings
//! - [`output`]: Profile plots (feature `plotting`)
//! - [`error`]: Error types
//!
//! # Features
//!
//! - `plotting` (default): PNG/SVG profiles through `plotters`
//! - `parallel`: rayon across the stages of a sweep and the bracket trials of
//!   a stage-count search

pub mod error;

pub mod chemistry;
pub mod design;
pub mod models;
pub mod solver;

#[cfg(feature = "plotting")]
pub mod output;

pub mod prelude {
    //! Convenient imports for common usage
    //!
    //! ```rust
    //! use strip_rs::prelude::*;
    //! ```
    pub use crate::chemistry::{EquilibriumOracle, WaterChemistry, WaterTemplate};
    pub use crate::design::{
        ColumnDesign,
        DesignWarning,
        PreliminaryDesign,
        SimulationRequest,
        simulate_column,
        simulate_column_with,
    };
    pub use crate::error::{StrippingError, StrippingResult};
    pub use crate::models::{Application, ContaminantProperties, HenrySpeciationOracle};
    pub use crate::solver::{
        ColumnBoundaries,
        CounterCurrentSolver,
        EfficiencyPolicy,
        Scenario,
        Solver,
        SolverConfiguration,
        StageCountSearch,
        validate_mass_balance,
    };
}
