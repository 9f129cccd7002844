//! Aqueous chemistry
//!
//! This module defines how the column solver talks to a chemical-equilibrium
//! engine, plus the small amount of chemistry the solver needs on its own.
//!
//! # Core Concepts
//!
//! - **Equilibrium Oracle**: external engine that equilibrates a solution,
//!   optionally against a gas phase. Consumed through the
//!   [`EquilibriumOracle`] trait only.
//! - **Composition**: declared solution content with an explicit
//!   [`UnitBasis`]. Components cannot be declared twice.
//! - **Water chemistry**: background ion analysis (templates or user data)
//!   converted into an oracle composition.
//!
//! # Architecture
//!
//! Chemistry is **separate from the column numerics**:
//! - The oracle provides **equilibrium** (thermodynamics)
//! - The solver provides the **stage-to-stage iteration** (numerics)
//!
//! Any engine honouring the oracle contract can be plugged in. The crate
//! ships an analytic engine, [`HenrySpeciationOracle`](crate::models::HenrySpeciationOracle),
//! covering Henry's-law partitioning with weak-acid speciation.
//!
//! # Example
//!
//! ```rust
//! use strip_rs::chemistry::{Composition, EquilibriumConstraints, EquilibriumOracle, GasPhase, UnitBasis};
//! use strip_rs::models::HenrySpeciationOracle;
//!
//! let oracle = HenrySpeciationOracle::default();
//!
//! // 1 kg of water with 10 mg/L TCE contacting 25 L of clean air
//! let water = Composition::new(UnitBasis::MolPerKgw).with("Tce", 10.0 / 131_388.0).unwrap();
//! let air = GasPhase::clean(1.0, 25.0 / (0.082057 * 298.15));
//!
//! let result = oracle
//!     .equilibrate(&water, &EquilibriumConstraints::with_gas(298.15, air))
//!     .unwrap();
//!
//! // Most of the TCE moved to the gas
//! assert!(result.gas_moles("Tce") > 100.0 * result.total("Tce"));
//! ```

pub mod data;
pub mod traits;
pub mod water;

pub use traits::{
    Composition,
    EquilibriumConstraints,
    EquilibriumOracle,
    EquilibriumResult,
    GasPhase,
    GasPhaseResult,
    PhConstraint,
    UnitBasis,
};
pub use water::{WaterChemistry, WaterTemplate};
