//! Physical models for packed-tower stripping
//!
//! The solver iterates the column; models are responsible for the physics of
//! what happens inside one stage and for the data describing the contaminant.
//!
//! # Available Models
//!
//! ## [`Application`] and [`ContaminantProperties`]
//!
//! Contaminant data (Henry's constant, molar mass, acid constants) with
//! defaults for each application class (CO2, H2S, VOC, general). Each class
//! also fixes the tolerance its mass balance is judged against.
//!
//! ## [`HenrySpeciationOracle`]
//!
//! Analytic [`EquilibriumOracle`](crate::chemistry::EquilibriumOracle):
//! Henry's-law liquid/gas partitioning of the neutral form, weak-acid
//! speciation of the dissolved total and electroneutral pH.
//!
//! ## [`StageEvaluator`]
//!
//! One theoretical stage: closed-system equilibrium of the inflows followed
//! by Murphree interpolation of the exit streams.

// =================================================================================================
// Module Declarations
// =================================================================================================

pub mod application;
pub mod henry_speciation;
pub mod stage;

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use application::{Application, ContaminantProperties};
pub use henry_speciation::HenrySpeciationOracle;
pub use stage::{StageEvaluator, StageFault};
