//! Stage evaluator
//!
//! One theoretical stage is a damped approach to full equilibrium:
//!
//! 1. The liquid entering from above and the gas entering from below are
//!    submitted to the oracle as one closed system at fixed temperature and
//!    1 atm total pressure.
//! 2. The exit streams are interpolated between inflow and equilibrium with
//!    the Murphree efficiency E:
//!
//!    ```text
//!    n_out = n_in + E · (n_eq − n_in)          (liquid and gas, in moles)
//!    ```
//!
//!    Because the oracle conserves moles and both phases use the same E, the
//!    interpolated stage conserves moles too.
//! 3. pH and α₀ of the interpolated liquid are obtained from a second,
//!    liquid-only oracle call.
//!
//! Amounts are handled on a basis of 1 kg of water contacting the gas that
//! accompanies it through the column (`air_water_ratio` litres of air).

use crate::chemistry::data::{
    P_ATM,
    ideal_gas_moles,
    mg_per_l_to_mol_per_kgw,
    mol_per_kgw_to_mg_per_l,
    mole_fraction,
    moles_from_fraction,
};
use crate::chemistry::{
    Composition,
    EquilibriumConstraints,
    EquilibriumOracle,
    EquilibriumResult,
    GasPhase,
    UnitBasis,
};
use crate::error::{OracleError, StrippingError};
use crate::models::application::ContaminantProperties;
use crate::solver::StageState;

/// Failure of a single stage evaluation
///
/// Carries no stage index: the caller locates it with [`StageFault::locate`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StageFault {
    /// Inflow or oracle output is not physical
    #[error("{0}")]
    NonPhysical(String),

    /// The oracle reported amounts in an unexpected basis
    #[error("totals in {totals}, species in {species}, expected {expected}")]
    UnitMismatch {
        expected: UnitBasis,
        totals: UnitBasis,
        species: UnitBasis,
    },

    /// The oracle refused the request
    #[error(transparent)]
    Oracle(#[from] OracleError),
}

impl StageFault {
    /// Attach stage, iteration and inflow context
    pub fn locate(
        self,
        stage: usize,
        iteration: usize,
        liquid_in_mg_l: f64,
        gas_in_mole_fraction: f64,
    ) -> StrippingError {
        let instability = |reason: String| StrippingError::NumericalInstability {
            stage,
            iteration,
            liquid_in_mg_l,
            gas_in_mole_fraction,
            reason,
        };
        match self {
            StageFault::UnitMismatch { expected, totals, species } => {
                StrippingError::OracleUnitMismatch { expected, totals, species }
            }
            StageFault::NonPhysical(reason) => instability(reason),
            StageFault::Oracle(err @ (OracleError::NonPhysicalInput(_) | OracleError::NoConvergence(_))) => {
                instability(err.to_string())
            }
            StageFault::Oracle(err) => StrippingError::Oracle(err),
        }
    }
}

/// Evaluates one stage against an equilibrium oracle
///
/// Holds the operating conditions shared by every stage of a column. The
/// evaluation itself is a pure function of its arguments.
///
/// # Example
///
/// ```rust
/// use strip_rs::chemistry::{Composition, UnitBasis};
/// use strip_rs::models::{Application, HenrySpeciationOracle, StageEvaluator};
///
/// let oracle = HenrySpeciationOracle::default();
/// let evaluator = StageEvaluator::new(&oracle, 298.15, 25.0);
/// let tce = Application::Voc.default_properties();
/// let background = Composition::new(UnitBasis::MolPerKgw);
///
/// let out = evaluator.evaluate(10.0, 0.0, 0.85, &tce, &background).unwrap();
/// assert!(out.liquid_mg_l < 2.0);
/// assert!(out.gas_mole_fraction > 0.0);
/// ```
#[derive(Clone, Copy)]
pub struct StageEvaluator<'a> {
    oracle: &'a dyn EquilibriumOracle,
    temperature_k: f64,
    carrier_moles: f64,
}

impl<'a> StageEvaluator<'a> {
    /// Create an evaluator
    ///
    /// `air_water_ratio` is the volumetric gas/liquid ratio (L air per L
    /// water); it fixes the carrier gas per kg of water at 1 atm.
    pub fn new(oracle: &'a dyn EquilibriumOracle, temperature_k: f64, air_water_ratio: f64) -> Self {
        Self {
            oracle,
            temperature_k,
            carrier_moles: ideal_gas_moles(air_water_ratio, temperature_k, P_ATM),
        }
    }

    /// Carrier gas per kg of water (mol)
    pub fn carrier_moles(&self) -> f64 {
        self.carrier_moles
    }

    /// Temperature (K)
    pub fn temperature_k(&self) -> f64 {
        self.temperature_k
    }

    /// Evaluate one stage
    ///
    /// # Arguments
    ///
    /// * `liquid_in_mg_l` - Total contaminant in the liquid entering from above
    /// * `gas_in` - Contaminant mole fraction in the gas entering from below
    /// * `efficiency` - Murphree efficiency in ]0, 1]
    /// * `contaminant` - Contaminant being stripped
    /// * `background` - Background solution (ions and carried electrical balance)
    pub fn evaluate(
        &self,
        liquid_in_mg_l: f64,
        gas_in: f64,
        efficiency: f64,
        contaminant: &ContaminantProperties,
        background: &Composition,
    ) -> Result<StageState, StageFault> {
        // ====== Step 1: Validation ======

        if !liquid_in_mg_l.is_finite() || liquid_in_mg_l < 0.0 {
            return Err(StageFault::NonPhysical(format!(
                "liquid inflow {liquid_in_mg_l} mg/L"
            )));
        }
        if !gas_in.is_finite() || !(0.0..1.0).contains(&gas_in) {
            return Err(StageFault::NonPhysical(format!("gas inflow mole fraction {gas_in}")));
        }
        if !(efficiency > 0.0 && efficiency <= 1.0) {
            return Err(StageFault::NonPhysical(format!("stage efficiency {efficiency}")));
        }

        // ====== Step 2: Closed-system equilibrium ======

        let component = contaminant.component.as_str();
        let liquid_in = mg_per_l_to_mol_per_kgw(liquid_in_mg_l, contaminant.molar_mass);
        let gas_in_moles = moles_from_fraction(gas_in, self.carrier_moles);

        let mut solution = background.clone();
        solution.declare(component, liquid_in)?;
        let gas = GasPhase::clean(P_ATM, self.carrier_moles).with_component(component, gas_in_moles);

        let equilibrium = self
            .oracle
            .equilibrate(&solution, &EquilibriumConstraints::with_gas(self.temperature_k, gas))?;
        check_basis(&equilibrium, solution.basis())?;

        let liquid_eq = equilibrium.total(component);
        let gas_eq = equilibrium.gas_moles(component);
        if !liquid_eq.is_finite() || liquid_eq < 0.0 || !gas_eq.is_finite() || gas_eq < 0.0 {
            return Err(StageFault::NonPhysical(format!(
                "oracle returned liquid {liquid_eq:e} mol/kgw, gas {gas_eq:e} mol"
            )));
        }

        // ====== Step 3: Murphree interpolation ======

        let liquid_out = liquid_in + efficiency * (liquid_eq - liquid_in);
        let gas_out = gas_in_moles + efficiency * (gas_eq - gas_in_moles);

        // ====== Step 4: Speciate the exit liquid ======

        let ph = if efficiency == 1.0 {
            equilibrium.ph
        } else {
            let mut exit = background.clone();
            exit.declare(component, liquid_out)?;
            let speciated = self
                .oracle
                .equilibrate(&exit, &EquilibriumConstraints::liquid(self.temperature_k))?;
            check_basis(&speciated, exit.basis())?;
            speciated.ph
        };

        let state = StageState {
            liquid_mg_l: mol_per_kgw_to_mg_per_l(liquid_out, contaminant.molar_mass),
            gas_mole_fraction: mole_fraction(gas_out, self.carrier_moles),
            ph,
            alpha0: contaminant.strippable_fraction(ph),
            temperature_k: self.temperature_k,
        };

        if !state.is_physical() {
            return Err(StageFault::NonPhysical(format!("stage exit {state:?}")));
        }

        Ok(state)
    }
}

/// Totals and species must both come back in the requested basis
fn check_basis(result: &EquilibriumResult, expected: UnitBasis) -> Result<(), StageFault> {
    if result.totals_basis != expected || result.species_basis != expected {
        return Err(StageFault::UnitMismatch {
            expected,
            totals: result.totals_basis,
            species: result.species_basis,
        });
    }
    Ok(())
}

// =================================================================================================
// Tests
// =================================================================================================
