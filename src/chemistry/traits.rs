//! Equilibrium oracle traits and types
//!
//! This module defines the contract between the column solver and whatever
//! engine computes aqueous/gas equilibrium:
//! - `EquilibriumOracle`: trait for all chemistry engines
//! - `Composition`: declared solution content with an explicit unit basis
//! - `EquilibriumConstraints`: temperature, pH handling and optional gas phase
//! - `EquilibriumResult`: equilibrated speciation, pH and gas phase

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::OracleError;

// =================================================================================================
// Unit Basis
// =================================================================================================

/// Unit basis of amounts exchanged with an oracle
///
/// Totals and species amounts must always carry their basis explicitly.
/// A result whose totals and species are in different bases is a unit
/// mismatch, never something to reconcile silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitBasis {
    /// mol per kg of water (molal)
    MolPerKgw,

    /// mmol per kg of water
    MmolPerKgw,

    /// mol per litre of solution (molar)
    MolPerLiter,

    /// mg per litre of solution
    MgPerLiter,
}

impl fmt::Display for UnitBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UnitBasis::MolPerKgw => "mol/kgw",
            UnitBasis::MmolPerKgw => "mmol/kgw",
            UnitBasis::MolPerLiter => "mol/L",
            UnitBasis::MgPerLiter => "mg/L",
        };
        f.write_str(label)
    }
}

// =================================================================================================
// Composition
// =================================================================================================

/// Declared content of an aqueous solution
///
/// Components are keyed by element/valence names (`"Na"`, `"S(6)"`,
/// `"C(4)"`, `"Alkalinity"`...). A component can be declared only once:
/// adding a secondary solute that is already present from the background
/// water fails with [`OracleError::DuplicateComponent`] instead of silently
/// overwriting it.
///
/// The composition also carries its net electrical balance (eq per basis
/// unit). Stripping a neutral species does not change it, so a solution
/// calibrated at the feed keeps the same balance through the column.
///
/// # Example
///
/// ```rust
/// use strip_rs::chemistry::{Composition, UnitBasis};
///
/// let mut solution = Composition::new(UnitBasis::MolPerKgw);
/// solution.declare("Na", 2.0e-3).unwrap();
/// assert!(solution.declare("Na", 1.0e-3).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    basis: UnitBasis,
    components: BTreeMap<String, f64>,
    electrical_balance: f64,
}

impl Composition {
    /// Create an empty composition in a given basis
    pub fn new(basis: UnitBasis) -> Self {
        Self {
            basis,
            components: BTreeMap::new(),
            electrical_balance: 0.0,
        }
    }

    /// Declare a component
    ///
    /// Fails if the component is already present.
    pub fn declare(&mut self, component: impl Into<String>, amount: f64) -> Result<(), OracleError> {
        let component = component.into();
        if self.components.contains_key(&component) {
            return Err(OracleError::DuplicateComponent(component));
        }
        self.components.insert(component, amount);
        Ok(())
    }

    /// Builder form of [`declare`](Self::declare)
    pub fn with(mut self, component: impl Into<String>, amount: f64) -> Result<Self, OracleError> {
        self.declare(component, amount)?;
        Ok(self)
    }

    /// Set the carried electrical balance
    pub fn with_electrical_balance(mut self, balance: f64) -> Self {
        self.electrical_balance = balance;
        self
    }

    /// Unit basis of every amount in this composition
    pub fn basis(&self) -> UnitBasis {
        self.basis
    }

    /// Amount of a component, if declared
    pub fn get(&self, component: &str) -> Option<f64> {
        self.components.get(component).copied()
    }

    /// Whether a component is declared
    pub fn contains(&self, component: &str) -> bool {
        self.components.contains_key(component)
    }

    /// Carried electrical balance
    pub fn electrical_balance(&self) -> f64 {
        self.electrical_balance
    }

    /// Iterate over declared components in a deterministic order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.components.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of declared components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether no component is declared
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

// =================================================================================================
// Constraints
// =================================================================================================

/// How the oracle should treat pH
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PhConstraint {
    /// pH is imposed; the oracle reports the electrical balance it implies
    Fixed(f64),

    /// pH is solved so that the solution keeps its carried electrical balance
    ChargeBalance,
}

/// Gas phase held at fixed total pressure
///
/// `carrier_moles` is the inert carrier (air). `moles` holds volatile
/// components already in the gas, keyed by the same names as the aqueous
/// components they exchange with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasPhase {
    /// Total pressure (atm)
    pub pressure_atm: f64,

    /// Inert carrier gas (mol)
    pub carrier_moles: f64,

    /// Volatile components in the gas (mol)
    pub moles: BTreeMap<String, f64>,
}

impl GasPhase {
    /// Clean carrier gas at a given pressure
    pub fn clean(pressure_atm: f64, carrier_moles: f64) -> Self {
        Self {
            pressure_atm,
            carrier_moles,
            moles: BTreeMap::new(),
        }
    }

    /// Add a volatile component to the gas
    pub fn with_component(mut self, component: impl Into<String>, moles: f64) -> Self {
        self.moles.insert(component.into(), moles);
        self
    }
}

/// Constraints for one equilibrium calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumConstraints {
    /// Temperature (K)
    pub temperature_k: f64,

    /// pH treatment
    pub ph: PhConstraint,

    /// Optional gas phase in contact with the solution (closed system)
    pub gas_phase: Option<GasPhase>,
}

impl EquilibriumConstraints {
    /// Liquid-only speciation with pH solved from electroneutrality
    pub fn liquid(temperature_k: f64) -> Self {
        Self {
            temperature_k,
            ph: PhConstraint::ChargeBalance,
            gas_phase: None,
        }
    }

    /// Liquid-only speciation at an imposed pH
    pub fn at_ph(temperature_k: f64, ph: f64) -> Self {
        Self {
            temperature_k,
            ph: PhConstraint::Fixed(ph),
            gas_phase: None,
        }
    }

    /// Closed liquid/gas system with pH solved from electroneutrality
    pub fn with_gas(temperature_k: f64, gas_phase: GasPhase) -> Self {
        Self {
            temperature_k,
            ph: PhConstraint::ChargeBalance,
            gas_phase: Some(gas_phase),
        }
    }
}

// =================================================================================================
// Results
// =================================================================================================

/// Equilibrated gas phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasPhaseResult {
    /// Total gas amount including carrier (mol)
    pub total_moles: f64,

    /// Volatile components (mol)
    pub moles: BTreeMap<String, f64>,

    /// Partial pressures of volatile components (atm)
    pub partial_pressures_atm: BTreeMap<String, f64>,
}

/// Equilibrated composition returned by an oracle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumResult {
    /// Basis of `totals`
    pub totals_basis: UnitBasis,

    /// Basis of `species`
    pub species_basis: UnitBasis,

    /// Aqueous totals per component
    pub totals: BTreeMap<String, f64>,

    /// Aqueous species amounts (e.g. `"H2S"`, `"HS-"`)
    pub species: BTreeMap<String, f64>,

    /// Equilibrium pH
    pub ph: f64,

    /// Net electrical balance of the solution (eq per basis unit)
    pub electrical_balance: f64,

    /// Equilibrated gas phase, when one was supplied
    pub gas: Option<GasPhaseResult>,
}

impl EquilibriumResult {
    /// Aqueous total of a component (0 when absent)
    pub fn total(&self, component: &str) -> f64 {
        self.totals.get(component).copied().unwrap_or(0.0)
    }

    /// Gas amount of a component (0 when absent or no gas phase)
    pub fn gas_moles(&self, component: &str) -> f64 {
        self.gas
            .as_ref()
            .and_then(|gas| gas.moles.get(component).copied())
            .unwrap_or(0.0)
    }
}

// =================================================================================================
// Equilibrium Oracle Trait
// =================================================================================================

/// Chemistry engine consumed as a black box
///
/// # Contract
///
/// - Deterministic: identical inputs give identical outputs.
/// - Explicit units: [`basis`](Self::basis) declares the only basis accepted;
///   results report the basis of totals and species separately.
/// - Loud failures: non-physical input yields an [`OracleError`], never a
///   NaN or negative result.
/// - Closed system: when a gas phase is supplied, component moles are
///   conserved between liquid and gas.
///
/// `Send + Sync` so that stages of one sweep can be evaluated concurrently.
///
/// # Example
///
/// ```rust
/// use strip_rs::chemistry::{Composition, EquilibriumConstraints, EquilibriumOracle, UnitBasis};
/// use strip_rs::models::HenrySpeciationOracle;
///
/// let oracle = HenrySpeciationOracle::default();
/// let feed = Composition::new(UnitBasis::MolPerKgw).with("S(-2)", 1.0e-3).unwrap();
/// let result = oracle
///     .equilibrate(&feed, &EquilibriumConstraints::at_ph(298.15, 7.0))
///     .unwrap();
/// assert!(result.species["H2S"] > 0.0);
/// ```
pub trait EquilibriumOracle: Send + Sync {
    /// Equilibrate a composition under the given constraints
    fn equilibrate(
        &self,
        composition: &Composition,
        constraints: &EquilibriumConstraints,
    ) -> Result<EquilibriumResult, OracleError>;

    /// Unit basis this oracle accepts and reports in
    fn basis(&self) -> UnitBasis;

    /// Oracle name
    fn name(&self) -> &str;

    /// Optional description
    fn description(&self) -> Option<&str> {
        None
    }
}

// =================================================================================================
// Tests
// =================================================================================================
