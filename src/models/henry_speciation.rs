//! Analytic equilibrium engine: Henry's law with weak-acid speciation
//!
//! # Model
//!
//! For every volatile component *c* with neutral concentration c₀ (mol/kgw):
//!
//! ```text
//! aqueous total       C_T = c₀ / α₀(pH)
//! partial pressure    p   = H(T) · c₀ · R · T
//! gas amount          n_g = (p / P) · G,      G = carrier + Σ n_g
//! ```
//!
//! and pH follows from electroneutrality with the carried balance E:
//!
//! ```text
//! S + [H⁺] − Σ C_T · z̄(pH) − Kw/[H⁺] = E
//! ```
//!
//! where S is the charge of the conservative background ions and z̄ the mean
//! negative charge of the speciated acid. Non-volatile background carbonate
//! (`Alkalinity`) is treated as a conservative anion: it buffers through E
//! but is not stripped. Activities are taken equal to concentrations.
//!
//! # Numerics
//!
//! Both unknowns are found by bisection, nested: the total gas amount G for a
//! given pH, then pH. Each residual is monotone on its bracket, so the roots
//! are unique and the result is a deterministic function of the input.
//!
//! # Example
//!
//! ```rust
//! use strip_rs::chemistry::{Composition, EquilibriumConstraints, EquilibriumOracle, UnitBasis};
//! use strip_rs::models::HenrySpeciationOracle;
//!
//! let oracle = HenrySpeciationOracle::default();
//! let water = Composition::new(UnitBasis::MolPerKgw)
//!     .with("C(4)", 2.0e-3).unwrap()
//!     .with("Na", 1.8e-3).unwrap();
//!
//! let result = oracle.equilibrate(&water, &EquilibriumConstraints::liquid(298.15)).unwrap();
//! assert!(result.ph > 6.0 && result.ph < 8.0);
//! ```

use std::collections::BTreeMap;

use crate::chemistry::data::{
    R_GAS_L_ATM,
    ionization_fractions,
    mean_charge,
    pkw,
};
use crate::chemistry::traits::{
    Composition,
    EquilibriumConstraints,
    EquilibriumOracle,
    EquilibriumResult,
    GasPhase,
    GasPhaseResult,
    PhConstraint,
    UnitBasis,
};
use crate::chemistry::water::component_charge;
use crate::error::OracleError;
use crate::models::application::{Application, ContaminantProperties};

/// Lowest pH searched
const PH_MIN: f64 = -1.0;

/// Highest pH searched
const PH_MAX: f64 = 15.0;

/// Bisection steps for each nested search (2⁻²⁰⁰ of the bracket)
const MAX_BISECTION_STEPS: usize = 200;

/// Volatile component resolved against the species registry
struct Volatile<'a> {
    component: &'a str,
    properties: &'a ContaminantProperties,
    acid_constants: Vec<f64>,
    henry: f64,
    total_moles: f64,
}

/// Distribution of every volatile component at a trial pH
struct Distribution {
    fractions: Vec<Vec<f64>>,
    aqueous_totals: Vec<f64>,
    gas_moles: Vec<f64>,
    gas_total: f64,
}

/// Henry's-law / weak-acid equilibrium engine
///
/// Volatile components are looked up in a registry of
/// [`ContaminantProperties`] keyed by oracle component. Every other component
/// must be a conservative ion from the water-chemistry table.
#[derive(Debug, Clone)]
pub struct HenrySpeciationOracle {
    species: BTreeMap<String, ContaminantProperties>,
}

impl HenrySpeciationOracle {
    /// Oracle with an empty species registry
    pub fn new() -> Self {
        Self { species: BTreeMap::new() }
    }

    /// Register a volatile contaminant
    ///
    /// Replaces an existing registration for the same component.
    pub fn with_species(mut self, properties: ContaminantProperties) -> Self {
        self.species.insert(properties.component.clone(), properties);
        self
    }

    /// Registered data for a component
    pub fn species(&self, component: &str) -> Option<&ContaminantProperties> {
        self.species.get(component)
    }

    /// Registered components
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.species.keys().map(String::as_str)
    }

    // ---------------------------------------------------------------------------------------------
    // Validation
    // ---------------------------------------------------------------------------------------------

    fn validate(
        &self,
        composition: &Composition,
        constraints: &EquilibriumConstraints,
    ) -> Result<(), OracleError> {
        if composition.basis() != UnitBasis::MolPerKgw {
            return Err(OracleError::UnsupportedBasis {
                expected: UnitBasis::MolPerKgw,
                found: composition.basis(),
            });
        }
        let t = constraints.temperature_k;
        if !t.is_finite() || t <= 0.0 {
            return Err(OracleError::NonPhysicalInput(format!("temperature {t} K")));
        }
        for (component, amount) in composition.iter() {
            if !amount.is_finite() || amount < 0.0 {
                return Err(OracleError::NonPhysicalInput(format!(
                    "{component} amount {amount}"
                )));
            }
        }
        if !composition.electrical_balance().is_finite() {
            return Err(OracleError::NonPhysicalInput(
                "non-finite electrical balance".to_string(),
            ));
        }
        if let PhConstraint::Fixed(ph) = constraints.ph
            && !(ph.is_finite() && (PH_MIN..=PH_MAX).contains(&ph))
        {
            return Err(OracleError::NonPhysicalInput(format!("pH {ph}")));
        }
        if let Some(gas) = &constraints.gas_phase {
            if !gas.pressure_atm.is_finite() || gas.pressure_atm <= 0.0 {
                return Err(OracleError::NonPhysicalInput(format!(
                    "gas pressure {} atm",
                    gas.pressure_atm
                )));
            }
            if !gas.carrier_moles.is_finite() || gas.carrier_moles < 0.0 {
                return Err(OracleError::NonPhysicalInput(format!(
                    "carrier amount {} mol",
                    gas.carrier_moles
                )));
            }
            for (component, moles) in &gas.moles {
                if !self.species.contains_key(component) {
                    return Err(OracleError::UnknownComponent(component.clone()));
                }
                if !moles.is_finite() || *moles < 0.0 {
                    return Err(OracleError::NonPhysicalInput(format!(
                        "gas {component} amount {moles}"
                    )));
                }
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------------------------------
    // Partitioning
    // ---------------------------------------------------------------------------------------------

    /// Distribute volatile components between liquid and gas at fixed [H⁺]
    fn distribute(
        &self,
        h: f64,
        volatiles: &[Volatile<'_>],
        gas: Option<&GasPhase>,
        temperature_k: f64,
    ) -> Distribution {
        let fractions: Vec<Vec<f64>> = volatiles
            .iter()
            .map(|v| ionization_fractions(h, &v.acid_constants))
            .collect();

        let Some(gas) = gas else {
            return Distribution {
                fractions,
                aqueous_totals: volatiles.iter().map(|v| v.total_moles).collect(),
                gas_moles: vec![0.0; volatiles.len()],
                gas_total: 0.0,
            };
        };

        // k = H·R·T/P converts neutral concentration to mole fraction
        let ks: Vec<f64> = volatiles
            .iter()
            .map(|v| v.henry * R_GAS_L_ATM * temperature_k / gas.pressure_atm)
            .collect();

        // Neutral concentration for a trial total gas amount G
        let neutral = |g: f64, i: usize| -> f64 {
            let alpha0 = fractions[i][0];
            volatiles[i].total_moles / (1.0 / alpha0 + g * ks[i])
        };

        let gas_in_phase = |g: f64| -> f64 {
            (0..volatiles.len()).map(|i| g * ks[i] * neutral(g, i)).sum()
        };

        // G = carrier + Σ n_g(G); residual is positive at the carrier amount
        // and non-positive once every mole is in the gas
        let mut lo = gas.carrier_moles;
        let mut hi = gas.carrier_moles + volatiles.iter().map(|v| v.total_moles).sum::<f64>();
        for _ in 0..MAX_BISECTION_STEPS {
            let mid = 0.5 * (lo + hi);
            if mid <= lo || mid >= hi {
                break;
            }
            if gas.carrier_moles + gas_in_phase(mid) - mid > 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let gas_total = 0.5 * (lo + hi);

        let mut aqueous_totals = Vec::with_capacity(volatiles.len());
        let mut gas_moles = Vec::with_capacity(volatiles.len());
        for (i, v) in volatiles.iter().enumerate() {
            let in_gas = (gas_total * ks[i] * neutral(gas_total, i)).min(v.total_moles);
            // Liquid takes the remainder so that the component is conserved exactly
            gas_moles.push(in_gas);
            aqueous_totals.push(v.total_moles - in_gas);
        }

        Distribution { fractions, aqueous_totals, gas_moles, gas_total }
    }

    /// Net charge of the solution at fixed [H⁺]
    fn charge(&self, h: f64, strong_ions: f64, kw: f64, distribution: &Distribution) -> f64 {
        let acid_charge: f64 = distribution
            .fractions
            .iter()
            .zip(&distribution.aqueous_totals)
            .map(|(fractions, total)| total * mean_charge(fractions))
            .sum();
        strong_ions + h - acid_charge - kw / h
    }
}

impl Default for HenrySpeciationOracle {
    /// Registry holding the default contaminant of every application
    fn default() -> Self {
        Application::all()
            .iter()
            .fold(Self::new(), |oracle, app| oracle.with_species(app.default_properties()))
    }
}

impl EquilibriumOracle for HenrySpeciationOracle {
    fn equilibrate(
        &self,
        composition: &Composition,
        constraints: &EquilibriumConstraints,
    ) -> Result<EquilibriumResult, OracleError> {
        // ====== Step 1: Validation ======

        self.validate(composition, constraints)?;
        let temperature_k = constraints.temperature_k;
        let gas = constraints.gas_phase.as_ref();

        // ====== Step 2: Classify components ======

        let mut strong_ions = 0.0;
        let mut volatiles: Vec<Volatile<'_>> = Vec::new();
        for (component, amount) in composition.iter() {
            if let Some(properties) = self.species.get(component) {
                let in_gas = gas.and_then(|g| g.moles.get(component)).copied().unwrap_or(0.0);
                volatiles.push(Volatile {
                    component,
                    properties,
                    acid_constants: properties.acid_constants(),
                    henry: properties.henry_at(temperature_k),
                    total_moles: amount + in_gas,
                });
            } else if let Some(z) = component_charge(component) {
                strong_ions += z * amount;
            } else {
                return Err(OracleError::UnknownComponent(component.to_string()));
            }
        }
        // Volatile present only in the incoming gas
        if let Some(gas) = gas {
            for (component, moles) in &gas.moles {
                if composition.contains(component) {
                    continue;
                }
                if let Some((key, properties)) = self.species.get_key_value(component) {
                    volatiles.push(Volatile {
                        component: key.as_str(),
                        properties,
                        acid_constants: properties.acid_constants(),
                        henry: properties.henry_at(temperature_k),
                        total_moles: *moles,
                    });
                }
            }
        }

        // ====== Step 3: Solve pH ======

        let kw = 10f64.powf(-pkw(temperature_k));
        let carried = composition.electrical_balance();

        let ph = match constraints.ph {
            PhConstraint::Fixed(ph) => ph,
            PhConstraint::ChargeBalance => {
                let residual = |ph: f64| {
                    let h = 10f64.powf(-ph);
                    let d = self.distribute(h, &volatiles, gas, temperature_k);
                    self.charge(h, strong_ions, kw, &d) - carried
                };
                let (mut lo, mut hi) = (PH_MIN, PH_MAX);
                if residual(lo) < 0.0 || residual(hi) > 0.0 {
                    return Err(OracleError::NoConvergence(format!(
                        "electroneutral pH outside [{PH_MIN}, {PH_MAX}] \
                         (strong ions {strong_ions:.3e} eq, carried balance {carried:.3e} eq)"
                    )));
                }
                for _ in 0..MAX_BISECTION_STEPS {
                    let mid = 0.5 * (lo + hi);
                    if hi - lo < 1e-12 {
                        break;
                    }
                    if residual(mid) > 0.0 {
                        lo = mid;
                    } else {
                        hi = mid;
                    }
                }
                0.5 * (lo + hi)
            }
        };

        // ====== Step 4: Build Result ======

        let h = 10f64.powf(-ph);
        let distribution = self.distribute(h, &volatiles, gas, temperature_k);
        let electrical_balance = self.charge(h, strong_ions, kw, &distribution);

        let mut totals = BTreeMap::new();
        let mut species = BTreeMap::new();
        for (component, amount) in composition.iter() {
            if !self.species.contains_key(component) {
                totals.insert(component.to_string(), amount);
                species.insert(component.to_string(), amount);
            }
        }
        for (i, v) in volatiles.iter().enumerate() {
            let total = distribution.aqueous_totals[i];
            totals.insert(v.component.to_string(), total);
            let fractions = &distribution.fractions[i];
            species.insert(v.properties.name.clone(), total * fractions[0]);
            for (name, fraction) in v.properties.ionized_species.iter().zip(&fractions[1..]) {
                species.insert(name.clone(), total * fraction);
            }
        }
        species.insert("H+".to_string(), h);
        species.insert("OH-".to_string(), kw / h);

        let gas = gas.map(|g| {
            let mut moles = BTreeMap::new();
            let mut partial_pressures_atm = BTreeMap::new();
            for (i, v) in volatiles.iter().enumerate() {
                let n = distribution.gas_moles[i];
                moles.insert(v.component.to_string(), n);
                let y = if distribution.gas_total > 0.0 { n / distribution.gas_total } else { 0.0 };
                partial_pressures_atm.insert(v.component.to_string(), y * g.pressure_atm);
            }
            GasPhaseResult {
                total_moles: distribution.gas_total,
                moles,
                partial_pressures_atm,
            }
        });

        let result = EquilibriumResult {
            totals_basis: UnitBasis::MolPerKgw,
            species_basis: UnitBasis::MolPerKgw,
            totals,
            species,
            ph,
            electrical_balance,
            gas,
        };

        if !result.ph.is_finite()
            || result.totals.values().chain(result.species.values()).any(|x| !x.is_finite() || *x < 0.0)
        {
            return Err(OracleError::NoConvergence(
                "equilibrium produced a non-physical composition".to_string(),
            ));
        }

        Ok(result)
    }

    fn basis(&self) -> UnitBasis {
        UnitBasis::MolPerKgw
    }

    fn name(&self) -> &str {
        "Henry/weak-acid speciation"
    }

    fn description(&self) -> Option<&str> {
        Some("Ideal-solution Henry's law partitioning with polyprotic weak-acid speciation")
    }
}

// =================================================================================================
// Tests
// =================================================================================================
