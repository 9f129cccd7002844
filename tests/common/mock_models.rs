//! Mock equilibrium oracles for testing
//!
//! `LinearPartitionOracle` has a known analytical column solution (Kremser),
//! the others misbehave on purpose.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use strip_rs::chemistry::{
    Composition,
    EquilibriumConstraints,
    EquilibriumOracle,
    EquilibriumResult,
    GasPhaseResult,
    PhConstraint,
    UnitBasis,
};
use strip_rs::error::OracleError;

// =================================================================================================
// Linear partition: n_gas = S · n_liquid
// =================================================================================================

/// Splits one component so that gas moles are `S` times liquid moles
///
/// With E = 1 an N-stage column then follows the Kremser equation:
///
/// ```text
/// C_out / C_feed = (S − 1) / (S^(N+1) − 1)
/// ```
///
/// pH is constant unless fixed by the constraints.
pub struct LinearPartitionOracle {
    pub component: String,
    pub stripping_factor: f64,
    pub ph: f64,
}

impl LinearPartitionOracle {
    pub fn new(component: &str, stripping_factor: f64) -> Self {
        Self {
            component: component.to_string(),
            stripping_factor,
            ph: 7.0,
        }
    }
}

impl EquilibriumOracle for LinearPartitionOracle {
    fn equilibrate(
        &self,
        composition: &Composition,
        constraints: &EquilibriumConstraints,
    ) -> Result<EquilibriumResult, OracleError> {
        let ph = match constraints.ph {
            PhConstraint::Fixed(ph) => ph,
            PhConstraint::ChargeBalance => self.ph,
        };
        let liquid_in = composition.get(&self.component).unwrap_or(0.0);

        let mut totals: BTreeMap<String, f64> = composition.iter().map(|(k, v)| (k.to_string(), v)).collect();
        let gas = constraints.gas_phase.as_ref().map(|gas| {
            let gas_in = gas.moles.get(&self.component).copied().unwrap_or(0.0);
            let total = liquid_in + gas_in;
            let in_gas = total * self.stripping_factor / (1.0 + self.stripping_factor);
            totals.insert(self.component.clone(), total - in_gas);

            let total_moles = gas.carrier_moles + in_gas;
            GasPhaseResult {
                total_moles,
                moles: BTreeMap::from([(self.component.clone(), in_gas)]),
                partial_pressures_atm: BTreeMap::from([(
                    self.component.clone(),
                    gas.pressure_atm * in_gas / total_moles,
                )]),
            }
        });

        Ok(EquilibriumResult {
            totals_basis: UnitBasis::MolPerKgw,
            species_basis: UnitBasis::MolPerKgw,
            species: totals.clone(),
            totals,
            ph,
            electrical_balance: composition.electrical_balance(),
            gas,
        })
    }

    fn basis(&self) -> UnitBasis {
        UnitBasis::MolPerKgw
    }

    fn name(&self) -> &str {
        "Linear partition"
    }
}

// =================================================================================================
// Faulty oracle
// =================================================================================================

/// How [`FaultyOracle`] misbehaves
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fault {
    /// NaN liquid total
    NanLiquid,

    /// Negative gas amount
    NegativeGas,

    /// Species reported in mmol/kgw while totals are in mol/kgw
    MixedBasis,
}

/// Linear partition that fails once contaminant enters a stage with the gas
///
/// Feed calibration and every stage fed by clean gas behave normally, so the
/// fault surfaces on the second sweep at stage 2.
pub struct FaultyOracle {
    pub inner: LinearPartitionOracle,
    pub fault: Fault,
}

impl FaultyOracle {
    pub fn new(component: &str, fault: Fault) -> Self {
        Self {
            inner: LinearPartitionOracle::new(component, 2.0),
            fault,
        }
    }
}

impl EquilibriumOracle for FaultyOracle {
    fn equilibrate(
        &self,
        composition: &Composition,
        constraints: &EquilibriumConstraints,
    ) -> Result<EquilibriumResult, OracleError> {
        let mut result = self.inner.equilibrate(composition, constraints)?;
        let loaded_gas = constraints
            .gas_phase
            .as_ref()
            .is_some_and(|gas| gas.moles.values().any(|&m| m > 0.0));
        if !loaded_gas {
            return Ok(result);
        }

        let component = &self.inner.component;
        match self.fault {
            Fault::NanLiquid => {
                result.totals.insert(component.clone(), f64::NAN);
            }
            Fault::NegativeGas => {
                if let Some(gas) = result.gas.as_mut() {
                    gas.moles.insert(component.clone(), -1.0e-6);
                }
            }
            Fault::MixedBasis => result.species_basis = UnitBasis::MmolPerKgw,
        }
        Ok(result)
    }

    fn basis(&self) -> UnitBasis {
        UnitBasis::MolPerKgw
    }

    fn name(&self) -> &str {
        "Faulty"
    }
}

// =================================================================================================
// Counting oracle
// =================================================================================================

/// Delegates to another oracle and counts the calls
///
/// The counter is shared so that the test keeps a handle once the oracle is
/// moved into a scenario.
pub struct CountingOracle {
    inner: Box<dyn EquilibriumOracle>,
    calls: Arc<AtomicUsize>,
}

impl CountingOracle {
    pub fn new(inner: Box<dyn EquilibriumOracle>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (Self { inner, calls: Arc::clone(&calls) }, calls)
    }
}

impl EquilibriumOracle for CountingOracle {
    fn equilibrate(
        &self,
        composition: &Composition,
        constraints: &EquilibriumConstraints,
    ) -> Result<EquilibriumResult, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.equilibrate(composition, constraints)
    }

    fn basis(&self) -> UnitBasis {
        self.inner.basis()
    }

    fn name(&self) -> &str {
        "Counting"
    }
}
