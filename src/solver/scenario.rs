//! Stripping scenario definition
//!
//! A scenario combines the chemistry engine with the operating conditions of
//! one column. It is the "WHAT to solve"; the number of stages and the
//! numerical settings are supplied separately to the solver.

use crate::chemistry::data::{LITERS_PER_M3, P_ATM, T_REF_K, ideal_gas_moles, mg_per_l_to_mol_per_kgw};
use crate::chemistry::{Composition, EquilibriumConstraints, EquilibriumOracle, WaterChemistry};
use crate::error::{StrippingError, StrippingResult};
use crate::models::{Application, ContaminantProperties, StageEvaluator};
use crate::solver::boundary::ColumnBoundaries;

/// Default liquid flow (m³/h)
pub const DEFAULT_WATER_FLOW_M3_H: f64 = 100.0;

/// Default volumetric air/water ratio
pub const DEFAULT_AIR_WATER_RATIO: f64 = 30.0;

/// Background solution calibrated against the feed
///
/// `background` holds the water ions plus the electrical balance that puts
/// the feed at its declared pH. It does not contain the contaminant.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedCalibration {
    pub background: Composition,
    pub feed_ph: f64,
    pub feed_alpha0: f64,
}

/// Stripping scenario
///
/// # Examples
///
/// ```rust
/// use strip_rs::models::{Application, HenrySpeciationOracle};
/// use strip_rs::solver::{ColumnBoundaries, Scenario};
///
/// let scenario = Scenario::new(
///     Box::new(HenrySpeciationOracle::default()),
///     Application::H2s,
///     ColumnBoundaries::new(20.0, 6.5),
/// )
/// .with_air_water_ratio(40.0);
///
/// assert!(scenario.validate().is_ok());
/// assert!((scenario.air_flow_m3_h() - 4000.0).abs() < 1e-9);
/// ```
pub struct Scenario {
    /// Chemistry engine
    pub oracle: Box<dyn EquilibriumOracle>,

    /// Application class (selects the efficiency regime)
    pub application: Application,

    /// Contaminant being stripped
    pub contaminant: ContaminantProperties,

    /// Background water analysis
    pub water: WaterChemistry,

    /// Feed and gas inlet
    pub boundaries: ColumnBoundaries,

    /// Liquid flow (m³/h)
    pub water_flow_m3_h: f64,

    /// Volumetric air/water ratio
    pub air_water_ratio: f64,

    /// Column temperature (K)
    pub temperature_k: f64,
}

impl Scenario {
    /// Create a scenario with the application's default contaminant
    ///
    /// Background water is pure, flow is 100 m³/h, air/water ratio 30 and
    /// temperature 25 °C until overridden.
    pub fn new(
        oracle: Box<dyn EquilibriumOracle>,
        application: Application,
        boundaries: ColumnBoundaries,
    ) -> Self {
        Self {
            oracle,
            application,
            contaminant: application.default_properties(),
            water: WaterChemistry::pure(),
            boundaries,
            water_flow_m3_h: DEFAULT_WATER_FLOW_M3_H,
            air_water_ratio: DEFAULT_AIR_WATER_RATIO,
            temperature_k: T_REF_K,
        }
    }

    pub fn with_contaminant(mut self, contaminant: ContaminantProperties) -> Self {
        self.contaminant = contaminant;
        self
    }

    pub fn with_water(mut self, water: WaterChemistry) -> Self {
        self.water = water;
        self
    }

    pub fn with_water_flow(mut self, water_flow_m3_h: f64) -> Self {
        self.water_flow_m3_h = water_flow_m3_h;
        self
    }

    pub fn with_air_water_ratio(mut self, air_water_ratio: f64) -> Self {
        self.air_water_ratio = air_water_ratio;
        self
    }

    pub fn with_temperature_k(mut self, temperature_k: f64) -> Self {
        self.temperature_k = temperature_k;
        self
    }

    pub fn with_boundaries(mut self, boundaries: ColumnBoundaries) -> Self {
        self.boundaries = boundaries;
        self
    }

    /// Verify operating conditions
    pub fn validate(&self) -> StrippingResult<()> {
        self.boundaries.validate().map_err(StrippingError::InvalidConfiguration)?;

        let positive = |value: f64| value.is_finite() && value > 0.0;
        if !positive(self.water_flow_m3_h) {
            return Err(StrippingError::InvalidConfiguration(format!(
                "water flow must be positive, got {} m3/h",
                self.water_flow_m3_h
            )));
        }
        if !positive(self.air_water_ratio) {
            return Err(StrippingError::InvalidConfiguration(format!(
                "air/water ratio must be positive, got {}",
                self.air_water_ratio
            )));
        }
        if !positive(self.temperature_k) {
            return Err(StrippingError::InvalidConfiguration(format!(
                "temperature must be positive, got {} K",
                self.temperature_k
            )));
        }
        Ok(())
    }

    /// Oracle name
    pub fn oracle_name(&self) -> &str {
        self.oracle.name()
    }

    /// Feed concentration (mg/L)
    pub fn feed_mg_l(&self) -> f64 {
        self.boundaries.feed_mg_l
    }

    /// Air flow (m³/h)
    pub fn air_flow_m3_h(&self) -> f64 {
        self.air_water_ratio * self.water_flow_m3_h
    }

    /// Carrier gas flow (mol/h)
    pub fn carrier_flow_mol_h(&self) -> f64 {
        ideal_gas_moles(self.air_flow_m3_h() * LITERS_PER_M3, self.temperature_k, P_ATM)
    }

    /// Stage evaluator bound to this scenario's oracle and conditions
    pub fn stage_evaluator(&self) -> StageEvaluator<'_> {
        StageEvaluator::new(self.oracle.as_ref(), self.temperature_k, self.air_water_ratio)
    }

    /// Calibrate the background electrical balance at the feed pH
    ///
    /// The feed (background + contaminant) is equilibrated at its declared
    /// pH; the implied electrical balance is carried by every stage.
    pub fn calibrate_feed(&self) -> StrippingResult<FeedCalibration> {
        let component = self.contaminant.component.as_str();
        let ions = self.water.to_composition()?;

        let mut feed = ions.clone();
        feed.declare(
            component,
            mg_per_l_to_mol_per_kgw(self.boundaries.feed_mg_l, self.contaminant.molar_mass),
        )?;

        let result = self.oracle.equilibrate(
            &feed,
            &EquilibriumConstraints::at_ph(self.temperature_k, self.boundaries.feed_ph),
        )?;
        if result.totals_basis != feed.basis() || result.species_basis != feed.basis() {
            return Err(StrippingError::OracleUnitMismatch {
                expected: feed.basis(),
                totals: result.totals_basis,
                species: result.species_basis,
            });
        }

        Ok(FeedCalibration {
            background: ions.with_electrical_balance(result.electrical_balance),
            feed_ph: self.boundaries.feed_ph,
            feed_alpha0: self.contaminant.strippable_fraction(self.boundaries.feed_ph),
        })
    }
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("oracle", &self.oracle_name())
            .field("application", &self.application)
            .field("contaminant", &self.contaminant.name)
            .field("water", &self.water.source())
            .field("boundaries", &self.boundaries)
            .field("water flow (m3/h)", &self.water_flow_m3_h)
            .field("air/water ratio", &self.air_water_ratio)
            .field("temperature (K)", &self.temperature_k)
            .finish()
    }
}

// ================================================================================================
// Tests
// ================================================================================================
