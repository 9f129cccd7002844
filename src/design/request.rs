//! Simulation request
//!
//! Everything a caller states about one design case. Missing fields take the
//! defaults of a typical air-stripping study.
//!
//! ```json
//! {
//!   "application": "CO2",
//!   "water_flow_m3_h": 100.0,
//!   "inlet_concentration_mg_l": 100.0,
//!   "outlet_concentration_mg_l": 10.0,
//!   "water_ph": 6.5,
//!   "water": "brackish"
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chemistry::data::celsius_to_kelvin;
use crate::chemistry::{WaterChemistry, WaterTemplate};
use crate::error::{StrippingError, StrippingResult};
use crate::models::{Application, ContaminantProperties};
use crate::solver::{EfficiencyPolicy, InitialGuess, SolverConfiguration};

/// Background water: a template name or an ion analysis (mg/L)
///
/// An empty analysis (`{}`) is pure water.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WaterInput {
    Template(WaterTemplate),
    Ions(BTreeMap<String, f64>),
}

impl Default for WaterInput {
    fn default() -> Self {
        WaterInput::Template(WaterTemplate::Municipal)
    }
}

impl WaterInput {
    pub fn to_water_chemistry(&self) -> StrippingResult<WaterChemistry> {
        match self {
            WaterInput::Template(template) => Ok(WaterChemistry::template(*template)),
            WaterInput::Ions(ions) if ions.is_empty() => Ok(WaterChemistry::pure()),
            WaterInput::Ions(ions) => WaterChemistry::from_ions(ions.clone()),
        }
    }
}

/// One design case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub application: Application,

    /// Liquid flow (m³/h)
    pub water_flow_m3_h: f64,

    /// Contaminant in the feed (mg/L)
    #[serde(alias = "inlet_concentration_mg_L")]
    pub inlet_concentration_mg_l: f64,

    /// Target outlet (mg/L)
    #[serde(alias = "outlet_concentration_mg_L")]
    pub outlet_concentration_mg_l: f64,

    #[serde(default = "default_air_water_ratio")]
    pub air_water_ratio: f64,

    #[serde(default = "default_temperature_c")]
    pub temperature_c: f64,

    /// Feed pH
    #[serde(default = "default_water_ph")]
    pub water_ph: f64,

    #[serde(default)]
    pub water: WaterInput,

    /// Replaces the application's default Henry's constant at 25 °C
    #[serde(default)]
    pub henry_constant_25c: Option<f64>,

    /// Replaces the application's default contaminant entirely
    #[serde(default)]
    pub contaminant: Option<ContaminantProperties>,

    /// Search the smallest stage count meeting the target
    #[serde(default = "default_true")]
    pub find_optimal_stages: bool,

    /// Fixed stage count when not searching
    #[serde(default)]
    pub num_stages: Option<usize>,

    #[serde(default = "default_min_stages")]
    pub min_stages: usize,

    #[serde(default = "default_max_stages")]
    pub max_stages: usize,

    #[serde(default = "default_tolerance")]
    pub convergence_tolerance: f64,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    #[serde(default = "default_relaxation")]
    pub relaxation: f64,

    #[serde(default)]
    pub initial_guess: InitialGuess,

    /// Uniform stage efficiency; the adaptive policy applies when absent
    #[serde(default)]
    pub stage_efficiency: Option<f64>,
}

fn default_air_water_ratio() -> f64 {
    30.0
}

fn default_temperature_c() -> f64 {
    25.0
}

fn default_water_ph() -> f64 {
    7.0
}

fn default_true() -> bool {
    true
}

fn default_min_stages() -> usize {
    5
}

fn default_max_stages() -> usize {
    100
}

fn default_tolerance() -> f64 {
    1e-3
}

fn default_max_iterations() -> usize {
    200
}

fn default_relaxation() -> f64 {
    1.0
}

impl SimulationRequest {
    /// Request with every optional field at its default
    pub fn new(
        application: Application,
        water_flow_m3_h: f64,
        inlet_concentration_mg_l: f64,
        outlet_concentration_mg_l: f64,
    ) -> Self {
        Self {
            application,
            water_flow_m3_h,
            inlet_concentration_mg_l,
            outlet_concentration_mg_l,
            air_water_ratio: default_air_water_ratio(),
            temperature_c: default_temperature_c(),
            water_ph: default_water_ph(),
            water: WaterInput::default(),
            henry_constant_25c: None,
            contaminant: None,
            find_optimal_stages: true,
            num_stages: None,
            min_stages: default_min_stages(),
            max_stages: default_max_stages(),
            convergence_tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
            relaxation: default_relaxation(),
            initial_guess: InitialGuess::default(),
            stage_efficiency: None,
        }
    }

    /// Parse a request from JSON
    pub fn from_json(json: &str) -> StrippingResult<Self> {
        let request: Self = serde_json::from_str(json)?;
        request.validate()?;
        Ok(request)
    }

    /// Read a JSON request from disk
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> StrippingResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Check the request is physically meaningful
    pub fn validate(&self) -> StrippingResult<()> {
        let invalid = |msg: String| -> StrippingResult<()> { Err(StrippingError::InvalidConfiguration(msg)) };
        let positive = |v: f64| v.is_finite() && v > 0.0;

        if !positive(self.water_flow_m3_h) {
            return invalid(format!("water flow must be positive, got {}", self.water_flow_m3_h));
        }
        if !positive(self.inlet_concentration_mg_l) {
            return invalid(format!(
                "inlet concentration must be positive, got {}",
                self.inlet_concentration_mg_l
            ));
        }
        if !positive(self.outlet_concentration_mg_l)
            || self.outlet_concentration_mg_l >= self.inlet_concentration_mg_l
        {
            return invalid(format!(
                "outlet target must be positive and below the inlet ({} mg/L), got {}",
                self.inlet_concentration_mg_l, self.outlet_concentration_mg_l
            ));
        }
        if !positive(self.air_water_ratio) {
            return invalid(format!("air/water ratio must be positive, got {}", self.air_water_ratio));
        }
        if !(self.temperature_c.is_finite() && (0.0..100.0).contains(&self.temperature_c)) {
            return invalid(format!("temperature must be in [0, 100) °C, got {}", self.temperature_c));
        }
        if !(self.water_ph.is_finite() && (0.0..=14.0).contains(&self.water_ph)) {
            return invalid(format!("water pH must be in [0, 14], got {}", self.water_ph));
        }
        if let Some(h) = self.henry_constant_25c
            && !positive(h)
        {
            return invalid(format!("Henry's constant must be positive, got {h}"));
        }
        if let Some(e) = self.stage_efficiency
            && !(e > 0.0 && e <= 1.0)
        {
            return invalid(format!("stage efficiency must be in ]0, 1], got {e}"));
        }
        if self.min_stages == 0 || self.min_stages > self.max_stages {
            return invalid(format!(
                "stage bounds must satisfy 1 <= min <= max, got [{}, {}]",
                self.min_stages, self.max_stages
            ));
        }
        if self.num_stages == Some(0) {
            return invalid("num_stages must be at least 1".to_string());
        }
        self.solver_configuration().validate()
    }

    /// Column temperature (K)
    pub fn temperature_k(&self) -> f64 {
        celsius_to_kelvin(self.temperature_c)
    }

    /// Contaminant data after overrides
    pub fn contaminant_properties(&self) -> ContaminantProperties {
        let properties = self
            .contaminant
            .clone()
            .unwrap_or_else(|| self.application.default_properties());
        match self.henry_constant_25c {
            Some(h) => properties.with_henry(h),
            None => properties,
        }
    }

    /// Solver settings of this request
    pub fn solver_configuration(&self) -> SolverConfiguration {
        let efficiency = match self.stage_efficiency {
            Some(e) if e > 0.0 && e <= 1.0 => EfficiencyPolicy::uniform(e),
            Some(e) => EfficiencyPolicy { nominal: e, rules: Vec::new() },
            None => EfficiencyPolicy::adaptive(),
        };
        SolverConfiguration::iterative(self.convergence_tolerance, self.max_iterations)
            .with_relaxation(self.relaxation)
            .with_initial_guess(self.initial_guess)
            .with_efficiency(efficiency)
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "application": "H2S",
        "water_flow_m3_h": 50.0,
        "inlet_concentration_mg_L": 20.0,
        "outlet_concentration_mg_L": 0.5
    }"#;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let request = SimulationRequest::from_json(MINIMAL).unwrap();
        assert_eq!(request.application, Application::H2s);
        assert_eq!(request.air_water_ratio, 30.0);
        assert_eq!(request.temperature_c, 25.0);
        assert_eq!(request.water_ph, 7.0);
        assert!(request.find_optimal_stages);
        assert_eq!((request.min_stages, request.max_stages), (5, 100));
        assert_eq!(request.convergence_tolerance, 1e-3);
        assert_eq!(request.max_iterations, 200);
        assert_eq!(request.water, WaterInput::Template(WaterTemplate::Municipal));
        assert_eq!(request, SimulationRequest::new(Application::H2s, 50.0, 20.0, 0.5));
    }

    #[test]
    fn test_water_input_forms() {
        let template: WaterInput = serde_json::from_str(r#""seawater""#).unwrap();
        assert_eq!(template, WaterInput::Template(WaterTemplate::Seawater));

        let ions: WaterInput = serde_json::from_str(r#"{"Na+": 23.0, "Cl-": 35.45}"#).unwrap();
        let water = ions.to_water_chemistry().unwrap();
        assert_eq!(water.ions().len(), 2);

        let pure: WaterInput = serde_json::from_str("{}").unwrap();
        assert!(pure.to_water_chemistry().unwrap().ions().is_empty());

        let unknown = WaterInput::Ions(BTreeMap::from([("Xx+".to_string(), 1.0)]));
        assert!(unknown.to_water_chemistry().is_err());
    }

    #[test]
    fn test_validation_errors() {
        let base = SimulationRequest::new(Application::Voc, 10.0, 1.0, 0.005);
        assert!(base.validate().is_ok());

        let mut r = base.clone();
        r.outlet_concentration_mg_l = 2.0;
        assert!(r.validate().is_err());

        let mut r = base.clone();
        r.min_stages = 20;
        r.max_stages = 10;
        assert!(r.validate().is_err());

        let mut r = base.clone();
        r.stage_efficiency = Some(1.5);
        assert!(r.validate().is_err());

        let mut r = base;
        r.relaxation = 0.0;
        assert!(r.validate().is_err());
    }

    #[test]
    fn test_malformed_json_is_a_request_error() {
        let err = SimulationRequest::from_json("{ not json").unwrap_err();
        assert!(matches!(err, StrippingError::Request(_)));
    }

    #[test]
    fn test_overrides() {
        let mut request = SimulationRequest::new(Application::Voc, 10.0, 1.0, 0.005);
        request.henry_constant_25c = Some(1.13);
        request.stage_efficiency = Some(0.6);

        assert_eq!(request.contaminant_properties().henry_ref, 1.13);
        assert_eq!(request.solver_configuration().efficiency, EfficiencyPolicy::uniform(0.6));
    }
}
