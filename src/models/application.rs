//! Contaminant applications
//!
//! Each application class fixes the contaminant's default physical data
//! (Henry's constant, molar mass, acid constants) and the chemistry-specific
//! tolerance the mass balance is judged against.
//!
//! | Application | Hcc (25 °C) | M (g/mol) | pKa         | Component | Mass-balance tol. |
//! |-------------|-------------|-----------|-------------|-----------|-------------------|
//! | `Co2`       | 0.83        | 44.01     | 6.35, 10.33 | `C(4)`    | 10 %              |
//! | `H2s`       | 0.41        | 34.08     | 7.0         | `S(-2)`   | 10 %              |
//! | `Voc` (TCE) | 8.59        | 131.388   | –           | `Tce`     | 1 %               |
//! | `General`   | 1.0         | 100.0     | –           | `General` | 1 %               |
//!
//! pH-coupled chemistries get the looser tolerance: each stage compounds the
//! oracle's speciation approximation with the iteration residual.

use serde::{Deserialize, Serialize};

use crate::chemistry::data::{henry_at_temperature, strippable_fraction};

/// Application class of a stripping tower
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Application {
    /// Carbon dioxide removal (degasification)
    #[serde(alias = "co2")]
    Co2,

    /// Hydrogen sulfide removal
    #[serde(alias = "h2s")]
    H2s,

    /// Volatile organic compound removal (TCE by default)
    #[serde(alias = "voc")]
    Voc,

    /// Generic non-ionising volatile solute
    #[serde(alias = "general")]
    General,
}

impl Application {
    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Application::Co2 => "CO2",
            Application::H2s => "H2S",
            Application::Voc => "VOC",
            Application::General => "General",
        }
    }

    /// Whether speciation (and therefore strippability) depends on pH
    pub fn is_ph_coupled(&self) -> bool {
        matches!(self, Application::Co2 | Application::H2s)
    }

    /// Mass-balance closure tolerance (fraction of mass in)
    pub fn mass_balance_tolerance(&self) -> f64 {
        if self.is_ph_coupled() { 0.10 } else { 0.01 }
    }

    /// Default contaminant data for this application
    pub fn default_properties(&self) -> ContaminantProperties {
        let properties = match self {
            Application::Co2 => ContaminantProperties::new("CO2", "C(4)", 0.83, 44.01)
                .with_enthalpy(19_950.0)
                .with_acid_constants(&[6.35, 10.33], &["HCO3-", "CO3-2"]),
            Application::H2s => ContaminantProperties::new("H2S", "S(-2)", 0.41, 34.08)
                .with_enthalpy(17_460.0)
                .with_acid_constants(&[7.0], &["HS-"]),
            Application::Voc => ContaminantProperties::new("Tce", "Tce", 8.59, 131.388)
                .with_enthalpy(35_750.0),
            Application::General => ContaminantProperties::new("General", "General", 1.0, 100.0),
        };
        properties.with_mass_balance_tolerance(self.mass_balance_tolerance())
    }

    /// All application classes
    pub fn all() -> [Application; 4] {
        [Application::Co2, Application::H2s, Application::Voc, Application::General]
    }
}

impl std::fmt::Display for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =================================================================================================
// Contaminant Properties
// =================================================================================================

/// Physical data of one volatile contaminant
///
/// # Example
///
/// ```rust
/// use strip_rs::models::{Application, ContaminantProperties};
///
/// // Carbon tetrachloride
/// let ct = ContaminantProperties::new("Ct", "Ct", 1.13, 153.82).with_enthalpy(32_000.0);
/// assert!(!ct.is_ph_coupled());
///
/// let h2s = Application::H2s.default_properties();
/// assert!((h2s.strippable_fraction(7.0) - 0.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContaminantProperties {
    /// Neutral (volatile) species name, also used for the gas phase
    pub name: String,

    /// Oracle component key (total of all forms)
    pub component: String,

    /// Dimensionless Henry's constant Cgas/Caq at 25 °C
    pub henry_ref: f64,

    /// Volatilisation enthalpy for the van't Hoff correction (J/mol)
    #[serde(default)]
    pub henry_enthalpy: f64,

    /// Molar mass (g/mol)
    pub molar_mass: f64,

    /// Successive pKa values (empty for non-ionising solutes)
    #[serde(default)]
    pub pkas: Vec<f64>,

    /// Names of the ionised forms, one per pKa
    #[serde(default)]
    pub ionized_species: Vec<String>,

    /// Mass-balance closure tolerance (fraction)
    #[serde(default = "default_mass_balance_tolerance")]
    pub mass_balance_tolerance: f64,
}

fn default_mass_balance_tolerance() -> f64 {
    0.01
}

impl ContaminantProperties {
    /// Create a non-ionising contaminant
    ///
    /// # Panics
    ///
    /// Panics when the Henry's constant or molar mass is not positive.
    pub fn new(name: &str, component: &str, henry_ref: f64, molar_mass: f64) -> Self {
        assert!(
            henry_ref > 0.0 && henry_ref.is_finite(),
            "Henry's constant must be positive, got {}",
            henry_ref
        );
        assert!(
            molar_mass > 0.0 && molar_mass.is_finite(),
            "Molar mass must be positive, got {}",
            molar_mass
        );
        Self {
            name: name.to_string(),
            component: component.to_string(),
            henry_ref,
            henry_enthalpy: 0.0,
            molar_mass,
            pkas: Vec::new(),
            ionized_species: Vec::new(),
            mass_balance_tolerance: default_mass_balance_tolerance(),
        }
    }

    /// Set the van't Hoff enthalpy (J/mol)
    pub fn with_enthalpy(mut self, enthalpy_j_mol: f64) -> Self {
        self.henry_enthalpy = enthalpy_j_mol;
        self
    }

    /// Declare acid dissociation steps
    ///
    /// # Panics
    ///
    /// Panics when the number of pKa values and species names differ, or
    /// when the pKa values are not increasing.
    pub fn with_acid_constants(mut self, pkas: &[f64], ionized_species: &[&str]) -> Self {
        assert_eq!(
            pkas.len(),
            ionized_species.len(),
            "One ionised species name is required per pKa"
        );
        assert!(
            pkas.windows(2).all(|w| w[0] < w[1]),
            "pKa values must be strictly increasing, got {:?}",
            pkas
        );
        self.pkas = pkas.to_vec();
        self.ionized_species = ionized_species.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Override the mass-balance tolerance
    pub fn with_mass_balance_tolerance(mut self, tolerance: f64) -> Self {
        assert!(
            tolerance > 0.0 && tolerance < 1.0,
            "Mass-balance tolerance must be in ]0,1[, got {}",
            tolerance
        );
        self.mass_balance_tolerance = tolerance;
        self
    }

    /// Override the reference Henry's constant
    pub fn with_henry(mut self, henry_ref: f64) -> Self {
        assert!(henry_ref > 0.0, "Henry's constant must be positive, got {}", henry_ref);
        self.henry_ref = henry_ref;
        self
    }

    /// Whether strippability depends on pH
    #[inline]
    pub fn is_ph_coupled(&self) -> bool {
        !self.pkas.is_empty()
    }

    /// Henry's constant at temperature
    #[inline]
    pub fn henry_at(&self, temperature_k: f64) -> f64 {
        henry_at_temperature(self.henry_ref, self.henry_enthalpy, temperature_k)
    }

    /// Strippable (neutral) fraction α₀ at a given pH
    #[inline]
    pub fn strippable_fraction(&self, ph: f64) -> f64 {
        strippable_fraction(ph, &self.pkas)
    }

    /// Acid constants Ka (not pKa)
    pub fn acid_constants(&self) -> Vec<f64> {
        self.pkas.iter().map(|pk| 10f64.powf(-pk)).collect()
    }

    /// Apparent stripping factor λ = α₀ · H · (G/L)
    pub fn stripping_factor(&self, ph: f64, temperature_k: f64, air_water_ratio: f64) -> f64 {
        self.strippable_fraction(ph) * self.henry_at(temperature_k) * air_water_ratio
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chemistry::data::T_REF_K;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults_per_application() {
        let co2 = Application::Co2.default_properties();
        assert_eq!(co2.component, "C(4)");
        assert_eq!(co2.pkas, vec![6.35, 10.33]);
        assert_relative_eq!(co2.mass_balance_tolerance, 0.10);

        let voc = Application::Voc.default_properties();
        assert_relative_eq!(voc.henry_ref, 8.59);
        assert_relative_eq!(voc.molar_mass, 131.388);
        assert_relative_eq!(voc.mass_balance_tolerance, 0.01);
        assert!(!voc.is_ph_coupled());
    }

    #[test]
    fn test_tolerance_declared_per_application() {
        for app in Application::all() {
            let expected = if app.is_ph_coupled() { 0.10 } else { 0.01 };
            assert_relative_eq!(app.default_properties().mass_balance_tolerance, expected);
        }
    }

    #[test]
    fn test_henry_at_reference_temperature() {
        let h2s = Application::H2s.default_properties();
        assert_relative_eq!(h2s.henry_at(T_REF_K), 0.41, epsilon = 1e-12);
    }

    #[test]
    fn test_stripping_factor_drops_with_ph() {
        let h2s = Application::H2s.default_properties();
        let low = h2s.stripping_factor(6.0, T_REF_K, 30.0);
        let high = h2s.stripping_factor(8.5, T_REF_K, 30.0);
        assert!(low > 10.0 * high);
    }

    #[test]
    fn test_serde_names() {
        let app: Application = serde_json::from_str("\"H2S\"").unwrap();
        assert_eq!(app, Application::H2s);
        let app: Application = serde_json::from_str("\"voc\"").unwrap();
        assert_eq!(app, Application::Voc);
        assert_eq!(serde_json::to_string(&Application::Co2).unwrap(), "\"CO2\"");
    }

    #[test]
    #[should_panic(expected = "Henry's constant must be positive")]
    fn test_negative_henry_panics() {
        ContaminantProperties::new("X", "X", -1.0, 50.0);
    }

    #[test]
    #[should_panic(expected = "One ionised species name is required per pKa")]
    fn test_mismatched_acid_constants_panic() {
        ContaminantProperties::new("X", "X", 1.0, 50.0).with_acid_constants(&[4.0, 9.0], &["X-"]);
    }
}
