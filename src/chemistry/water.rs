//! Background water chemistry
//!
//! Ion analyses are given in mg/L of the ion. They are mapped onto oracle
//! components (element/valence keys) in mol/kgw:
//!
//! | Ion       | Component    | Charge |
//! |-----------|--------------|--------|
//! | `HCO3-`   | `Alkalinity` | −1 (eq) |
//! | `CO3-2`   | `C(4)`       | −2     |
//! | `SO4-2`   | `S(6)`       | −2     |
//! | `NO3-`    | `N(5)`       | −1     |
//! | `HS-`     | `S(-2)`      | −1     |
//!
//! Because carbonate maps to `C(4)`, a CO₂ contaminant cannot be declared on
//! top of a carbonate-bearing water: the oracle composition rejects the
//! second `C(4)` declaration.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chemistry::data::mg_per_l_to_mol_per_kgw;
use crate::chemistry::traits::{Composition, UnitBasis};
use crate::error::{OracleError, StrippingError, StrippingResult};

/// Charge-balance error above which an analysis is reported as suspicious (%)
pub const CHARGE_BALANCE_WARNING_PERCENT: f64 = 5.0;

// =================================================================================================
// Ion Table
// =================================================================================================

/// One ion accepted in a water analysis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IonDefinition {
    /// Ion symbol as written in analyses (`"Ca2+"`)
    pub symbol: &'static str,

    /// Ionic charge
    pub charge: i32,

    /// Molar mass of the ion (g/mol)
    pub molar_mass: f64,

    /// Oracle component key
    pub component: &'static str,
}

const fn ion(symbol: &'static str, charge: i32, molar_mass: f64, component: &'static str) -> IonDefinition {
    IonDefinition { symbol, charge, molar_mass, component }
}

/// Ions accepted in water analyses
pub const ION_TABLE: &[IonDefinition] = &[
    // cations
    ion("Na+", 1, 22.99, "Na"),
    ion("Ca2+", 2, 40.08, "Ca"),
    ion("Mg2+", 2, 24.31, "Mg"),
    ion("K+", 1, 39.10, "K"),
    ion("Fe2+", 2, 55.85, "Fe(2)"),
    ion("Fe3+", 3, 55.85, "Fe(3)"),
    ion("Mn2+", 2, 54.94, "Mn"),
    ion("Ba2+", 2, 137.33, "Ba"),
    ion("Sr2+", 2, 87.62, "Sr"),
    ion("NH4+", 1, 18.04, "N(-3)"),
    // anions
    ion("Cl-", -1, 35.45, "Cl"),
    ion("SO4-2", -2, 96.06, "S(6)"),
    ion("HCO3-", -1, 61.02, "Alkalinity"),
    ion("CO3-2", -2, 60.01, "C(4)"),
    ion("NO3-", -1, 62.00, "N(5)"),
    ion("F-", -1, 19.00, "F"),
    ion("PO4-3", -3, 94.97, "P"),
    ion("SiO3-2", -2, 76.08, "Si"),
    ion("Br-", -1, 79.90, "Br"),
    ion("B(OH)4-", -1, 78.84, "B"),
    ion("HS-", -1, 33.07, "S(-2)"),
];

/// Look up an ion by symbol
pub fn ion_definition(symbol: &str) -> Option<&'static IonDefinition> {
    ION_TABLE.iter().find(|def| def.symbol == symbol)
}

/// Charge carried by one mole of a conservative (non-volatile) component
///
/// Returns `None` for components that are not part of the ion table.
pub fn component_charge(component: &str) -> Option<f64> {
    ION_TABLE
        .iter()
        .find(|def| def.component == component)
        .map(|def| def.charge as f64)
}

// =================================================================================================
// Templates
// =================================================================================================

/// Typical water analyses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaterTemplate {
    Municipal,
    Brackish,
    Seawater,
}

impl WaterTemplate {
    /// Ion concentrations (mg/L)
    pub fn ions(&self) -> &'static [(&'static str, f64)] {
        match self {
            WaterTemplate::Municipal => &[
                ("Na+", 50.0),
                ("Ca2+", 40.0),
                ("Mg2+", 10.0),
                ("K+", 5.0),
                ("Cl-", 60.0),
                ("SO4-2", 30.0),
                ("HCO3-", 120.0),
                ("NO3-", 10.0),
            ],
            WaterTemplate::Brackish => &[
                ("Na+", 1000.0),
                ("Ca2+", 100.0),
                ("Mg2+", 50.0),
                ("K+", 20.0),
                ("Cl-", 1500.0),
                ("SO4-2", 200.0),
                ("HCO3-", 200.0),
            ],
            WaterTemplate::Seawater => &[
                ("Na+", 10770.0),
                ("Mg2+", 1290.0),
                ("Ca2+", 412.0),
                ("K+", 399.0),
                ("Sr2+", 7.9),
                ("Cl-", 19350.0),
                ("SO4-2", 2712.0),
                ("HCO3-", 142.0),
                ("Br-", 67.0),
                ("B(OH)4-", 4.5),
                ("F-", 1.3),
            ],
        }
    }

    /// Template name
    pub fn name(&self) -> &'static str {
        match self {
            WaterTemplate::Municipal => "municipal",
            WaterTemplate::Brackish => "brackish",
            WaterTemplate::Seawater => "seawater",
        }
    }
}

// =================================================================================================
// Water Chemistry
// =================================================================================================

/// Validated ion analysis of the water being treated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterChemistry {
    /// Ion concentrations (mg/L)
    ions_mg_l: BTreeMap<String, f64>,

    /// Where the analysis came from (`"user"`, `"template:municipal"`)
    source: String,
}

impl WaterChemistry {
    /// Build from an ion analysis, validating every entry
    pub fn from_ions<I, S>(ions: I) -> StrippingResult<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut ions_mg_l = BTreeMap::new();
        for (symbol, value) in ions {
            let symbol = symbol.into();
            if ion_definition(&symbol).is_none() {
                return Err(StrippingError::InvalidConfiguration(format!(
                    "unknown ion `{symbol}` in water analysis"
                )));
            }
            if !value.is_finite() || value < 0.0 {
                return Err(StrippingError::InvalidConfiguration(format!(
                    "concentration of {symbol} must be a non-negative number, got {value}"
                )));
            }
            ions_mg_l.insert(symbol, value);
        }
        if ions_mg_l.is_empty() {
            return Err(StrippingError::InvalidConfiguration(
                "water analysis cannot be empty".to_string(),
            ));
        }
        Ok(Self { ions_mg_l, source: "user".to_string() })
    }

    /// Build from a template
    pub fn template(template: WaterTemplate) -> Self {
        let ions_mg_l = template
            .ions()
            .iter()
            .map(|(symbol, value)| (symbol.to_string(), *value))
            .collect();
        Self {
            ions_mg_l,
            source: format!("template:{}", template.name()),
        }
    }

    /// Pure water (no background ions)
    pub fn pure() -> Self {
        Self {
            ions_mg_l: BTreeMap::new(),
            source: "pure".to_string(),
        }
    }

    /// Parse a JSON object of `ion: mg/L` pairs
    ///
    /// ```rust
    /// use strip_rs::chemistry::WaterChemistry;
    ///
    /// let water = WaterChemistry::from_json(r#"{"Na+": 46.0, "Cl-": 71.0}"#).unwrap();
    /// assert!(water.charge_balance_percent().abs() < 1.0);
    /// ```
    pub fn from_json(json: &str) -> StrippingResult<Self> {
        let ions: BTreeMap<String, f64> = serde_json::from_str(json)?;
        Self::from_ions(ions)
    }

    /// Read a JSON analysis from disk
    pub fn from_json_file(path: impl AsRef<Path>) -> StrippingResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Ion concentrations (mg/L)
    pub fn ions(&self) -> &BTreeMap<String, f64> {
        &self.ions_mg_l
    }

    /// Origin of the analysis
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Charge-balance error (%), positive for excess cations
    ///
    /// ```text
    /// CB = (Σcat − Σan) / (Σcat + Σan) · 100      (meq/L)
    /// ```
    pub fn charge_balance_percent(&self) -> f64 {
        let (cations, anions) = self.equivalents();
        let total = cations + anions;
        if total == 0.0 {
            return 0.0;
        }
        (cations - anions) / total * 100.0
    }

    /// Whether the charge-balance error exceeds the warning threshold
    pub fn has_charge_imbalance(&self) -> bool {
        self.charge_balance_percent().abs() > CHARGE_BALANCE_WARNING_PERCENT
    }

    /// Convert to an oracle composition (mol/kgw)
    ///
    /// Fails if two ions map to the same component.
    pub fn to_composition(&self) -> Result<Composition, OracleError> {
        let mut composition = Composition::new(UnitBasis::MolPerKgw);
        for (symbol, value) in &self.ions_mg_l {
            let def = ion_definition(symbol)
                .ok_or_else(|| OracleError::UnknownComponent(symbol.clone()))?;
            let moles = mg_per_l_to_mol_per_kgw(*value, def.molar_mass);
            // Alkalinity is declared in equivalents
            let amount = if def.component == "Alkalinity" {
                moles * def.charge.unsigned_abs() as f64
            } else {
                moles
            };
            composition.declare(def.component, amount)?;
        }
        Ok(composition)
    }

    /// Cation and anion equivalents (meq/L)
    fn equivalents(&self) -> (f64, f64) {
        self.ions_mg_l
            .iter()
            .filter_map(|(symbol, value)| ion_definition(symbol).map(|def| (def, value)))
            .fold((0.0, 0.0), |(cat, an), (def, value)| {
                let meq = value / def.molar_mass * def.charge.unsigned_abs() as f64;
                if def.charge > 0 { (cat + meq, an) } else { (cat, an + meq) }
            })
    }
}

impl Default for WaterChemistry {
    fn default() -> Self {
        Self::template(WaterTemplate::Municipal)
    }
}

// =================================================================================================
// Tests
// =================================================================================================
