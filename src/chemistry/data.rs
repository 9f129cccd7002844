//! Constants, unit conversions and speciation helpers
//!
//! All concentration conversions between the mass basis used in design
//! reports (mg/L) and the molal basis used by equilibrium oracles go through
//! this module. The dilute-solution approximation (1 L of water ≈ 1 kg) is
//! applied here and nowhere else.

/// Gas constant (L·atm / (mol·K))
pub const R_GAS_L_ATM: f64 = 0.082_057_366;

/// Gas constant (J / (mol·K))
pub const R_GAS_J: f64 = 8.314;

/// Reference temperature for tabulated constants (K)
pub const T_REF_K: f64 = 298.15;

/// Standard pressure (atm)
pub const P_ATM: f64 = 1.0;

/// Litres per cubic metre
pub const LITERS_PER_M3: f64 = 1000.0;

/// Convert Celsius to Kelvin
#[inline]
pub fn celsius_to_kelvin(t_c: f64) -> f64 {
    t_c + 273.15
}

// =================================================================================================
// Concentration Conversions
// =================================================================================================

/// mg/L → mol/kgw (dilute solution, 1 L ≈ 1 kgw)
#[inline]
pub fn mg_per_l_to_mol_per_kgw(c_mg_l: f64, molar_mass: f64) -> f64 {
    c_mg_l / (molar_mass * 1000.0)
}

/// mol/kgw → mg/L (dilute solution, 1 L ≈ 1 kgw)
#[inline]
pub fn mol_per_kgw_to_mg_per_l(m: f64, molar_mass: f64) -> f64 {
    m * molar_mass * 1000.0
}

/// Moles of ideal gas in a volume at given temperature and pressure
#[inline]
pub fn ideal_gas_moles(volume_l: f64, temperature_k: f64, pressure_atm: f64) -> f64 {
    pressure_atm * volume_l / (R_GAS_L_ATM * temperature_k)
}

/// Mole fraction of a component in a carrier gas
#[inline]
pub fn mole_fraction(component_moles: f64, carrier_moles: f64) -> f64 {
    let total = component_moles + carrier_moles;
    if total > 0.0 { component_moles / total } else { 0.0 }
}

/// Component moles accompanying `carrier_moles` at mole fraction `y`
///
/// Inverse of [`mole_fraction`]. `y` must be below 1.
#[inline]
pub fn moles_from_fraction(y: f64, carrier_moles: f64) -> f64 {
    carrier_moles * y / (1.0 - y)
}

/// Mole fraction → ppm(v)
#[inline]
pub fn to_ppm(y: f64) -> f64 {
    y * 1.0e6
}

// =================================================================================================
// Temperature Dependence
// =================================================================================================

/// Henry's constant at temperature (van't Hoff)
///
/// ```text
/// H(T) = H_ref · exp[ ΔH/R · (1/T_ref − 1/T) ]
/// ```
///
/// `enthalpy_j_mol` is the volatilisation enthalpy: positive values make the
/// contaminant more volatile in warm water.
pub fn henry_at_temperature(henry_ref: f64, enthalpy_j_mol: f64, temperature_k: f64) -> f64 {
    henry_ref * (enthalpy_j_mol / R_GAS_J * (1.0 / T_REF_K - 1.0 / temperature_k)).exp()
}

/// pKw of water as a function of temperature
///
/// Empirical fit, pKw(298.15 K) ≈ 14.0.
pub fn pkw(temperature_k: f64) -> f64 {
    4470.99 / temperature_k - 6.0875 + 0.01706 * temperature_k
}

// =================================================================================================
// Weak-Acid Speciation
// =================================================================================================

/// Ionisation fractions of a polyprotic acid
///
/// Returns `[α₀, α₁, ..., αₙ]` where α₀ is the neutral (volatile) form and
/// αᵢ carries charge −i. `acid_constants` are successive Ka values.
pub fn ionization_fractions(h: f64, acid_constants: &[f64]) -> Vec<f64> {
    let mut terms = Vec::with_capacity(acid_constants.len() + 1);
    let mut product = 1.0;
    terms.push(1.0);
    for ka in acid_constants {
        product *= ka / h;
        terms.push(product);
    }
    let sum: f64 = terms.iter().sum();
    terms.iter().map(|t| t / sum).collect()
}

/// Mean negative charge per mole of a speciated acid
#[inline]
pub fn mean_charge(fractions: &[f64]) -> f64 {
    fractions
        .iter()
        .enumerate()
        .map(|(i, a)| i as f64 * a)
        .sum()
}

/// Strippable fraction α₀ at a given pH
///
/// 1.0 when `pkas` is empty (non-ionising contaminant).
pub fn strippable_fraction(ph: f64, pkas: &[f64]) -> f64 {
    if pkas.is_empty() {
        return 1.0;
    }
    let h = 10f64.powf(-ph);
    let kas: Vec<f64> = pkas.iter().map(|pk| 10f64.powf(-pk)).collect();
    ionization_fractions(h, &kas)[0]
}
