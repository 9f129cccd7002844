//! Design result surface
//!
//! [`ColumnDesign`] is what a caller (a report, a costing step) consumes. A
//! non-converged or unbalanced design is still returned, but its status
//! fields and warnings say so explicitly.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chemistry::data::to_ppm;
use crate::error::StrippingResult;
use crate::models::Application;
use crate::solver::{MassBalanceReport, Profile, ProfileQuantity, SweepStatus, TrialRecord};

// =================================================================================================
// Warnings
// =================================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// What a warning is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Sweep budget exhausted
    NotConverged,

    /// Mass balance outside the application's tolerance
    MassBalance,

    /// Some stages ran below the declared efficiency
    AdaptiveEfficiency,

    /// Background analysis not electroneutral
    ChargeBalance,

    /// Staged height well above the heuristic estimate (pH drift)
    HeightRatio,

    /// HTU taken from packing-family defaults
    HtuFallback,
}

/// Diagnostic attached to a design
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignWarning {
    pub kind: WarningKind,
    pub severity: Severity,
    pub message: String,
}

impl DesignWarning {
    pub fn new(kind: WarningKind, severity: Severity, message: impl Into<String>) -> Self {
        Self { kind, severity, message: message.into() }
    }
}

impl fmt::Display for DesignWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.severity, self.message)
    }
}

// =================================================================================================
// Profiles
// =================================================================================================

/// Column profiles, bottom (index 0) to top
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageProfiles {
    pub stage_numbers: Vec<usize>,
    pub liquid_conc_mg_l: Vec<f64>,
    pub gas_conc_ppm: Vec<f64>,
    pub ph: Vec<f64>,
    pub alpha_0: Vec<f64>,
}

impl From<&Profile> for StageProfiles {
    fn from(profile: &Profile) -> Self {
        let column = |q: ProfileQuantity| profile.get(q).iter().copied().collect::<Vec<f64>>();
        Self {
            stage_numbers: (0..profile.len()).collect(),
            liquid_conc_mg_l: column(ProfileQuantity::LiquidConcentration),
            gas_conc_ppm: column(ProfileQuantity::GasMoleFraction).into_iter().map(to_ppm).collect(),
            ph: column(ProfileQuantity::Ph),
            alpha_0: column(ProfileQuantity::StrippableFraction),
        }
    }
}

// =================================================================================================
// Convergence
// =================================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceInfo {
    pub status: SweepStatus,
    pub converged: bool,

    /// Sweeps of the reported profile
    pub inner_iterations: usize,

    /// Relative change of the last sweep
    pub final_change: f64,

    /// Stage-count bisection steps (0 for a fixed stage count)
    pub bisection_steps: usize,

    /// Stage-count trials (empty for a fixed stage count)
    pub trials: Vec<TrialRecord>,
}

// =================================================================================================
// Column design
// =================================================================================================

/// Result of a staged column simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDesign {
    pub application: Application,

    /// Packed height (m)
    pub tower_height_m: f64,

    /// Diameter, carried over from the preliminary design (m)
    pub tower_diameter_m: f64,

    pub theoretical_stages: usize,
    pub hetp_m: f64,
    pub htu_m: f64,

    /// Treated-water concentration (mg/L)
    pub outlet_mg_l: f64,

    /// (inlet − outlet) / inlet (%)
    pub removal_percent: f64,

    /// Some stages ran below the declared efficiency
    pub efficiency_adapted: bool,

    pub stage_profiles: StageProfiles,
    pub convergence: ConvergenceInfo,
    pub mass_balance: MassBalanceReport,
    pub warnings: Vec<DesignWarning>,
}

impl ColumnDesign {
    /// Converged and mass-balanced
    pub fn is_valid(&self) -> bool {
        self.convergence.converged && self.mass_balance.passed
    }

    pub fn has_warning(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> StrippingResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::StageState;

    #[test]
    fn test_stage_profiles_from_profile() {
        let mut profile = Profile::linear(2, 10.0, 1.0, 7.0, 1.0, 298.15);
        profile.set_stage(
            2,
            &StageState {
                liquid_mg_l: 4.0,
                gas_mole_fraction: 2.5e-6,
                ph: 7.3,
                alpha0: 0.9,
                temperature_k: 298.15,
            },
        );
        let profiles = StageProfiles::from(&profile);
        assert_eq!(profiles.stage_numbers, vec![0, 1, 2]);
        assert_eq!(profiles.liquid_conc_mg_l[2], 4.0);
        assert!((profiles.gas_conc_ppm[2] - 2.5).abs() < 1e-12);
        assert_eq!(profiles.ph, vec![7.0, 7.0, 7.3]);
    }

    #[test]
    fn test_warning_display_and_serde() {
        let w = DesignWarning::new(WarningKind::HtuFallback, Severity::Info, "typical HTU used");
        assert_eq!(w.to_string(), "[Info] typical HTU used");
        let json = serde_json::to_string(&w).unwrap();
        assert!(json.contains("\"htu_fallback\""));
        assert!(Severity::Critical > Severity::Warning);
    }
}
