//! Stage efficiency policy
//!
//! Maps (application class, local pH regime) to the Murphree efficiency used
//! by a stage. The efficiency is a **physical** stage parameter: lowering it
//! reduces the mass transferred per stage and therefore changes the converged
//! profile, not only the path to it.
//!
//! The adaptive policy lowers the efficiency of carbonate and sulfide stages
//! once their liquid enters the high-pH regime, where a full equilibrium step
//! tends to overshoot. Whenever that happens the sweep reports it
//! (`SweepOutcome::efficiency_adapted`, a `warn!` log and a design warning).
//! Callers who only want a numerical damping that leaves the converged answer
//! untouched should use [`SolverConfiguration::with_relaxation`](crate::solver::SolverConfiguration::with_relaxation)
//! together with [`EfficiencyPolicy::uniform`].

use serde::{Deserialize, Serialize};

use crate::models::Application;

/// Carbonate systems are stiff from this pH upward
pub const CARBONATE_HIGH_PH: f64 = 7.0;

/// Sulfide systems are stiff from this pH upward
pub const SULFIDE_HIGH_PH: f64 = 8.0;

// =================================================================================================
// pH Regime
// =================================================================================================

/// Local chemistry regime of a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhRegime {
    /// Below the application's stiffness threshold (always for non-ionising solutes)
    Normal,

    /// At or above the threshold
    HighPh,
}

impl PhRegime {
    /// Regime of a stage at a given pH
    pub fn classify(application: Application, ph: f64) -> Self {
        let threshold = match application {
            Application::Co2 => CARBONATE_HIGH_PH,
            Application::H2s => SULFIDE_HIGH_PH,
            Application::Voc | Application::General => return PhRegime::Normal,
        };
        if ph >= threshold { PhRegime::HighPh } else { PhRegime::Normal }
    }
}

// =================================================================================================
// Rules
// =================================================================================================

/// Efficiency for one application in one regime
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyRule {
    pub application: Application,
    pub regime: PhRegime,
    pub efficiency: f64,
}

impl EfficiencyRule {
    /// # Panics
    ///
    /// Panics when `efficiency` is not in ]0, 1].
    pub fn new(application: Application, regime: PhRegime, efficiency: f64) -> Self {
        assert!(
            efficiency > 0.0 && efficiency <= 1.0,
            "Stage efficiency must be in ]0, 1], got {}",
            efficiency
        );
        Self { application, regime, efficiency }
    }
}

// =================================================================================================
// Policy
// =================================================================================================

/// Efficiency lookup used by every stage of a sweep
///
/// # Example
///
/// ```rust
/// use strip_rs::models::Application;
/// use strip_rs::solver::EfficiencyPolicy;
///
/// let policy = EfficiencyPolicy::adaptive();
/// assert_eq!(policy.efficiency(Application::Voc, 7.5), 0.85);
/// assert_eq!(policy.efficiency(Application::Co2, 6.5), 0.7);
/// assert_eq!(policy.efficiency(Application::Co2, 7.5), 0.35);
/// assert!(policy.is_reduced(Application::Co2, 7.5));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyPolicy {
    /// Efficiency of any (application, regime) without a rule
    pub nominal: f64,

    /// Overrides, first match wins
    #[serde(default)]
    pub rules: Vec<EfficiencyRule>,
}

impl EfficiencyPolicy {
    /// Same efficiency everywhere
    ///
    /// # Panics
    ///
    /// Panics when `efficiency` is not in ]0, 1].
    pub fn uniform(efficiency: f64) -> Self {
        assert!(
            efficiency > 0.0 && efficiency <= 1.0,
            "Stage efficiency must be in ]0, 1], got {}",
            efficiency
        );
        Self { nominal: efficiency, rules: Vec::new() }
    }

    /// Default policy
    ///
    /// | Application | Normal | High pH |
    /// |-------------|--------|---------|
    /// | CO2         | 0.70   | 0.35 (pH ≥ 7) |
    /// | H2S         | 0.70   | 0.50 (pH ≥ 8) |
    /// | VOC/General | 0.85   | –       |
    pub fn adaptive() -> Self {
        Self {
            nominal: 0.85,
            rules: vec![
                EfficiencyRule::new(Application::Co2, PhRegime::Normal, 0.70),
                EfficiencyRule::new(Application::Co2, PhRegime::HighPh, 0.35),
                EfficiencyRule::new(Application::H2s, PhRegime::Normal, 0.70),
                EfficiencyRule::new(Application::H2s, PhRegime::HighPh, 0.50),
            ],
        }
    }

    /// Add or replace a rule
    pub fn with_rule(mut self, rule: EfficiencyRule) -> Self {
        self.rules
            .retain(|r| !(r.application == rule.application && r.regime == rule.regime));
        self.rules.push(rule);
        self
    }

    fn lookup(&self, application: Application, regime: PhRegime) -> f64 {
        self.rules
            .iter()
            .find(|r| r.application == application && r.regime == regime)
            .map_or(self.nominal, |r| r.efficiency)
    }

    /// Efficiency of a stage whose liquid sits at `ph`
    pub fn efficiency(&self, application: Application, ph: f64) -> f64 {
        self.lookup(application, PhRegime::classify(application, ph))
    }

    /// Efficiency the design declares for the application (normal regime)
    pub fn declared(&self, application: Application) -> f64 {
        self.lookup(application, PhRegime::Normal)
    }

    /// Whether the stage runs below the declared efficiency
    pub fn is_reduced(&self, application: Application, ph: f64) -> bool {
        self.efficiency(application, ph) < self.declared(application)
    }

    /// Check every factor lies in ]0, 1]
    pub fn validate(&self) -> Result<(), String> {
        let valid = |e: f64| e > 0.0 && e <= 1.0;
        if !valid(self.nominal) {
            return Err(format!("nominal efficiency must be in ]0, 1], got {}", self.nominal));
        }
        if let Some(rule) = self.rules.iter().find(|r| !valid(r.efficiency)) {
            return Err(format!(
                "efficiency for {} ({:?}) must be in ]0, 1], got {}",
                rule.application, rule.regime, rule.efficiency
            ));
        }
        Ok(())
    }
}

impl Default for EfficiencyPolicy {
    fn default() -> Self {
        Self::adaptive()
    }
}

// =================================================================================================
// Tests
// =================================================================================================
