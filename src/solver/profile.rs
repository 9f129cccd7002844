//! Column profile
//!
//! A [`Profile`] holds N+1 stage snapshots ordered **bottom to top**:
//!
//! ```text
//!   index N   ── top stage      (liquid feed enters, gas leaves)
//!   index N-1
//!     ...
//!   index 1   ── bottom stage
//!   index 0   ── bottom boundary (liquid outlet collected, clean air enters)
//! ```
//!
//! Entries 1..=N are theoretical stages; entry *i* records the streams that
//! leave stage *i*. Entry 0 is the bottom boundary: its liquid is the column
//! outlet (what leaves stage 1) and its gas is the clean-air inlet.
//!
//! Two values are boundary constants and never unknowns:
//! - the liquid entering stage N is the feed, stored apart from the stage
//!   vectors so that no update can overwrite it;
//! - the gas at index 0 is [`CLEAN_GAS_INLET`] and is never written.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::solver::boundary::CLEAN_GAS_INLET;

/// Absolute floor of the per-entry change denominators
///
/// Keeps entries that are exactly zero (the boundary gas, a clean starting
/// gas profile) from dividing by zero without masking the deep-stage liquid
/// of a tall column, which can fall far below any practical target.
pub const CHANGE_FLOOR: f64 = 1e-30;

// =================================================================================================
// Stage State
// =================================================================================================

/// Exit condition of one stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageState {
    /// Total contaminant in the liquid (mg/L)
    pub liquid_mg_l: f64,

    /// Contaminant mole fraction in the gas
    pub gas_mole_fraction: f64,

    /// Liquid pH
    pub ph: f64,

    /// Strippable (neutral) fraction α₀
    pub alpha0: f64,

    /// Temperature (K)
    pub temperature_k: f64,
}

impl StageState {
    /// Concentrations non-negative and finite, α₀ in [0, 1], pH finite
    pub fn is_physical(&self) -> bool {
        self.liquid_mg_l.is_finite()
            && self.liquid_mg_l >= 0.0
            && self.gas_mole_fraction.is_finite()
            && (0.0..1.0).contains(&self.gas_mole_fraction)
            && self.ph.is_finite()
            && (0.0..=1.0).contains(&self.alpha0)
            && self.temperature_k.is_finite()
            && self.temperature_k > 0.0
    }
}

// =================================================================================================
// Profile Quantities
// =================================================================================================

/// Per-stage quantities stored in a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileQuantity {
    /// Total liquid concentration (mg/L)
    LiquidConcentration,

    /// Gas mole fraction
    GasMoleFraction,

    /// Liquid pH
    Ph,

    /// Strippable fraction α₀
    StrippableFraction,
}

impl std::fmt::Display for ProfileQuantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ProfileQuantity::LiquidConcentration => "liquid concentration",
            ProfileQuantity::GasMoleFraction => "gas mole fraction",
            ProfileQuantity::Ph => "pH",
            ProfileQuantity::StrippableFraction => "strippable fraction",
        };
        f.write_str(label)
    }
}

// =================================================================================================
// Profile
// =================================================================================================

/// Full column state, one entry per stage plus the bottom boundary
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    feed_mg_l: f64,
    temperature_k: f64,
    liquid: DVector<f64>,
    gas: DVector<f64>,
    ph: DVector<f64>,
    alpha0: DVector<f64>,
}

impl Profile {
    /// Starting profile
    ///
    /// Liquid is interpolated linearly between the provisional outlet
    /// (index 0) and the feed (index N). Gas is clean everywhere. pH and α₀
    /// take their feed values.
    ///
    /// # Panics
    ///
    /// Panics when `stages == 0`.
    pub fn linear(
        stages: usize,
        feed_mg_l: f64,
        provisional_outlet_mg_l: f64,
        feed_ph: f64,
        feed_alpha0: f64,
        temperature_k: f64,
    ) -> Self {
        assert!(stages > 0, "A column needs at least 1 stage, got {}", stages);
        let n = stages as f64;
        let liquid = DVector::from_fn(stages + 1, |i, _| {
            provisional_outlet_mg_l + (feed_mg_l - provisional_outlet_mg_l) * i as f64 / n
        });
        Self {
            feed_mg_l,
            temperature_k,
            liquid,
            gas: DVector::from_element(stages + 1, CLEAN_GAS_INLET),
            ph: DVector::from_element(stages + 1, feed_ph),
            alpha0: DVector::from_element(stages + 1, feed_alpha0),
        }
    }

    /// Number of theoretical stages N
    pub fn stages(&self) -> usize {
        self.liquid.len() - 1
    }

    /// Number of entries (N + 1)
    pub fn len(&self) -> usize {
        self.liquid.len()
    }

    /// Always false: a profile holds at least one stage
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Feed concentration entering the top stage (mg/L)
    pub fn feed_mg_l(&self) -> f64 {
        self.feed_mg_l
    }

    /// Column temperature (K)
    pub fn temperature_k(&self) -> f64 {
        self.temperature_k
    }

    /// Snapshot of entry `index`
    pub fn stage(&self, index: usize) -> StageState {
        StageState {
            liquid_mg_l: self.liquid[index],
            gas_mole_fraction: self.gas[index],
            ph: self.ph[index],
            alpha0: self.alpha0[index],
            temperature_k: self.temperature_k,
        }
    }

    /// Liquid entering stage `stage` (from above)
    ///
    /// The top stage receives the feed.
    #[inline]
    pub fn liquid_inflow(&self, stage: usize) -> f64 {
        if stage == self.stages() {
            self.feed_mg_l
        } else {
            self.liquid[stage + 1]
        }
    }

    /// Gas entering stage `stage` (from below)
    ///
    /// The bottom stage receives clean air.
    #[inline]
    pub fn gas_inflow(&self, stage: usize) -> f64 {
        if stage == 1 { CLEAN_GAS_INLET } else { self.gas[stage - 1] }
    }

    /// Record the exit streams of a stage
    ///
    /// # Panics
    ///
    /// Panics when `stage` is 0 (the boundary) or above N.
    pub fn set_stage(&mut self, stage: usize, state: &StageState) {
        assert!(
            (1..=self.stages()).contains(&stage),
            "Stage index must be in [1, {}], got {}",
            self.stages(),
            stage
        );
        self.liquid[stage] = state.liquid_mg_l;
        self.gas[stage] = state.gas_mole_fraction;
        self.ph[stage] = state.ph;
        self.alpha0[stage] = state.alpha0;
    }

    /// Collect the bottom-stage liquid into the boundary entry
    ///
    /// Gas at the boundary stays at zero.
    pub fn close_bottom(&mut self) {
        self.liquid[0] = self.liquid[1];
        self.ph[0] = self.ph[1];
        self.alpha0[0] = self.alpha0[1];
    }

    /// Liquid outlet concentration (mg/L)
    pub fn outlet_mg_l(&self) -> f64 {
        self.liquid[0]
    }

    /// Gas outlet mole fraction (top stage)
    pub fn gas_outlet(&self) -> f64 {
        self.gas[self.stages()]
    }

    /// Liquid leaving the top stage (mg/L)
    pub fn top_liquid_mg_l(&self) -> f64 {
        self.liquid[self.stages()]
    }

    /// Whole column of one quantity, bottom to top
    pub fn get(&self, quantity: ProfileQuantity) -> &DVector<f64> {
        match quantity {
            ProfileQuantity::LiquidConcentration => &self.liquid,
            ProfileQuantity::GasMoleFraction => &self.gas,
            ProfileQuantity::Ph => &self.ph,
            ProfileQuantity::StrippableFraction => &self.alpha0,
        }
    }

    /// Both boundary constants hold
    pub fn boundaries_intact(&self, feed_mg_l: f64) -> bool {
        self.feed_mg_l == feed_mg_l && self.gas[0] == CLEAN_GAS_INLET
    }

    /// Largest per-entry relative change against a previous iterate
    ///
    /// Every liquid and gas entry counts on its own, the outlet (index 0)
    /// included, so the dilute bottom of the column has to settle as tightly
    /// as the concentrated top:
    ///
    /// ```text
    /// Δ = max_i  max( |L_i − L'_i| / (|L'_i| + ε) ,  |G_i − G'_i| / (|G'_i| + ε) )
    /// ```
    ///
    /// with ε = [`CHANGE_FLOOR`] and primes marking `previous`.
    pub fn relative_change(&self, previous: &Profile) -> f64 {
        fn largest(current: &DVector<f64>, previous: &DVector<f64>) -> f64 {
            current
                .iter()
                .zip(previous.iter())
                .map(|(c, p)| (c - p).abs() / (p.abs() + CHANGE_FLOOR))
                .fold(0.0, f64::max)
        }
        largest(&self.liquid, &previous.liquid).max(largest(&self.gas, &previous.gas))
    }

    /// Liquid non-increasing from top to bottom, within a relative slack
    pub fn is_monotonic(&self, slack: f64) -> bool {
        (0..self.stages()).all(|i| self.liquid[i] <= self.liquid[i + 1] * (1.0 + slack) + f64::EPSILON)
            && self.top_liquid_mg_l() <= self.feed_mg_l * (1.0 + slack)
    }

    /// First entry that is not physical, if any
    pub fn first_non_physical(&self) -> Option<usize> {
        (0..self.len()).find(|&i| !self.stage(i).is_physical())
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> Profile {
        Profile::linear(4, 10.0, 2.0, 7.0, 1.0, 298.15)
    }

    #[test]
    fn test_linear_initialisation() {
        let p = sample();
        assert_eq!(p.stages(), 4);
        assert_eq!(p.len(), 5);
        assert_relative_eq!(p.outlet_mg_l(), 2.0);
        assert_relative_eq!(p.top_liquid_mg_l(), 10.0);
        assert_relative_eq!(p.stage(2).liquid_mg_l, 6.0);
        assert!(p.get(ProfileQuantity::GasMoleFraction).iter().all(|&y| y == 0.0));
        assert!(p.get(ProfileQuantity::Ph).iter().all(|&ph| ph == 7.0));
    }

    #[test]
    fn test_inflows_use_boundary_constants() {
        let mut p = sample();
        let state = StageState {
            liquid_mg_l: 8.0,
            gas_mole_fraction: 1e-5,
            ph: 7.2,
            alpha0: 1.0,
            temperature_k: 298.15,
        };
        p.set_stage(4, &state);
        p.set_stage(1, &state);

        // Top stage is always fed by the feed, whatever it produced
        assert_relative_eq!(p.liquid_inflow(4), 10.0);
        assert_relative_eq!(p.liquid_inflow(3), 8.0);
        // Bottom stage is always fed clean air
        assert_eq!(p.gas_inflow(1), CLEAN_GAS_INLET);
        assert_relative_eq!(p.gas_inflow(2), 1e-5);
        assert!(p.boundaries_intact(10.0));
    }

    #[test]
    #[should_panic(expected = "Stage index must be in [1, 4]")]
    fn test_boundary_entry_cannot_be_set() {
        let mut p = sample();
        let state = p.stage(1);
        p.set_stage(0, &state);
    }

    #[test]
    fn test_close_bottom_copies_liquid_only() {
        let mut p = sample();
        let state = StageState {
            liquid_mg_l: 0.5,
            gas_mole_fraction: 2e-6,
            ph: 8.1,
            alpha0: 0.3,
            temperature_k: 298.15,
        };
        p.set_stage(1, &state);
        p.close_bottom();
        assert_relative_eq!(p.outlet_mg_l(), 0.5);
        assert_relative_eq!(p.stage(0).ph, 8.1);
        assert_eq!(p.stage(0).gas_mole_fraction, 0.0);
    }

    #[test]
    fn test_relative_change() {
        let a = sample();
        assert_eq!(a.relative_change(&a), 0.0);

        let mut b = a.clone();
        let mut s = b.stage(2);
        s.liquid_mg_l += 3.0;
        b.set_stage(2, &s);
        // Stage 2 held 6 mg/L; gas all zero
        assert_relative_eq!(b.relative_change(&a), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_relative_change_sees_the_dilute_outlet() {
        let mut a = sample();
        let mut s = a.stage(1);
        s.liquid_mg_l = 1e-9;
        a.set_stage(1, &s);
        a.close_bottom();

        // A shift invisible next to the 10 mg/L feed still counts at the outlet
        let mut b = a.clone();
        s.liquid_mg_l = 2e-9;
        b.set_stage(1, &s);
        b.close_bottom();
        assert_relative_eq!(b.relative_change(&a), 1.0, epsilon = 1e-9);

        // Gas leaving a clean start is measured against the floor
        let mut c = a.clone();
        let mut s = c.stage(3);
        s.gas_mole_fraction = 1e-20;
        c.set_stage(3, &s);
        assert!(c.relative_change(&a) > 1e9);
        assert_eq!(c.relative_change(&c), 0.0);
    }

    #[test]
    fn test_monotonic_detection() {
        let mut p = sample();
        assert!(p.is_monotonic(0.0));
        let mut s = p.stage(1);
        s.liquid_mg_l = 9.0;
        p.set_stage(1, &s);
        assert!(!p.is_monotonic(0.0));
    }

    #[test]
    fn test_non_physical_detection() {
        let mut p = sample();
        assert_eq!(p.first_non_physical(), None);
        let mut s = p.stage(3);
        s.liquid_mg_l = f64::NAN;
        p.set_stage(3, &s);
        assert_eq!(p.first_non_physical(), Some(3));
    }
}
