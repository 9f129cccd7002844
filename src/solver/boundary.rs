//! Column boundary conditions
//!
//! A counter-current column has two independent boundaries:
//!
//! - **Top**: liquid feed at a fixed concentration and pH
//! - **Bottom**: clean carrier gas (zero contaminant)
//!
//! Both are constants of the problem. The solver never treats them as
//! unknowns, and no stage update may overwrite them. The target outlet
//! concentration is *not* a boundary: it only seeds the starting profile,
//! and the bottom outlet is whatever the converged column produces.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Contaminant mole fraction of the gas entering the bottom stage
pub const CLEAN_GAS_INLET: f64 = 0.0;

// =================================================================================================
// Column Boundaries
// =================================================================================================

/// Fixed inlet conditions of a column
///
/// # Examples
///
/// ```rust
/// use strip_rs::solver::ColumnBoundaries;
///
/// // 10 mg/L feed at pH 7, solution guessed to leave at 0.005 mg/L
/// let boundaries = ColumnBoundaries::new(10.0, 7.0).with_provisional_outlet(0.005);
/// assert!(boundaries.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnBoundaries {
    /// Contaminant total in the feed liquid (mg/L)
    pub feed_mg_l: f64,

    /// Feed pH, used to calibrate the background electrical balance
    pub feed_ph: f64,

    /// Outlet guess used for the starting liquid profile only (mg/L)
    pub provisional_outlet_mg_l: f64,
}

impl ColumnBoundaries {
    /// Feed boundary with a provisional outlet of 1 % of the feed
    pub fn new(feed_mg_l: f64, feed_ph: f64) -> Self {
        Self {
            feed_mg_l,
            feed_ph,
            provisional_outlet_mg_l: feed_mg_l * 0.01,
        }
    }

    /// Set the outlet guess (typically the design target)
    pub fn with_provisional_outlet(mut self, outlet_mg_l: f64) -> Self {
        self.provisional_outlet_mg_l = outlet_mg_l;
        self
    }

    /// Validate boundary values
    pub fn validate(&self) -> Result<(), String> {
        if !(self.feed_mg_l.is_finite() && self.feed_mg_l > 0.0) {
            return Err(format!("Feed concentration must be positive, got {}", self.feed_mg_l));
        }
        if !(self.feed_ph.is_finite() && (0.0..=14.0).contains(&self.feed_ph)) {
            return Err(format!("Feed pH must be in [0, 14], got {}", self.feed_ph));
        }
        if !(self.provisional_outlet_mg_l.is_finite() && self.provisional_outlet_mg_l >= 0.0) {
            return Err(format!(
                "Provisional outlet must be non-negative, got {}",
                self.provisional_outlet_mg_l
            ));
        }
        if self.provisional_outlet_mg_l > self.feed_mg_l {
            return Err(format!(
                "Provisional outlet ({} mg/L) exceeds the feed ({} mg/L)",
                self.provisional_outlet_mg_l, self.feed_mg_l
            ));
        }
        Ok(())
    }
}

impl fmt::Display for ColumnBoundaries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "feed {} mg/L at pH {}, clean gas inlet (outlet guess {} mg/L)",
            self.feed_mg_l, self.feed_ph, self.provisional_outlet_mg_l
        )
    }
}

// =================================================================================================
// Tests
// =================================================================================================
