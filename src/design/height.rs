//! Theoretical stages to packed height
//!
//! ```text
//! HETP   = HTU × 1.2
//! height = N × HETP
//! ```
//!
//! HTU comes from the preliminary (heuristic) design. When that design has
//! none, a typical value for the packing family is used and flagged.

use serde::{Deserialize, Serialize};

/// Safety factor from HTU to HETP
pub const HETP_SAFETY_FACTOR: f64 = 1.2;

/// Typical HTU of structured packing (m)
pub const STRUCTURED_HTU_M: f64 = 0.4;

/// Typical HTU of random packing (m)
pub const RANDOM_HTU_M: f64 = 0.8;

/// Packed height per stage assumed when guessing a stage count (m)
pub const HEIGHT_PER_STAGE_GUESS_M: f64 = 0.5;

/// Fewest stages of a guessed column
pub const MIN_GUESSED_STAGES: usize = 10;

/// Packing family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackingType {
    Structured,
    #[default]
    Random,
}

impl PackingType {
    /// Typical HTU when none is known (m)
    pub fn typical_htu_m(&self) -> f64 {
        match self {
            PackingType::Structured => STRUCTURED_HTU_M,
            PackingType::Random => RANDOM_HTU_M,
        }
    }
}

/// Heuristic sizing the staged simulation refines
///
/// Produced by a rate-based short-cut design outside this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreliminaryDesign {
    pub tower_diameter_m: f64,
    pub tower_height_m: f64,
    #[serde(default)]
    pub htu_m: Option<f64>,
    #[serde(default)]
    pub packing_type: PackingType,
    #[serde(default)]
    pub initial_stages: Option<usize>,
}

impl PreliminaryDesign {
    pub fn new(tower_diameter_m: f64, tower_height_m: f64) -> Self {
        Self {
            tower_diameter_m,
            tower_height_m,
            htu_m: None,
            packing_type: PackingType::Random,
            initial_stages: None,
        }
    }

    pub fn with_htu(mut self, htu_m: f64) -> Self {
        self.htu_m = Some(htu_m);
        self
    }

    pub fn with_packing(mut self, packing_type: PackingType) -> Self {
        self.packing_type = packing_type;
        self
    }

    pub fn with_initial_stages(mut self, stages: usize) -> Self {
        self.initial_stages = Some(stages);
        self
    }

    /// Stage count implied by the heuristic height
    ///
    /// `max(10, floor(height / 0.5 m))`
    pub fn guessed_stages(&self) -> usize {
        let from_height = (self.tower_height_m / HEIGHT_PER_STAGE_GUESS_M).floor();
        let from_height = if from_height.is_finite() && from_height > 0.0 { from_height as usize } else { 0 };
        from_height.max(MIN_GUESSED_STAGES)
    }
}

/// Packed height of a column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PackedHeight {
    pub height_m: f64,
    pub hetp_m: f64,
    pub htu_m: f64,

    /// HTU was a packing-family default
    pub htu_fallback: bool,
}

/// Packed height of `stages` theoretical stages
///
/// ```rust
/// use strip_rs::design::{packed_height, PackingType, PreliminaryDesign};
///
/// let preliminary = PreliminaryDesign::new(1.5, 6.0).with_packing(PackingType::Structured);
/// let height = packed_height(10, &preliminary);
/// assert!(height.htu_fallback);
/// assert!((height.hetp_m - 0.48).abs() < 1e-12);
/// assert!((height.height_m - 4.8).abs() < 1e-12);
/// ```
pub fn packed_height(stages: usize, preliminary: &PreliminaryDesign) -> PackedHeight {
    let (htu_m, htu_fallback) = match preliminary.htu_m {
        Some(htu) if htu.is_finite() && htu > 0.0 => (htu, false),
        _ => {
            let htu = preliminary.packing_type.typical_htu_m();
            log::warn!(
                "no HTU in the preliminary design, using {htu:.2} m typical of {:?} packing",
                preliminary.packing_type
            );
            (htu, true)
        }
    };
    let hetp_m = htu_m * HETP_SAFETY_FACTOR;
    PackedHeight {
        height_m: stages as f64 * hetp_m,
        hetp_m,
        htu_m,
        htu_fallback,
    }
}

// =================================================================================================
// Tests
// =================================================================================================
