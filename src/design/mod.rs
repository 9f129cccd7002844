//! Staged column design
//!
//! Turns a [`SimulationRequest`] and a [`PreliminaryDesign`] (heuristic
//! short-cut sizing) into a [`ColumnDesign`]:
//!
//! 1. Build the scenario (contaminant, background water, flows, feed pH)
//! 2. Find the smallest stage count meeting the outlet target, or solve a
//!    fixed stage count
//! 3. Check the mass balance
//! 4. Convert stages to packed height with the preliminary HTU
//! 5. Collect warnings
//!
//! # Example
//!
//! ```rust
//! use strip_rs::design::{simulate_column, PreliminaryDesign, SimulationRequest};
//!
//! let request = SimulationRequest::from_json(r#"{
//!     "application": "VOC",
//!     "water_flow_m3_h": 50.0,
//!     "inlet_concentration_mg_l": 1.0,
//!     "outlet_concentration_mg_l": 0.005,
//!     "min_stages": 1,
//!     "max_stages": 30
//! }"#).unwrap();
//! let preliminary = PreliminaryDesign::new(1.2, 4.0).with_htu(0.6);
//!
//! let design = simulate_column(&request, &preliminary).unwrap();
//! assert!(design.is_valid());
//! assert!(design.removal_percent > 99.5);
//! ```

mod height;
mod request;
mod result;

pub use height::{PackedHeight, PackingType, PreliminaryDesign, packed_height};
pub use request::{SimulationRequest, WaterInput};
pub use result::{ColumnDesign, ConvergenceInfo, DesignWarning, Severity, StageProfiles, WarningKind};

use crate::chemistry::EquilibriumOracle;
use crate::error::StrippingResult;
use crate::models::HenrySpeciationOracle;
use crate::solver::{
    ColumnBoundaries,
    CounterCurrentSolver,
    Scenario,
    Solver,
    StageCountSearch,
    validate_mass_balance,
};

/// Staged height above this multiple of the heuristic height is flagged
pub const HEIGHT_RATIO_WARNING: f64 = 1.5;

/// Simulate with the built-in Henry/speciation oracle
///
/// The oracle knows every application default plus the request's contaminant.
pub fn simulate_column(request: &SimulationRequest, preliminary: &PreliminaryDesign) -> StrippingResult<ColumnDesign> {
    let oracle = HenrySpeciationOracle::default().with_species(request.contaminant_properties());
    simulate_column_with(request, preliminary, Box::new(oracle))
}

/// Simulate with a caller-supplied oracle
pub fn simulate_column_with(
    request: &SimulationRequest,
    preliminary: &PreliminaryDesign,
    oracle: Box<dyn EquilibriumOracle>,
) -> StrippingResult<ColumnDesign> {
    // ====== Step 1: Scenario ======

    request.validate()?;
    let config = request.solver_configuration();
    let water = request.water.to_water_chemistry()?;
    let mut warnings = Vec::new();

    if water.has_charge_imbalance() {
        let message = format!(
            "background water ({}) has a charge-balance error of {:.1} %",
            water.source(),
            water.charge_balance_percent()
        );
        log::warn!("{message}");
        warnings.push(DesignWarning::new(WarningKind::ChargeBalance, Severity::Warning, message));
    }

    let scenario = Scenario::new(
        oracle,
        request.application,
        ColumnBoundaries::new(request.inlet_concentration_mg_l, request.water_ph)
            .with_provisional_outlet(request.outlet_concentration_mg_l),
    )
    .with_contaminant(request.contaminant_properties())
    .with_water(water)
    .with_water_flow(request.water_flow_m3_h)
    .with_air_water_ratio(request.air_water_ratio)
    .with_temperature_k(request.temperature_k());

    log::info!(
        "staged simulation: {} {} -> {} mg/L, {} m3/h, A/W {}",
        request.application,
        request.inlet_concentration_mg_l,
        request.outlet_concentration_mg_l,
        request.water_flow_m3_h,
        request.air_water_ratio
    );

    // ====== Step 2: Stage count ======

    let (stages, outcome, trials, bisection_steps) = if request.find_optimal_stages {
        let found = StageCountSearch::new().find_minimal_stages(
            &scenario,
            &config,
            request.outlet_concentration_mg_l,
            request.min_stages,
            request.max_stages,
        )?;
        (found.stages, found.outcome, found.trials, found.bisection_steps)
    } else {
        let stages = request
            .num_stages
            .or(preliminary.initial_stages)
            .unwrap_or_else(|| preliminary.guessed_stages());
        log::info!("using fixed stage count N = {stages}");
        let outcome = CounterCurrentSolver::new().solve(&scenario, &config, stages)?;
        (stages, outcome, Vec::new(), 0)
    };

    // ====== Step 3: Validation ======

    if !outcome.converged() {
        warnings.push(DesignWarning::new(
            WarningKind::NotConverged,
            Severity::Critical,
            format!(
                "profile did not converge in {} sweeps (last change {:.2e}); results are indicative only",
                outcome.iterations(),
                outcome.tracker.last_change
            ),
        ));
    }

    let mass_balance = validate_mass_balance(&outcome.profile, &scenario);
    if !mass_balance.passed {
        warnings.push(DesignWarning::new(
            WarningKind::MassBalance,
            Severity::Critical,
            format!(
                "mass balance error {:.2} % exceeds {:.1} %",
                mass_balance.error_percent(),
                mass_balance.tolerance * 100.0
            ),
        ));
    }

    if outcome.efficiency_adapted {
        warnings.push(DesignWarning::new(
            WarningKind::AdaptiveEfficiency,
            Severity::Warning,
            format!(
                "stage efficiency lowered below {} in high-pH stages; the profile reflects the lower efficiency",
                config.efficiency.declared(request.application)
            ),
        ));
    }

    // ====== Step 4: Height ======

    let height = packed_height(stages, preliminary);
    if height.htu_fallback {
        warnings.push(DesignWarning::new(
            WarningKind::HtuFallback,
            Severity::Info,
            format!(
                "HTU not provided, assumed {:.2} m for {:?} packing",
                height.htu_m, preliminary.packing_type
            ),
        ));
    }

    if preliminary.tower_height_m > 0.0 {
        let ratio = height.height_m / preliminary.tower_height_m;
        if ratio > HEIGHT_RATIO_WARNING {
            let message = format!(
                "staged height {:.2} m is {:.1}x the heuristic {:.2} m, pH drift is significant",
                height.height_m, ratio, preliminary.tower_height_m
            );
            log::warn!("{message}");
            warnings.push(DesignWarning::new(WarningKind::HeightRatio, Severity::Warning, message));
        }
    }

    // ====== Step 5: Result ======

    let outlet_mg_l = outcome.outlet_mg_l();
    let removal_percent =
        (request.inlet_concentration_mg_l - outlet_mg_l) / request.inlet_concentration_mg_l * 100.0;

    log::info!(
        "N = {} stages, height {:.2} m, outlet {:.4e} mg/L ({:.2} % removal), {} warning(s)",
        stages,
        height.height_m,
        outlet_mg_l,
        removal_percent,
        warnings.len()
    );

    Ok(ColumnDesign {
        application: request.application,
        tower_height_m: height.height_m,
        tower_diameter_m: preliminary.tower_diameter_m,
        theoretical_stages: stages,
        hetp_m: height.hetp_m,
        htu_m: height.htu_m,
        outlet_mg_l,
        removal_percent,
        efficiency_adapted: outcome.efficiency_adapted,
        stage_profiles: StageProfiles::from(&outcome.profile),
        convergence: ConvergenceInfo {
            status: outcome.tracker.status,
            converged: outcome.converged(),
            inner_iterations: outcome.iterations(),
            final_change: outcome.tracker.last_change,
            bisection_steps,
            trials,
        },
        mass_balance,
        warnings,
    })
}
