//! Example: TCE air stripper - staged design from a JSON request
//!
//! A groundwater remediation tower removing trichloroethylene (TCE):
//!
//! - Feed: 10 mg/L TCE, 100 m³/h, pure background water
//! - Target: 5 µg/L
//! - Air/water ratio: 25
//! - Preliminary design: 1.8 m diameter, 6 m packed, HTU 0.6 m
//!
//! Searches the smallest stage count, prints the profile, writes the design
//! as JSON and, with the `plotting` feature, the stage profile as PNG.
//!
//! ```bash
//! RUST_LOG=info cargo run --example voc_tower
//! ```

use std::time::Instant;

use strip_rs::prelude::*;

const REQUEST: &str = r#"{
    "application": "VOC",
    "water_flow_m3_h": 100.0,
    "inlet_concentration_mg_l": 10.0,
    "outlet_concentration_mg_l": 0.005,
    "air_water_ratio": 25.0,
    "temperature_c": 15.0,
    "water": {},
    "min_stages": 1,
    "max_stages": 40
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("═══════════════════════════════════════════════════════");
    println!("  TCE Air Stripper - Staged Design");
    println!("═══════════════════════════════════════════════════════\n");

    // ====== Request ======

    let request = SimulationRequest::from_json(REQUEST)?;
    let preliminary = PreliminaryDesign::new(1.8, 6.0).with_htu(0.6);

    println!("Request:");
    println!("  Inlet       : {} mg/L", request.inlet_concentration_mg_l);
    println!("  Target      : {} mg/L", request.outlet_concentration_mg_l);
    println!("  Water flow  : {} m³/h", request.water_flow_m3_h);
    println!("  Air/water   : {}", request.air_water_ratio);
    println!("  Temperature : {} °C\n", request.temperature_c);

    // ====== Simulation ======

    let start = Instant::now();
    let design = simulate_column(&request, &preliminary)?;
    let elapsed = start.elapsed();

    println!("Design ({:.1} ms):", elapsed.as_secs_f64() * 1e3);
    println!("  Stages      : {}", design.theoretical_stages);
    println!("  HETP        : {:.2} m", design.hetp_m);
    println!("  Height      : {:.2} m (heuristic {:.2} m)", design.tower_height_m, preliminary.tower_height_m);
    println!("  Outlet      : {:.3e} mg/L", design.outlet_mg_l);
    println!("  Removal     : {:.3} %", design.removal_percent);
    println!("  Mass balance: {:.4} % error", design.mass_balance.error_percent());
    println!("  Trials      : {}\n", design.convergence.trials.len());

    println!("Stage   Liquid (mg/L)   Gas (ppmv)     pH");
    let profiles = &design.stage_profiles;
    for (i, stage) in profiles.stage_numbers.iter().enumerate().rev() {
        println!(
            "{:>5}   {:>13.4e}   {:>10.3}   {:>5.2}",
            stage, profiles.liquid_conc_mg_l[i], profiles.gas_conc_ppm[i], profiles.ph[i]
        );
    }

    for warning in &design.warnings {
        println!("{warning}");
    }

    // ====== Output ======

    let tmp_dir = std::env::temp_dir();
    let json_path = tmp_dir.join("voc_tower_design.json");
    std::fs::write(&json_path, design.to_json()?)?;
    println!("\nDesign written to {}", json_path.display());

    #[cfg(feature = "plotting")]
    {
        use strip_rs::output::{PlotConfig, plot_stage_profiles};

        let png_path = tmp_dir.join("voc_tower_profile.png");
        let config = PlotConfig::stage_profile(format!("TCE stripper, {} stages", design.theoretical_stages));
        plot_stage_profiles(&design.stage_profiles, &png_path.to_string_lossy(), Some(&config))?;
        println!("Profile plotted to {}", png_path.display());
    }

    Ok(())
}
