//! Helper functions for integration tests

use strip_rs::chemistry::WaterChemistry;
use strip_rs::models::{Application, HenrySpeciationOracle};
use strip_rs::solver::{ColumnBoundaries, Profile, Scenario};

/// TCE column on pure water
pub fn voc_scenario(feed_mg_l: f64, air_water_ratio: f64) -> Scenario {
    Scenario::new(
        Box::new(HenrySpeciationOracle::default()),
        Application::Voc,
        ColumnBoundaries::new(feed_mg_l, 7.0).with_provisional_outlet(feed_mg_l * 1e-3),
    )
    .with_water(WaterChemistry::pure())
    .with_air_water_ratio(air_water_ratio)
}

/// CO2 degasser: 100 mg/L at pH 7.5 in pure water, A/W 30
pub fn co2_scenario() -> Scenario {
    Scenario::new(
        Box::new(HenrySpeciationOracle::default()),
        Application::Co2,
        ColumnBoundaries::new(100.0, 7.5).with_provisional_outlet(10.0),
    )
    .with_water(WaterChemistry::pure())
    .with_air_water_ratio(30.0)
}

/// Kremser outlet of `stages` ideal stages with stripping factor `s`
pub fn kremser_outlet(feed: f64, s: f64, stages: usize) -> f64 {
    feed * (s - 1.0) / (s.powi(stages as i32 + 1) - 1.0)
}

/// Relative error |a − b| / |b|
pub fn relative_error(computed: f64, reference: f64) -> f64 {
    if reference.abs() < 1e-300 {
        computed.abs()
    } else {
        ((computed - reference) / reference).abs()
    }
}

/// Assert two profiles agree entry by entry (liquid and gas)
pub fn assert_profiles_close(a: &Profile, b: &Profile, max_relative: f64, message: &str) {
    assert_eq!(a.len(), b.len(), "{}: stage count mismatch", message);
    for i in 0..a.len() {
        let (sa, sb) = (a.stage(i), b.stage(i));
        for (name, va, vb) in [
            ("liquid", sa.liquid_mg_l, sb.liquid_mg_l),
            ("gas", sa.gas_mole_fraction, sb.gas_mole_fraction),
        ] {
            let scale = va.abs().max(vb.abs()).max(1e-300);
            assert!(
                (va - vb).abs() / scale <= max_relative,
                "{}: {} at entry {} differs ({} vs {})",
                message, name, i, va, vb
            );
        }
    }
}
