//! Stage profile plotting
//!
//! Liquid concentration and pH against stage number, bottom (0) to top (N).
//! The concentration axis is log10 by default since a well-designed stripper
//! spans several decades.
//!
//! # Usage
//!
//! ```rust,ignore
//! use strip_rs::output::visualization::plot_stage_profiles;
//!
//! let design = simulate_column(&request, &preliminary)?;
//! plot_stage_profiles(&design.stage_profiles, "profile.png", None)?;
//! ```

use std::error::Error;

use plotters::prelude::*;

use super::config::{NO_TITLE, PlotConfig};
use crate::design::StageProfiles;

/// Floor of the log axis (mg/L)
const LOG_FLOOR_MG_L: f64 = 1e-12;

// =================================================================================================
// Core Plotting Functions
// =================================================================================================

/// Plot the liquid concentration (upper panel) and pH (lower panel) of one column
///
/// # Arguments
///
/// * `profiles` - Stage profiles of a design
/// * `output_path` - PNG or SVG, chosen by extension
/// * `config` - Optional plot configuration
pub fn plot_stage_profiles(
    profiles: &StageProfiles,
    output_path: &str,
    config: Option<&PlotConfig>,
) -> Result<(), Box<dyn Error>> {
    if profiles.stage_numbers.is_empty() {
        return Err("Empty stage profile".into());
    }

    let default_config = PlotConfig::stage_profile(NO_TITLE);
    let config = config.unwrap_or(&default_config);

    let stages: Vec<f64> = profiles.stage_numbers.iter().map(|&s| s as f64).collect();
    let liquid = scale(&profiles.liquid_conc_mg_l, config.log_scale);

    match extension(output_path) {
        "svg" => {
            let backend = SVGBackend::new(output_path, (config.width, config.height));
            plot_stage_impl(backend, &stages, &liquid, &profiles.ph, config)
        }
        _ => {
            let backend = BitMapBackend::new(output_path, (config.width, config.height));
            plot_stage_impl(backend, &stages, &liquid, &profiles.ph, config)
        }
    }
}

/// Overlay the liquid profiles of several columns
///
/// # Example
///
/// ```rust,ignore
/// let profiles = vec![
///     ("N = 8", &short.stage_profiles),
///     ("N = 12", &tall.stage_profiles),
/// ];
/// plot_profiles_comparison(profiles, "comparison.svg", None)?;
/// ```
pub fn plot_profiles_comparison(
    profiles: Vec<(&str, &StageProfiles)>,
    output_path: &str,
    config: Option<&PlotConfig>,
) -> Result<(), Box<dyn Error>> {
    if profiles.is_empty() {
        return Err("No profiles provided".into());
    }

    let default_config = PlotConfig::comparison(NO_TITLE);
    let config = config.unwrap_or(&default_config);

    let series: Vec<(&str, Vec<f64>, Vec<f64>)> = profiles
        .iter()
        .map(|(label, p)| {
            let stages = p.stage_numbers.iter().map(|&s| s as f64).collect();
            (*label, stages, scale(&p.liquid_conc_mg_l, config.log_scale))
        })
        .collect();

    match extension(output_path) {
        "svg" => {
            let backend = SVGBackend::new(output_path, (config.width, config.height));
            plot_comparison_impl(backend, &series, config)
        }
        _ => {
            let backend = BitMapBackend::new(output_path, (config.width, config.height));
            plot_comparison_impl(backend, &series, config)
        }
    }
}

// =================================================================================================
// Backend implementations
// =================================================================================================

fn plot_stage_impl<DB: DrawingBackend>(
    backend: DB,
    stages: &[f64],
    liquid: &[f64],
    ph: &[f64],
    config: &PlotConfig,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let root = backend.into_drawing_area();
    root.fill(&config.background)?;
    let panels = root.split_evenly((2, 1));

    let max_stage = stages.last().copied().unwrap_or(1.0).max(1.0);
    let (y_lo, y_hi) = padded_range(liquid);
    let log_scale = config.log_scale;

    // ====== Liquid concentration ======

    let mut chart = ChartBuilder::on(&panels[0])
        .caption(&config.title, ("sans-serif", 32).into_font())
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(0.0..max_stage, y_lo..y_hi)?;

    if config.show_grid {
        chart
            .configure_mesh()
            .x_desc(&config.xlabel)
            .y_desc(&config.ylabel)
            .x_label_formatter(&|x| format!("{:.0}", x))
            .y_label_formatter(&|y| axis_label(*y, log_scale))
            .draw()?;
    }

    chart
        .draw_series(LineSeries::new(
            stages.iter().zip(liquid.iter()).map(|(s, c)| (*s, *c)),
            ShapeStyle::from(&config.line_color).stroke_width(config.line_width),
        ))?
        .label("Liquid")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &config.line_color));

    chart
        .configure_series_labels()
        .background_style(&config.background.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    // ====== pH ======

    let (ph_lo, ph_hi) = padded_range(ph);
    let mut chart = ChartBuilder::on(&panels[1])
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(0.0..max_stage, ph_lo..ph_hi)?;

    if config.show_grid {
        chart
            .configure_mesh()
            .x_desc(&config.xlabel)
            .y_desc("pH")
            .x_label_formatter(&|x| format!("{:.0}", x))
            .y_label_formatter(&|y| format!("{:.2}", y))
            .draw()?;
    }

    chart.draw_series(LineSeries::new(
        stages.iter().zip(ph.iter()).map(|(s, p)| (*s, *p)),
        ShapeStyle::from(&config.ph_color).stroke_width(config.line_width),
    ))?;

    root.present()?;

    Ok(())
}

fn plot_comparison_impl<DB: DrawingBackend>(
    backend: DB,
    series: &[(&str, Vec<f64>, Vec<f64>)],
    config: &PlotConfig,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let root = backend.into_drawing_area();
    root.fill(&config.background)?;

    let max_stage = series
        .iter()
        .filter_map(|(_, s, _)| s.last().copied())
        .fold(1.0, f64::max);
    let all: Vec<f64> = series.iter().flat_map(|(_, _, c)| c.iter().copied()).collect();
    let (y_lo, y_hi) = padded_range(&all);
    let log_scale = config.log_scale;

    let mut chart = ChartBuilder::on(&root)
        .caption(&config.title, ("sans-serif", 40).into_font())
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(0.0..max_stage, y_lo..y_hi)?;

    if config.show_grid {
        chart
            .configure_mesh()
            .x_desc(&config.xlabel)
            .y_desc(&config.ylabel)
            .x_label_formatter(&|x| format!("{:.0}", x))
            .y_label_formatter(&|y| axis_label(*y, log_scale))
            .draw()?;
    }

    for (idx, (label, stages, liquid)) in series.iter().enumerate() {
        let color = config.series_color(idx);
        chart
            .draw_series(LineSeries::new(
                stages.iter().zip(liquid.iter()).map(|(s, c)| (*s, *c)),
                ShapeStyle::from(&color).stroke_width(config.line_width),
            ))?
            .label(*label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
    }

    chart
        .configure_series_labels()
        .background_style(&config.background.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;

    Ok(())
}

// =================================================================================================
// Helpers
// =================================================================================================

fn extension(output_path: &str) -> &str {
    std::path::Path::new(output_path)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("png")
}

/// log10 of the concentrations when plotting on a log axis
fn scale(values: &[f64], log_scale: bool) -> Vec<f64> {
    if log_scale {
        values.iter().map(|v| v.max(LOG_FLOOR_MG_L).log10()).collect()
    } else {
        values.to_vec()
    }
}

fn axis_label(y: f64, log_scale: bool) -> String {
    if log_scale {
        format!("{:.0e}", 10f64.powf(y))
    } else {
        format!("{:.3}", y)
    }
}

/// Data range widened by 5 %, never empty
fn padded_range(values: &[f64]) -> (f64, f64) {
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((hi - lo) * 0.05).max(1e-3);
    (lo - pad, hi + pad)
}

// =================================================================================================
// Tests
// =================================================================================================
