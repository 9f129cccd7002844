//! Column plots with the `plotters` library
//!
//! # Organization
//!
//! - **config**: Shared plot configuration (`PlotConfig`)
//! - **stages**: Stage profiles (liquid concentration and pH vs stage number)
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use strip_rs::output::visualization::{plot_stage_profiles, PlotConfig};
//!
//! let design = simulate_column(&request, &preliminary)?;
//!
//! // Default config
//! plot_stage_profiles(&design.stage_profiles, "profile.png", None)?;
//!
//! // Or with a custom title
//! let config = PlotConfig::stage_profile("CO2 degasser");
//! plot_stage_profiles(&design.stage_profiles, "profile.svg", Some(&config))?;
//! ```
//!
//! | Use Case | Function |
//! |----------|----------|
//! | One column, liquid and pH | `plot_stage_profiles` |
//! | Several columns, liquid only | `plot_profiles_comparison` |

pub mod config;
pub mod stages;

pub use config::{NO_TITLE, PlotConfig};

pub use stages::{plot_profiles_comparison, plot_stage_profiles};
