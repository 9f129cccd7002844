//! Output of design results
//!
//! - **Visualization**: PNG/SVG stage profiles using plotters
//! - **JSON**: [`ColumnDesign::to_json`](crate::design::ColumnDesign::to_json),
//!   always available
//!
//! Enabled by the `plotting` feature (default).
//!
//! ```text
//! output/
//! ├── mod.rs              ← This file
//! └── visualization/
//!     ├── mod.rs
//!     ├── config.rs
//!     └── stages.rs
//! ```

pub mod visualization;

pub use visualization::{PlotConfig, plot_profiles_comparison, plot_stage_profiles};
