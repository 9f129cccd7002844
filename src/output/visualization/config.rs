//! Plot configuration shared by the column plots

use plotters::prelude::*;

/// Configuration for customizing plots
///
/// # Example
///
/// ```rust,ignore
/// use strip_rs::output::visualization::PlotConfig;
/// use plotters::prelude::*;
///
/// let mut config = PlotConfig::stage_profile("Degasser, 15 stages");
/// config.line_color = BLUE;
/// config.log_scale = false;
/// ```
#[derive(Clone)]
pub struct PlotConfig {
    /// Image width in pixels (default: 1024)
    pub width: u32,

    /// Image height in pixels (default: 768)
    pub height: u32,

    pub title: String,

    /// X-axis label (default: "Stage (bottom = 0)")
    pub xlabel: String,

    /// Y-axis label of the concentration panel
    pub ylabel: String,

    /// Liquid concentration line (default: BLUE)
    pub line_color: RGBColor,

    /// pH line (default: RED)
    pub ph_color: RGBColor,

    /// Colors for overlaid profiles; the default palette is used when None
    pub series_colors: Option<Vec<RGBColor>>,

    pub background: RGBColor,

    /// Line width in pixels (default: 2)
    pub line_width: u32,

    pub show_grid: bool,

    /// Logarithmic concentration axis (default: true)
    pub log_scale: bool,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            title: "Stage Profile".to_string(),
            xlabel: "Stage (bottom = 0)".to_string(),
            ylabel: "Liquid concentration (mg/L)".to_string(),
            line_color: BLUE,
            ph_color: RED,
            series_colors: None,
            background: WHITE,
            line_width: 2,
            show_grid: true,
            log_scale: true,
        }
    }
}

/// Accepts `&str`, `String` or `None` as a title
pub trait IntoOptionalTitle {
    fn into_optional_title(self) -> Option<String>;
}

impl IntoOptionalTitle for &str {
    fn into_optional_title(self) -> Option<String> {
        Some(self.to_string())
    }
}

impl IntoOptionalTitle for String {
    fn into_optional_title(self) -> Option<String> {
        Some(self)
    }
}

impl<T: IntoOptionalTitle> IntoOptionalTitle for Option<T> {
    fn into_optional_title(self) -> Option<String> {
        self.and_then(|t| t.into_optional_title())
    }
}

/// Keep the default title
pub const NO_TITLE: Option<&str> = None;

impl PlotConfig {
    /// Config for a single column's liquid and pH profiles
    pub fn stage_profile(title: impl IntoOptionalTitle) -> Self {
        let mut config = Self::default();
        config.title = title
            .into_optional_title()
            .unwrap_or_else(|| "Stage Profile".to_string());
        config
    }

    /// Config for overlaid liquid profiles of several columns
    pub fn comparison(title: impl IntoOptionalTitle) -> Self {
        let mut config = Self::default();
        config.title = title
            .into_optional_title()
            .unwrap_or_else(|| "Profile Comparison".to_string());
        config
    }

    /// Color of overlaid series `index`
    pub(crate) fn series_color(&self, index: usize) -> RGBColor {
        if let Some(colors) = &self.series_colors
            && index < colors.len()
        {
            return colors[index];
        }

        const PALETTE: [RGBColor; 8] = [
            BLUE,
            RED,
            GREEN,
            MAGENTA,
            CYAN,
            BLACK,
            RGBColor(255, 165, 0),
            RGBColor(128, 0, 128),
        ];
        PALETTE[index % PALETTE.len()]
    }
}

// =================================================================================================
// Tests
// =================================================================================================
