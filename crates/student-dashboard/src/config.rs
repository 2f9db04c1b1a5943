//! Configuration types for the dashboard pipeline.
//!
//! This module provides configuration options using the builder pattern.
//! Defaults reproduce the fixed layout of the dashboard: input and output
//! next to the working directory, charts under `plots/`, top-20 rankings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default number of rows kept in each ranking table.
pub const DEFAULT_TOP_N: usize = 20;

/// Default vertical spacing, in rows, between embedded charts.
pub const DEFAULT_CHART_SPACING: u32 = 20;

/// Configuration for the dashboard pipeline.
///
/// Use [`DashboardConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use student_dashboard::DashboardConfig;
///
/// let config = DashboardConfig::builder()
///     .input_path("data/StudentsPerformance.csv")
///     .output_path("out/dashboard.xlsx")
///     .top_n(10)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Path to the student performance CSV.
    /// Default: "StudentsPerformance.csv"
    pub input_path: PathBuf,

    /// Path of the spreadsheet report.
    /// Default: "Students_Performance_Dashboard.xlsx"
    pub output_path: PathBuf,

    /// Directory the chart images are written to.
    /// Default: "plots"
    pub plots_dir: PathBuf,

    /// Number of rows in each ranking table.
    /// Default: 20
    pub top_n: usize,

    /// Rows between the anchors of consecutive embedded charts.
    /// Default: 20
    pub chart_spacing: u32,

    /// Chart image size in pixels (width, height).
    /// Default: (800, 500)
    pub chart_size: (u32, u32),
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("StudentsPerformance.csv"),
            output_path: PathBuf::from("Students_Performance_Dashboard.xlsx"),
            plots_dir: PathBuf::from("plots"),
            top_n: DEFAULT_TOP_N,
            chart_spacing: DEFAULT_CHART_SPACING,
            chart_size: (800, 500),
        }
    }
}

impl DashboardConfig {
    /// Create a new configuration builder.
    pub fn builder() -> DashboardConfigBuilder {
        DashboardConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.top_n == 0 {
            return Err(ConfigValidationError::InvalidTopN(self.top_n));
        }

        if self.chart_spacing == 0 {
            return Err(ConfigValidationError::InvalidChartSpacing(
                self.chart_spacing,
            ));
        }

        let (width, height) = self.chart_size;
        if width == 0 || height == 0 {
            return Err(ConfigValidationError::InvalidChartSize { width, height });
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid top_n: {0} (must be at least 1)")]
    InvalidTopN(usize),

    #[error("Invalid chart spacing: {0} (must be at least 1 row)")]
    InvalidChartSpacing(u32),

    #[error("Invalid chart size: {width}x{height} (both sides must be non-zero)")]
    InvalidChartSize { width: u32, height: u32 },
}

/// Builder for [`DashboardConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct DashboardConfigBuilder {
    input_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    plots_dir: Option<PathBuf>,
    top_n: Option<usize>,
    chart_spacing: Option<u32>,
    chart_size: Option<(u32, u32)>,
}

impl DashboardConfigBuilder {
    /// Set the input CSV path.
    pub fn input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = Some(path.into());
        self
    }

    /// Set the spreadsheet output path.
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Set the directory chart images are written to.
    pub fn plots_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.plots_dir = Some(path.into());
        self
    }

    /// Set the number of rows kept in each ranking table.
    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }

    /// Set the row spacing between embedded charts.
    pub fn chart_spacing(mut self, rows: u32) -> Self {
        self.chart_spacing = Some(rows);
        self
    }

    /// Set the chart image size in pixels.
    pub fn chart_size(mut self, width: u32, height: u32) -> Self {
        self.chart_size = Some((width, height));
        self
    }

    /// Build the configuration, validating all values.
    pub fn build(self) -> Result<DashboardConfig, ConfigValidationError> {
        let default = DashboardConfig::default();
        let config = DashboardConfig {
            input_path: self.input_path.unwrap_or(default.input_path),
            output_path: self.output_path.unwrap_or(default.output_path),
            plots_dir: self.plots_dir.unwrap_or(default.plots_dir),
            top_n: self.top_n.unwrap_or(default.top_n),
            chart_spacing: self.chart_spacing.unwrap_or(default.chart_spacing),
            chart_size: self.chart_size.unwrap_or(default.chart_size),
        };
        config.validate()?;
        Ok(config)
    }
}
