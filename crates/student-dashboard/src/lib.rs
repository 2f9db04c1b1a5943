//! Student Performance Dashboard Library
//!
//! Turns the student performance CSV into a spreadsheet dashboard using Polars,
//! plotters and rust_xlsxwriter.
//!
//! # Overview
//!
//! The pipeline runs a fixed sequence of stages over one in-memory table:
//!
//! - **Loading**: CSV read, header normalization, score columns coerced to floats
//! - **Cleaning**: Missing-value and duplicate counts, mean/mode imputation
//! - **Deriving**: Per-student `Average` and `Performance_Band`
//! - **Aggregating**: Grouped means, band distribution, top-N rankings
//! - **Charting**: Four PNG bar charts
//! - **Reporting**: `Cleaned_Data` and `Summary` sheets, with charts embedded
//!   when the build supports it
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use student_dashboard::{DashboardConfig, Pipeline};
//!
//! let config = DashboardConfig::builder()
//!     .input_path("StudentsPerformance.csv")
//!     .output_path("Students_Performance_Dashboard.xlsx")
//!     .build()?;
//!
//! let outcome = Pipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run()?;
//!
//! println!("Wrote: {}", outcome.report.path.display());
//! ```
//!
//! # Individual Stages
//!
//! Every stage is also usable on its own:
//!
//! ```rust,ignore
//! use student_dashboard::{Aggregator, DataCleaner, Deriver, TableLoader};
//!
//! let mut df = TableLoader::load("StudentsPerformance.csv")?;
//! let quality = DataCleaner::assess(&df)?;
//! DataCleaner::fill_missing(&mut df)?;
//! Deriver::add_average(&mut df)?;
//! Deriver::add_band(&mut df)?;
//! let by_gender = Aggregator::group_means(&df, "Gender")?;
//! ```

pub mod aggregator;
pub mod charts;
pub mod cleaner;
pub mod config;
pub mod deriver;
pub mod error;
pub mod imputers;
pub mod loader;
pub mod pipeline;
pub mod reporting;
pub mod schema;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use aggregator::Aggregator;
pub use charts::{ChartKind, ChartRenderer, ChartSeries, RenderedChart};
pub use cleaner::DataCleaner;
pub use config::{ConfigValidationError, DashboardConfig, DashboardConfigBuilder};
pub use deriver::Deriver;
pub use error::{DashboardError, Result as DashboardResult, ResultExt};
pub use imputers::StatisticalImputer;
pub use loader::TableLoader;
pub use pipeline::{
    Pipeline, PipelineBuilder, PipelineOutcome, PipelineStage, ProgressReporter, ProgressUpdate,
};
pub use reporting::{
    PlainSink, ReportOutcome, ReportSink, RichSink, SinkKind, SummaryBlock, detect_sink,
};
pub use schema::PerformanceBand;
pub use types::{
    AggregateView, BandCounts, DashboardSummary, DataQuality, GroupMeans, MissingCounts, TopNView,
};
