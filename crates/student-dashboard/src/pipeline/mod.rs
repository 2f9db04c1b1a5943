//! Pipeline module.
//!
//! This module provides the dashboard pipeline and its progress reporting.

mod builder;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder, PipelineOutcome};
pub use progress::{PipelineStage, ProgressReporter, ProgressUpdate};
