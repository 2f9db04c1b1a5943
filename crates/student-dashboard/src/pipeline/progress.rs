//! Progress reporting for the dashboard pipeline.
//!
//! # Example
//!
//! ```rust,ignore
//! use student_dashboard::Pipeline;
//!
//! let outcome = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run()?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of the dashboard pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Reading the CSV and normalizing headers
    Loading,
    /// Counting and filling missing values, counting duplicates
    Cleaning,
    /// Computing Average and Performance_Band
    Deriving,
    /// Grouped means, band counts and rankings
    Aggregating,
    /// Rendering chart images
    Charting,
    /// Writing the spreadsheet
    Reporting,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl PipelineStage {
    /// The working stages, excluding terminal states.
    pub const WORKING: [PipelineStage; 6] = [
        Self::Loading,
        Self::Cleaning,
        Self::Deriving,
        Self::Aggregating,
        Self::Charting,
        Self::Reporting,
    ];

    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading Data",
            Self::Cleaning => "Cleaning Data",
            Self::Deriving => "Deriving Columns",
            Self::Aggregating => "Aggregating",
            Self::Charting => "Rendering Charts",
            Self::Reporting => "Writing Report",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Overall progress when this stage starts and when it ends.
    ///
    /// Working stages tile `0.0..=1.0` in execution order.
    pub fn progress_range(&self) -> (f32, f32) {
        match self {
            Self::Loading => (0.0, 0.15),
            Self::Cleaning => (0.15, 0.30),
            Self::Deriving => (0.30, 0.40),
            Self::Aggregating => (0.40, 0.50),
            Self::Charting => (0.50, 0.80),
            Self::Reporting => (0.80, 1.0),
            Self::Complete => (1.0, 1.0),
            Self::Failed => (0.0, 0.0),
        }
    }
}

/// Progress update emitted at stage boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: PipelineStage,
    /// Overall progress (0.0 - 1.0)
    pub progress: f32,
    pub message: String,
}

impl ProgressUpdate {
    /// A stage is starting.
    pub fn started(stage: PipelineStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            progress: stage.progress_range().0,
            message: message.into(),
        }
    }

    /// A stage has finished. Use [`PipelineStage::Complete`] or
    /// [`PipelineStage::Failed`] for the terminal update.
    pub fn finished(stage: PipelineStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            progress: stage.progress_range().1,
            message: message.into(),
        }
    }
}

/// Receives progress updates from the pipeline.
///
/// Any `Fn(ProgressUpdate)` closure is a reporter.
///
/// ```rust,ignore
/// use student_dashboard::{ProgressReporter, ProgressUpdate};
///
/// struct StderrReporter;
///
/// impl ProgressReporter for StderrReporter {
///     fn report(&self, update: ProgressUpdate) {
///         eprintln!("{}: {}", update.stage.display_name(), update.message);
///     }
/// }
/// ```
pub trait ProgressReporter: Send + Sync {
    /// Called at the start and end of every stage.
    fn report(&self, update: ProgressUpdate);
}

impl<F> ProgressReporter for F
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        self(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
static_assertions::assert_impl_all!(PipelineStage: Send, Sync, Copy);
