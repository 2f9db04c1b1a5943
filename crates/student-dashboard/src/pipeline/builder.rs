//! Main dashboard pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating the load, clean, derive, aggregate, chart and report stages.

use crate::aggregator::Aggregator;
use crate::charts::{ChartRenderer, RenderedChart};
use crate::cleaner::DataCleaner;
use crate::config::{ConfigValidationError, DashboardConfig};
use crate::deriver::Deriver;
use crate::error::{Result, ResultExt};
use crate::loader::TableLoader;
use crate::pipeline::progress::{PipelineStage, ProgressReporter, ProgressUpdate};
use crate::reporting::{ReportOutcome, ReportSink, build_blocks, detect_sink};
use crate::types::DashboardSummary;
use polars::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Everything a finished run produced.
#[derive(Debug)]
pub struct PipelineOutcome {
    /// The cleaned table with derived columns, as written to `Cleaned_Data`.
    pub table: DataFrame,
    pub summary: DashboardSummary,
    pub charts: Vec<RenderedChart>,
    pub report: ReportOutcome,
    /// Descriptions of the missing-value fills that were applied.
    pub fill_steps: Vec<String>,
    pub duration_ms: u64,
}

/// The dashboard pipeline.
///
/// The pipeline owns its table for the duration of a run: the loader
/// creates it, the cleaner and deriver mutate it in place, and every later
/// stage only reads it.
///
/// # Example
///
/// ```rust,ignore
/// use student_dashboard::{DashboardConfig, Pipeline};
///
/// let outcome = Pipeline::builder()
///     .config(DashboardConfig::builder().top_n(10).build()?)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run()?;
///
/// println!("Wrote: {}", outcome.report.path.display());
/// ```
pub struct Pipeline {
    config: DashboardConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    report_sink: Option<Box<dyn ReportSink>>,
}

static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Load the configured input file and run every stage.
    pub fn run(&self) -> Result<PipelineOutcome> {
        self.finish(self.load().and_then(|df| self.process(df)))
    }

    /// Run every stage after loading on a table that is already in memory.
    ///
    /// The table gets the same header normalization and score coercion as a
    /// loaded file, so raw headers are accepted.
    pub fn run_on(&self, mut df: DataFrame) -> Result<PipelineOutcome> {
        let result = TableLoader::prepare(&mut df).and_then(|_| self.process(df));
        self.finish(result)
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn started(&self, stage: PipelineStage, message: impl Into<String>) {
        self.report_progress(ProgressUpdate::started(stage, message));
    }

    fn finished(&self, stage: PipelineStage, message: impl Into<String>) {
        self.report_progress(ProgressUpdate::finished(stage, message));
    }

    fn finish(&self, result: Result<PipelineOutcome>) -> Result<PipelineOutcome> {
        match result {
            Ok(outcome) => {
                let message = format!("Wrote {}", outcome.report.path.display());
                self.finished(PipelineStage::Complete, message);
                Ok(outcome)
            }
            Err(e) => {
                self.finished(PipelineStage::Failed, e.to_string());
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    fn load(&self) -> Result<DataFrame> {
        let input = &self.config.input_path;
        self.started(PipelineStage::Loading, format!("Loading {}", input.display()));
        let df = TableLoader::load(input)?;
        self.finished(PipelineStage::Loading, format!("Loaded {} rows", df.height()));
        Ok(df)
    }

    fn process(&self, mut df: DataFrame) -> Result<PipelineOutcome> {
        let start_time = Instant::now();

        // Step 1: Cleaning. Quality is measured before anything is filled.
        self.started(PipelineStage::Cleaning, "Checking missing values and duplicates...");
        info!("Step 1: Cleaning data...");
        let quality = DataCleaner::assess(&df).context("During cleaning")?;
        info!(
            "Found {} missing values and {} duplicate rows",
            quality.missing.total(),
            quality.duplicate_rows
        );
        let fill_steps = DataCleaner::fill_missing(&mut df).context("During cleaning")?;
        for step in &fill_steps {
            debug!("{}", step);
        }
        self.finished(
            PipelineStage::Cleaning,
            format!("Filled {} columns", fill_steps.len()),
        );

        // Step 2: Derived columns
        self.started(PipelineStage::Deriving, "Computing averages and bands...");
        info!("Step 2: Deriving Average and Performance_Band...");
        Deriver::add_average(&mut df).context("During deriving")?;
        Deriver::add_band(&mut df).context("During deriving")?;
        self.finished(PipelineStage::Deriving, "Derived columns added");

        // Step 3: Aggregation
        self.started(PipelineStage::Aggregating, "Aggregating...");
        info!("Step 3: Aggregating...");
        let summary =
            Aggregator::summarize(&df, quality, self.config.top_n).context("During aggregation")?;
        self.finished(PipelineStage::Aggregating, "Aggregation complete");

        // Step 4: Charts. Failures here are per chart and never abort the run.
        self.started(PipelineStage::Charting, "Rendering charts...");
        info!("Step 4: Rendering charts...");
        let renderer = ChartRenderer::new(&self.config.plots_dir, self.config.chart_size);
        let charts = renderer.render_all(&summary);
        let rendered = charts.iter().filter(|c| c.path.is_some()).count();
        self.finished(
            PipelineStage::Charting,
            format!("Rendered {} of {} charts", rendered, charts.len()),
        );

        // Step 5: Report
        self.started(PipelineStage::Reporting, "Writing report...");
        info!("Step 5: Writing report...");
        let blocks = build_blocks(&summary, &charts, self.config.top_n)?;
        let report = match &self.report_sink {
            Some(sink) => sink.write(&df, &blocks, &self.config.output_path)?,
            None => detect_sink(&self.config).write(&df, &blocks, &self.config.output_path)?,
        };
        info!("Report written with the {} sink", report.sink);

        let duration_ms = start_time.elapsed().as_millis() as u64;
        info!("Pipeline completed in {}ms", duration_ms);

        Ok(PipelineOutcome {
            table: df,
            summary,
            charts,
            report,
            fill_steps,
            duration_ms,
        })
    }
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<DashboardConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    report_sink: Option<Box<dyn ReportSink>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: DashboardConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(callback));
        self
    }

    /// Use a specific report sink instead of probing for one at run time.
    pub fn report_sink(mut self, sink: Box<dyn ReportSink>) -> Self {
        self.report_sink = Some(sink);
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            config,
            progress_reporter: self.progress_reporter,
            report_sink: self.report_sink,
        })
    }
}
