//! Student Performance Dashboard CLI
//!
//! Reads `StudentsPerformance.csv` from the working directory and writes
//! `Students_Performance_Dashboard.xlsx` plus chart images under `plots/`.
//! Log verbosity follows `RUST_LOG` and defaults to `info`.

use anyhow::{Context, Result};
use student_dashboard::{DashboardConfig, Pipeline};
use tracing::debug;

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_logging();

    let config = DashboardConfig::default();
    let pipeline = Pipeline::builder()
        .config(config)
        .on_progress(|update| {
            debug!(
                "[{:>3.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        })
        .build()
        .context("Invalid dashboard configuration")?;

    let outcome = pipeline.run().with_context(|| {
        format!(
            "Failed to build dashboard from '{}'",
            pipeline.config().input_path.display()
        )
    })?;

    println!("Wrote: {}", outcome.report.path.display());
    Ok(())
}
