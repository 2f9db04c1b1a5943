//! Spreadsheet report generation.
//!
//! The report has two sheets:
//! - `Cleaned_Data`: the full cleaned table with a header row
//! - `Summary`: data quality facts, grouped tables, band counts, rankings
//!   and, when the build supports it, the chart images
//!
//! The summary content is described once as a list of [`SummaryBlock`]s.
//! A [`ReportSink`] turns the blocks into a [`WorkbookLayout`] and saves it;
//! [`RichSink`] embeds charts and [`PlainSink`] leaves them out.
//!
//! # Example
//!
//! ```rust,ignore
//! use student_dashboard::reporting::{build_blocks, detect_sink};
//!
//! let blocks = build_blocks(&summary, &charts, config.top_n)?;
//! let sink = detect_sink(&config);
//! let outcome = sink.write(&table, &blocks, &config.output_path)?;
//! println!("Wrote: {}", outcome.path.display());
//! ```

mod blocks;
mod sinks;
mod workbook;

pub use blocks::{Cell, SummaryBlock, build_blocks, table_cells};
pub use sinks::{
    PlainSink, ReportOutcome, ReportSink, RichSink, SinkKind, detect_sink,
    image_embedding_available,
};
pub use workbook::{
    CLEANED_SHEET, ImageAnchor, SUMMARY_SHEET, SheetLayout, WorkbookLayout, save_workbook,
};
