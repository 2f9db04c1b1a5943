use super::blocks::{Cell, SummaryBlock, table_cells};
use super::workbook::{
    CLEANED_SHEET, ImageAnchor, SUMMARY_SHEET, SheetLayout, WorkbookLayout, save_workbook,
};
use crate::config::DashboardConfig;
use crate::error::Result;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Which report variant was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Data sheets plus embedded chart images.
    Rich,
    /// Data sheets only.
    Plain,
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rich => write!(f, "rich"),
            Self::Plain => write!(f, "plain"),
        }
    }
}

/// Result of writing a report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOutcome {
    pub path: PathBuf,
    pub sink: SinkKind,
    pub images_embedded: usize,
}

/// Strategy for turning the cleaned table and summary blocks into a report.
pub trait ReportSink: Send + Sync {
    fn kind(&self) -> SinkKind;

    /// Lay out every sheet in memory without touching the filesystem.
    fn layout(&self, table: &DataFrame, blocks: &[SummaryBlock]) -> Result<WorkbookLayout>;

    /// Lay out and save the report to `dest`.
    fn write(&self, table: &DataFrame, blocks: &[SummaryBlock], dest: &Path) -> Result<ReportOutcome> {
        let layout = self.layout(table, blocks)?;
        save_workbook(&layout, dest)?;
        Ok(ReportOutcome {
            path: dest.to_path_buf(),
            sink: self.kind(),
            images_embedded: layout.image_count(),
        })
    }
}

/// Report with chart images embedded below their captions.
#[derive(Debug, Clone)]
pub struct RichSink {
    chart_spacing: u32,
}

impl RichSink {
    pub fn new(chart_spacing: u32) -> Self {
        Self { chart_spacing }
    }
}

impl ReportSink for RichSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Rich
    }

    fn layout(&self, table: &DataFrame, blocks: &[SummaryBlock]) -> Result<WorkbookLayout> {
        let mut summary = SheetLayout::new(SUMMARY_SHEET);
        for block in blocks {
            match block {
                SummaryBlock::Chart { caption, path } => {
                    summary.push_bold_row(vec![Cell::text(caption)]);
                    match path.as_deref().filter(|p| p.is_file()) {
                        Some(path) => {
                            let row = summary.cursor();
                            summary.images.push(ImageAnchor {
                                row,
                                col: 0,
                                path: path.to_path_buf(),
                            });
                            summary.push_blank_rows(self.chart_spacing);
                        }
                        None => {
                            warn!("Chart '{}' has no image; writing caption only", caption);
                            summary.push_blank_rows(1);
                        }
                    }
                }
                other => push_data_block(&mut summary, other),
            }
        }

        Ok(WorkbookLayout {
            sheets: vec![cleaned_sheet(table)?, summary],
        })
    }
}

/// Report without images. Chart blocks are omitted.
#[derive(Debug, Clone, Default)]
pub struct PlainSink;

impl ReportSink for PlainSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Plain
    }

    fn layout(&self, table: &DataFrame, blocks: &[SummaryBlock]) -> Result<WorkbookLayout> {
        let mut summary = SheetLayout::new(SUMMARY_SHEET);
        for block in blocks {
            if !matches!(block, SummaryBlock::Chart { .. }) {
                push_data_block(&mut summary, block);
            }
        }

        Ok(WorkbookLayout {
            sheets: vec![cleaned_sheet(table)?, summary],
        })
    }
}

/// The `Cleaned_Data` sheet: header row then every record, shared by all sinks.
fn cleaned_sheet(table: &DataFrame) -> Result<SheetLayout> {
    let (header, rows) = table_cells(table)?;
    let mut sheet = SheetLayout::new(CLEANED_SHEET);
    sheet.push_bold_row(header.into_iter().map(Cell::Text).collect());
    for row in rows {
        sheet.push_row(row);
    }
    Ok(sheet)
}

/// Write a non-chart block; tables and facts end with a blank delimiter row.
fn push_data_block(sheet: &mut SheetLayout, block: &SummaryBlock) {
    match block {
        SummaryBlock::Title(title) => sheet.push_bold_row(vec![Cell::text(title)]),
        SummaryBlock::Fact { label, value } => {
            sheet.push_row(vec![Cell::text(label), value.clone()]);
            sheet.push_blank_rows(1);
        }
        SummaryBlock::Table { title, header, rows } => {
            sheet.push_bold_row(vec![Cell::text(title)]);
            sheet.push_bold_row(header.iter().map(Cell::text).collect());
            for row in rows {
                sheet.push_row(row.clone());
            }
            sheet.push_blank_rows(1);
        }
        SummaryBlock::Chart { .. } => {}
    }
}

/// Minimal 1x1 RGBA PNG used to check that image embedding works.
const PROBE_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Check whether this build can embed images in the report.
pub fn image_embedding_available() -> bool {
    cfg!(feature = "embed-images") && rust_xlsxwriter::Image::new_from_buffer(PROBE_PNG).is_ok()
}

/// Pick the report sink once, from build capabilities.
pub fn detect_sink(config: &DashboardConfig) -> Box<dyn ReportSink> {
    if image_embedding_available() {
        info!("Image embedding available; using rich report");
        Box::new(RichSink::new(config.chart_spacing))
    } else {
        warn!("Image embedding unavailable; falling back to plain report");
        Box::new(PlainSink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{GENDER, MATH};
    use polars::prelude::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn table() -> DataFrame {
        df![
            GENDER => ["female", "male"],
            MATH => [72.0, 69.0],
        ]
        .unwrap()
    }

    fn blocks(chart: Option<PathBuf>) -> Vec<SummaryBlock> {
        vec![
            SummaryBlock::Title("Data Quality".to_string()),
            SummaryBlock::Fact {
                label: "Duplicate Rows".to_string(),
                value: Cell::Number(0.0),
            },
            SummaryBlock::Table {
                title: "Average Scores by Gender".to_string(),
                header: vec![GENDER.to_string(), MATH.to_string()],
                rows: vec![vec![Cell::text("female"), Cell::Number(72.0)]],
            },
            SummaryBlock::Chart {
                caption: "Average by Gender".to_string(),
                path: chart,
            },
            SummaryBlock::Table {
                title: "Top 20 by Math".to_string(),
                header: vec![GENDER.to_string(), MATH.to_string()],
                rows: vec![vec![Cell::text("female"), Cell::Number(72.0)]],
            },
        ]
    }

    fn probe_image(dir: &Path) -> PathBuf {
        let path = dir.join("chart.png");
        fs::write(&path, PROBE_PNG).unwrap();
        path
    }

    #[test]
    fn test_cleaned_data_is_identical_across_sinks() {
        let dir = tempfile::tempdir().unwrap();
        let blocks = blocks(Some(probe_image(dir.path())));

        let rich = RichSink::new(20).layout(&table(), &blocks).unwrap();
        let plain = PlainSink.layout(&table(), &blocks).unwrap();

        let rich_data = rich.sheet(CLEANED_SHEET).unwrap();
        assert_eq!(Some(rich_data), plain.sheet(CLEANED_SHEET));
        assert_eq!(rich_data.rows.len(), 3);
        assert_eq!(rich_data.rows[0], vec![Cell::text(GENDER), Cell::text(MATH)]);
        assert!(rich_data.images.is_empty());
    }

    #[test]
    fn test_rich_sink_anchors_image_below_caption() {
        let dir = tempfile::tempdir().unwrap();
        let image = probe_image(dir.path());
        let layout = RichSink::new(20).layout(&table(), &blocks(Some(image.clone()))).unwrap();
        let summary = layout.sheet(SUMMARY_SHEET).unwrap();

        let caption = summary.find_row("Average by Gender").unwrap();
        assert_eq!(
            summary.images,
            vec![ImageAnchor {
                row: caption + 1,
                col: 0,
                path: image,
            }]
        );
        let next = summary.find_row("Top 20 by Math").unwrap();
        assert_eq!(next, caption + 1 + 20);
    }

    #[test]
    fn test_rich_sink_keeps_caption_when_image_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.png");
        let layout = RichSink::new(20).layout(&table(), &blocks(Some(missing))).unwrap();
        let summary = layout.sheet(SUMMARY_SHEET).unwrap();

        assert!(summary.images.is_empty());
        assert!(summary.find_row("Average by Gender").is_some());
    }

    #[test]
    fn test_plain_sink_omits_charts_and_delimits_blocks() {
        let layout = PlainSink.layout(&table(), &blocks(None)).unwrap();
        let summary = layout.sheet(SUMMARY_SHEET).unwrap();

        assert_eq!(layout.image_count(), 0);
        assert!(summary.find_row("Average by Gender").is_none());

        let titles: Vec<u32> = ["Data Quality", "Average Scores by Gender", "Top 20 by Math"]
            .iter()
            .map(|title| summary.find_row(title).unwrap())
            .collect();
        assert_eq!(titles, vec![0, 3, 7]);
        assert!(summary.rows[2].is_empty());
        assert!(summary.rows[6].is_empty());
    }

    #[test]
    fn test_sheet_order() {
        let layout = PlainSink.layout(&table(), &blocks(None)).unwrap();
        let names: Vec<&str> = layout.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec![CLEANED_SHEET, SUMMARY_SHEET]);
    }

    #[test]
    fn test_write_reports_sink_and_image_count() {
        let dir = tempfile::tempdir().unwrap();
        let blocks = blocks(Some(probe_image(dir.path())));
        let dest = dir.path().join("dashboard.xlsx");

        let outcome = RichSink::new(20).write(&table(), &blocks, &dest).unwrap();
        assert_eq!(outcome.sink, SinkKind::Rich);
        assert_eq!(outcome.images_embedded, 1);
        assert!(dest.is_file());

        let outcome = PlainSink.write(&table(), &blocks, &dest).unwrap();
        assert_eq!(outcome.sink, SinkKind::Plain);
        assert_eq!(outcome.images_embedded, 0);
    }

    #[cfg(feature = "embed-images")]
    #[test]
    fn test_detect_sink_prefers_rich() {
        assert!(image_embedding_available());
        let sink = detect_sink(&DashboardConfig::default());
        assert_eq!(sink.kind(), SinkKind::Rich);
    }
}
