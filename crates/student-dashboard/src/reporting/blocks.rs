use crate::charts::{ChartKind, RenderedChart};
use crate::error::Result;
use crate::schema::{GENDER, METRIC_COLUMNS, PERFORMANCE_BAND, RACE_ETHNICITY, TEST_PREP};
use crate::types::{AggregateView, DashboardSummary, MissingCounts, TopNView};
use crate::utils::{float_values, is_numeric_dtype, string_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Cells
// ============================================================================

/// A single spreadsheet cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Text(String),
    Number(f64),
    Blank,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Non-finite numbers have no spreadsheet representation and become blank.
    pub fn number(value: f64) -> Self {
        if value.is_finite() {
            Self::Number(value)
        } else {
            Self::Blank
        }
    }
}

/// Convert a table into a header row plus one row of cells per record.
///
/// Numeric columns become [`Cell::Number`], everything else [`Cell::Text`];
/// nulls become [`Cell::Blank`].
pub fn table_cells(df: &DataFrame) -> Result<(Vec<String>, Vec<Vec<Cell>>)> {
    let header: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();

    let mut rows = vec![Vec::with_capacity(df.width()); df.height()];
    for column in df.get_columns() {
        let series = column.as_materialized_series();
        if is_numeric_dtype(series.dtype()) {
            for (row, value) in float_values(series)?.into_iter().enumerate() {
                rows[row].push(value.map_or(Cell::Blank, Cell::number));
            }
        } else {
            for (row, value) in string_values(series)?.into_iter().enumerate() {
                rows[row].push(value.map_or(Cell::Blank, Cell::Text));
            }
        }
    }

    Ok((header, rows))
}

// ============================================================================
// Summary Blocks
// ============================================================================

/// One section of the Summary sheet.
///
/// The block list is built once and rendered by every sink, so both report
/// variants carry the same sections in the same order.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryBlock {
    Title(String),
    Fact {
        label: String,
        value: Cell,
    },
    Table {
        title: String,
        header: Vec<String>,
        rows: Vec<Vec<Cell>>,
    },
    Chart {
        caption: String,
        path: Option<PathBuf>,
    },
}

/// Build the Summary sheet sections from the aggregates and rendered charts.
pub fn build_blocks(
    summary: &DashboardSummary,
    charts: &[RenderedChart],
    top_n: usize,
) -> Result<Vec<SummaryBlock>> {
    let chart = |kind: ChartKind| SummaryBlock::Chart {
        caption: kind.caption().to_string(),
        path: charts
            .iter()
            .find(|chart| chart.kind == kind)
            .and_then(|chart| chart.path.clone()),
    };

    let mut blocks = vec![
        SummaryBlock::Title("Data Quality".to_string()),
        SummaryBlock::Fact {
            label: "Duplicate Rows".to_string(),
            value: Cell::number(summary.quality.duplicate_rows as f64),
        },
        missing_table(&summary.quality.missing),
        group_table("Average Scores by Gender", GENDER, &summary.by_gender),
        chart(ChartKind::AverageByGender),
        group_table(
            "Average Scores by Race/Ethnicity",
            RACE_ETHNICITY,
            &summary.by_race,
        ),
        chart(ChartKind::AverageByRace),
        group_table("Scores by Test Preparation", TEST_PREP, &summary.by_prep),
        chart(ChartKind::ScoresByPrep),
        SummaryBlock::Table {
            title: "Performance Band Distribution".to_string(),
            header: vec![PERFORMANCE_BAND.to_string(), "Count".to_string()],
            rows: summary
                .bands
                .counts
                .iter()
                .map(|(band, count)| vec![Cell::text(band.label()), Cell::number(*count as f64)])
                .collect(),
        },
        chart(ChartKind::BandCounts),
    ];
    blocks.push(top_table(format!("Top {} by Average", top_n), &summary.top_by_average)?);
    blocks.push(top_table(format!("Top {} by Math", top_n), &summary.top_by_math)?);

    Ok(blocks)
}

fn missing_table(missing: &MissingCounts) -> SummaryBlock {
    SummaryBlock::Table {
        title: "Missing Values (per column)".to_string(),
        header: vec!["Column".to_string(), "Missing".to_string()],
        rows: missing
            .entries
            .iter()
            .map(|(column, count)| vec![Cell::text(column), Cell::number(*count as f64)])
            .collect(),
    }
}

fn group_table(title: &str, column: &str, view: &AggregateView) -> SummaryBlock {
    let mut header = vec![column.to_string()];
    header.extend(METRIC_COLUMNS.iter().map(|name| name.to_string()));

    let rows = view
        .groups
        .iter()
        .map(|group| {
            let mut row = vec![Cell::text(&group.key)];
            row.extend(group.metrics().into_iter().map(Cell::number));
            row
        })
        .collect();

    SummaryBlock::Table {
        title: title.to_string(),
        header,
        rows,
    }
}

fn top_table(title: String, view: &TopNView) -> Result<SummaryBlock> {
    let (header, rows) = table_cells(&view.rows)?;
    Ok(SummaryBlock::Table {
        title,
        header,
        rows,
    })
}
