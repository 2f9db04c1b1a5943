//! Derived views computed from the cleaned table.
//!
//! Every type here is a read-only snapshot: it is computed once by the
//! aggregator and then consumed by both the chart renderer and the report
//! builder.

use crate::schema::PerformanceBand;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

/// Per-column missing value counts, sorted descending by count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissingCounts {
    pub entries: Vec<(String, usize)>,
}

impl MissingCounts {
    /// Total number of missing cells across all columns.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    /// Missing count for one column, if the column exists.
    pub fn get(&self, column: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, count)| *count)
    }
}

/// Quality facts about the table as loaded, before any filling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataQuality {
    pub duplicate_rows: usize,
    pub missing: MissingCounts,
}

/// Mean statistics for one group of an [`AggregateView`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMeans {
    pub key: String,
    /// Number of rows in the group.
    pub count: usize,
    pub math: f64,
    pub reading: f64,
    pub writing: f64,
    pub average: f64,
}

impl GroupMeans {
    /// The four metrics in [`crate::schema::METRIC_COLUMNS`] order.
    pub fn metrics(&self) -> [f64; 4] {
        [self.math, self.reading, self.writing, self.average]
    }
}

/// Grouped mean statistics over one categorical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateView {
    /// Canonical name of the grouping column.
    pub column: String,
    /// Groups sorted by key.
    pub groups: Vec<GroupMeans>,
}

/// Row counts per performance band, always in band order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandCounts {
    pub counts: [(PerformanceBand, usize); 4],
}

impl BandCounts {
    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, count)| count).sum()
    }
}

/// First N rows of the table ranked descending by one numeric column.
#[derive(Debug, Clone)]
pub struct TopNView {
    /// Column the rows were ranked by.
    pub column: String,
    pub rows: DataFrame,
}

/// Everything the chart renderer and report builder need, computed once.
#[derive(Debug, Clone)]
pub struct DashboardSummary {
    pub quality: DataQuality,
    pub by_gender: AggregateView,
    pub by_race: AggregateView,
    pub by_prep: AggregateView,
    pub bands: BandCounts,
    pub top_by_average: TopNView,
    pub top_by_math: TopNView,
}
