//! Data cleaning module.
//!
//! This module provides functionality for:
//! - Counting missing values per column
//! - Counting duplicate rows
//! - Filling missing values (mean for scores, mode for everything else)
//!
//! NaN in a score column counts as missing.
//!
//! Duplicates are only counted, never removed.

use crate::error::{DashboardError, Result, ResultExt};
use crate::imputers::StatisticalImputer;
use crate::schema::{AVERAGE, PERFORMANCE_BAND, SCORE_COLUMNS, is_score_column};
use crate::types::{DataQuality, MissingCounts};
use crate::utils::{is_numeric_dtype, nan_to_null};
use polars::prelude::*;
use tracing::{debug, info, warn};

/// Fill value planned for one column.
#[derive(Debug, Clone, PartialEq)]
enum FillPlan {
    Mean(f64),
    NumericMode(f64),
    Mode(String),
}

/// Data cleaner for the student table.
pub struct DataCleaner;

impl DataCleaner {
    /// Missing and duplicate counts for the table as it is now.
    ///
    /// The pipeline calls this before [`DataCleaner::fill_missing`] so the
    /// report describes the data as loaded.
    pub fn assess(df: &DataFrame) -> Result<DataQuality> {
        Ok(DataQuality {
            duplicate_rows: Self::count_duplicates(df)?,
            missing: Self::count_missing(df),
        })
    }

    /// Count nulls per column, sorted descending by count.
    ///
    /// Columns with equal counts keep their table order.
    pub fn count_missing(df: &DataFrame) -> MissingCounts {
        let mut entries: Vec<(String, usize)> = df
            .get_columns()
            .iter()
            .map(|column| (column.name().to_string(), column.null_count()))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        MissingCounts { entries }
    }

    /// Count rows that exactly repeat an earlier row across all columns.
    pub fn count_duplicates(df: &DataFrame) -> Result<usize> {
        if df.width() == 0 {
            return Ok(0);
        }
        let unique = df
            .unique::<&str, &str>(None, UniqueKeepStrategy::First, None)
            .context("Counting duplicate rows")?;
        let duplicates = df.height() - unique.height();
        debug!("Found {} duplicate rows", duplicates);
        Ok(duplicates)
    }

    /// Fill every missing value in place.
    ///
    /// Fill values are computed from the unfilled table before any column is
    /// written. Derived columns are skipped; they are recomputed by the
    /// deriver. Calling this on a table without nulls is a no-op.
    ///
    /// Returns a description of each fill performed.
    pub fn fill_missing(df: &mut DataFrame) -> Result<Vec<String>> {
        let mut processing_steps = Vec::new();
        Self::nan_scores_to_null(df)?;
        let plan = Self::plan_fills(df)?;

        if plan.is_empty() {
            debug!("No missing values to fill");
            return Ok(processing_steps);
        }

        info!("Filling missing values in {} columns", plan.len());
        for (col_name, fill) in &plan {
            let filled = match fill {
                FillPlan::Mean(value) => StatisticalImputer::fill_numeric(
                    df,
                    col_name,
                    *value,
                    &mut processing_steps,
                ),
                FillPlan::NumericMode(value) => StatisticalImputer::fill_numeric_mode(
                    df,
                    col_name,
                    *value,
                    &mut processing_steps,
                ),
                FillPlan::Mode(value) => StatisticalImputer::fill_categorical(
                    df,
                    col_name,
                    value,
                    &mut processing_steps,
                ),
            };
            filled.map_err(|e| {
                DashboardError::Internal(e.to_string())
                    .with_context(format!("Filling column '{}'", col_name))
            })?;
        }

        Ok(processing_steps)
    }

    /// Turn NaN in the score columns into null so they are imputed.
    pub fn nan_scores_to_null(df: &mut DataFrame) -> Result<()> {
        for name in SCORE_COLUMNS {
            let Ok(column) = df.column(name) else { continue };
            if !is_numeric_dtype(column.dtype()) {
                continue;
            }
            let cleaned = nan_to_null(column.as_materialized_series())?;
            df.replace(name, cleaned)?;
        }
        Ok(())
    }

    fn plan_fills(df: &DataFrame) -> Result<Vec<(String, FillPlan)>> {
        let mut plan = Vec::new();

        for column in df.get_columns() {
            let name = column.name().as_str();
            if column.null_count() == 0 || name == AVERAGE || name == PERFORMANCE_BAND {
                continue;
            }

            let series = column.as_materialized_series();
            let fill = if is_score_column(name) {
                StatisticalImputer::numeric_mean(series)
                    .map(|mean| mean.map(FillPlan::Mean))
            } else if is_numeric_dtype(series.dtype()) {
                StatisticalImputer::numeric_mode(series)
                    .map(|mode| mode.map(FillPlan::NumericMode))
            } else {
                StatisticalImputer::categorical_mode(series)
                    .map(|mode| mode.map(FillPlan::Mode))
            };

            match fill {
                Ok(Some(fill)) => plan.push((name.to_string(), fill)),
                Ok(None) => warn!("Column '{}' has no values to impute from; left as is", name),
                Err(e) => {
                    return Err(DashboardError::Internal(e.to_string())
                        .with_context(format!("Computing fill value for '{}'", name)));
                }
            }
        }

        Ok(plan)
    }
}
