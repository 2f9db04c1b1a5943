//! Statistical imputation methods.
//!
//! Provides mean imputation for score columns and mode imputation for
//! every other column, in the column's own type. Statistics and fills are
//! separate steps so a caller can compute every fill value before any
//! column is modified.

use crate::utils::{
    fill_numeric_nulls, fill_numeric_nulls_keep_dtype, fill_string_nulls, numeric_mode, string_mode,
};
use anyhow::Result;
use polars::prelude::*;

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Mean of the non-null values, cast to Float64.
    pub fn numeric_mean(series: &Series) -> Result<Option<f64>> {
        let casted = series.cast(&DataType::Float64)?;
        Ok(casted.mean())
    }

    /// Most frequent non-null value; ties go to the first one seen.
    pub fn categorical_mode(series: &Series) -> Result<Option<String>> {
        Ok(string_mode(series)?)
    }

    /// Most frequent non-null value of a numeric column.
    pub fn numeric_mode(series: &Series) -> Result<Option<f64>> {
        Ok(numeric_mode(series)?)
    }

    /// Replace nulls in a numeric column with `fill_value`.
    pub fn fill_numeric(
        df: &mut DataFrame,
        col_name: &str,
        fill_value: f64,
        processing_steps: &mut Vec<String>,
    ) -> Result<()> {
        let column = df.column(col_name)?;
        let missing = column.null_count();
        let filled = fill_numeric_nulls(column.as_materialized_series(), fill_value)?;
        df.replace(col_name, filled)?;

        processing_steps.push(format!(
            "Filled {} missing values in '{}' with mean: {:.2}",
            missing, col_name, fill_value
        ));
        Ok(())
    }

    /// Replace nulls in a numeric column with its mode, keeping the dtype.
    pub fn fill_numeric_mode(
        df: &mut DataFrame,
        col_name: &str,
        fill_value: f64,
        processing_steps: &mut Vec<String>,
    ) -> Result<()> {
        let column = df.column(col_name)?;
        let missing = column.null_count();
        let filled = fill_numeric_nulls_keep_dtype(column.as_materialized_series(), fill_value)?;
        df.replace(col_name, filled)?;

        processing_steps.push(format!(
            "Filled {} missing values in '{}' with mode: {}",
            missing, col_name, fill_value
        ));
        Ok(())
    }

    /// Replace nulls in a categorical column with `fill_value`.
    pub fn fill_categorical(
        df: &mut DataFrame,
        col_name: &str,
        fill_value: &str,
        processing_steps: &mut Vec<String>,
    ) -> Result<()> {
        let column = df.column(col_name)?;
        let missing = column.null_count();
        let filled = fill_string_nulls(column.as_materialized_series(), fill_value)?;
        df.replace(col_name, filled)?;

        processing_steps.push(format!(
            "Filled {} missing values in '{}' with mode: '{}'",
            missing, col_name, fill_value
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // numeric_mean() tests
    // ========================================================================

    #[test]
    fn test_numeric_mean_ignores_nulls() {
        let series = Series::new("values".into(), &[Some(1.0), None, Some(5.0)]);
        assert_eq!(StatisticalImputer::numeric_mean(&series).unwrap(), Some(3.0));
    }

    #[test]
    fn test_numeric_mean_all_nulls() {
        let series = Series::new("values".into(), &[Option::<f64>::None, None]);
        assert_eq!(StatisticalImputer::numeric_mean(&series).unwrap(), None);
    }

    #[test]
    fn test_numeric_mean_integer_column() {
        let series = Series::new("values".into(), &[Some(10i64), None, Some(20i64)]);
        assert_eq!(StatisticalImputer::numeric_mean(&series).unwrap(), Some(15.0));
    }

    // ========================================================================
    // categorical_mode() tests
    // ========================================================================

    #[test]
    fn test_categorical_mode_basic() {
        let series = Series::new(
            "category".into(),
            &[Some("A"), Some("B"), Some("A"), None, Some("A")],
        );
        assert_eq!(
            StatisticalImputer::categorical_mode(&series).unwrap(),
            Some("A".to_string())
        );
    }

    #[test]
    fn test_categorical_mode_tie_breaking() {
        let series = Series::new("category".into(), &[Some("B"), Some("A"), None]);
        assert_eq!(
            StatisticalImputer::categorical_mode(&series).unwrap(),
            Some("B".to_string())
        );
    }

    #[test]
    fn test_numeric_mode_integer_column() {
        let series = Series::new("ids".into(), &[Some(4i64), None, Some(7i64), Some(7i64)]);
        assert_eq!(StatisticalImputer::numeric_mode(&series).unwrap(), Some(7.0));
    }

    // ========================================================================
    // fill_numeric() / fill_categorical() tests
    // ========================================================================

    #[test]
    fn test_fill_numeric_preserves_original_values() {
        let mut df = df![
            "values" => [Some(10.0), None, Some(20.0)],
        ]
        .unwrap();
        let mut steps = Vec::new();

        StatisticalImputer::fill_numeric(&mut df, "values", 15.0, &mut steps).unwrap();

        let values = df.column("values").unwrap();
        assert_eq!(values.null_count(), 0);
        assert_eq!(values.get(0).unwrap().try_extract::<f64>().unwrap(), 10.0);
        assert_eq!(values.get(1).unwrap().try_extract::<f64>().unwrap(), 15.0);
        assert_eq!(values.get(2).unwrap().try_extract::<f64>().unwrap(), 20.0);
        assert!(matches!(values.dtype(), DataType::Float64));

        assert_eq!(steps.len(), 1);
        assert!(steps[0].contains("mean"));
        assert!(steps[0].contains("15.00"));
    }

    #[test]
    fn test_fill_categorical() {
        let mut df = df![
            "category" => [Some("A"), None, Some("B")],
        ]
        .unwrap();
        let mut steps = Vec::new();

        StatisticalImputer::fill_categorical(&mut df, "category", "A", &mut steps).unwrap();

        let category = df.column("category").unwrap();
        assert_eq!(category.null_count(), 0);
        assert_eq!(category.as_materialized_series().str().unwrap().get(1), Some("A"));
        assert_eq!(category.as_materialized_series().str().unwrap().get(2), Some("B"));
        assert!(steps[0].contains("mode"));
    }

    #[test]
    fn test_fill_numeric_mode_keeps_integer_dtype() {
        let mut df = df![
            "student_id" => [Some(1i64), None, Some(3i64)],
        ]
        .unwrap();
        let mut steps = Vec::new();

        StatisticalImputer::fill_numeric_mode(&mut df, "student_id", 1.0, &mut steps).unwrap();

        let ids = df.column("student_id").unwrap();
        assert_eq!(ids.dtype(), &DataType::Int64);
        assert_eq!(ids.null_count(), 0);
        assert_eq!(ids.as_materialized_series().i64().unwrap().get(1), Some(1));
        assert!(steps[0].contains("mode"));
    }

    #[test]
    fn test_fill_missing_column_errors() {
        let mut df = df![
            "other" => [1.0, 2.0],
        ]
        .unwrap();
        let mut steps = Vec::new();

        assert!(StatisticalImputer::fill_numeric(&mut df, "values", 0.0, &mut steps).is_err());
        assert!(steps.is_empty());
    }
}
