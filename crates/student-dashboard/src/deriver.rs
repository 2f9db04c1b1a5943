//! Derived columns: the per-student average and its performance band.
//!
//! Both columns are recomputed from scratch on every call, so running the
//! deriver twice yields the same table.

use crate::error::{DashboardError, Result};
use crate::schema::{AVERAGE, PERFORMANCE_BAND, PerformanceBand, SCORE_COLUMNS};
use crate::utils::{float_values, round2};
use polars::prelude::*;
use tracing::debug;

pub struct Deriver;

impl Deriver {
    /// Set `Average = round(mean(Math, Reading, Writing), 2)` for every row.
    ///
    /// Must run after the cleaner: any missing score is a [`DashboardError::Derive`].
    pub fn add_average(df: &mut DataFrame) -> Result<()> {
        let mut totals = vec![0.0; df.height()];

        for name in SCORE_COLUMNS {
            let column = df.column(name).map_err(|_| {
                DashboardError::derive(AVERAGE, format!("score column '{}' is missing", name))
            })?;
            let values = float_values(column.as_materialized_series())?;
            for (row, value) in values.into_iter().enumerate() {
                let value = value.ok_or_else(|| {
                    DashboardError::derive(
                        AVERAGE,
                        format!("'{}' is missing in row {}; fill missing values first", name, row),
                    )
                })?;
                totals[row] += value;
            }
        }

        let averages: Vec<f64> = totals
            .into_iter()
            .map(|total| round2(total / SCORE_COLUMNS.len() as f64))
            .collect();
        Self::put_column(df, Series::new(AVERAGE.into(), averages))?;

        debug!("Computed '{}' for {} rows", AVERAGE, df.height());
        Ok(())
    }

    /// Set `Performance_Band` from `Average` for every row.
    pub fn add_band(df: &mut DataFrame) -> Result<()> {
        let column = df.column(AVERAGE).map_err(|_| {
            DashboardError::derive(PERFORMANCE_BAND, "'Average' has not been computed")
        })?;
        let averages = float_values(column.as_materialized_series())?;

        let mut bands = Vec::with_capacity(averages.len());
        for (row, average) in averages.into_iter().enumerate() {
            let average = average.ok_or_else(|| {
                DashboardError::derive(PERFORMANCE_BAND, format!("'Average' is missing in row {}", row))
            })?;
            bands.push(PerformanceBand::classify(average).label());
        }
        Self::put_column(df, Series::new(PERFORMANCE_BAND.into(), bands))?;

        debug!("Computed '{}' for {} rows", PERFORMANCE_BAND, df.height());
        Ok(())
    }

    /// Replace a column if present, append it otherwise.
    fn put_column(df: &mut DataFrame, series: Series) -> Result<()> {
        let name = series.name().to_string();
        if df.column(&name).is_ok() {
            df.replace(&name, series)?;
        } else {
            df.with_column(series)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{GENDER, MATH, READING, WRITING};

    fn scores(math: &[f64], reading: &[f64], writing: &[f64]) -> DataFrame {
        df![
            GENDER => vec!["female"; math.len()],
            MATH => math,
            READING => reading,
            WRITING => writing,
        ]
        .unwrap()
    }

    fn column_f64(df: &DataFrame, name: &str) -> Vec<f64> {
        float_values(df.column(name).unwrap().as_materialized_series())
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap())
            .collect()
    }

    fn column_str(df: &DataFrame, name: &str) -> Vec<String> {
        df.column(name)
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_add_average_rounds_to_two_decimals() {
        let mut df = scores(&[72.0, 90.0, 100.0], &[72.0, 95.0, 100.0], &[74.0, 93.0, 99.0]);
        Deriver::add_average(&mut df).unwrap();
        assert_eq!(column_f64(&df, AVERAGE), vec![72.67, 92.67, 99.67]);
    }

    #[test]
    fn test_add_average_matches_formula_for_every_row() {
        let math = [47.0, 66.0, 71.5, 88.0, 0.0];
        let reading = [57.0, 71.0, 62.25, 95.0, 17.0];
        let writing = [44.0, 60.0, 80.0, 92.0, 10.0];
        let mut df = scores(&math, &reading, &writing);
        Deriver::add_average(&mut df).unwrap();

        let averages = column_f64(&df, AVERAGE);
        for row in 0..math.len() {
            let expected = round2((math[row] + reading[row] + writing[row]) / 3.0);
            assert_eq!(averages[row], expected);
        }
    }

    #[test]
    fn test_add_average_recomputes_existing_column() {
        let mut df = scores(&[60.0], &[60.0], &[60.0]);
        Deriver::add_average(&mut df).unwrap();
        df.replace(MATH, Series::new(MATH.into(), [90.0])).unwrap();
        Deriver::add_average(&mut df).unwrap();
        assert_eq!(column_f64(&df, AVERAGE), vec![70.0]);
        assert_eq!(df.width(), 5);
    }

    #[test]
    fn test_add_average_fails_on_missing_score() {
        let mut df = df![
            MATH => [Some(60.0), None],
            READING => [60.0, 60.0],
            WRITING => [60.0, 60.0],
        ]
        .unwrap();
        let err = Deriver::add_average(&mut df).unwrap_err();
        assert_eq!(err.error_code(), "DERIVE_ERROR");
    }

    #[test]
    fn test_add_band_boundaries() {
        let mut df = scores(
            &[50.0, 70.0, 85.0, 85.0, 85.03],
            &[50.0, 70.0, 85.0, 85.0, 85.0],
            &[50.0, 70.0, 85.0, 85.03, 85.0],
        );
        Deriver::add_average(&mut df).unwrap();
        Deriver::add_band(&mut df).unwrap();

        assert_eq!(column_f64(&df, AVERAGE), vec![50.0, 70.0, 85.0, 85.01, 85.01]);
        assert_eq!(
            column_str(&df, PERFORMANCE_BAND),
            vec!["Low", "Fair", "Good", "Excellent", "Excellent"]
        );
    }

    #[test]
    fn test_add_band_requires_average() {
        let mut df = scores(&[60.0], &[60.0], &[60.0]);
        let err = Deriver::add_band(&mut df).unwrap_err();
        assert_eq!(err.error_code(), "DERIVE_ERROR");
    }

    #[test]
    fn test_add_band_fails_on_missing_average() {
        let mut df = df![
            AVERAGE => [Some(60.0), None],
        ]
        .unwrap();
        let err = Deriver::add_band(&mut df).unwrap_err();
        assert_eq!(err.error_code(), "DERIVE_ERROR");
    }
}
