//! Grouped statistics, band counts, and ranked views over the cleaned table.

use crate::error::{DashboardError, Result};
use crate::schema::{
    AVERAGE, GENDER, MATH, METRIC_COLUMNS, PERFORMANCE_BAND, PerformanceBand, RACE_ETHNICITY,
    TEST_PREP,
};
use crate::types::{
    AggregateView, BandCounts, DashboardSummary, DataQuality, GroupMeans, TopNView,
};
use crate::utils::{float_values, is_numeric_dtype, nan_to_null, round2, string_values};
use polars::prelude::*;
use tracing::{debug, info};

/// Group size column produced by [`Aggregator::group_means`].
const GROUP_SIZE: &str = "group_size";

pub struct Aggregator;

impl Aggregator {
    /// Compute every derived view the dashboard needs, once.
    ///
    /// `quality` is carried through unchanged; it must be taken before the
    /// table was filled.
    pub fn summarize(df: &DataFrame, quality: DataQuality, top_n: usize) -> Result<DashboardSummary> {
        info!("Aggregating {} rows", df.height());
        Ok(DashboardSummary {
            quality,
            by_gender: Self::group_means(df, GENDER)?,
            by_race: Self::group_means(df, RACE_ETHNICITY)?,
            by_prep: Self::group_means(df, TEST_PREP)?,
            bands: Self::band_distribution(df)?,
            top_by_average: Self::top_n(df, AVERAGE, top_n)?,
            top_by_math: Self::top_n(df, MATH, top_n)?,
        })
    }

    /// Mean Math, Reading, Writing and Average per value of `column`.
    ///
    /// Means are rounded to two decimals and groups are ordered by key.
    /// Rows with a null key are not grouped.
    pub fn group_means(df: &DataFrame, column: &str) -> Result<AggregateView> {
        if df.column(column).is_err() {
            return Err(DashboardError::invalid_column(column, "column does not exist"));
        }
        for name in METRIC_COLUMNS {
            Self::require_numeric(df, name)?;
        }

        let mut aggregations = vec![len().alias(GROUP_SIZE)];
        aggregations.extend(
            METRIC_COLUMNS
                .iter()
                .map(|name| col(*name).cast(DataType::Float64).mean()),
        );

        let grouped = df
            .clone()
            .lazy()
            .filter(col(column).is_not_null())
            .group_by([col(column)])
            .agg(aggregations)
            .sort([column], SortMultipleOptions::default())
            .collect()?;

        let keys = string_values(grouped.column(column)?.as_materialized_series())?;
        let sizes = float_values(grouped.column(GROUP_SIZE)?.as_materialized_series())?;
        let mut means = Vec::with_capacity(METRIC_COLUMNS.len());
        for name in METRIC_COLUMNS {
            means.push(float_values(grouped.column(name)?.as_materialized_series())?);
        }

        let groups: Vec<GroupMeans> = keys
            .into_iter()
            .enumerate()
            .map(|(row, key)| {
                let mean = |slot: usize| round2(means[slot][row].unwrap_or(f64::NAN));
                GroupMeans {
                    key: key.unwrap_or_default(),
                    count: sizes[row].unwrap_or(0.0) as usize,
                    math: mean(0),
                    reading: mean(1),
                    writing: mean(2),
                    average: mean(3),
                }
            })
            .collect();

        debug!("Grouped by '{}': {} groups", column, groups.len());
        Ok(AggregateView {
            column: column.to_string(),
            groups,
        })
    }

    /// Count rows per performance band, in band order with zero fill.
    pub fn band_distribution(df: &DataFrame) -> Result<BandCounts> {
        let column = df.column(PERFORMANCE_BAND).map_err(|_| {
            DashboardError::derive(PERFORMANCE_BAND, "band column has not been computed")
        })?;
        let labels = string_values(column.as_materialized_series())?;

        let mut counts = PerformanceBand::ALL.map(|band| (band, 0usize));
        for label in labels.into_iter().flatten() {
            let band = PerformanceBand::from_label(&label).ok_or_else(|| {
                DashboardError::derive(PERFORMANCE_BAND, format!("unknown band label '{}'", label))
            })?;
            counts[band as usize].1 += 1;
        }

        Ok(BandCounts { counts })
    }

    /// The first `n` rows ranked descending by `column`.
    ///
    /// Ties keep their original row order. Missing values, NaN included,
    /// rank last.
    pub fn top_n(df: &DataFrame, column: &str, n: usize) -> Result<TopNView> {
        let values = Self::require_numeric(df, column)?;

        let key = nan_to_null(values.as_materialized_series())?.with_name("key".into());
        let ranking = DataFrame::new(vec![key.into_column()])?
            .with_row_index("row".into(), None)?
            .sort(
                ["key"],
                SortMultipleOptions::default()
                    .with_order_descending(true)
                    .with_nulls_last(true)
                    .with_maintain_order(true),
            )?
            .head(Some(n));
        let order = ranking.column("row")?.as_materialized_series().idx()?.clone();
        let rows = df.take(&order)?;

        Ok(TopNView {
            column: column.to_string(),
            rows,
        })
    }

    fn require_numeric<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
        let column = df
            .column(name)
            .map_err(|_| DashboardError::invalid_column(name, "column does not exist"))?;
        if !is_numeric_dtype(column.dtype()) {
            return Err(DashboardError::invalid_column(
                name,
                format!("expected a numeric column, found {}", column.dtype()),
            ));
        }
        Ok(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{READING, WRITING};
    use pretty_assertions::assert_eq;

    fn derived_df() -> DataFrame {
        df![
            GENDER => ["female", "male", "female", "male", "female"],
            TEST_PREP => ["none", "completed", "none", "none", "completed"],
            MATH => [70.0, 80.0, 90.0, 40.0, 90.0],
            READING => [80.0, 70.0, 90.0, 50.0, 95.0],
            WRITING => [75.0, 60.0, 90.0, 45.0, 94.0],
            AVERAGE => [75.0, 70.0, 90.0, 45.0, 93.0],
            PERFORMANCE_BAND => ["Good", "Fair", "Excellent", "Low", "Excellent"],
        ]
        .unwrap()
    }

    #[test]
    fn test_group_means() {
        let view = Aggregator::group_means(&derived_df(), GENDER).unwrap();
        assert_eq!(view.column, GENDER);
        assert_eq!(
            view.groups,
            vec![
                GroupMeans {
                    key: "female".to_string(),
                    count: 3,
                    math: 83.33,
                    reading: 88.33,
                    writing: 86.33,
                    average: 86.0,
                },
                GroupMeans {
                    key: "male".to_string(),
                    count: 2,
                    math: 60.0,
                    reading: 60.0,
                    writing: 52.5,
                    average: 57.5,
                },
            ]
        );
    }

    #[test]
    fn test_group_means_weighted_back_to_overall_mean() {
        let df = derived_df();
        let view = Aggregator::group_means(&df, TEST_PREP).unwrap();

        let total: usize = view.groups.iter().map(|g| g.count).sum();
        let weighted: f64 = view
            .groups
            .iter()
            .map(|g| g.average * g.count as f64)
            .sum::<f64>()
            / total as f64;
        let overall = df.column(AVERAGE).unwrap().as_materialized_series().mean().unwrap();
        assert!((weighted - overall).abs() < 0.01 * view.groups.len() as f64);
    }

    #[test]
    fn test_group_means_identical_scores_per_group() {
        let df = df![
            GENDER => ["female", "male"],
            MATH => [64.0, 64.0],
            READING => [64.0, 64.0],
            WRITING => [64.0, 64.0],
            AVERAGE => [64.0, 64.0],
        ]
        .unwrap();
        let view = Aggregator::group_means(&df, GENDER).unwrap();
        assert_eq!(view.groups.len(), 2);
        for group in &view.groups {
            assert_eq!(group.average, 64.0);
        }
    }

    #[test]
    fn test_group_means_unknown_column() {
        let err = Aggregator::group_means(&derived_df(), "Lunch").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_COLUMN");
    }

    #[test]
    fn test_summarize_builds_every_view() {
        let mut df = derived_df();
        df.with_column(Series::new(
            RACE_ETHNICITY.into(),
            ["group B", "group A", "group B", "group C", "group A"],
        ))
        .unwrap();
        let quality = DataQuality {
            duplicate_rows: 1,
            ..Default::default()
        };

        let summary = Aggregator::summarize(&df, quality.clone(), 2).unwrap();
        assert_eq!(summary.quality, quality);
        assert_eq!(summary.by_gender.groups.len(), 2);
        let races: Vec<&str> = summary.by_race.groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(races, vec!["group A", "group B", "group C"]);
        assert_eq!(summary.by_prep.column, TEST_PREP);
        assert_eq!(summary.bands.total(), df.height());
        assert_eq!(summary.top_by_average.rows.height(), 2);
        assert_eq!(summary.top_by_math.column, MATH);
    }

    #[test]
    fn test_band_distribution_fixed_order_with_zero_fill() {
        let df = df![
            PERFORMANCE_BAND => ["Excellent", "Low", "Excellent"],
        ]
        .unwrap();
        let bands = Aggregator::band_distribution(&df).unwrap();
        assert_eq!(
            bands.counts,
            [
                (PerformanceBand::Low, 1),
                (PerformanceBand::Fair, 0),
                (PerformanceBand::Good, 0),
                (PerformanceBand::Excellent, 2),
            ]
        );
        assert_eq!(bands.total(), df.height());
    }

    #[test]
    fn test_band_distribution_requires_band_column() {
        let df = df![AVERAGE => [50.0]].unwrap();
        assert!(Aggregator::band_distribution(&df).is_err());
    }

    #[test]
    fn test_top_n_descending_and_stable() {
        let df = derived_df();
        let top = Aggregator::top_n(&df, MATH, 3).unwrap();
        assert_eq!(top.column, MATH);
        assert_eq!(top.rows.height(), 3);

        let math = float_values(top.rows.column(MATH).unwrap().as_materialized_series()).unwrap();
        assert_eq!(math, vec![Some(90.0), Some(90.0), Some(80.0)]);

        // Rows 2 and 4 tie on 90; row 2 comes first.
        let reading =
            float_values(top.rows.column(READING).unwrap().as_materialized_series()).unwrap();
        assert_eq!(reading[0], Some(90.0));
        assert_eq!(reading[1], Some(95.0));
    }

    #[test]
    fn test_top_n_ranks_nan_and_nulls_last() {
        let math: Vec<Option<f64>> = (0..64)
            .map(|i| match i % 5 {
                0 => Some(f64::NAN),
                4 => None,
                _ => Some(i as f64),
            })
            .collect();
        let df = df![MATH => math].unwrap();

        let top = Aggregator::top_n(&df, MATH, 64).unwrap();
        let ranked = float_values(top.rows.column(MATH).unwrap().as_materialized_series()).unwrap();
        let valid = ranked.iter().take_while(|v| v.is_some_and(|x| !x.is_nan())).count();
        assert_eq!(valid, 64 - 13 - 12);
        assert_eq!(ranked[0], Some(63.0));
        assert!(ranked[valid..].iter().all(|v| v.is_none_or(f64::is_nan)));
    }

    #[test]
    fn test_group_means_skips_null_keys() {
        let df = df![
            GENDER => [Some("female"), None, Some("male")],
            MATH => [70.0, 10.0, 80.0],
            READING => [70.0, 10.0, 80.0],
            WRITING => [70.0, 10.0, 80.0],
            AVERAGE => [70.0, 10.0, 80.0],
        ]
        .unwrap();
        let view = Aggregator::group_means(&df, GENDER).unwrap();
        let keys: Vec<&str> = view.groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["female", "male"]);
        assert_eq!(view.groups[0].count, 1);
        assert_eq!(view.groups[1].math, 80.0);
    }

    #[test]
    fn test_top_n_larger_than_table() {
        let df = derived_df();
        let top = Aggregator::top_n(&df, AVERAGE, 20).unwrap();
        assert_eq!(top.rows.height(), df.height());
        assert_eq!(top.rows.width(), df.width());
    }

    #[test]
    fn test_top_n_rejects_categorical_and_missing_columns() {
        let df = derived_df();
        let err = Aggregator::top_n(&df, GENDER, 3).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_COLUMN");
        let err = Aggregator::top_n(&df, "Science", 3).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_COLUMN");
    }
}
