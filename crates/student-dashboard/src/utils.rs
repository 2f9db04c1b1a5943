//! Shared utilities for the dashboard pipeline.
//!
//! This module contains common helper functions used across multiple modules
//! to reduce code duplication and ensure consistency.

use polars::prelude::*;
use std::collections::HashMap;
use std::hash::Hash;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

// =============================================================================
// Series Extraction Utilities
// =============================================================================

/// Read a Series as optional floats, casting if needed.
///
/// Values that cannot be cast become `None`.
pub fn float_values(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    let casted = series.cast(&DataType::Float64)?;
    Ok(casted.f64()?.into_iter().collect())
}

/// Read a Series as optional strings, casting if needed.
pub fn string_values(series: &Series) -> PolarsResult<Vec<Option<String>>> {
    let casted = series.cast(&DataType::String)?;
    Ok(casted
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

// =============================================================================
// Series Statistics Utilities
// =============================================================================

/// Round to two decimal places.
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Most frequent value; a tie resolves to the value seen first.
fn first_seen_mode<T: Clone + Eq + Hash>(values: impl IntoIterator<Item = T>) -> Option<T> {
    let mut order: Vec<(T, usize)> = Vec::new();
    let mut index: HashMap<T, usize> = HashMap::new();
    for value in values {
        match index.get(&value) {
            Some(&slot) => order[slot].1 += 1,
            None => {
                index.insert(value.clone(), order.len());
                order.push((value, 1));
            }
        }
    }

    let mut best: Option<(T, usize)> = None;
    for (value, count) in order {
        if best.as_ref().is_none_or(|(_, top)| count > *top) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

/// Calculate the mode (most frequent value) of a string Series.
///
/// Counts are kept in first-encountered order so a tie resolves to the
/// value that appeared first in the column.
pub fn string_mode(series: &Series) -> PolarsResult<Option<String>> {
    Ok(first_seen_mode(string_values(series)?.into_iter().flatten()))
}

/// Calculate the mode of a numeric Series, compared as Float64.
///
/// Ties resolve the same way as [`string_mode`]. NaN counts as missing.
pub fn numeric_mode(series: &Series) -> PolarsResult<Option<f64>> {
    let bits = float_values(series)?
        .into_iter()
        .flatten()
        .filter(|value| !value.is_nan())
        .map(f64::to_bits);
    Ok(first_seen_mode(bits).map(f64::from_bits))
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill null values in a numeric Series with a specific value.
///
/// The result is always Float64.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let filled: Vec<f64> = float_values(series)?
        .into_iter()
        .map(|value| value.unwrap_or(fill_value))
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

/// Fill null values with `fill_value` and cast back to the input dtype.
///
/// Used for mode fills on numeric columns that are not scores, so an
/// integer column stays an integer column.
pub fn fill_numeric_nulls_keep_dtype(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    fill_numeric_nulls(series, fill_value)?.cast(series.dtype())
}

/// Replace NaN with null in a numeric Series. The result is Float64.
pub fn nan_to_null(series: &Series) -> PolarsResult<Series> {
    let values: Float64Chunked = float_values(series)?
        .into_iter()
        .map(|value| value.filter(|v| !v.is_nan()))
        .collect();
    Ok(values.with_name(series.name().clone()).into_series())
}

/// Fill null values in a string Series with a specific value.
///
/// The result is always String.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let filled: Vec<String> = string_values(series)?
        .into_iter()
        .map(|value| value.unwrap_or_else(|| fill_value.to_string()))
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

// =============================================================================
// Tests
// =============================================================================
