//! Table loading and column normalization.

use crate::cleaner::DataCleaner;
use crate::error::{DashboardError, Result};
use crate::schema::{MISSING_MARKERS, SCORE_COLUMNS, normalize_column_name};
use polars::io::csv::read::{CsvReadOptions, NullValues};
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Reads the source CSV into a [`DataFrame`] with canonical column names.
pub struct TableLoader;

impl TableLoader {
    /// Load a CSV file with a header row.
    ///
    /// Headers are renamed through the fixed normalization table and the
    /// score columns are coerced to Float64. No row-level validation happens
    /// here; missing values are left for the cleaner.
    pub fn load(path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(DashboardError::load(path, "file not found"));
        }

        info!("Loading dataset from: {}", path.display());
        let mut df = CsvReadOptions::default()
            .with_infer_schema_length(Some(100))
            .with_has_header(true)
            .with_parse_options(
                CsvParseOptions::default()
                    .with_quote_char(Some(b'"'))
                    .with_null_values(Some(Self::null_values())),
            )
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .and_then(|reader| reader.finish())
            .map_err(|e| DashboardError::load(path, e))?;

        if df.width() == 0 {
            return Err(DashboardError::load(path, "no header row"));
        }

        Self::prepare(&mut df).map_err(|e| DashboardError::load(path, e))?;

        info!("Dataset loaded successfully: {:?}", df.shape());
        Ok(df)
    }

    /// Cell text read as missing in every column.
    fn null_values() -> NullValues {
        NullValues::AllColumns(MISSING_MARKERS.iter().map(|marker| (*marker).into()).collect())
    }

    /// Normalize headers and coerce score columns on an in-memory table.
    pub fn prepare(df: &mut DataFrame) -> Result<()> {
        Self::normalize_columns(df)?;
        Self::coerce_scores(df)
    }

    /// Rename every column through the normalization table.
    pub fn normalize_columns(df: &mut DataFrame) -> Result<()> {
        let renamed: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| normalize_column_name(name.as_str()).to_string())
            .collect();
        debug!("Normalized columns: {:?}", renamed);
        df.set_column_names(renamed.iter().map(String::as_str))?;
        Ok(())
    }

    /// Cast the score columns to Float64. Unparseable values and NaN become
    /// null.
    fn coerce_scores(df: &mut DataFrame) -> Result<()> {
        for name in SCORE_COLUMNS {
            let column = df.column(name).map_err(|_| {
                DashboardError::invalid_column(name, "required score column is missing")
            })?;
            if column.dtype() != &DataType::Float64 {
                let casted = column.cast(&DataType::Float64)?;
                df.replace(name, casted.take_materialized_series())?;
            }
        }
        DataCleaner::nan_scores_to_null(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_normalizes_headers() {
        let file = write_csv(
            "gender,race/ethnicity,parental level of education,lunch,test preparation course,math score,reading score,writing score,student_id\n\
             female,group B,bachelor's degree,standard,none,72,72,74,1\n",
        );
        let df = TableLoader::load(file.path()).unwrap();
        let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "Gender",
                "Race_Ethnicity",
                "Parental_Education",
                "Lunch",
                "Test_Prep",
                "Math",
                "Reading",
                "Writing",
                "student_id"
            ]
        );
        assert_eq!(df.column("Math").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_load_keeps_missing_values() {
        let file = write_csv(
            "gender,math score,reading score,writing score\n\
             female,72,,74\n\
             ,90,95,93\n",
        );
        let df = TableLoader::load(file.path()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("Reading").unwrap().null_count(), 1);
        assert_eq!(df.column("Gender").unwrap().null_count(), 1);
    }

    #[test]
    fn test_load_reads_missing_markers_as_null() {
        let file = write_csv(
            "gender,math score,reading score,writing score,lunch\n\
             female,NaN,50,50,standard\n\
             male,70,NA,60,N/A\n\
             null,80,90,n/a,free/reduced\n",
        );
        let df = TableLoader::load(file.path()).unwrap();
        assert_eq!(df.column("Math").unwrap().null_count(), 1);
        assert_eq!(df.column("Reading").unwrap().null_count(), 1);
        assert_eq!(df.column("Writing").unwrap().null_count(), 1);
        assert_eq!(df.column("Lunch").unwrap().null_count(), 1);
        assert_eq!(df.column("Gender").unwrap().null_count(), 1);
        assert_eq!(df.column("Math").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_prepare_turns_nan_scores_into_nulls() {
        let mut df = df![
            "math score" => [Some(f64::NAN), Some(70.0)],
            "reading score" => [Some(50.0), None],
            "writing score" => [Some(50.0), Some(60.0)],
        ]
        .unwrap();
        TableLoader::prepare(&mut df).unwrap();
        assert_eq!(df.column("Math").unwrap().null_count(), 1);
        assert_eq!(df.column("Reading").unwrap().null_count(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let err = TableLoader::load("/nonexistent/StudentsPerformance.csv").unwrap_err();
        assert_eq!(err.error_code(), "LOAD_ERROR");
    }

    #[test]
    fn test_load_without_score_columns_fails() {
        let file = write_csv("gender,lunch\nfemale,standard\n");
        let err = TableLoader::load(file.path()).unwrap_err();
        assert_eq!(err.error_code(), "LOAD_ERROR");
    }

    #[test]
    fn test_normalize_columns_passes_unknown_through() {
        let mut df = df![
            "math score" => [1.0],
            "Notes" => ["x"],
        ]
        .unwrap();
        TableLoader::normalize_columns(&mut df).unwrap();
        let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["Math", "Notes"]);
    }
}
