//! Custom error types for the dashboard pipeline.
//!
//! This module provides the error hierarchy using `thiserror`. Every stage
//! maps its failures into [`DashboardError`] at the stage boundary, so the
//! pipeline driver and the binary see one typed error.
//!
//! Errors are serializable as `{code, message}` so they can be logged or
//! handed to other tools in a structured form.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the dashboard pipeline.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// The input table could not be read or has no usable header.
    #[error("Failed to load '{path}': {reason}")]
    Load { path: String, reason: String },

    /// A derived column was requested on incomplete data.
    ///
    /// This always indicates a stage-ordering bug in the caller.
    #[error("Cannot derive '{column}': {reason}")]
    Derive { column: String, reason: String },

    /// An aggregation was requested on a missing or non-numeric column.
    #[error("Invalid column '{column}': {reason}")]
    InvalidColumn { column: String, reason: String },

    /// The report destination could not be created or written.
    #[error("Failed to write '{path}': {reason}")]
    Write { path: String, reason: String },

    /// A single chart could not be rendered.
    #[error("Failed to render chart '{chart}': {reason}")]
    ChartRender { chart: String, reason: String },

    /// Internal error from a helper that reports through `anyhow`.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<DashboardError>,
    },
}

impl DashboardError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        DashboardError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    pub fn load(path: impl AsRef<std::path::Path>, reason: impl ToString) -> Self {
        Self::Load {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn write(path: impl AsRef<std::path::Path>, reason: impl ToString) -> Self {
        Self::Write {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn derive(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Derive {
            column: column.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_column(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidColumn {
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Get a stable error code for structured output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Load { .. } => "LOAD_ERROR",
            Self::Derive { .. } => "DERIVE_ERROR",
            Self::InvalidColumn { .. } => "INVALID_COLUMN",
            Self::Write { .. } => "WRITE_ERROR",
            Self::ChartRender { .. } => "CHART_RENDER_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if the pipeline may continue after this error.
    ///
    /// Only chart rendering failures are recoverable: the chart is omitted
    /// and the report is written without it.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::ChartRender { .. } => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

impl Serialize for DashboardError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("DashboardError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for dashboard operations.
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| DashboardError::Polars(e).with_context(context))
    }
}
