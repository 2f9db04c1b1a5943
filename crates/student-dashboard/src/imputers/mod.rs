//! Imputation module for handling missing values.
//!
//! Score columns are filled with their mean, every other column with its
//! mode.

mod statistical;

pub use statistical::StatisticalImputer;
