//! Canonical column schema and performance bands.
//!
//! Raw headers from the source file are mapped to canonical names once, at
//! load time. Every later stage refers to columns only through the
//! constants in this module.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const GENDER: &str = "Gender";
pub const RACE_ETHNICITY: &str = "Race_Ethnicity";
pub const PARENTAL_EDUCATION: &str = "Parental_Education";
pub const LUNCH: &str = "Lunch";
pub const TEST_PREP: &str = "Test_Prep";
pub const MATH: &str = "Math";
pub const READING: &str = "Reading";
pub const WRITING: &str = "Writing";
pub const AVERAGE: &str = "Average";
pub const PERFORMANCE_BAND: &str = "Performance_Band";

/// Score columns averaged into [`AVERAGE`].
pub const SCORE_COLUMNS: [&str; 3] = [MATH, READING, WRITING];

/// Columns reported by the grouped mean tables, in output order.
pub const METRIC_COLUMNS: [&str; 4] = [MATH, READING, WRITING, AVERAGE];

/// Raw header to canonical name. Matching is exact.
pub const COLUMN_MAP: [(&str, &str); 8] = [
    ("gender", GENDER),
    ("race/ethnicity", RACE_ETHNICITY),
    ("parental level of education", PARENTAL_EDUCATION),
    ("lunch", LUNCH),
    ("test preparation course", TEST_PREP),
    ("math score", MATH),
    ("reading score", READING),
    ("writing score", WRITING),
];

/// Cell text treated as missing when reading the CSV. Empty cells are
/// always missing.
pub const MISSING_MARKERS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Map a raw header to its canonical name; unknown headers pass through.
pub fn normalize_column_name(raw: &str) -> &str {
    COLUMN_MAP
        .iter()
        .find(|(from, _)| *from == raw)
        .map(|(_, to)| *to)
        .unwrap_or(raw)
}

/// Check whether a canonical column holds scores (imputed with the mean).
pub fn is_score_column(name: &str) -> bool {
    SCORE_COLUMNS.contains(&name)
}

/// Ordered bucket of the average score.
///
/// The four bands partition the real line into `(-inf, 50]`, `(50, 70]`,
/// `(70, 85]` and `(85, inf)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PerformanceBand {
    Low,
    Fair,
    Good,
    Excellent,
}

impl PerformanceBand {
    /// All bands in their fixed order.
    pub const ALL: [PerformanceBand; 4] = [Self::Low, Self::Fair, Self::Good, Self::Excellent];

    /// Classify an average score. Upper bounds are inclusive.
    pub fn classify(average: f64) -> Self {
        if average > 85.0 {
            Self::Excellent
        } else if average > 70.0 {
            Self::Good
        } else if average > 50.0 {
            Self::Fair
        } else {
            // NaN lands here too; the pipeline never produces one.
            Self::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Fair => "Fair",
            Self::Good => "Good",
            Self::Excellent => "Excellent",
        }
    }

    /// Parse a band label written by [`PerformanceBand::label`].
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|band| band.label() == label)
    }
}

impl fmt::Display for PerformanceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
