//! Error types for caller mistakes detectable by the analysis library.

use std::fmt;

/// Errors returned by the checked analysis entry points.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// The two matrices being compared do not have the same row count.
    RowCountMismatch {
        /// Rows in the baseline matrix.
        baseline: usize,
        /// Rows in the candidate matrix.
        candidate: usize,
    },
    /// Row `row` carries different group keys in the two matrices.
    KeyMismatch {
        /// Index of the first misaligned row.
        row: usize,
        /// Key in the baseline matrix.
        baseline: Option<u64>,
        /// Key in the candidate matrix.
        candidate: Option<u64>,
    },
    /// A noise threshold that is negative or not finite.
    InvalidThreshold(f64),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RowCountMismatch {
                baseline,
                candidate,
            } => write!(
                f,
                "cannot compare runs: baseline has {baseline} rows, candidate has {candidate}"
            ),
            Self::KeyMismatch {
                row,
                baseline,
                candidate,
            } => write!(
                f,
                "cannot compare runs: row {row} has key {} in baseline but {} in candidate",
                fmt_key(*baseline),
                fmt_key(*candidate)
            ),
            Self::InvalidThreshold(value) => {
                write!(f, "invalid regression threshold: {value}%")
            }
        }
    }
}

impl std::error::Error for AnalysisError {}

fn fmt_key(key: Option<u64>) -> String {
    key.map_or_else(|| "ALL".to_string(), |k| k.to_string())
}
