//! IOzone benchmark result analysis.
//!
//! Parses the tabular output of `iozone -a`, reduces it to geometric-mean
//! summaries per file size and per record size, compares two runs cell by
//! cell, and renders tables plus the headerless data files and gnuplot
//! scripts used for graphing.
//!
//! Pipeline: raw text → [`parse`] → [`aggregate`] (overall, by record size,
//! by file size) → [`report`], or → [`compare`] → [`report`] for two runs.

pub mod aggregate;
pub mod compare;
pub mod error;
pub mod keyval;
pub mod model;
pub mod parse;
pub mod plot;
pub mod report;

pub use aggregate::{Analysis, aggregate, geometric_mean};
pub use compare::{CellOutcome, ComparisonResult, Delta, Threshold, compare, compare_checked};
pub use error::AnalysisError;
pub use model::{AggregatedMatrix, AggregatedRow, GroupBy, Metric, RawRow, ResultMatrix};
pub use report::Reporter;
