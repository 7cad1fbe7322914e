//! Cell-by-cell comparison of two aggregated runs.
//!
//! The baseline run is `A`, the candidate run is `B`. Every metric is a
//! throughput, so a positive delta means `B` is faster than `A`.

use serde::Serialize;

use crate::error::AnalysisError;
use crate::model::{AggregatedMatrix, GroupBy, METRIC_COUNT, Metric};

/// Noise band, in percent, inside which a delta is neither a regression nor
/// an improvement.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Threshold(f64);

impl Threshold {
    /// 5%, wide enough to absorb run-to-run IOzone jitter.
    pub const DEFAULT: Threshold = Threshold(5.0);

    /// Build a threshold from a non-negative percentage.
    pub fn new(percent: f64) -> Result<Self, AnalysisError> {
        if percent.is_finite() && percent >= 0.0 {
            Ok(Self(percent))
        } else {
            Err(AnalysisError::InvalidThreshold(percent))
        }
    }

    /// The threshold as a percentage.
    pub fn percent(self) -> f64 {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Percentage change of one cell from baseline to candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Delta {
    /// `(B - A) / A * 100`.
    Defined(f64),
    /// The baseline cell was zero.
    Undefined,
}

impl Delta {
    /// Delta between a baseline and a candidate value.
    pub fn between(baseline: u64, candidate: u64) -> Self {
        if baseline == 0 {
            return Self::Undefined;
        }
        let a = baseline as f64;
        Self::Defined((candidate as f64 - a) * 100.0 / a)
    }

    /// The percentage, if defined.
    pub fn percent(self) -> Option<f64> {
        match self {
            Self::Defined(pct) => Some(pct),
            Self::Undefined => None,
        }
    }

    /// Classify this delta against a noise threshold.
    pub fn classify(self, threshold: Threshold) -> CellOutcome {
        match self {
            Self::Undefined => CellOutcome::Undefined,
            Self::Defined(pct) if pct < -threshold.percent() => CellOutcome::Regression,
            Self::Defined(pct) if pct > threshold.percent() => CellOutcome::Improvement,
            Self::Defined(_) => CellOutcome::Unchanged,
        }
    }
}

/// Classification of one compared cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CellOutcome {
    /// The candidate is slower beyond the threshold.
    Regression,
    /// The candidate is faster beyond the threshold.
    Improvement,
    /// The change is within the threshold.
    Unchanged,
    /// The baseline was zero, so no percentage exists.
    Undefined,
}

/// Deltas for one aligned pair of aggregated rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeltaRow {
    /// Group key shared by both rows (baseline's key).
    pub key: Option<u64>,
    /// Per-metric deltas, indexed by [`Metric::index`].
    pub cells: [Delta; METRIC_COUNT],
}

impl DeltaRow {
    /// Delta of one metric column.
    pub fn cell(&self, metric: Metric) -> Delta {
        self.cells[metric.index()]
    }
}

/// Outcome of comparing two aggregated matrices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    /// Grouping of the compared matrices.
    pub group_by: GroupBy,
    /// Threshold the cells were classified with.
    pub threshold: Threshold,
    /// Aligned delta matrix.
    pub rows: Vec<DeltaRow>,
    /// Cells where the candidate is slower beyond the threshold.
    pub regressions: usize,
    /// Cells where the candidate is faster beyond the threshold.
    pub improvements: usize,
    /// Cells whose baseline was zero.
    pub undefined: usize,
    /// All compared cells (`rows × 13`).
    pub total: usize,
}

impl ComparisonResult {
    /// Cells with a defined delta.
    pub fn defined(&self) -> usize {
        self.total - self.undefined
    }

    /// Regressions as a percentage of defined cells.
    pub fn regression_pct(&self) -> Option<f64> {
        self.share(self.regressions)
    }

    /// Improvements as a percentage of defined cells.
    pub fn improvement_pct(&self) -> Option<f64> {
        self.share(self.improvements)
    }

    /// Classification of one cell.
    pub fn outcome(&self, row: usize, metric: Metric) -> Option<CellOutcome> {
        self.rows
            .get(row)
            .map(|r| r.cell(metric).classify(self.threshold))
    }

    fn share(&self, count: usize) -> Option<f64> {
        let defined = self.defined();
        (defined > 0).then(|| 100.0 * count as f64 / defined as f64)
    }
}

/// Compare `candidate` against `baseline` row by row.
///
/// Both matrices must come from the same grouping over the same size grid;
/// rows are paired by position and extra rows on either side are ignored.
/// Use [`compare_checked`] when the inputs are not known to line up.
pub fn compare(
    baseline: &AggregatedMatrix,
    candidate: &AggregatedMatrix,
    threshold: Threshold,
) -> ComparisonResult {
    let mut result = ComparisonResult {
        group_by: baseline.group_by,
        threshold,
        rows: Vec::with_capacity(baseline.len()),
        regressions: 0,
        improvements: 0,
        undefined: 0,
        total: 0,
    };

    for (a, b) in baseline.rows.iter().zip(&candidate.rows) {
        let mut cells = [Delta::Undefined; METRIC_COUNT];
        for metric in Metric::ALL {
            let delta = Delta::between(a.value(metric), b.value(metric));
            match delta.classify(threshold) {
                CellOutcome::Regression => result.regressions += 1,
                CellOutcome::Improvement => result.improvements += 1,
                CellOutcome::Undefined => result.undefined += 1,
                CellOutcome::Unchanged => {}
            }
            cells[metric.index()] = delta;
        }
        result.total += METRIC_COUNT;
        result.rows.push(DeltaRow { key: a.key, cells });
    }

    result
}

/// Like [`compare`], but first verifies that both matrices have the same
/// rows with the same keys in the same order.
pub fn compare_checked(
    baseline: &AggregatedMatrix,
    candidate: &AggregatedMatrix,
    threshold: Threshold,
) -> Result<ComparisonResult, AnalysisError> {
    if baseline.len() != candidate.len() {
        return Err(AnalysisError::RowCountMismatch {
            baseline: baseline.len(),
            candidate: candidate.len(),
        });
    }

    let misaligned = baseline
        .keys()
        .zip(candidate.keys())
        .enumerate()
        .find(|(_, (a, b))| a != b);
    if let Some((row, (expected, found))) = misaligned {
        return Err(AnalysisError::KeyMismatch {
            row,
            baseline: expected,
            candidate: found,
        });
    }

    Ok(compare(baseline, candidate, threshold))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AggregatedRow;

    fn matrix(rows: &[(u64, [u64; METRIC_COUNT])]) -> AggregatedMatrix {
        AggregatedMatrix {
            group_by: GroupBy::FileSize,
            rows: rows
                .iter()
                .map(|&(key, values)| AggregatedRow {
                    key: Some(key),
                    values,
                })
                .collect(),
        }
    }

    fn scaled(m: &AggregatedMatrix, num: u64, den: u64) -> AggregatedMatrix {
        let mut out = m.clone();
        for row in &mut out.rows {
            for v in &mut row.values {
                *v = *v * num / den;
            }
        }
        out
    }

    fn sample() -> AggregatedMatrix {
        matrix(&[
            (64, [1000; METRIC_COUNT]),
            (128, [2000; METRIC_COUNT]),
            (256, [500; METRIC_COUNT]),
        ])
    }

    #[test]
    fn identical_runs_have_no_changes() {
        let a = sample();
        let result = compare(&a, &a.clone(), Threshold::DEFAULT);
        assert_eq!(result.regressions, 0);
        assert_eq!(result.improvements, 0);
        assert_eq!(result.undefined, 0);
        assert_eq!(result.total, 3 * METRIC_COUNT);
        assert_eq!(result.rows[1].cell(Metric::Read), Delta::Defined(0.0));
    }

    #[test]
    fn identical_runs_with_zero_cells_still_count_every_cell() {
        let mut values = [100; METRIC_COUNT];
        values[Metric::StrideRead.index()] = 0;
        let a = matrix(&[(64, values)]);
        let result = compare(&a, &a.clone(), Threshold::DEFAULT);
        assert_eq!(result.regressions, 0);
        assert_eq!(result.improvements, 0);
        assert_eq!(result.undefined, 1);
        assert_eq!(result.total, METRIC_COUNT);
        assert_eq!(result.defined(), METRIC_COUNT - 1);
    }

    #[test]
    fn faster_candidate_is_improvement() {
        let a = sample();
        let b = scaled(&a, 110, 100);
        let result = compare(&a, &b, Threshold::DEFAULT);
        assert_eq!(result.improvements, result.total);
        assert_eq!(result.regressions, 0);
        assert_eq!(result.improvement_pct(), Some(100.0));

        let pct = result.rows[0].cell(Metric::InitWrite).percent().unwrap();
        assert!((pct - 10.0).abs() < 1e-9);
    }

    #[test]
    fn slower_candidate_is_regression() {
        let a = sample();
        let b = scaled(&a, 80, 100);
        let result = compare(&a, &b, Threshold::DEFAULT);
        assert_eq!(result.regressions, result.total);
        assert_eq!(result.outcome(2, Metric::FRead), Some(CellOutcome::Regression));

        let pct = result.rows[2].cell(Metric::FRead).percent().unwrap();
        assert!((pct + 20.0).abs() < 1e-9);
    }

    #[test]
    fn changes_inside_threshold_are_noise() {
        let a = sample();
        let b = scaled(&a, 103, 100);
        let result = compare(&a, &b, Threshold::DEFAULT);
        assert_eq!(result.regressions, 0);
        assert_eq!(result.improvements, 0);

        let strict = compare(&a, &b, Threshold::new(0.0).unwrap());
        assert_eq!(strict.improvements, strict.total);
    }

    #[test]
    fn threshold_boundary_is_not_a_change() {
        let a = matrix(&[(64, [100; METRIC_COUNT])]);
        let b = matrix(&[(64, [95; METRIC_COUNT])]);
        let result = compare(&a, &b, Threshold::DEFAULT);
        assert_eq!(result.regressions, 0);
    }

    #[test]
    fn zero_baseline_is_undefined_and_excluded() {
        let mut base = [1000; METRIC_COUNT];
        base[Metric::InitWrite.index()] = 0;
        let a = matrix(&[(64, base)]);
        let b = matrix(&[(64, [500; METRIC_COUNT])]);

        let result = compare(&a, &b, Threshold::DEFAULT);
        assert_eq!(result.rows[0].cell(Metric::InitWrite), Delta::Undefined);
        assert_eq!(result.outcome(0, Metric::InitWrite), Some(CellOutcome::Undefined));
        assert_eq!(result.undefined, 1);
        assert_eq!(result.regressions, METRIC_COUNT - 1);
        assert_eq!(result.regression_pct(), Some(100.0));
    }

    #[test]
    fn all_undefined_has_no_percentages() {
        let a = matrix(&[(64, [0; METRIC_COUNT])]);
        let result = compare(&a, &a.clone(), Threshold::DEFAULT);
        assert_eq!(result.regression_pct(), None);
        assert_eq!(result.improvement_pct(), None);
    }

    #[test]
    fn checked_rejects_row_count_mismatch() {
        let a = sample();
        let mut b = sample();
        b.rows.pop();
        let err = compare_checked(&a, &b, Threshold::DEFAULT).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::RowCountMismatch {
                baseline: 3,
                candidate: 2
            }
        );
    }

    #[test]
    fn checked_rejects_key_mismatch() {
        let a = sample();
        let mut b = sample();
        b.rows.swap(0, 1);
        let err = compare_checked(&a, &b, Threshold::DEFAULT).unwrap_err();
        assert!(matches!(err, AnalysisError::KeyMismatch { row: 0, .. }));
        assert!(err.to_string().contains("row 0"));
    }

    #[test]
    fn checked_accepts_aligned_runs() {
        let a = sample();
        let result = compare_checked(&a, &scaled(&a, 50, 100), Threshold::DEFAULT).unwrap();
        assert_eq!(result.regressions, result.total);
    }

    #[test]
    fn threshold_validation() {
        assert!(Threshold::new(-1.0).is_err());
        assert!(Threshold::new(f64::NAN).is_err());
        assert!(Threshold::new(f64::INFINITY).is_err());
        assert_eq!(Threshold::new(2.5).unwrap().percent(), 2.5);
        assert_eq!(Threshold::default(), Threshold::DEFAULT);
    }
}
