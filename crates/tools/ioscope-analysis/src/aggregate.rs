//! Geometric-mean aggregation of IOzone rows.
//!
//! Each grouping collapses the rows sharing a key into one summary row whose
//! metrics are the geometric means of the group's columns, converted from
//! KB/s to MB/s and truncated.

use std::collections::HashMap;

use serde::Serialize;

use crate::model::{
    AggregatedMatrix, AggregatedRow, GroupBy, METRIC_COUNT, RawRow, ResultMatrix,
};

/// Relative distance, in machine epsilons, under which a mean whose
/// product is too large to check exactly is treated as the nearby integer.
const SNAP_ULPS: f64 = 32.0;

/// Geometric mean of `values`, or `None` for an empty slice.
///
/// A single zero makes the mean exactly zero. `exp(mean(ln x))` carries a
/// few ulps of error, so a mean that is exactly an integer (2048 for
/// `[1024, 4096]`) is returned as that integer rather than 2047.999…, which
/// would truncate to the wrong MB/s value.
pub fn geometric_mean(values: &[u64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    if values.contains(&0) {
        return Some(0.0);
    }

    let log_sum: f64 = values.iter().map(|&v| (v as f64).ln()).sum();
    Some(snap((log_sum / values.len() as f64).exp(), values))
}

/// Round `mean` to the nearest integer only when that integer is the mean.
fn snap(mean: f64, values: &[u64]) -> f64 {
    let nearest = mean.round();
    if !(1.0..u64::MAX as f64).contains(&nearest) {
        return mean;
    }

    let exact = match is_exact_mean(nearest as u64, values) {
        Some(exact) => exact,
        None => (mean - nearest).abs() <= nearest * SNAP_ULPS * f64::EPSILON,
    };
    if exact { nearest } else { mean }
}

/// Whether `candidate^n` equals the product of the `n` values, or `None`
/// when either side overflows `u128`.
fn is_exact_mean(candidate: u64, values: &[u64]) -> Option<bool> {
    let n = u32::try_from(values.len()).ok()?;
    let power = u128::from(candidate).checked_pow(n)?;
    let product = values
        .iter()
        .try_fold(1u128, |acc, &v| acc.checked_mul(u128::from(v)))?;
    Some(power == product)
}

/// Convert a KB/s mean to whole MB/s, truncating toward zero.
fn kb_to_mb(kb: f64) -> u64 {
    (kb / 1024.0).trunc() as u64
}

/// Split `matrix` into groups by `group_by`, keys in first-seen order.
///
/// [`GroupBy::None`] yields a single unkeyed group (none for an empty matrix).
pub fn partition(matrix: &[RawRow], group_by: GroupBy) -> Vec<(Option<u64>, Vec<RawRow>)> {
    if group_by == GroupBy::None {
        if matrix.is_empty() {
            return Vec::new();
        }
        return vec![(None, matrix.to_vec())];
    }

    let mut groups: Vec<(Option<u64>, Vec<RawRow>)> = Vec::new();
    let mut slots: HashMap<Option<u64>, usize> = HashMap::new();

    for row in matrix {
        let key = row.key(group_by);
        let slot = *slots.entry(key).or_insert_with(|| {
            groups.push((key, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(*row);
    }

    groups
}

/// Reduce one group to its summary row.
fn reduce(key: Option<u64>, rows: &[RawRow]) -> AggregatedRow {
    let mut values = [0u64; METRIC_COUNT];
    let mut column = Vec::with_capacity(rows.len());

    for (i, value) in values.iter_mut().enumerate() {
        column.clear();
        column.extend(rows.iter().map(|row| row.metrics[i]));
        *value = geometric_mean(&column).map_or(0, kb_to_mb);
    }

    AggregatedRow { key, values }
}

/// Aggregate `matrix` by `group_by`.
pub fn aggregate(matrix: &[RawRow], group_by: GroupBy) -> AggregatedMatrix {
    let rows = partition(matrix, group_by)
        .iter()
        .map(|(key, rows)| reduce(*key, rows))
        .collect();

    AggregatedMatrix { group_by, rows }
}

/// The three summaries computed for every results file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Analysis {
    /// All file and record sizes combined.
    pub overall: AggregatedMatrix,
    /// One row per record size.
    pub by_record_size: AggregatedMatrix,
    /// One row per file size.
    pub by_file_size: AggregatedMatrix,
}

impl Analysis {
    /// Run all three groupings over one parsed results file.
    pub fn from_matrix(matrix: &ResultMatrix) -> Self {
        Self {
            overall: aggregate(matrix, GroupBy::None),
            by_record_size: aggregate(matrix, GroupBy::RecordSize),
            by_file_size: aggregate(matrix, GroupBy::FileSize),
        }
    }

    /// Returns `true` if the results file contained no rows.
    pub fn is_empty(&self) -> bool {
        self.overall.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FIELD_COUNT, Metric};
    use crate::parse::parse_line;

    fn row(file_size: u64, record_size: u64, value: u64) -> RawRow {
        let mut fields = [value; FIELD_COUNT];
        fields[0] = file_size;
        fields[1] = record_size;
        RawRow::from_fields(fields)
    }

    fn row_with(file_size: u64, record_size: u64, metric: Metric, value: u64) -> RawRow {
        let mut r = row(file_size, record_size, 4096);
        r.metrics[metric.index()] = value;
        r
    }

    #[test]
    fn geometric_mean_basics() {
        assert_eq!(geometric_mean(&[]), None);
        assert_eq!(geometric_mean(&[7]), Some(7.0));
        assert_eq!(geometric_mean(&[1024, 4096]), Some(2048.0));
        assert_eq!(geometric_mean(&[2, 8]), Some(4.0));
        assert_eq!(geometric_mean(&[5, 0, 9]), Some(0.0));
    }

    #[test]
    fn single_row_group() {
        let r = parse_line("64 4 1000 1000 2000 2000 500 500 500 500 500 500 500 500 500").unwrap();
        let m = aggregate(&[r], GroupBy::FileSize);
        assert_eq!(m.rows.len(), 1);
        assert_eq!(m.rows[0].key, Some(64));
        assert_eq!(m.rows[0].value(Metric::InitWrite), 0);
        assert_eq!(m.rows[0].value(Metric::Read), 1);
    }

    #[test]
    fn two_row_record_group() {
        let rows = [
            row_with(64, 4, Metric::InitWrite, 1024),
            row_with(128, 4, Metric::InitWrite, 4096),
        ];
        let m = aggregate(&rows, GroupBy::RecordSize);
        assert_eq!(m.rows.len(), 1);
        assert_eq!(m.rows[0].key, Some(4));
        assert_eq!(m.rows[0].value(Metric::InitWrite), 2);
        assert_eq!(m.rows[0].value(Metric::Rewrite), 4);
    }

    #[test]
    fn zero_in_group_zeroes_column() {
        let rows = [
            row(64, 4, 900_000),
            row_with(64, 8, Metric::StrideRead, 0),
            row(64, 16, 700_000),
        ];
        let m = aggregate(&rows, GroupBy::FileSize);
        assert_eq!(m.rows[0].value(Metric::StrideRead), 0);
        assert!(m.rows[0].value(Metric::Read) > 0);
    }

    #[test]
    fn constant_column_is_fixed_point() {
        for v in [1u64, 1023, 1024, 3000, 1_048_576, 987_654_321] {
            let rows = [row(64, 4, v), row(64, 8, v), row(64, 16, v)];
            let m = aggregate(&rows, GroupBy::FileSize);
            for metric in Metric::ALL {
                assert_eq!(m.rows[0].value(metric), v / 1024, "v = {v}");
            }
        }
    }

    #[test]
    fn near_integer_mean_is_not_rounded_up() {
        // sqrt(4194304^2 - 1) sits just below 4096 MB/s.
        let mean = geometric_mean(&[4_194_303, 4_194_305]).unwrap();
        assert!(mean < 4_194_304.0, "mean = {mean}");
        assert_eq!(kb_to_mb(mean), 4095);

        let rows = [
            row(64, 4, 4_194_303),
            row(64, 8, 4_194_305),
        ];
        let m = aggregate(&rows, GroupBy::FileSize);
        assert_eq!(m.rows[0].value(Metric::Read), 4095);
    }

    #[test]
    fn large_constant_group_stays_fixed_point() {
        let rows: Vec<RawRow> = (0..8).map(|i| row(64, 4 << i, 1_000_003)).collect();
        let m = aggregate(&rows, GroupBy::FileSize);
        assert_eq!(m.rows[0].value(Metric::FRead), 1_000_003 / 1024);
    }

    #[test]
    fn order_does_not_change_means() {
        let rows = vec![
            row(64, 4, 123_456),
            row(64, 8, 654_321),
            row(64, 16, 99_999),
            row(64, 32, 1_500_000),
        ];
        let mut reversed = rows.clone();
        reversed.reverse();
        let mut rotated = rows.clone();
        rotated.rotate_left(1);

        let a = aggregate(&rows, GroupBy::FileSize);
        assert_eq!(a, aggregate(&reversed, GroupBy::FileSize));
        assert_eq!(a, aggregate(&rotated, GroupBy::FileSize));
    }

    #[test]
    fn keys_in_first_seen_order() {
        let rows = [
            row(256, 8, 1),
            row(64, 4, 1),
            row(256, 4, 1),
            row(128, 16, 1),
            row(64, 8, 1),
        ];
        let by_file: Vec<_> = aggregate(&rows, GroupBy::FileSize).keys().collect();
        assert_eq!(by_file, vec![Some(256), Some(64), Some(128)]);

        let by_record: Vec<_> = aggregate(&rows, GroupBy::RecordSize).keys().collect();
        assert_eq!(by_record, vec![Some(8), Some(4), Some(16)]);
    }

    #[test]
    fn partition_reconstructs_input() {
        let rows = vec![
            row(64, 4, 1),
            row(64, 8, 2),
            row(128, 4, 3),
            row(128, 8, 4),
            row(256, 4, 5),
        ];
        for group_by in [GroupBy::None, GroupBy::FileSize, GroupBy::RecordSize] {
            let groups = partition(&rows, group_by);
            let total: usize = groups.iter().map(|(_, g)| g.len()).sum();
            assert_eq!(total, rows.len());

            for (key, members) in &groups {
                assert!(members.iter().all(|r| r.key(group_by) == *key));
            }

            let mut rebuilt: Vec<_> = groups.into_iter().flat_map(|(_, g)| g).collect();
            let mut original = rows.clone();
            rebuilt.sort_by_key(|r| (r.file_size, r.record_size));
            original.sort_by_key(|r| (r.file_size, r.record_size));
            assert_eq!(rebuilt, original);
        }
    }

    #[test]
    fn unkeyed_aggregate_has_no_key() {
        let rows = [row(64, 4, 2048), row(128, 8, 2048)];
        let m = aggregate(&rows, GroupBy::None);
        assert_eq!(m.rows.len(), 1);
        assert_eq!(m.rows[0].key, None);
        assert_eq!(m.rows[0].value(Metric::Read), 2);
    }

    #[test]
    fn empty_matrix_yields_empty_analysis() {
        let analysis = Analysis::from_matrix(&Vec::new());
        assert!(analysis.is_empty());
        assert!(analysis.by_file_size.is_empty());
        assert!(analysis.by_record_size.is_empty());
    }
}
