//! Row and matrix types shared by the parser, aggregator and comparator.
//!
//! IOzone's auto mode prints one line per (file size, record size) pair:
//! two size columns in KB followed by 13 throughput columns in KB/s.

use serde::Serialize;

/// Number of throughput columns in an IOzone row.
pub const METRIC_COUNT: usize = 13;

/// Number of fields in a conforming IOzone row (two sizes + metrics).
pub const FIELD_COUNT: usize = 2 + METRIC_COUNT;

/// One of the 13 throughput columns, in IOzone's column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    /// Initial sequential write.
    InitWrite,
    /// Sequential rewrite of an existing file.
    Rewrite,
    /// Sequential read.
    Read,
    /// Sequential re-read.
    Reread,
    /// Random read.
    RandomRead,
    /// Random write.
    RandomWrite,
    /// Backward read.
    BackwardRead,
    /// Rewrite of a single record in place.
    RecordRewrite,
    /// Strided read.
    StrideRead,
    /// `fwrite()` library call.
    FWrite,
    /// `fwrite()` on an existing file.
    FRewrite,
    /// `fread()` library call.
    FRead,
    /// `fread()` on a cached file.
    FReread,
}

impl Metric {
    /// All metrics in column order.
    pub const ALL: [Metric; METRIC_COUNT] = [
        Metric::InitWrite,
        Metric::Rewrite,
        Metric::Read,
        Metric::Reread,
        Metric::RandomRead,
        Metric::RandomWrite,
        Metric::BackwardRead,
        Metric::RecordRewrite,
        Metric::StrideRead,
        Metric::FWrite,
        Metric::FRewrite,
        Metric::FRead,
        Metric::FReread,
    ];

    /// Position of this metric among the 13 throughput columns.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Short label used in keyval keys, plot titles and script file names.
    pub fn label(self) -> &'static str {
        match self {
            Metric::InitWrite => "write",
            Metric::Rewrite => "rewrite",
            Metric::Read => "read",
            Metric::Reread => "reread",
            Metric::RandomRead => "randread",
            Metric::RandomWrite => "randwrite",
            Metric::BackwardRead => "bkwdread",
            Metric::RecordRewrite => "recordrewrite",
            Metric::StrideRead => "strideread",
            Metric::FWrite => "fwrite",
            Metric::FRewrite => "frewrite",
            Metric::FRead => "fread",
            Metric::FReread => "freread",
        }
    }

    /// Column header used in rendered tables.
    pub fn header(self) -> &'static str {
        match self {
            Metric::InitWrite => "INIT WRITE",
            Metric::Rewrite => "RE WRITE",
            Metric::Read => "READ",
            Metric::Reread => "RE READ",
            Metric::RandomRead => "RANDOM READ",
            Metric::RandomWrite => "RANDOM WRITE",
            Metric::BackwardRead => "BACKWD READ",
            Metric::RecordRewrite => "RECRE WRITE",
            Metric::StrideRead => "STRIDE READ",
            Metric::FWrite => "F WRITE",
            Metric::FRewrite => "FRE WRITE",
            Metric::FRead => "F READ",
            Metric::FReread => "FRE READ",
        }
    }
}

/// A single parsed IOzone observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RawRow {
    /// File size in KB.
    pub file_size: u64,
    /// Record size in KB.
    pub record_size: u64,
    /// Throughput values in KB/s, indexed by [`Metric::index`].
    pub metrics: [u64; METRIC_COUNT],
}

impl RawRow {
    /// Build a row from the 15 fields in IOzone column order.
    pub fn from_fields(fields: [u64; FIELD_COUNT]) -> Self {
        let mut metrics = [0; METRIC_COUNT];
        metrics.copy_from_slice(&fields[2..]);
        Self {
            file_size: fields[0],
            record_size: fields[1],
            metrics,
        }
    }

    /// Value of one throughput column.
    pub fn metric(&self, metric: Metric) -> u64 {
        self.metrics[metric.index()]
    }

    /// Value of the grouping column, if any.
    pub fn key(&self, group_by: GroupBy) -> Option<u64> {
        match group_by {
            GroupBy::None => None,
            GroupBy::FileSize => Some(self.file_size),
            GroupBy::RecordSize => Some(self.record_size),
        }
    }
}

/// Rows of one IOzone output file, in source order.
pub type ResultMatrix = Vec<RawRow>;

/// Column used to partition rows before reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupBy {
    /// The whole matrix is one group.
    None,
    /// Group by the file size column.
    FileSize,
    /// Group by the record size column.
    RecordSize,
}

impl GroupBy {
    /// Header of the leading key column in rendered tables.
    pub fn key_header(self) -> &'static str {
        match self {
            GroupBy::None => "FILE & RECORD SIZES (KB)",
            GroupBy::FileSize => "FILE SIZE (KB)",
            GroupBy::RecordSize => "RECORD SIZE (KB)",
        }
    }
}

/// Geometric-mean summary of one group, in MB/s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AggregatedRow {
    /// Group key (file or record size); `None` for the overall summary.
    pub key: Option<u64>,
    /// Truncated MB/s values, indexed by [`Metric::index`].
    pub values: [u64; METRIC_COUNT],
}

impl AggregatedRow {
    /// Value of one throughput column.
    pub fn value(&self, metric: Metric) -> u64 {
        self.values[metric.index()]
    }
}

/// One aggregated row per distinct key, in first-seen key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedMatrix {
    /// Grouping that produced the rows.
    pub group_by: GroupBy,
    /// Aggregated rows.
    pub rows: Vec<AggregatedRow>,
}

impl AggregatedMatrix {
    /// Number of aggregated rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if no group produced a row.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Group keys in row order.
    pub fn keys(&self) -> impl Iterator<Item = Option<u64>> + '_ {
        self.rows.iter().map(|row| row.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_indices_follow_column_order() {
        for (i, metric) in Metric::ALL.iter().enumerate() {
            assert_eq!(metric.index(), i);
        }
        assert_eq!(Metric::FReread.index(), METRIC_COUNT - 1);
    }

    #[test]
    fn row_from_fields_splits_sizes() {
        let mut fields = [0u64; FIELD_COUNT];
        for (i, f) in fields.iter_mut().enumerate() {
            *f = i as u64 * 10;
        }
        let row = RawRow::from_fields(fields);
        assert_eq!(row.file_size, 0);
        assert_eq!(row.record_size, 10);
        assert_eq!(row.metric(Metric::InitWrite), 20);
        assert_eq!(row.metric(Metric::FReread), 140);
    }

    #[test]
    fn row_key_by_grouping() {
        let row = RawRow::from_fields([64, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(row.key(GroupBy::None), None);
        assert_eq!(row.key(GroupBy::FileSize), Some(64));
        assert_eq!(row.key(GroupBy::RecordSize), Some(4));
    }
}
