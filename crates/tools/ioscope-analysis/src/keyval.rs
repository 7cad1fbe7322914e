//! Flat key/value extraction of a single IOzone run.
//!
//! Auto mode (`-a`) produces one key per (file size, record size, metric)
//! cell. Throughput mode (`-t N`) prints per-section summaries instead, e.g.
//!
//! ```text
//! Children see throughput for  2 initial writers  =  531372.38 kB/sec
//! Parent sees throughput for  2 initial writers   =  254236.52 kB/sec
//! Min throughput per process                      =  262213.84 kB/sec
//! Min xfer                                        =  510976.00 kB
//! ```
//!
//! which become `initial_writers-2-kids`, `initial_writers-2-parent`,
//! `initial_writers-2-Min` and `initial_writers-2-MinXfer`.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::model::Metric;
use crate::parse;

const CHILDREN_PREFIX: &str = "Children see throughput for";
const PARENT_PREFIX: &str = "Parent sees throughput for";
const MIN_XFER_PREFIX: &str = "Min xfer";
/// Unit of every throughput figure.
const RATE_UNIT: &str = "KB/sec";
/// Unit of the `Min xfer` transfer size.
const SIZE_UNIT: &str = "KB";

/// How IOzone was invoked, which decides the shape of its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// `-a`: full result table.
    Auto,
    /// Throughput summaries per test section.
    Throughput,
}

impl Mode {
    /// Detect the mode from the IOzone argument string.
    pub fn detect(args: &str) -> Self {
        if args.split_whitespace().any(|arg| arg == "-a") {
            Self::Auto
        } else {
            Self::Throughput
        }
    }
}

/// A single extracted value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum KeyvalValue {
    /// Integer KB/s from the auto-mode table.
    Int(u64),
    /// KB/s or KB figure from a throughput summary.
    Float(f64),
}

/// Extracted values, ordered by key.
pub type Keyval = BTreeMap<String, KeyvalValue>;

/// Extract key/value pairs from raw IOzone output.
pub fn extract(raw: &str, mode: Mode) -> Keyval {
    match mode {
        Mode::Auto => extract_auto(raw),
        Mode::Throughput => extract_throughput(raw),
    }
}

/// Serialize extracted values as pretty-printed JSON.
pub fn to_json(keyval: &Keyval) -> Result<String> {
    serde_json::to_string_pretty(keyval).context("serializing keyval to JSON")
}

fn extract_auto(raw: &str) -> Keyval {
    let mut keyval = Keyval::new();
    for row in raw.lines().filter_map(parse::parse_line) {
        for metric in Metric::ALL {
            keyval.insert(
                format!("{}-{}-{}", row.file_size, row.record_size, metric.label()),
                KeyvalValue::Int(row.metric(metric)),
            );
        }
    }
    keyval
}

/// Read `"<number> <unit>"` from the right-hand side of a summary line,
/// accepting only `unit` (case-insensitively).
fn reading(rhs: &str, unit: &str) -> Option<f64> {
    let mut tokens = rhs.split_whitespace();
    let value = tokens.next()?.parse().ok()?;
    tokens.next()?.eq_ignore_ascii_case(unit).then_some(value)
}

/// Parse `"<count> <section words>"` into `(count, section_name)`.
fn section_header(rest: &str) -> Option<(u64, String)> {
    let rest = rest.trim();
    let (count, name) = rest.split_once(char::is_whitespace)?;
    let count = count.parse().ok()?;
    let name = name.split_whitespace().collect::<Vec<_>>().join("_");
    (!name.is_empty()).then_some((count, name))
}

/// `Min|Max|Avg throughput per thread|process`.
fn per_worker_stat(lhs: &str) -> Option<&str> {
    let (stat, rest) = lhs.split_once(' ')?;
    if !matches!(stat, "Min" | "Max" | "Avg") {
        return None;
    }
    matches!(
        rest.trim(),
        "throughput per thread" | "throughput per process"
    )
    .then_some(stat)
}

fn extract_throughput(raw: &str) -> Keyval {
    let mut keyval = Keyval::new();
    let mut section: Option<(u64, String)> = None;

    for line in raw.lines() {
        let Some((lhs, rhs)) = line.split_once('=') else {
            continue;
        };
        let lhs = lhs.trim();

        if let Some(rest) = lhs.strip_prefix(CHILDREN_PREFIX) {
            if let (Some((count, name)), Some(value)) =
                (section_header(rest), reading(rhs, RATE_UNIT))
            {
                keyval.insert(format!("{name}-{count}-kids"), KeyvalValue::Float(value));
                section = Some((count, name));
            }
            continue;
        }

        let Some((count, name)) = section.as_ref() else {
            continue;
        };

        let (basekey, unit) = if let Some(rest) = lhs.strip_prefix(PARENT_PREFIX) {
            // Parent lines must belong to the current children section.
            match section_header(rest) {
                Some((c, n)) if c == *count && n == *name => ("parent", RATE_UNIT),
                _ => continue,
            }
        } else if lhs.starts_with(MIN_XFER_PREFIX) {
            ("MinXfer", SIZE_UNIT)
        } else if let Some(stat) = per_worker_stat(lhs) {
            (stat, RATE_UNIT)
        } else {
            continue;
        };

        let Some(value) = reading(rhs, unit) else {
            continue;
        };
        keyval.insert(format!("{name}-{count}-{basekey}"), KeyvalValue::Float(value));
    }

    keyval
}
