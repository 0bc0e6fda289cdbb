//! Field-name enumeration for every output group.
//!
//! Names that hold sequences carry a bracket suffix describing the sequence:
//!
//! | suffix        | meaning                                                   |
//! |---------------|-----------------------------------------------------------|
//! | `name[]`      | indeterminate length                                      |
//! | `name[n]`     | exactly `n` elements                                      |
//! | `name[n1,]`   | indeterminate length, labels start at `n1`                |
//! | `name[n1,n2]` | `n2 - n1` elements labelled `n1..n2`, like a Rust range   |
//!
//! So `foo[1,5]` expands to `foo_1`, `foo_2`, `foo_3`, `foo_4`. The data
//! field sets themselves use the bare names.

use crate::status::{ALERT_FIELDS, WEDGE_COUNT};

/// Status group names: general, obstruction detail, alert detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFieldNames {
    pub general: Vec<String>,
    pub obstruction: Vec<String>,
    pub alerts: Vec<String>,
}

/// Bulk history names: general, per-metric sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkFieldNames {
    pub general: Vec<String>,
    pub bulk: Vec<String>,
}

/// Ping stat names: general, ping drop, run length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingFieldNames {
    pub general: Vec<String>,
    pub ping_drop: Vec<String>,
    pub run_length: Vec<String>,
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

const GENERAL_HISTORY: &[&str] = &["samples", "end_counter"];

pub fn status_field_names() -> StatusFieldNames {
    StatusFieldNames {
        general: owned(&[
            "id",
            "hardware_version",
            "software_version",
            "state",
            "uptime",
            "snr",
            "seconds_to_first_nonempty_slot",
            "pop_ping_drop_rate",
            "downlink_throughput_bps",
            "uplink_throughput_bps",
            "pop_ping_latency_ms",
            "alerts",
            "fraction_obstructed",
            "currently_obstructed",
            "seconds_obstructed",
        ]),
        obstruction: vec![format!("wedges_fraction_obstructed[{WEDGE_COUNT}]")],
        alerts: owned(ALERT_FIELDS),
    }
}

pub fn history_bulk_field_names() -> BulkFieldNames {
    BulkFieldNames {
        general: owned(GENERAL_HISTORY),
        bulk: owned(&[
            "pop_ping_drop_rate[]",
            "pop_ping_latency_ms[]",
            "downlink_throughput_bps[]",
            "uplink_throughput_bps[]",
            "snr[]",
            "scheduled[]",
            "obstructed[]",
        ]),
    }
}

pub fn history_ping_field_names() -> PingFieldNames {
    PingFieldNames {
        general: owned(GENERAL_HISTORY),
        ping_drop: owned(&[
            "total_ping_drop",
            "count_full_ping_drop",
            "count_obstructed",
            "total_obstructed_ping_drop",
            "count_full_obstructed_ping_drop",
            "count_unscheduled",
            "total_unscheduled_ping_drop",
            "count_full_unscheduled_ping_drop",
        ]),
        run_length: owned(&[
            "init_run_fragment",
            "final_run_fragment",
            "run_seconds[1,61]",
            "run_minutes[1,61]",
        ]),
    }
}

/// A field name split into its base name and sequence shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape<'a> {
    Scalar(&'a str),
    /// Base name, first label, and element count if known.
    Sequence {
        name: &'a str,
        first: usize,
        len: Option<usize>,
    },
}

impl<'a> FieldShape<'a> {
    /// Parse a possibly bracketed field name. Malformed brackets are treated
    /// as part of a scalar name.
    pub fn parse(field: &'a str) -> Self {
        let Some(body) = field.strip_suffix(']') else {
            return Self::Scalar(field);
        };
        let Some((name, spec)) = body.split_once('[') else {
            return Self::Scalar(field);
        };
        let parsed = match spec.split_once(',') {
            None if spec.is_empty() => Some((0, None)),
            None => spec.parse::<usize>().ok().map(|n| (0, Some(n))),
            Some((a, "")) => a.parse::<usize>().ok().map(|a| (a, None)),
            Some((a, b)) => match (a.parse::<usize>(), b.parse::<usize>()) {
                (Ok(a), Ok(b)) if b >= a => Some((a, Some(b - a))),
                _ => None,
            },
        };
        match parsed {
            Some((first, len)) => Self::Sequence { name, first, len },
            None => Self::Scalar(field),
        }
    }

    pub fn name(&self) -> &'a str {
        match *self {
            Self::Scalar(name) | Self::Sequence { name, .. } => name,
        }
    }
}

/// Expand a field name into column names.
///
/// Sequences of unknown length expand to `actual_len` columns when given,
/// otherwise to the bare name.
pub fn expand_field_name(field: &str, actual_len: Option<usize>) -> Vec<String> {
    match FieldShape::parse(field) {
        FieldShape::Scalar(name) => vec![name.to_string()],
        FieldShape::Sequence { name, first, len } => match len.or(actual_len) {
            Some(n) => (first..first + n).map(|i| format!("{name}_{i}")).collect(),
            None => vec![name.to_string()],
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
