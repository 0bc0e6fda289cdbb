//! History snapshots: one read of the terminal's per-second ring buffers.
//!
//! A [`HistorySnapshot`] holds the write counter and seven parallel
//! sequences, one per metric, all `capacity` long. Nothing here knows which
//! slots are valid or in what order; [`crate::window::resolve`] decides that,
//! and [`HistorySnapshot::bulk`] unwinds a resolved window into plain
//! oldest-to-newest sequences.

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::stats::GeneralStats;
use crate::value::{FieldSet, FieldValue};
use crate::window::SampleWindow;
use crate::wire;

/// Raw history buffers as reported by the terminal.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySnapshot {
    /// Samples written since boot, irrespective of buffer wrap.
    #[serde(default, deserialize_with = "wire::u64_lenient")]
    pub current: u64,
    /// Fraction of lost ping replies per sample.
    #[serde(default, deserialize_with = "wire::f64_seq")]
    pub pop_ping_drop_rate: Vec<f64>,
    /// Round trip time in milliseconds; meaningless when drop rate is 1.
    #[serde(default, deserialize_with = "wire::f64_seq")]
    pub pop_ping_latency_ms: Vec<f64>,
    /// Download usage in bits per second.
    #[serde(default, deserialize_with = "wire::f64_seq")]
    pub downlink_throughput_bps: Vec<f64>,
    /// Upload usage in bits per second.
    #[serde(default, deserialize_with = "wire::f64_seq")]
    pub uplink_throughput_bps: Vec<f64>,
    /// Signal to noise ratio.
    #[serde(default, deserialize_with = "wire::f64_seq")]
    pub snr: Vec<f64>,
    /// Whether a satellite was scheduled for the sample period.
    #[serde(default)]
    pub scheduled: Vec<bool>,
    /// Whether the dish judged the signal obstructed.
    #[serde(default)]
    pub obstructed: Vec<bool>,
}

/// One slot of the history buffers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub pop_ping_drop_rate: f64,
    /// `None` when the sample saw 100% ping drop or latency was not reported.
    pub pop_ping_latency_ms: Option<f64>,
    pub downlink_throughput_bps: Option<f64>,
    pub uplink_throughput_bps: Option<f64>,
    pub snr: Option<f64>,
    pub scheduled: bool,
    pub obstructed: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryResponse {
    dish_get_history: Option<HistorySnapshot>,
}

impl HistorySnapshot {
    /// Parse a `{"dishGetHistory": {...}}` response and validate it.
    pub fn from_json(text: &str) -> Result<Self> {
        let response: HistoryResponse = serde_json::from_str(text)?;
        let history = response
            .dish_get_history
            .ok_or(Error::MissingResponse("dishGetHistory"))?;
        history.validate()?;
        Ok(history)
    }

    /// Number of slots in each ring buffer.
    pub fn capacity(&self) -> usize {
        self.pop_ping_drop_rate.len()
    }

    /// Check the metric sequences against `capacity`.
    ///
    /// The flags feed the statistics and must match exactly. The other
    /// metrics may be missing altogether (an empty sequence reads as absent
    /// in every slot) but must not be partially filled.
    pub fn validate(&self) -> Result<()> {
        let expected = self.capacity();
        let required = [
            ("scheduled", self.scheduled.len()),
            ("obstructed", self.obstructed.len()),
        ];
        let optional = [
            ("pop_ping_latency_ms", self.pop_ping_latency_ms.len()),
            ("downlink_throughput_bps", self.downlink_throughput_bps.len()),
            ("uplink_throughput_bps", self.uplink_throughput_bps.len()),
            ("snr", self.snr.len()),
        ];
        let bad = required
            .into_iter()
            .chain(optional.into_iter().filter(|&(_, len)| len > 0))
            .find(|&(_, len)| len != expected);
        match bad {
            Some((field, actual)) => Err(Error::MalformedHistory {
                field,
                expected,
                actual,
            }),
            None => Ok(()),
        }
    }

    /// The sample stored in slot `index`, if the drop rate and both flags
    /// have that slot. Missing auxiliary metrics come back as `None`.
    pub fn sample(&self, index: usize) -> Option<Sample> {
        let drop = *self.pop_ping_drop_rate.get(index)?;
        let latency = self.pop_ping_latency_ms.get(index).copied();
        Some(Sample {
            pop_ping_drop_rate: drop,
            pop_ping_latency_ms: latency.filter(|_| drop < 1.0),
            downlink_throughput_bps: self.downlink_throughput_bps.get(index).copied(),
            uplink_throughput_bps: self.uplink_throughput_bps.get(index).copied(),
            snr: self.snr.get(index).copied(),
            scheduled: *self.scheduled.get(index)?,
            obstructed: *self.obstructed.get(index)?,
        })
    }

    /// Unwind the samples of `window` from oldest to newest.
    pub fn bulk(&self, window: &SampleWindow) -> BulkHistory {
        let mut counters = Vec::with_capacity(window.len());
        let mut samples = Vec::with_capacity(window.len());
        for (counter, index) in window.counters() {
            if let Some(sample) = self.sample(index) {
                counters.push(counter);
                samples.push(sample);
            }
        }
        BulkHistory {
            general: GeneralStats::from_window(window),
            counters,
            samples,
        }
    }
}

/// History data for a window, unwound from the ring buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkHistory {
    pub general: GeneralStats,
    /// Sample counter of each entry in `samples`.
    pub counters: Vec<u64>,
    pub samples: Vec<Sample>,
}

impl BulkHistory {
    /// One sequence per metric, named as in
    /// [`crate::fields::history_bulk_field_names`] without the brackets.
    pub fn fields(&self) -> FieldSet {
        let column = |f: fn(&Sample) -> FieldValue| -> FieldValue {
            FieldValue::Seq(self.samples.iter().map(f).collect())
        };
        FieldSet::new()
            .with("pop_ping_drop_rate", column(|s| s.pop_ping_drop_rate.into()))
            .with("pop_ping_latency_ms", column(|s| s.pop_ping_latency_ms.into()))
            .with(
                "downlink_throughput_bps",
                column(|s| s.downlink_throughput_bps.into()),
            )
            .with(
                "uplink_throughput_bps",
                column(|s| s.uplink_throughput_bps.into()),
            )
            .with("snr", column(|s| s.snr.into()))
            .with("scheduled", column(|s| s.scheduled.into()))
            .with("obstructed", column(|s| s.obstructed.into()))
    }

    /// Per-sample rows: the sample counter and that sample's metrics.
    pub fn rows(&self) -> impl Iterator<Item = (u64, FieldSet)> + '_ {
        self.counters
            .iter()
            .zip(&self.samples)
            .map(|(&counter, s)| (counter, sample_fields(s)))
    }
}

fn sample_fields(s: &Sample) -> FieldSet {
    FieldSet::new()
        .with("pop_ping_drop_rate", s.pop_ping_drop_rate)
        .with("pop_ping_latency_ms", s.pop_ping_latency_ms)
        .with("downlink_throughput_bps", s.downlink_throughput_bps)
        .with("uplink_throughput_bps", s.uplink_throughput_bps)
        .with("snr", s.snr)
        .with("scheduled", s.scheduled)
        .with("obstructed", s.obstructed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{SampleCount, resolve};

    fn snapshot(current: u64, drops: &[f64]) -> HistorySnapshot {
        let n = drops.len();
        HistorySnapshot {
            current,
            pop_ping_drop_rate: drops.to_vec(),
            pop_ping_latency_ms: (0..n).map(|i| 20.0 + i as f64).collect(),
            downlink_throughput_bps: vec![1000.0; n],
            uplink_throughput_bps: vec![100.0; n],
            snr: vec![9.0; n],
            scheduled: vec![true; n],
            obstructed: vec![false; n],
        }
    }

    #[test]
    fn test_from_json_camel_case_and_quoted_counter() {
        let text = r#"{
            "apiVersion": "4",
            "dishGetHistory": {
                "current": "7",
                "popPingDropRate": [0, 1, 0.5],
                "popPingLatencyMs": [30.5, "NaN", 41],
                "downlinkThroughputBps": [10, 20, 30],
                "uplinkThroughputBps": [1, 2, 3],
                "snr": [9, 9, 8],
                "scheduled": [true, false, true],
                "obstructed": [false, false, true]
            }
        }"#;
        let h = HistorySnapshot::from_json(text).unwrap();
        assert_eq!(h.current, 7);
        assert_eq!(h.capacity(), 3);
        assert!(h.pop_ping_latency_ms[1].is_nan());
        assert_eq!(h.scheduled, vec![true, false, true]);
    }

    #[test]
    fn test_from_json_missing_member() {
        let err = HistorySnapshot::from_json(r#"{"dishGetStatus": {}}"#).unwrap_err();
        assert!(matches!(err, Error::MissingResponse("dishGetHistory")));
    }

    #[test]
    fn test_validate_rejects_short_sequence() {
        let mut h = snapshot(3, &[0.0, 0.0, 0.0]);
        h.snr.pop();
        let err = h.validate().unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedHistory {
                field: "snr",
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_missing_metric_reads_as_absent() {
        let text = r#"{"dishGetHistory": {
            "current": "2",
            "popPingDropRate": [0, 0.5],
            "popPingLatencyMs": [20, 30],
            "scheduled": [true, true],
            "obstructed": [false, false]
        }}"#;
        let h = HistorySnapshot::from_json(text).unwrap();
        let s = h.sample(1).unwrap();
        assert_eq!(s.snr, None);
        assert_eq!(s.downlink_throughput_bps, None);
        assert_eq!(s.pop_ping_latency_ms, Some(30.0));

        let w = resolve(h.capacity(), h.current, SampleCount::All, None);
        let rows: Vec<_> = h.bulk(&w).rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].1.get("snr"), Some(&FieldValue::Absent));
        let line = crate::output::csv::row(0, &[&rows[0].1]);
        assert_eq!(line, "1970-01-01T00:00:00,0,20,,,,true,false");
    }

    #[test]
    fn test_validate_requires_flags() {
        let mut h = snapshot(3, &[0.0, 0.0, 0.0]);
        h.obstructed.clear();
        assert!(matches!(
            h.validate(),
            Err(Error::MalformedHistory {
                field: "obstructed",
                expected: 3,
                actual: 0
            })
        ));
    }

    #[test]
    fn test_negative_counter_gives_empty_window() {
        let text = r#"{"dishGetHistory": {
            "current": -1,
            "popPingDropRate": [1, 1],
            "scheduled": [true, true],
            "obstructed": [false, false]
        }}"#;
        let h = HistorySnapshot::from_json(text).unwrap();
        assert_eq!(h.current, 0);
        let w = resolve(h.capacity(), h.current, SampleCount::All, None);
        assert!(w.is_empty());
        assert!(h.bulk(&w).samples.is_empty());
    }

    #[test]
    fn test_empty_snapshot_is_valid() {
        let h = HistorySnapshot::default();
        assert!(h.validate().is_ok());
        assert_eq!(h.capacity(), 0);
    }

    #[test]
    fn test_sample_hides_latency_on_full_drop() {
        let h = snapshot(2, &[0.0, 1.0]);
        assert_eq!(h.sample(0).unwrap().pop_ping_latency_ms, Some(20.0));
        assert_eq!(h.sample(1).unwrap().pop_ping_latency_ms, None);
        assert!(h.sample(2).is_none());
    }

    #[test]
    fn test_bulk_unwinds_wrapped_buffer() {
        // Capacity 4, 6 samples written: slot 2 is oldest.
        let h = snapshot(6, &[0.1, 0.2, 0.3, 0.4]);
        let w = resolve(h.capacity(), h.current, SampleCount::All, None);
        let bulk = h.bulk(&w);
        assert_eq!(bulk.counters, vec![3, 4, 5, 6]);
        let drops: Vec<f64> = bulk.samples.iter().map(|s| s.pop_ping_drop_rate).collect();
        assert_eq!(drops, vec![0.3, 0.4, 0.1, 0.2]);
        assert_eq!(bulk.general.samples, 4);
        assert_eq!(bulk.general.end_counter, 6);
    }

    #[test]
    fn test_bulk_fields_are_sequences() {
        let h = snapshot(3, &[0.0, 1.0, 0.0]);
        let w = resolve(h.capacity(), h.current, SampleCount::Last(2), None);
        let fields = h.bulk(&w).fields();
        let latency = fields.get("pop_ping_latency_ms").unwrap().as_seq().unwrap();
        assert_eq!(latency, &[FieldValue::Absent, FieldValue::Float(22.0)]);
        assert_eq!(fields.len(), 7);
    }

    #[test]
    fn test_bulk_rows_carry_counters() {
        let h = snapshot(2, &[0.0, 0.5]);
        let w = resolve(h.capacity(), h.current, SampleCount::All, None);
        let bulk = h.bulk(&w);
        let rows: Vec<_> = bulk.rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].0, 2);
        assert_eq!(rows[1].1.get("pop_ping_drop_rate"), Some(&FieldValue::Float(0.5)));
    }
}
