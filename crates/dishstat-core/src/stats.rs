//! Packet-loss statistics over a resolved history window.
//!
//! One oldest-to-newest pass produces two groups of results:
//!
//! - [`PingDropStats`]: how much ping drop there was, split by whether the
//!   sample was unscheduled (no satellite available) or obstructed.
//! - [`RunLengthStats`]: a histogram of consecutive 100%-drop runs by length.
//!
//! # Run-length fragments
//!
//! A run touching the start of the window may have begun before it, and a run
//! touching the end may continue after it. Neither has a known length, so they
//! are reported separately as `init_run_fragment` and `final_run_fragment` and
//! left out of the histogram. When the whole window is a single run, it is
//! reported once, as the initial fragment.
//!
//! Histogram cells count samples, not runs: a 3-sample run adds 3 to
//! `run_seconds[2]`. That keeps the totals comparable to
//! `count_full_ping_drop`:
//!
//! ```text
//! sum(run_seconds) + sum(run_minutes) + init_run_fragment + final_run_fragment
//!     == count_full_ping_drop
//! ```

use crate::history::HistorySnapshot;
use crate::value::FieldSet;
use crate::window::SampleWindow;

/// Number of cells in each run-length histogram.
pub const RUN_BUCKETS: usize = 60;

/// Samples per minute bucket.
const SECONDS_PER_MINUTE: u64 = 60;

/// Fields common to every history-derived group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneralStats {
    /// Number of samples analyzed or returned.
    pub samples: u64,
    /// Write counter at the newest sample; pass it as `start` next time to get
    /// only new samples.
    pub end_counter: u64,
}

impl GeneralStats {
    pub fn from_window(window: &SampleWindow) -> Self {
        Self {
            samples: window.len() as u64,
            end_counter: window.end_counter,
        }
    }

    pub fn fields(&self) -> FieldSet {
        FieldSet::new()
            .with("samples", self.samples)
            .with("end_counter", self.end_counter)
    }
}

/// Aggregate ping drop, overall and by cause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PingDropStats {
    /// Total time, in sample intervals, lost to ping drop.
    pub total_ping_drop: f64,
    /// Samples with 100% ping drop.
    pub count_full_ping_drop: u64,
    /// Scheduled samples marked obstructed, regardless of drop.
    pub count_obstructed: u64,
    pub total_obstructed_ping_drop: f64,
    pub count_full_obstructed_ping_drop: u64,
    /// Samples not marked scheduled, regardless of drop.
    pub count_unscheduled: u64,
    pub total_unscheduled_ping_drop: f64,
    pub count_full_unscheduled_ping_drop: u64,
}

impl PingDropStats {
    pub fn fields(&self) -> FieldSet {
        FieldSet::new()
            .with("total_ping_drop", self.total_ping_drop)
            .with("count_full_ping_drop", self.count_full_ping_drop)
            .with("count_obstructed", self.count_obstructed)
            .with("total_obstructed_ping_drop", self.total_obstructed_ping_drop)
            .with(
                "count_full_obstructed_ping_drop",
                self.count_full_obstructed_ping_drop,
            )
            .with("count_unscheduled", self.count_unscheduled)
            .with("total_unscheduled_ping_drop", self.total_unscheduled_ping_drop)
            .with(
                "count_full_unscheduled_ping_drop",
                self.count_full_unscheduled_ping_drop,
            )
    }
}

/// Histogram of consecutive 100%-drop runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLengthStats {
    /// Full-drop samples at the start of the window.
    pub init_run_fragment: u64,
    /// Full-drop samples at the end of the window.
    pub final_run_fragment: u64,
    /// `run_seconds[i]`: samples spent in runs of exactly `i + 1` samples.
    pub run_seconds: [u64; RUN_BUCKETS],
    /// `run_minutes[i]`: samples spent in runs longer than `(i + 1) * 60` and
    /// at most `(i + 2) * 60` samples. The last cell takes everything over
    /// 3600.
    pub run_minutes: [u64; RUN_BUCKETS],
}

impl Default for RunLengthStats {
    fn default() -> Self {
        Self {
            init_run_fragment: 0,
            final_run_fragment: 0,
            run_seconds: [0; RUN_BUCKETS],
            run_minutes: [0; RUN_BUCKETS],
        }
    }
}

impl RunLengthStats {
    /// Sum of every cell and both fragments.
    pub fn total(&self) -> u64 {
        self.init_run_fragment
            + self.final_run_fragment
            + self.run_seconds.iter().sum::<u64>()
            + self.run_minutes.iter().sum::<u64>()
    }

    fn record(&mut self, len: u64) {
        if len <= SECONDS_PER_MINUTE {
            self.run_seconds[(len - 1) as usize] += len;
        } else {
            let bucket = ((len - 1) / SECONDS_PER_MINUTE - 1).min(RUN_BUCKETS as u64 - 1);
            self.run_minutes[bucket as usize] += len;
        }
    }

    pub fn fields(&self) -> FieldSet {
        FieldSet::new()
            .with("init_run_fragment", self.init_run_fragment)
            .with("final_run_fragment", self.final_run_fragment)
            .with("run_seconds", self.run_seconds.to_vec())
            .with("run_minutes", self.run_minutes.to_vec())
    }
}

/// Streaming fold over samples in oldest-to-newest order.
#[derive(Debug, Clone, Default)]
pub struct StatsAggregator {
    drop: PingDropStats,
    runs: RunLengthStats,
    run_length: u64,
    /// `None` until the first sample that is not part of a leading run.
    init_run: Option<u64>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in one sample.
    pub fn push(&mut self, drop_rate: f64, scheduled: bool, obstructed: bool) {
        let d = clamp_drop(drop_rate);
        let full = d >= 1.0;

        self.drop.total_ping_drop += d;
        if !scheduled {
            self.drop.count_unscheduled += 1;
            self.drop.total_unscheduled_ping_drop += d;
            if full {
                self.drop.count_full_unscheduled_ping_drop += 1;
            }
        } else if obstructed {
            // Unscheduled and obstructed have not been seen together, but if
            // they ever are the sample counts as unscheduled only.
            self.drop.count_obstructed += 1;
            self.drop.total_obstructed_ping_drop += d;
            if full {
                self.drop.count_full_obstructed_ping_drop += 1;
            }
        }

        if full {
            self.drop.count_full_ping_drop += 1;
            self.run_length += 1;
        } else if self.run_length > 0 {
            self.close_run();
        } else if self.init_run.is_none() {
            self.init_run = Some(0);
        }
    }

    fn close_run(&mut self) {
        let len = std::mem::take(&mut self.run_length);
        match self.init_run {
            None => self.init_run = Some(len),
            Some(_) => self.runs.record(len),
        }
    }

    /// Close out the pass and return both groups.
    pub fn finish(self) -> (PingDropStats, RunLengthStats) {
        let mut runs = self.runs;
        match self.init_run {
            // Never left the leading run: report it once, as the initial one.
            None => {
                runs.init_run_fragment = self.run_length;
                runs.final_run_fragment = 0;
            }
            Some(init) => {
                runs.init_run_fragment = init;
                runs.final_run_fragment = self.run_length;
            }
        }
        (self.drop, runs)
    }
}

/// Drop fraction limited to `[0, 1]`; NaN counts as no drop.
fn clamp_drop(d: f64) -> f64 {
    if d >= 1.0 {
        1.0
    } else if d > 0.0 {
        d
    } else {
        0.0
    }
}

/// Compute ping drop and run-length stats for the samples in `window`.
pub fn aggregate(
    history: &HistorySnapshot,
    window: &SampleWindow,
) -> (PingDropStats, RunLengthStats) {
    let mut agg = StatsAggregator::new();
    for i in window.indices() {
        let (Some(&drop), Some(&scheduled), Some(&obstructed)) = (
            history.pop_ping_drop_rate.get(i),
            history.scheduled.get(i),
            history.obstructed.get(i),
        ) else {
            continue;
        };
        agg.push(drop, scheduled, obstructed);
    }
    agg.finish()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
