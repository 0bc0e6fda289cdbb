//! Periodic status polling into a [`PointSink`].
//!
//! Each cycle queues at most two points. They are written in batches every
//! `commit_every` cycles; a batch that fails to write stays queued and goes
//! out with the next one.

use std::time::Duration;

use crate::client::DishClient;
use crate::error::Result;
use crate::output::influx::{PING_STATS_MEASUREMENT, Point, PointSink, STATUS_MEASUREMENT};
use crate::source::TelemetrySource;
use crate::stats::{GeneralStats, aggregate};
use crate::status::{DishStatus, STATE_UNREACHABLE, status_data};
use crate::value::FieldSet;
use crate::window::{SampleCount, resolve};

/// Polling loop settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Time between cycles.
    pub interval: Duration,
    /// Cycles between sink writes.
    pub commit_every: usize,
    /// History window for ping stats.
    pub samples: SampleCount,
    /// Also record ping drop and run-length stats each cycle.
    pub ping_stats: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            commit_every: 6,
            samples: SampleCount::Last(3600),
            ping_stats: false,
        }
    }
}

/// What one cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub reachable: bool,
    /// Points written by this cycle's commit, if it committed successfully.
    pub written: Option<usize>,
}

pub struct StatusPoller<S, K> {
    client: DishClient<S>,
    sink: K,
    config: PollConfig,
    pending: Vec<Point>,
    cycles: usize,
    last_id: Option<String>,
}

impl<S: TelemetrySource, K: PointSink> StatusPoller<S, K> {
    pub fn new(client: DishClient<S>, sink: K, config: PollConfig) -> Self {
        Self {
            client,
            sink,
            config,
            pending: Vec::new(),
            cycles: 0,
            last_id: None,
        }
    }

    /// Points waiting for the next commit.
    pub fn pending(&self) -> &[Point] {
        &self.pending
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Run one cycle stamped `now` (seconds since the epoch).
    pub fn poll_once(&mut self, now: u64) -> CycleReport {
        let reachable = match self.client.status() {
            Ok(status) => {
                self.queue_status(&status, now);
                if self.config.ping_stats {
                    self.queue_ping_stats(status.id(), now);
                }
                self.last_id = Some(status.device_info.id);
                true
            }
            Err(e) => {
                log::warn!("{}: {e}", self.client.describe());
                // Without an id there is nothing to tag the point with.
                if let Some(id) = &self.last_id {
                    let point = Point::new(STATUS_MEASUREMENT, now)
                        .tag("id", id.clone())
                        .fields(FieldSet::new().with("state", STATE_UNREACHABLE));
                    self.pending.push(point);
                }
                false
            }
        };
        log::debug!("{} points pending", self.pending.len());

        self.cycles += 1;
        let mut written = None;
        if self.cycles >= self.config.commit_every.max(1) {
            self.cycles = 0;
            match self.commit() {
                Ok(n) => written = Some(n),
                Err(e) => log::error!("failed to write {} points: {e}", self.pending.len()),
            }
        }

        CycleReport { reachable, written }
    }

    /// Write all pending points now.
    pub fn flush(&mut self) -> Result<usize> {
        self.cycles = 0;
        self.commit()
    }

    fn commit(&mut self) -> Result<usize> {
        let lines: Vec<String> = self.pending.iter().filter_map(Point::to_line).collect();
        if !lines.is_empty() {
            self.sink.write_lines(&lines)?;
            log::info!("wrote {} points", lines.len());
        }
        self.pending.clear();
        Ok(lines.len())
    }

    fn queue_status(&mut self, status: &DishStatus, now: u64) {
        let data = status_data(status);
        let mut fields = FieldSet::new();
        for (name, value) in data.general.iter().filter(|(name, _)| *name != "id") {
            fields.insert(name, value.clone());
        }
        fields.extend(data.obstruction);
        fields.extend(data.alerts);
        self.pending.push(
            Point::new(STATUS_MEASUREMENT, now)
                .tag("id", status.id())
                .fields(fields),
        );
    }

    fn queue_ping_stats(&mut self, id: &str, now: u64) {
        let history = match self.client.history() {
            Ok(h) => h,
            Err(e) => {
                log::warn!("history unavailable, skipping ping stats: {e}");
                return;
            }
        };
        let window = resolve(history.capacity(), history.current, self.config.samples, None);
        let (drop, runs) = aggregate(&history, &window);
        let mut fields = GeneralStats::from_window(&window).fields();
        fields.extend(drop.fields());
        fields.extend(runs.fields());
        self.pending.push(
            Point::new(PING_STATS_MEASUREMENT, now)
                .tag("id", id)
                .fields(fields),
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::error::Error;
    use crate::history::HistorySnapshot;

    struct FakeDish {
        up: VecDeque<bool>,
    }

    impl FakeDish {
        fn new(up: &[bool]) -> Self {
            Self {
                up: up.iter().copied().collect(),
            }
        }
    }

    impl TelemetrySource for FakeDish {
        fn describe(&self) -> String {
            "fake dish".to_string()
        }

        fn fetch_history(&mut self) -> Result<HistorySnapshot> {
            Ok(HistorySnapshot {
                current: 4,
                pop_ping_drop_rate: vec![0.0, 1.0, 1.0, 0.5],
                pop_ping_latency_ms: vec![20.0; 4],
                downlink_throughput_bps: vec![0.0; 4],
                uplink_throughput_bps: vec![0.0; 4],
                snr: vec![9.0; 4],
                scheduled: vec![true; 4],
                obstructed: vec![false; 4],
            })
        }

        fn fetch_status(&mut self) -> Result<DishStatus> {
            if self.up.pop_front().unwrap_or(false) {
                let mut status = DishStatus::default();
                status.device_info.id = "ut01".to_string();
                status.state = "CONNECTED".to_string();
                Ok(status)
            } else {
                Err(Error::Connection {
                    target: "fake".to_string(),
                    detail: "down".to_string(),
                })
            }
        }
    }

    #[derive(Default)]
    struct MemorySink {
        batches: Vec<Vec<String>>,
        fail: bool,
    }

    impl PointSink for MemorySink {
        fn write_lines(&mut self, lines: &[String]) -> Result<()> {
            if self.fail {
                return Err(Error::Sink("refused".to_string()));
            }
            self.batches.push(lines.to_vec());
            Ok(())
        }
    }

    fn poller(up: &[bool], config: PollConfig) -> StatusPoller<FakeDish, MemorySink> {
        StatusPoller::new(
            DishClient::new(FakeDish::new(up)),
            MemorySink::default(),
            config,
        )
    }

    #[test]
    fn test_default_config() {
        let c = PollConfig::default();
        assert_eq!(c.interval, Duration::from_secs(30));
        assert_eq!(c.commit_every, 6);
        assert_eq!(c.samples, SampleCount::Last(3600));
        assert!(!c.ping_stats);
    }

    #[test]
    fn test_status_point_tagged_with_id() {
        let mut p = poller(&[true], PollConfig::default());
        let report = p.poll_once(100);
        assert!(report.reachable);
        assert_eq!(report.written, None);
        let line = p.pending()[0].to_line().unwrap();
        assert!(line.starts_with("spacex.starlink.user_terminal.status,id=ut01 "));
        assert!(line.contains("state=\"CONNECTED\""));
        assert!(!line.contains(" id="));
        assert!(line.contains("wedges_fraction_obstructed_1"));
        assert!(line.ends_with(" 100"));
    }

    #[test]
    fn test_unreachable_before_any_id_queues_nothing() {
        let mut p = poller(&[false], PollConfig::default());
        assert!(!p.poll_once(1).reachable);
        assert!(p.pending().is_empty());
    }

    #[test]
    fn test_unreachable_after_id_queues_marker() {
        // First call succeeds; second fails on a reused connection and the
        // retry fails too.
        let mut p = poller(&[true, false, false], PollConfig::default());
        p.poll_once(1);
        assert!(!p.poll_once(2).reachable);
        assert_eq!(
            p.pending()[1].to_line().unwrap(),
            "spacex.starlink.user_terminal.status,id=ut01 state=\"DISH_UNREACHABLE\" 2"
        );
    }

    #[test]
    fn test_commit_every_n_cycles() {
        let config = PollConfig {
            commit_every: 2,
            ..PollConfig::default()
        };
        let mut p = poller(&[true, true, true], config);
        assert_eq!(p.poll_once(1).written, None);
        assert_eq!(p.poll_once(2).written, Some(2));
        assert!(p.pending().is_empty());
        assert_eq!(p.sink().batches.len(), 1);
        p.poll_once(3);
        assert_eq!(p.flush().unwrap(), 1);
        assert_eq!(p.sink().batches.len(), 2);
    }

    #[test]
    fn test_failed_commit_keeps_points() {
        let config = PollConfig {
            commit_every: 1,
            ..PollConfig::default()
        };
        let mut p = poller(&[true, true], config);
        p.sink.fail = true;
        assert_eq!(p.poll_once(1).written, None);
        assert_eq!(p.pending().len(), 1);
        p.sink.fail = false;
        assert_eq!(p.poll_once(2).written, Some(2));
        assert!(p.pending().is_empty());
    }

    #[test]
    fn test_ping_stats_point() {
        let config = PollConfig {
            ping_stats: true,
            ..PollConfig::default()
        };
        let mut p = poller(&[true], config);
        p.poll_once(7);
        assert_eq!(p.pending().len(), 2);
        let line = p.pending()[1].to_line().unwrap();
        assert!(line.starts_with("spacex.starlink.user_terminal.ping_stats,id=ut01 "));
        assert!(line.contains("samples=4i"));
        assert!(line.contains("count_full_ping_drop=2i"));
        // The 2-sample run is closed by the partial drop.
        assert!(line.contains("run_seconds_2=2i"));
    }

    #[test]
    fn test_flush_empty_is_noop() {
        let mut p = poller(&[], PollConfig::default());
        assert_eq!(p.flush().unwrap(), 0);
        assert!(p.sink().batches.is_empty());
    }
}
