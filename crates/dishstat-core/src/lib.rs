//! # dishstat-core
//!
//! **Packet-loss statistics from a Starlink user terminal.**
//!
//! The terminal keeps roughly 12 hours of per-second telemetry in ring
//! buffers (ping drop, latency, throughput, SNR, scheduled/obstructed flags)
//! and reports its current status on request. `dishstat-core` reads both,
//! picks out the requested window of history, and reduces it to ping drop
//! counts and a histogram of full-outage run lengths.
//!
//! ## Quick Start
//!
//! ```no_run
//! use dishstat_core::{DishClient, GrpcurlSource, SampleCount, aggregate, resolve};
//!
//! let mut client = DishClient::new(GrpcurlSource::default());
//! let history = client.history()?;
//!
//! // Last hour of samples.
//! let window = resolve(history.capacity(), history.current, SampleCount::Last(3600), None);
//! let (drop, runs) = aggregate(&history, &window);
//! println!("{} of {} samples fully dropped", drop.count_full_ping_drop, window.len());
//! println!("{} samples in runs of exactly 5 s", runs.run_seconds[4]);
//! # Ok::<(), dishstat_core::Error>(())
//! ```
//!
//! ## Architecture
//!
//! Source → Snapshot → Window → Stats → Field sets → Sink
//!
//! Every way of reaching the terminal implements [`TelemetrySource`]; the
//! [`DishClient`] wrapper adds the reused-connection retry. Results come out
//! as ordered [`FieldSet`]s that the CSV and InfluxDB sinks consume without
//! knowing where they came from.

pub mod client;
pub mod error;
pub mod fields;
pub mod history;
pub mod output;
pub mod poll;
pub mod source;
pub mod stats;
pub mod status;
pub mod timestamp;
pub mod value;
pub mod window;

mod wire;

pub use client::DishClient;
pub use error::{Error, Result};
pub use fields::{
    BulkFieldNames, FieldShape, PingFieldNames, StatusFieldNames, expand_field_name,
    history_bulk_field_names, history_ping_field_names, status_field_names,
};
pub use history::{BulkHistory, HistorySnapshot, Sample};
pub use output::{InfluxConfig, Point, PointSink};
pub use poll::{CycleReport, PollConfig, StatusPoller};
pub use source::{DEFAULT_TARGET, GrpcurlSource, JsonInput, JsonSource, TelemetrySource};
pub use stats::{
    GeneralStats, PingDropStats, RUN_BUCKETS, RunLengthStats, StatsAggregator, aggregate,
};
pub use status::{DishStatus, StatusData, status_data};
pub use value::{FieldSet, FieldValue};
pub use window::{SampleCount, SampleWindow, resolve};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
