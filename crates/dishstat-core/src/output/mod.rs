//! Sinks for field sets: CSV text and InfluxDB line protocol.

pub mod csv;
pub mod influx;

pub use influx::{InfluxConfig, Point, PointSink};
