//! InfluxDB v1 line protocol.
//!
//! A [`Point`] is one measurement row: tags, field values, and a timestamp in
//! whole seconds. [`Point::to_line`] encodes it; actually sending lines is the
//! job of a [`PointSink`].
//!
//! Encoding rules:
//!
//! - unsigned values get the `i` suffix, floats print bare, bools as
//!   `true`/`false`, text is double-quoted
//! - sequences expand to `name_1`, `name_2`, ...
//! - absent and non-finite values are left out
//! - a point with no fields left encodes to nothing

use std::time::Duration;

use crate::error::Result;
use crate::value::{FieldSet, FieldValue};

/// Measurement for status points.
pub const STATUS_MEASUREMENT: &str = "spacex.starlink.user_terminal.status";

/// Measurement for ping drop and run-length points.
pub const PING_STATS_MEASUREMENT: &str = "spacex.starlink.user_terminal.ping_stats";

/// Destination for encoded lines.
pub trait PointSink {
    /// Write a batch of lines. On error nothing is assumed written.
    fn write_lines(&mut self, lines: &[String]) -> Result<()>;
}

/// Connection settings for an InfluxDB v1 server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfluxConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ssl: bool,
    pub timeout: Duration,
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8086,
            database: "dishstats".to_string(),
            username: None,
            password: None,
            ssl: false,
            timeout: Duration::from_secs(15),
        }
    }
}

impl InfluxConfig {
    /// `/write` endpoint, without a query string. Credentials are passed
    /// separately as basic auth.
    pub fn write_url(&self) -> String {
        let scheme = if self.ssl { "https" } else { "http" };
        format!("{scheme}://{}:{}/write", self.host, self.port)
    }

    /// Query parameters for `/write`: target database, second precision.
    pub fn write_query(&self) -> [(&'static str, &str); 2] {
        [("db", self.database.as_str()), ("precision", "s")]
    }
}

/// One line-protocol row.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub measurement: String,
    pub tags: Vec<(String, String)>,
    pub fields: FieldSet,
    pub timestamp_secs: u64,
}

impl Point {
    pub fn new(measurement: impl Into<String>, timestamp_secs: u64) -> Self {
        Self {
            measurement: measurement.into(),
            tags: Vec::new(),
            fields: FieldSet::new(),
            timestamp_secs,
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }

    pub fn fields(mut self, fields: FieldSet) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Encode as line protocol, or `None` if no field has a value.
    pub fn to_line(&self) -> Option<String> {
        let mut fields = Vec::new();
        for (name, value) in self.fields.iter() {
            match value {
                FieldValue::Seq(items) => {
                    for (i, item) in items.iter().enumerate() {
                        if let Some(v) = encode_value(item) {
                            fields.push(format!("{}_{}={v}", escape_key(name), i + 1));
                        }
                    }
                }
                other => {
                    if let Some(v) = encode_value(other) {
                        fields.push(format!("{}={v}", escape_key(name)));
                    }
                }
            }
        }
        if fields.is_empty() {
            return None;
        }

        let mut line = escape_measurement(&self.measurement);
        // Influx rejects empty tag values.
        for (key, value) in self.tags.iter().filter(|(_, v)| !v.is_empty()) {
            line.push(',');
            line.push_str(&escape_key(key));
            line.push('=');
            line.push_str(&escape_key(value));
        }
        line.push(' ');
        line.push_str(&fields.join(","));
        line.push(' ');
        line.push_str(&self.timestamp_secs.to_string());
        Some(line)
    }
}

fn encode_value(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::UInt(v) => Some(format!("{v}i")),
        FieldValue::Float(v) if v.is_finite() => Some(format!("{v}")),
        FieldValue::Float(_) => None,
        FieldValue::Bool(v) => Some(v.to_string()),
        FieldValue::Text(s) => Some(format!("\"{}\"", escape_string(s))),
        FieldValue::Absent | FieldValue::Seq(_) => None,
    }
}

fn escape_with(s: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn escape_measurement(s: &str) -> String {
    escape_with(s, &[',', ' '])
}

/// Tag keys, tag values, and field keys.
fn escape_key(s: &str) -> String {
    escape_with(s, &[',', '=', ' '])
}

fn escape_string(s: &str) -> String {
    escape_with(s, &['"', '\\'])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_line() {
        let p = Point::new(STATUS_MEASUREMENT, 1_600_000_000)
            .tag("id", "ut01")
            .fields(
                FieldSet::new()
                    .with("state", "CONNECTED")
                    .with("uptime", 42u64)
                    .with("snr", 9.5)
                    .with("currently_obstructed", false),
            );
        assert_eq!(
            p.to_line().unwrap(),
            "spacex.starlink.user_terminal.status,id=ut01 \
             state=\"CONNECTED\",uptime=42i,snr=9.5,currently_obstructed=false 1600000000"
        );
    }

    #[test]
    fn test_escaping() {
        let p = Point::new("my measure,x", 1)
            .tag("tag key", "a=b,c")
            .fields(FieldSet::new().with("field name", "say \"hi\" \\o/"));
        assert_eq!(
            p.to_line().unwrap(),
            "my\\ measure\\,x,tag\\ key=a\\=b\\,c field\\ name=\"say \\\"hi\\\" \\\\o/\" 1"
        );
    }

    #[test]
    fn test_sequences_expand_from_one() {
        let p = Point::new("m", 5).fields(
            FieldSet::new().with("wedges", vec![Some(0.5), None, Some(0.25)]),
        );
        assert_eq!(p.to_line().unwrap(), "m wedges_1=0.5,wedges_3=0.25 5");
    }

    #[test]
    fn test_absent_and_nan_omitted() {
        let p = Point::new("m", 5).fields(
            FieldSet::new()
                .with("latency", None::<f64>)
                .with("snr", f64::NAN)
                .with("state", "DISH_UNREACHABLE"),
        );
        assert_eq!(p.to_line().unwrap(), "m state=\"DISH_UNREACHABLE\" 5");
    }

    #[test]
    fn test_no_fields_no_line() {
        let p = Point::new("m", 5)
            .tag("id", "x")
            .fields(FieldSet::new().with("latency", None::<f64>));
        assert_eq!(p.to_line(), None);
    }

    #[test]
    fn test_empty_tag_value_dropped() {
        let p = Point::new("m", 5)
            .tag("id", "")
            .fields(FieldSet::new().with("a", 1u64));
        assert_eq!(p.to_line().unwrap(), "m a=1i 5");
    }

    #[test]
    fn test_write_url() {
        let mut cfg = InfluxConfig::default();
        assert_eq!(cfg.write_url(), "http://localhost:8086/write");
        assert_eq!(cfg.write_query(), [("db", "dishstats"), ("precision", "s")]);
        cfg.ssl = true;
        cfg.port = 8087;
        cfg.database = "dish stats".to_string();
        assert_eq!(cfg.write_url(), "https://localhost:8087/write");
        assert_eq!(cfg.write_query()[0], ("db", "dish stats"));
        assert_eq!(cfg.timeout, Duration::from_secs(15));
    }
}
