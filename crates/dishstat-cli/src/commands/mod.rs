pub mod bulk;
pub mod influx;
pub mod ping_stats;
pub mod status;

use std::time::Duration;

use dishstat_core::{GrpcurlSource, JsonInput, JsonSource, SampleCount, TelemetrySource};

/// Pick the data source: a saved JSON response if given, otherwise the dish.
pub fn make_source(json: Option<&str>, target: &str) -> Box<dyn TelemetrySource> {
    match json {
        Some(arg) => Box::new(JsonSource::new(JsonInput::from_arg(arg))),
        None => Box::new(GrpcurlSource::new(target)),
    }
}

/// `--all` wins; otherwise a negative count also means all.
pub fn sample_count(samples: i64, all: bool) -> SampleCount {
    if all {
        SampleCount::All
    } else {
        SampleCount::from_signed(samples)
    }
}

/// Print an error and exit with status 1.
pub fn fail(context: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("Error: {context}: {err}");
    std::process::exit(1);
}

/// Parse a duration string like "5m", "30s", "1h", "100ms". A bare number is
/// seconds.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();

    let (numeric, unit_ms) = if let Some(rest) = s.strip_suffix("ms") {
        (rest, 1u64)
    } else if let Some(rest) = s.strip_suffix('s') {
        (rest, 1000)
    } else if let Some(rest) = s.strip_suffix('m') {
        (rest, 60_000)
    } else if let Some(rest) = s.strip_suffix('h') {
        (rest, 3_600_000)
    } else {
        (s, 1000)
    };

    let value: u64 = numeric
        .trim()
        .parse()
        .map_err(|_| format!("invalid duration '{s}'"))?;
    value
        .checked_mul(unit_ms)
        .map(Duration::from_millis)
        .ok_or_else(|| format!("duration '{s}' is too long"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("100ms"), Ok(Duration::from_millis(100)));
        assert_eq!(parse_duration("30s"), Ok(Duration::from_secs(30)));
        assert_eq!(parse_duration("5m"), Ok(Duration::from_secs(300)));
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
        assert_eq!(parse_duration(" 45 "), Ok(Duration::from_secs(45)));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("-5s").is_err());
        assert!(parse_duration("").is_err());
        assert!(parse_duration(&format!("{}h", u64::MAX)).is_err());
    }

    #[test]
    fn test_sample_count() {
        assert_eq!(sample_count(3600, false), SampleCount::Last(3600));
        assert_eq!(sample_count(-1, false), SampleCount::All);
        assert_eq!(sample_count(10, true), SampleCount::All);
        assert_eq!(sample_count(0, false), SampleCount::Last(0));
    }

    #[test]
    fn test_make_source_describes_choice() {
        assert_eq!(make_source(None, "10.0.0.1:9200").describe(), "dish at 10.0.0.1:9200");
        assert_eq!(make_source(Some("-"), "unused").describe(), "JSON on stdin");
        assert_eq!(
            make_source(Some("h.json"), "unused").describe(),
            "JSON file h.json"
        );
    }
}
