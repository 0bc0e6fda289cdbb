//! UTC timestamps for CSV rows and InfluxDB points.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Whole seconds since the Unix epoch, now.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Broken-down UTC time. No leap second handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtcTime {
    pub year: u64,
    pub month: u64,
    pub day: u64,
    pub hour: u64,
    pub minute: u64,
    pub second: u64,
}

impl UtcTime {
    pub fn from_unix(secs: u64) -> Self {
        let mut days = secs / 86400;
        let mut year = 1970;
        loop {
            let len = if is_leap(year) { 366 } else { 365 };
            if days < len {
                break;
            }
            days -= len;
            year += 1;
        }

        let feb = if is_leap(year) { 29 } else { 28 };
        let month_lengths = [31, feb, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
        let mut month = 1;
        for len in month_lengths {
            if days < len {
                break;
            }
            days -= len;
            month += 1;
        }

        Self {
            year,
            month,
            day: days + 1,
            hour: (secs / 3600) % 24,
            minute: (secs / 60) % 60,
            second: secs % 60,
        }
    }
}

impl fmt::Display for UtcTime {
    /// `YYYY-MM-DDTHH:MM:SS`, no zone suffix.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Format seconds since the epoch as `YYYY-MM-DDTHH:MM:SS`.
pub fn format_utc(secs: u64) -> String {
    UtcTime::from_unix(secs).to_string()
}

fn is_leap(year: u64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch() {
        assert_eq!(format_utc(0), "1970-01-01T00:00:00");
    }

    #[test]
    fn test_known_instants() {
        // 2021-01-24 was a Sunday; 1611446400 is its midnight.
        assert_eq!(format_utc(1_611_446_400), "2021-01-24T00:00:00");
        assert_eq!(format_utc(1_611_446_400 + 3661), "2021-01-24T01:01:01");
    }

    #[test]
    fn test_leap_day() {
        // 2024-02-29T12:00:00Z
        let t = UtcTime::from_unix(1_709_208_000);
        assert_eq!((t.year, t.month, t.day, t.hour), (2024, 2, 29, 12));
        assert_eq!(format_utc(1_709_208_000 + 43_200), "2024-03-01T00:00:00");
    }

    #[test]
    fn test_year_end() {
        assert_eq!(format_utc(1_704_067_199), "2023-12-31T23:59:59");
        assert_eq!(format_utc(1_704_067_200), "2024-01-01T00:00:00");
    }

    #[test]
    fn test_leap_rules() {
        assert!(is_leap(2000));
        assert!(!is_leap(1900));
        assert!(is_leap(2024));
        assert!(!is_leap(2023));
    }
}
