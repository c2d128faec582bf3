//! Capture time resolution
//!
//! This module turns a manifest capture date (`YYYY-MM-DDTHH:MM:SSZ`) into:
//! - the UTC instant used for filenames, GPS stamps and file times
//! - the civil time in the configured zone, for EXIF date fields
//! - the `±HH:MM` offset string for the EXIF offset fields

pub mod exif;

use crate::error::{Error, Result};
use crate::metadata::gps::Rational;
use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use chrono_tz::Tz;
use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::trace;

/// Layout of manifest capture dates
pub const CAPTURE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Zone the parks' cameras are assumed to be in
pub const DEFAULT_TIMEZONE: &str = "America/New_York";

static CAPTURE_DATE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn capture_date_pattern() -> &'static Regex {
    CAPTURE_DATE_PATTERN
        .get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z$").unwrap())
}

/// A capture instant together with its civil time in the target zone
#[derive(Debug, Clone, PartialEq)]
pub struct LocalTime {
    /// Parsed capture instant
    pub utc: DateTime<Utc>,
    /// Same instant in the target zone
    pub local: DateTime<Tz>,
    /// UTC offset of `local` as `±HH:MM`
    pub offset: String,
}

impl LocalTime {
    /// Convert a UTC instant into the civil time of `tz`
    pub fn from_utc(utc: DateTime<Utc>, tz: Tz) -> Self {
        let local = utc.with_timezone(&tz);
        let offset = colon_offset(&local.format("%z").to_string());
        Self { utc, local, offset }
    }

    /// Local civil time as `YYYY:MM:DD HH:MM:SS`
    pub fn exif_datetime(&self) -> String {
        self.local.format("%Y:%m:%d %H:%M:%S").to_string()
    }

    /// UTC hour, minute and second as whole rationals
    pub fn gps_timestamp(&self) -> [Rational; 3] {
        [
            Rational::whole(self.utc.hour()),
            Rational::whole(self.utc.minute()),
            Rational::whole(self.utc.second()),
        ]
    }

    /// UTC date as `YYYY:MM:DD`
    pub fn gps_datestamp(&self) -> String {
        self.utc.format("%Y:%m:%d").to_string()
    }

    /// UTC date and time as `YYYY-MM-DD_HH-MM-SS`, used as a filename prefix
    pub fn filename_stem(&self) -> String {
        self.utc.format("%Y-%m-%d_%H-%M-%S").to_string()
    }
}

/// Insert a colon before the last two digits of a `±HHMM` offset
fn colon_offset(compact: &str) -> String {
    let split = compact.len().saturating_sub(2);
    let (hours, minutes) = compact.split_at(split);
    format!("{}:{}", hours, minutes)
}

/// Look up an IANA zone name such as `America/New_York`
pub fn parse_timezone(name: &str) -> Result<Tz> {
    Tz::from_str(name).map_err(|e| Error::Config(format!("Unknown timezone '{}': {}", name, e)))
}

/// Parse a manifest capture date; only `YYYY-MM-DDTHH:MM:SSZ` is accepted
pub fn parse_capture_date(value: &str) -> Result<DateTime<Utc>> {
    if !capture_date_pattern().is_match(value) {
        return Err(Error::TimestampParse {
            source_info: format!("capture date '{}'", value),
            message: "expected YYYY-MM-DDTHH:MM:SSZ".to_string(),
        });
    }

    let naive = NaiveDateTime::parse_from_str(value, CAPTURE_DATE_FORMAT).map_err(|e| {
        Error::TimestampParse {
            source_info: format!("capture date '{}'", value),
            message: e.to_string(),
        }
    })?;

    // chrono keeps second 60 as a leap second; the rest of the pipeline cannot
    if naive.nanosecond() >= 1_000_000_000 {
        return Err(Error::TimestampParse {
            source_info: format!("capture date '{}'", value),
            message: "leap seconds are not supported".to_string(),
        });
    }

    trace!(value, "Parsed capture date");
    Ok(naive.and_utc())
}

/// Parse a capture date and convert it to civil time in `tz`
pub fn resolve_local_time(value: &str, tz: Tz) -> Result<LocalTime> {
    parse_capture_date(value).map(|utc| LocalTime::from_utc(utc, tz))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::New_York;

    #[test]
    fn test_winter_eastern_time() {
        let local = resolve_local_time("2026-01-18T19:16:29Z", New_York).unwrap();
        assert_eq!(local.exif_datetime(), "2026:01:18 14:16:29");
        assert_eq!(local.offset, "-05:00");
        assert_eq!(local.filename_stem(), "2026-01-18_19-16-29");
    }

    #[test]
    fn test_summer_eastern_time() {
        let local = resolve_local_time("2025-07-04T02:30:00Z", New_York).unwrap();
        assert_eq!(local.exif_datetime(), "2025:07:03 22:30:00");
        assert_eq!(local.offset, "-04:00");
        // GPS fields stay in UTC even when the local date differs
        assert_eq!(local.gps_datestamp(), "2025:07:04");
        assert_eq!(
            local.gps_timestamp(),
            [Rational::whole(2), Rational::whole(30), Rational::whole(0)]
        );
    }

    #[test]
    fn test_dst_transition() {
        // 2025-03-09 07:00Z is exactly when New York springs forward
        let before = resolve_local_time("2025-03-09T06:59:59Z", New_York).unwrap();
        let after = resolve_local_time("2025-03-09T07:00:00Z", New_York).unwrap();
        assert_eq!(before.exif_datetime(), "2025:03:09 01:59:59");
        assert_eq!(before.offset, "-05:00");
        assert_eq!(after.exif_datetime(), "2025:03:09 03:00:00");
        assert_eq!(after.offset, "-04:00");
    }

    #[test]
    fn test_half_hour_zone() {
        let tz = parse_timezone("Asia/Kolkata").unwrap();
        let local = resolve_local_time("2026-01-18T19:16:29Z", tz).unwrap();
        assert_eq!(local.offset, "+05:30");
        assert_eq!(local.exif_datetime(), "2026:01:19 00:46:29");
    }

    #[test]
    fn test_offset_is_six_characters() {
        for zone in ["UTC", "America/New_York", "Asia/Tokyo", "Pacific/Honolulu", "Asia/Kathmandu"] {
            let tz = parse_timezone(zone).unwrap();
            let local = resolve_local_time("2026-06-01T12:00:00Z", tz).unwrap();
            let bytes = local.offset.as_bytes();
            assert_eq!(bytes.len(), 6, "{} -> {}", zone, local.offset);
            assert!(bytes[0] == b'+' || bytes[0] == b'-');
            assert_eq!(bytes[3], b':');
        }
    }

    #[test]
    fn test_local_time_is_same_instant() {
        for value in [
            "2024-02-29T23:59:59Z",
            "2025-11-02T05:30:00Z",
            "2025-11-02T06:30:00Z",
            "2026-12-31T00:00:00Z",
        ] {
            let local = resolve_local_time(value, New_York).unwrap();
            assert_eq!(local.local.with_timezone(&Utc), local.utc);
            assert_eq!(local.utc, parse_capture_date(value).unwrap());
        }
    }

    #[test]
    fn test_parse_capture_date() {
        let dt = parse_capture_date("2026-01-18T19:16:29Z").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2026, 1, 18, 19, 16, 29).unwrap());
    }

    #[test]
    fn test_malformed_capture_dates() {
        for value in [
            "",
            "garbage",
            "2026-01-18 19:16:29",
            "2026-01-18T19:16:29",
            "2026-1-18T19:16:29Z",
            "2026-01-18T19:16:29.123Z",
            "2026-01-18T19:16:29+00:00",
            "2026-02-30T10:00:00Z",
            "2026-01-18T25:00:00Z",
            "2016-12-31T23:59:60Z",
        ] {
            let result = parse_capture_date(value);
            assert!(
                matches!(result, Err(Error::TimestampParse { .. })),
                "{:?} should not parse",
                value
            );
        }
    }

    #[test]
    fn test_unknown_timezone() {
        assert!(matches!(parse_timezone("Mars/Olympus_Mons"), Err(Error::Config(_))));
        assert!(parse_timezone(DEFAULT_TIMEZONE).is_ok());
    }

    #[test]
    fn test_colon_offset() {
        assert_eq!(colon_offset("-0500"), "-05:00");
        assert_eq!(colon_offset("+0930"), "+09:30");
    }
}
