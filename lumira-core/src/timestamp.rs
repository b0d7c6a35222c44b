//! Lenient ISO-8601 timestamp parsing.
//!
//! Timestamps are always written as RFC 3339. On read, values without an
//! offset (`2024-03-01T12:00:00.123456`) are accepted and taken as UTC.
//!
//! Use with `#[serde(deserialize_with = "lumira_core::timestamp::deserialize")]`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer};

/// Formats tried, in order, for timestamps without an offset.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an RFC 3339 timestamp, or a naive ISO-8601 one as UTC.
pub fn parse(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

/// Serde deserializer for [`parse`].
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_rfc3339_with_offset() {
        let ts = parse("2024-03-01T23:30:00-02:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 2, 1, 30, 0).unwrap());
    }

    #[test]
    fn test_naive_timestamp_is_utc() {
        let ts = parse("2024-03-01T12:00:00.123456").unwrap();
        assert_eq!(
            ts.with_nanosecond(0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
        );
        assert_eq!(ts.nanosecond(), 123_456_000);

        assert_eq!(
            parse("2024-03-01T12:00:00"),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(
            parse("2024-03-01 12:00:00"),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_garbage_rejected() {
        assert_eq!(parse("yesterday"), None);
        assert_eq!(parse("2024-03-01"), None);
        assert_eq!(parse(""), None);
    }
}
