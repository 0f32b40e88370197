//! Lenient timestamp parsing.
//!
//! Backend endpoints disagree on timestamp formats: some emit RFC 3339 with an
//! offset, some emit naive ISO 8601 (implicitly UTC), and the JSON encoder of
//! older endpoints emits RFC 2822 dates.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a timestamp in any of the formats the backend is known to emit.
///
/// Naive timestamps are interpreted as UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    DateTime::parse_from_rfc2822(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Deserialize a timestamp, falling back to the Unix epoch.
///
/// A missing, null, non-string or unparseable value yields the epoch, so one
/// bad entry cannot fail the list it belongs to. Use with
/// `#[serde(default = "unix_epoch")]` to cover absent fields.
///
/// # Errors
///
/// Returns an error only if the input is not valid JSON-like data.
pub fn deserialize_timestamp_or_epoch<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_timestamp_opt(deserializer).map(|parsed| parsed.unwrap_or_else(unix_epoch))
}

/// Placeholder timestamp for entries the backend sent without a usable one.
#[must_use]
pub const fn unix_epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Deserialize an optional timestamp; anything that is not a recognised
/// timestamp string becomes `None`.
///
/// # Errors
///
/// Returns an error only if the input is not valid JSON-like data.
pub fn deserialize_timestamp_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_str)
        .and_then(parse_timestamp))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn new_year() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("valid date")
    }

    #[test]
    fn test_parse_rfc3339() {
        assert_eq!(parse_timestamp("2024-01-01T00:00:00Z"), Some(new_year()));
        assert_eq!(parse_timestamp("2024-01-01T01:00:00+01:00"), Some(new_year()));
    }

    #[test]
    fn test_parse_naive_as_utc() {
        assert_eq!(parse_timestamp("2024-01-01T00:00:00"), Some(new_year()));
        assert_eq!(parse_timestamp("2024-01-01 00:00:00.000"), Some(new_year()));
    }

    #[test]
    fn test_parse_rfc2822() {
        assert_eq!(
            parse_timestamp("Mon, 01 Jan 2024 00:00:00 GMT"),
            Some(new_year())
        );
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[derive(Deserialize)]
    struct Entry {
        #[serde(default = "unix_epoch", deserialize_with = "deserialize_timestamp_or_epoch")]
        at: DateTime<Utc>,
    }

    fn entry(json: &str) -> DateTime<Utc> {
        serde_json::from_str::<Entry>(json).expect("entry decodes").at
    }

    #[test]
    fn test_unusable_timestamps_fall_back_to_epoch() {
        assert_eq!(entry(r#"{"at": "2024-01-01T00:00:00"}"#), new_year());
        for json in [r#"{"at": null}"#, r#"{"at": "soon"}"#, r#"{"at": 17}"#, "{}"] {
            assert_eq!(entry(json), DateTime::<Utc>::UNIX_EPOCH, "{json}");
        }
    }
}
