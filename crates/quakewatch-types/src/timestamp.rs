//! Lenient timestamp parsing for server-provided dates.
//!
//! The data endpoint emits Python `isoformat()` strings, which carry no
//! offset (`2024-05-01T12:30:00.123456`). Such naive values are read as
//! local time of the host, matching how a browser would interpret them.
//! Values that do carry an offset are parsed as RFC 3339.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

/// Naive formats accepted after RFC 3339 fails, most specific first.
const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parse a timestamp string into UTC.
///
/// Returns `None` when the string matches neither RFC 3339 nor one of the
/// naive ISO-8601 layouts.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())?;

    // A naive time inside a DST gap has no local mapping; fall back to UTC.
    Some(
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map_or_else(|| naive.and_utc(), |local| local.with_timezone(&Utc)),
    )
}

/// Serde adapter for required timestamp fields.
pub mod required {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize as RFC 3339.
    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    /// Deserialize with [`super::parse_timestamp`].
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}

/// Serde adapter for nullable timestamp fields.
///
/// `null` and a missing field both map to `None`. A string that fails to
/// parse is an error rather than a silent `None`.
pub mod optional {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize as RFC 3339 or `null`.
    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let Some(ts) = value else {
            return serializer.serialize_none();
        };
        serializer.serialize_str(&ts.to_rfc3339())
    }

    /// Deserialize with [`super::parse_timestamp`], accepting `null`.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|raw| {
            super::parse_timestamp(&raw)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn rfc3339_with_offset() {
        let parsed = parse_timestamp("2024-05-01T15:30:00+03:00");
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).single();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn naive_isoformat_is_local_time() {
        let parsed = parse_timestamp("2024-05-01T12:30:00.123456");

        let naive = NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_micro_opt(12, 30, 0, 123_456));
        let expected = naive
            .and_then(|n| Local.from_local_datetime(&n).earliest())
            .map(|local| local.with_timezone(&Utc));
        assert!(parsed.is_some());
        assert_eq!(parsed, expected);
    }

    #[test]
    fn space_separated_naive_is_accepted() {
        assert!(parse_timestamp("2024-05-01 12:30:00").is_some());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_timestamp("Tahmin yapılamadı").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
