use chrono::{DateTime, Utc};

/// Parses an RFC 3339 timestamp (as returned by GitHub) into UTC.
pub fn parse_rfc3339_utc(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// Fractional seconds elapsed from `then` to `now`; negative when `then` is in the future.
pub fn seconds_between(then: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    now.signed_duration_since(then).num_milliseconds() as f64 / 1_000.0
}
