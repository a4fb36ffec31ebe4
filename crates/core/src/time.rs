//! Timestamp parsing for API records.

use chrono::{DateTime, Utc};

/// Parse an RFC 3339 timestamp.
///
/// Returns `None` for missing or unparseable input.
pub fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Parse a "last seen"/"last scan" timestamp.
///
/// The upstream marks never-scanned hosts with a zero time (either the Unix
/// epoch or `0001-01-01T00:00:00Z`); anything at or before the epoch is
/// mapped to `None`.
pub fn parse_seen_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    parse_timestamp(raw).filter(|ts| ts.timestamp() > 0)
}
