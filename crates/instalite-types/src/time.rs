use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

/// Parse a timestamp column. SQLite's `CURRENT_TIMESTAMP` yields
/// `YYYY-MM-DD HH:MM:SS` without a zone, which is UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>().ok().or_else(|| {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|ndt| ndt.and_utc())
    })
}

/// Like [`parse_timestamp`] but falls back to the epoch on corrupt rows.
pub fn timestamp_or_epoch(raw: &str) -> DateTime<Utc> {
    parse_timestamp(raw).unwrap_or_else(|| {
        warn!("Corrupt timestamp '{}'", raw);
        DateTime::default()
    })
}
