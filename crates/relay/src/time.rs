//! Timestamp conversion for card rendering.
//!
//! Alertmanager reports `startsAt`/`endsAt` as RFC 3339 instants in UTC. Cards
//! show them at a fixed UTC+8 offset.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use crate::{Error, Result};

/// Offset of the rendered wall-clock time from UTC.
pub const DISPLAY_UTC_OFFSET_HOURS: i64 = 8;

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Convert an ISO-8601 timestamp to `YYYY-MM-DD HH:MM:SS` at UTC+8.
///
/// Empty input renders as an empty string. Timestamps without an offset are
/// taken to be UTC.
pub fn to_local_display(iso: &str) -> Result<String> {
    if iso.is_empty() {
        return Ok(String::new());
    }

    let utc = parse_utc(iso)?;
    let local = utc.naive_utc() + Duration::hours(DISPLAY_UTC_OFFSET_HOURS);
    Ok(local.format(DISPLAY_FORMAT).to_string())
}

fn parse_utc(iso: &str) -> Result<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(iso) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(source) => NaiveDateTime::parse_from_str(iso, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|_| Error::TimeParse {
                value: iso.to_string(),
                source,
            }),
    }
}
