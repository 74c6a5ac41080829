//! Timestamp helpers for filesystem metadata.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, SecondsFormat, Utc};

/// Convert a filesystem timestamp to UTC.
///
/// Returns `None` when the time is out of chrono's range; some filesystems
/// store 64-bit seconds.
pub fn from_system_time(time: SystemTime) -> Option<DateTime<Utc>> {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => {
            let secs = i64::try_from(after.as_secs()).ok()?;
            DateTime::from_timestamp(secs, after.subsec_nanos())
        }
        Err(before) => {
            let before = before.duration();
            let secs = i64::try_from(before.as_secs()).ok()?.checked_neg()?;
            match before.subsec_nanos() {
                0 => DateTime::from_timestamp(secs, 0),
                nanos => DateTime::from_timestamp(secs.checked_sub(1)?, 1_000_000_000 - nanos),
            }
        }
    }
}

/// Convert seconds + nanoseconds since the Unix epoch to UTC.
///
/// Returns `None` when the pair is out of chrono's range.
pub fn from_unix(secs: i64, nanos: i64) -> Option<DateTime<Utc>> {
    let nanos = u32::try_from(nanos).ok()?;
    DateTime::from_timestamp(secs, nanos)
}

/// Format a UTC timestamp as RFC3339 with millisecond precision.
///
/// This is the shape API clients receive (e.g., "2024-01-15T10:30:00.000Z").
pub fn to_rfc3339(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}
