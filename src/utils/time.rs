use chrono::{DateTime, TimeZone, Utc};

/// Seconds between the Windows epoch (1601-01-01) and the Unix epoch.
const EPOCH_DIFFERENCE_SECONDS: i64 = 11_644_473_600;

/// Converts a Windows FILETIME (100ns ticks since 1601-01-01 UTC) to UTC.
///
/// Sub-second precision is dropped; the flat output only ever shows whole
/// seconds. Returns `None` for values chrono cannot represent.
pub fn datetime_from_filetime(filetime: u64) -> Option<DateTime<Utc>> {
    let seconds = (filetime / 10_000_000) as i64 - EPOCH_DIFFERENCE_SECONDS;
    Utc.timestamp_opt(seconds, 0).single()
}
