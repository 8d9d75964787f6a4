// SPDX-License-Identifier: MIT

//! Clock access for metadata timestamps.

use time::OffsetDateTime;

/// Returns the current UTC time.
pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Current time as unix seconds, clamped at the epoch.
pub fn unix_now() -> u64 {
    u64::try_from(now_utc().unix_timestamp()).unwrap_or(0)
}

/// Renders a stored unix timestamp; falls back to the raw number when
/// it does not fit a calendar date.
pub fn format_unix(ts: u64) -> String {
    i64::try_from(ts)
        .ok()
        .and_then(|s| OffsetDateTime::from_unix_timestamp(s).ok())
        .map(|dt| {
            format!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02} UTC",
                dt.year(),
                u8::from(dt.month()),
                dt.day(),
                dt.hour(),
                dt.minute(),
                dt.second()
            )
        })
        .unwrap_or_else(|| ts.to_string())
}
