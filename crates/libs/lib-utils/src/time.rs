//! # Time Utilities
//!
//! Conversions between contract timestamps (unix seconds) and display strings.

use chrono::{DateTime, Utc};

pub const SECONDS_PER_DAY: u64 = 86_400;

/// Convert a contract timestamp (unix seconds) to a UTC DateTime.
pub fn unix_to_utc(secs: u64) -> Result<DateTime<Utc>, Error> {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or(Error::TimestampOutOfRange(secs))
}

/// Format a contract timestamp as `M/D/YYYY`.
///
/// Timestamps chrono cannot represent render as `-`.
pub fn format_unix_date(secs: u64) -> String {
    match unix_to_utc(secs) {
        Ok(time) => time.format("%-m/%-d/%Y").to_string(),
        Err(_) => "-".to_string(),
    }
}

/// Poll durations are entered in days but sent to the contract in seconds.
pub fn days_to_seconds(days: u64) -> u64 {
    days.saturating_mul(SECONDS_PER_DAY)
}

// region:    --- Error
#[derive(Debug)]
pub enum Error {
    TimestampOutOfRange(u64),
}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(fmt, "{self:?}")
    }
}

impl std::error::Error for Error {}
// endregion: --- Error
