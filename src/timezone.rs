//! Helpers for converting canonical timezone names into UTC offsets.

use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

/// Get the current UTC offset for a canonical timezone name, e.g. "Pacific/Auckland".
///
/// Returns `None` if the name is not a known timezone.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// Today's date in the first valid timezone of `preferred` and `fallback`.
///
/// Falls back to UTC if neither name is a known timezone.
pub fn today_in(preferred: Option<&str>, fallback: &str) -> Date {
    let offset = preferred
        .and_then(get_local_offset)
        .or_else(|| get_local_offset(fallback))
        .unwrap_or_else(|| {
            tracing::warn!("Invalid timezone \"{fallback}\", using UTC.");
            UtcOffset::UTC
        });

    OffsetDateTime::now_utc().to_offset(offset).date()
}
