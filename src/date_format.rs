//! Lenient deserialization of dates in request bodies.
//!
//! Clients send either a plain date, e.g. "2026-10-16", or a full RFC 3339
//! date-time, e.g. "2026-10-16T08:30:00.000Z". The date-time form is reduced
//! to its calendar date in the offset it was written in.

use serde::{Deserialize, Deserializer};
use time::{
    Date, OffsetDateTime, format_description::BorrowedFormatItem,
    format_description::well_known::Rfc3339, macros::format_description,
};

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Parse a date from either a `YYYY-MM-DD` string or an RFC 3339 date-time.
pub fn parse_date(text: &str) -> Result<Date, time::error::Parse> {
    let text = text.trim();

    match Date::parse(text, DATE_FORMAT) {
        Ok(date) => Ok(date),
        Err(_) => OffsetDateTime::parse(text, &Rfc3339).map(|date_time| date_time.date()),
    }
}

/// Deserialize an optional date, see [parse_date].
///
/// Use with `#[serde(default, deserialize_with = "date_format::deserialize_optional")]`.
pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
where
    D: Deserializer<'de>,
{
    let text: Option<String> = Option::deserialize(deserializer)?;

    match text {
        Some(text) if !text.trim().is_empty() => parse_date(&text)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}
