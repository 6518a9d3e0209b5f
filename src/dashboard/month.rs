//! Calendar month helpers for monthly totals.

use std::ops::RangeInclusive;

use time::Date;

/// The first through to the last day of the month that contains `date`.
pub fn month_containing(date: Date) -> RangeInclusive<Date> {
    let first_day = date.replace_day(1).unwrap_or(date);
    let last_day = date
        .replace_day(date.month().length(date.year()))
        .unwrap_or(date);

    first_day..=last_day
}

/// The month and year of `date` for display, e.g. "October 2026".
pub fn month_label(date: Date) -> String {
    format!("{} {}", date.month(), date.year())
}
