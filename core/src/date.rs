//! Date Normalizer: strict `DD/MM/YYYY` handling for event dates.
//!
//! Event dates arrive as text in day/month/year order. [`validate`] decides
//! whether the text names a real calendar day; [`normalize`] turns validated
//! text into a [`NaiveDate`]. Callers validate first, then normalize. [`parse`]
//! does both and produces the domain error.

use crate::error::TicketingError;
use chrono::NaiveDate;

/// Message returned to clients when an event date is rejected.
pub const INVALID_DATE_MESSAGE: &str =
    "Invalid date format or value. Date must be in DD/MM/YYYY format and be a valid date";

/// Numeric components of a shape-checked date string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct DateParts {
    day: u32,
    month: u32,
    year: i32,
}

/// Splits `DD/MM/YYYY` into numbers. Only checks the shape, not the ranges.
fn split_parts(input: &str) -> Option<DateParts> {
    let mut parts = input.split('/');
    let (Some(day), Some(month), Some(year), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if day.len() != 2 || month.len() != 2 || year.len() != 4 {
        return None;
    }
    if !(all_digits(day) && all_digits(month) && all_digits(year)) {
        return None;
    }

    Some(DateParts {
        day: day.parse().ok()?,
        month: month.parse().ok()?,
        year: year.parse().ok()?,
    })
}

/// Gregorian leap year rule.
#[must_use]
pub const fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `month` (1-12) of `year`, or `None` for an invalid month.
#[must_use]
pub const fn days_in_month(year: i32, month: u32) -> Option<u32> {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => Some(31),
        4 | 6 | 9 | 11 => Some(30),
        2 if is_leap_year(year) => Some(29),
        2 => Some(28),
        _ => None,
    }
}

/// Returns `true` if `input` is `DD/MM/YYYY` and names an existing calendar day.
///
/// # Examples
///
/// ```
/// use ticketing_core::date::validate;
///
/// assert!(validate("29/02/2024"));
/// assert!(!validate("29/02/2023"));
/// assert!(!validate("1/2/2024"));
/// ```
#[must_use]
pub fn validate(input: &str) -> bool {
    let Some(parts) = split_parts(input) else {
        return false;
    };
    let Some(max_day) = days_in_month(parts.year, parts.month) else {
        return false;
    };
    (1..=max_day).contains(&parts.day)
}

/// Converts validated `DD/MM/YYYY` text into a calendar date.
///
/// Call [`validate`] first. The components are reassembled as year-month-day
/// without re-running the range checks; input that does not name a real day
/// yields `None` rather than a wrapped-around date.
#[must_use]
pub fn normalize(input: &str) -> Option<NaiveDate> {
    let parts = split_parts(input)?;
    NaiveDate::from_ymd_opt(parts.year, parts.month, parts.day)
}

/// Validates and normalizes in one step.
///
/// # Errors
///
/// Returns [`TicketingError::Validation`] when `input` is not a valid
/// `DD/MM/YYYY` date.
pub fn parse(input: &str) -> Result<NaiveDate, TicketingError> {
    if !validate(input) {
        return Err(TicketingError::Validation(INVALID_DATE_MESSAGE.to_string()));
    }
    normalize(input).ok_or_else(|| TicketingError::Validation(INVALID_DATE_MESSAGE.to_string()))
}
