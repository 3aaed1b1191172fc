//! Calendar-day helpers shared by the rule engine and the task service.
//!
//! Everything here works on naive calendar days (`NaiveDate`). Time-of-day and
//! zone information is stripped once at the boundary and never reintroduced.

use chrono::{Datelike, Duration, NaiveDate};

/// Boundary date format (`YYYYMMDD`).
pub const DATE_FORMAT: &str = "%Y%m%d";

/// Parse an 8-digit `YYYYMMDD` string into a calendar day.
///
/// Anything that is not exactly eight ASCII digits is rejected up front, so
/// inputs like `"2024011"` or `"+2024011"` never reach chrono's lenient field
/// parsing.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .map(|first_next| (first_next - Duration::days(1)).day())
        .unwrap_or(31)
}

/// Day-of-month of the last calendar day in `date`'s month.
pub fn last_day_of_month(date: NaiveDate) -> u32 {
    days_in_month(date.year(), date.month())
}

/// ISO weekday number: 1 = Monday .. 7 = Sunday.
pub fn iso_weekday(date: NaiveDate) -> u32 {
    date.weekday().number_from_monday()
}

/// Shift `date` by whole calendar years, keeping month and day.
///
/// A day that does not exist in the target year (Feb 29 outside leap years)
/// is clamped to the last day of that month.
pub fn add_years(date: NaiveDate, years: i32) -> Option<NaiveDate> {
    let year = date.year().checked_add(years)?;
    let day = date.day().min(days_in_month(year, date.month()));
    NaiveDate::from_ymd_opt(year, date.month(), day)
}
