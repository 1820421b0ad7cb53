//! Calendar helpers.
//!
//! Weeks run Monday to Sunday. A weekend is identified by its Saturday,
//! so a Saturday shift and the following Sunday shift share one weekend
//! id. Hour arithmetic is done on whole minutes.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};

/// Whether a date is a Saturday or Sunday.
#[inline]
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Monday of the calendar week containing `date`.
#[inline]
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Weekend identifier: the Saturday of the weekend containing `date`.
///
/// Returns `None` for weekdays.
pub fn weekend_id(date: NaiveDate) -> Option<NaiveDate> {
    match date.weekday() {
        Weekday::Sat => Some(date),
        Weekday::Sun => Some(date - Duration::days(1)),
        _ => None,
    }
}

/// `(year, month)` key for monthly caps.
#[inline]
pub fn month_key(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

/// Signed hours from `from` to `to`.
#[inline]
pub fn hours_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_minutes() as f64 / 60.0
}

/// Inclusive day iterator.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}
