//! Natural-language date resolution
//!
//! Turns the date expression in a Korean travel query into a calendar date.
//! Rules are tried in a fixed priority order and only the first rule that
//! matches is applied:
//!
//! 1. Full date, `2025년 3월 15일`, used verbatim (past dates included).
//! 2. Bare day of month, `15일`. A day before today's day of month refers to
//!    next month (December rolls into January of the following year).
//! 3. Relative expressions: `내일`, `모레`, `이번 주말`, `다음 주말`,
//!    `다음주`, `다음 주`.
//!
//! A rule whose numbers do not form a real calendar date resolves to nothing.

use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

static FULL_DATE: OnceLock<Regex> = OnceLock::new();
static DAY_OF_MONTH: OnceLock<Regex> = OnceLock::new();

fn full_date_pattern() -> &'static Regex {
    FULL_DATE.get_or_init(|| {
        Regex::new(r"([0-9]{4})년 ([0-9]{1,2})월 ([0-9]{1,2})일").expect("Invalid full date pattern")
    })
}

fn day_of_month_pattern() -> &'static Regex {
    DAY_OF_MONTH.get_or_init(|| Regex::new(r"([0-9]{1,2})일").expect("Invalid day pattern"))
}

/// A calendar date together with its distance from today
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDate {
    date: NaiveDate,
    days_ahead: i64,
}

impl ResolvedDate {
    pub fn new(date: NaiveDate, today: NaiveDate) -> Self {
        Self {
            date,
            days_ahead: (date - today).num_days(),
        }
    }

    /// Today, zero days ahead
    pub fn today(today: NaiveDate) -> Self {
        Self::new(today, today)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Calendar days between today and this date; negative for past dates
    pub fn days_ahead(&self) -> i64 {
        self.days_ahead
    }

    /// `YYYYMMDD`, the format the forecast providers use
    pub fn compact(&self) -> String {
        self.date.format("%Y%m%d").to_string()
    }
}

impl fmt::Display for ResolvedDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date.format("%Y%m%d"))
    }
}

/// Relative expressions in match order, with their day offset from `today`
fn relative_offsets(today: NaiveDate) -> [(&'static str, i64); 6] {
    let weekday = i64::from(today.weekday().num_days_from_monday());
    let is_weekday = weekday < 5;

    [
        ("내일", 1),
        ("모레", 2),
        ("이번 주말", if is_weekday { 5 - weekday } else { 1 }),
        ("다음 주말", if is_weekday { 12 - weekday } else { 8 }),
        ("다음주", 7),
        ("다음 주", 7),
    ]
}

/// Resolves the date expression in `query` relative to `today`.
///
/// Returns `None` when no rule matches, or when the first matching rule does
/// not describe a real date.
pub fn resolve(query: &str, today: NaiveDate) -> Option<ResolvedDate> {
    if let Some(caps) = full_date_pattern().captures(query) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;

        return NaiveDate::from_ymd_opt(year, month, day).map(|d| ResolvedDate::new(d, today));
    }

    if let Some(caps) = day_of_month_pattern().captures(query) {
        let day: u32 = caps[1].parse().ok()?;

        let (year, month) = if day < today.day() {
            if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            }
        } else {
            (today.year(), today.month())
        };

        return NaiveDate::from_ymd_opt(year, month, day).map(|d| ResolvedDate::new(d, today));
    }

    relative_offsets(today)
        .iter()
        .find(|(term, _)| query.contains(term))
        .map(|(_, offset)| ResolvedDate::new(today + Duration::days(*offset), today))
}

/// Resolves the date in `query`, defaulting to today
pub fn resolve_or_today(query: &str, today: NaiveDate) -> ResolvedDate {
    resolve(query, today).unwrap_or_else(|| ResolvedDate::today(today))
}
