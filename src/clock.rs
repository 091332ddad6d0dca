//! Calendar source for backoff windows and month-scoped keys.
//!
//! Backoff expiry is decided by comparing calendar dates, never wall-clock
//! durations: a daily backoff written on the 3rd expires when the clock
//! reports the 4th, regardless of the hour. The engine only ever asks for
//! "today", so that is all a [`Clock`] provides.

use std::fmt;
use std::sync::RwLock;

use chrono::{Datelike, Days, NaiveDate};

/// Source of the current calendar date.
pub trait Clock: Send + Sync {
    /// The current local date.
    fn today(&self) -> NaiveDate;

    /// The current calendar month.
    fn this_month(&self) -> MonthKey {
        MonthKey::from(self.today())
    }
}

/// Clock backed by the host's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Manually driven clock for tests and replays.
///
/// ```rust
/// # use asset_optimizer::{Clock, FixedClock};
/// # use chrono::NaiveDate;
/// let clock = FixedClock::new(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
/// clock.advance_days(1);
/// assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
/// ```
#[derive(Debug)]
pub struct FixedClock {
    date: RwLock<NaiveDate>,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: RwLock::new(date),
        }
    }

    /// Jump to an arbitrary date.
    pub fn set(&self, date: NaiveDate) {
        *self.date.write().unwrap_or_else(|e| e.into_inner()) = date;
    }

    /// Move forward by `days` calendar days (saturating at the maximum date).
    pub fn advance_days(&self, days: u64) {
        let mut date = self.date.write().unwrap_or_else(|e| e.into_inner());
        if let Some(next) = date.checked_add_days(Days::new(days)) {
            *date = next;
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.date.read().unwrap_or_else(|e| e.into_inner())
    }
}

/// A calendar month, displayed as `YYYYMM`.
///
/// Used as the namespace for usage counters and audit logs, and as the
/// payload of a monthly backoff record. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    /// Build from a year and a 1-based month. Returns `None` outside 1..=12
    /// or outside the four-digit year range.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        ((0..=9999).contains(&year) && (1..=12).contains(&month)).then_some(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Parse the six-digit `YYYYMM` form.
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let year = s[..4].parse().ok()?;
        let month = s[4..].parse().ok()?;
        Self::new(year, month)
    }
}

impl From<NaiveDate> for MonthKey {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}
