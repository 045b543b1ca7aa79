//! Date and time-of-day types for occurrence queries and layout.
//!
//! This module provides [`DateRange`] for inclusive query windows over naive
//! local dates, and [`TimeSpan`] for minute-resolution intervals within a
//! single day column.

use chrono::{Datelike, Days, NaiveDate, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// Number of minutes in a day; the end of a day column.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Returns the minute of the day (0..1440) for a time of day.
pub fn minutes_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Returns the first day of the week containing `date`.
///
/// `week_start` decides which weekday opens a week (e.g. Monday or Sunday).
pub fn week_start_of(date: NaiveDate, week_start: Weekday) -> NaiveDate {
    let back = days_from(week_start, date.weekday());
    date.checked_sub_days(Days::new(u64::from(back)))
        .unwrap_or(date)
}

/// Number of days from `from` forward to `to` within one week (0..=6).
pub fn days_from(from: Weekday, to: Weekday) -> u32 {
    (to.num_days_from_monday() + 7 - from.num_days_from_monday()) % 7
}

/// An inclusive range of dates `[start, end]`.
///
/// Query windows for month, week, day and agenda views are expressed as
/// date ranges; an occurrence belongs to a range when its date falls inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    /// First day of the range (inclusive).
    pub start: NaiveDate,
    /// Last day of the range (inclusive).
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a new date range.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        assert!(start <= end, "DateRange start must be <= end");
        Self { start, end }
    }

    /// Creates a date range, returning `None` when `start` is after `end`.
    pub fn checked(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// A range covering a single day.
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// The seven-day week containing `date`.
    pub fn for_week(date: NaiveDate, week_start: Weekday) -> Self {
        let start = week_start_of(date, week_start);
        let end = start.checked_add_days(Days::new(6)).unwrap_or(start);
        Self { start, end }
    }

    /// The calendar month `month` of `year`, or `None` for an invalid month.
    pub fn for_month(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some(Self {
            start,
            end: next.pred_opt()?,
        })
    }

    /// Checks if a date falls inside the range (both ends inclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Checks if the inclusive span `[first, last]` shares a day with the range.
    pub fn overlaps_days(&self, first: NaiveDate, last: NaiveDate) -> bool {
        first <= self.end && last >= self.start
    }

    /// Number of days in the range.
    pub fn len_days(&self) -> u64 {
        (self.end - self.start).num_days().unsigned_abs() + 1
    }

    /// Iterates over every day of the range in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }

    /// Extends the range by `days` on both ends.
    pub fn extend(&self, days: u64) -> Self {
        Self {
            start: self
                .start
                .checked_sub_days(Days::new(days))
                .unwrap_or(self.start),
            end: self.end.checked_add_days(Days::new(days)).unwrap_or(self.end),
        }
    }
}

/// A half-open interval `[start, end)` of minutes within a day column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSpan {
    /// Start minute (inclusive).
    pub start: u32,
    /// End minute (exclusive).
    pub end: u32,
}

impl TimeSpan {
    /// Creates a span from minute offsets.
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Builds a span from a start time and an optional end time.
    ///
    /// A missing end, or one not after the start, falls back to
    /// `start + default_duration_minutes`, clipped to midnight. A zero
    /// default still gives the span one minute.
    pub fn from_times(
        start: NaiveTime,
        end: Option<NaiveTime>,
        default_duration_minutes: u32,
    ) -> Self {
        let start = minutes_of_day(start);
        let end = end
            .map(minutes_of_day)
            .filter(|end| *end > start)
            .unwrap_or_else(|| {
                start
                    .saturating_add(default_duration_minutes.max(1))
                    .min(MINUTES_PER_DAY)
            });
        Self { start, end }
    }

    /// Length of the span in minutes.
    pub fn duration_minutes(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Checks whether two spans intersect.
    ///
    /// Back-to-back spans (`a.end == b.start`) do not overlap.
    pub fn overlaps(&self, other: &TimeSpan) -> bool {
        self.start < other.end && self.end > other.start
    }
}
