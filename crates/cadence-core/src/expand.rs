//! Recurrence expansion.
//!
//! [`RecurrenceExpander`] turns a master event and a date window into the
//! ordered list of concrete [`Occurrence`]s, applying per-date exceptions.
//! [`SeriesDates`] is the underlying generator: the raw dates a rule
//! produces from the series start, honouring the end condition but ignoring
//! query ranges and exceptions.
//!
//! Month and year steps are always computed from the series anchor (the
//! start date unless the series continues an earlier one), so a series
//! starting on the 31st lands on the last day of short months and returns
//! to the 31st afterwards.

use std::iter::FusedIterator;

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::event::{Event, ExceptionMap, Occurrence, OccurrenceException};
use crate::recurrence::{EndCondition, RecurrenceRule, RecurrenceUnit};
use crate::time::{DateRange, days_from, week_start_of};

/// Options shared by every expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpandOptions {
    /// First day of a week; anchors weekly blocks with a weekday set.
    pub week_start: Weekday,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            week_start: Weekday::Mon,
        }
    }
}

impl ExpandOptions {
    #[must_use]
    pub fn with_week_start(mut self, week_start: Weekday) -> Self {
        self.week_start = week_start;
        self
    }
}

/// Candidate generator for one rule shape.
#[derive(Debug, Clone)]
enum Stepper {
    /// No candidates at all.
    Empty,
    /// Only the start date.
    Once { done: bool },
    /// `start + index * days`.
    EveryDays { days: u64, index: u64 },
    /// `start + index * months`, clamped to month end.
    EveryMonths { months: u32, index: u32 },
    /// Day steps filtered to a weekday set.
    FilteredDays {
        days: u64,
        weekdays: Vec<Weekday>,
        index: u64,
    },
    /// Selected weekdays inside every `interval`-week block.
    WeekBlocks {
        first_block: NaiveDate,
        block_days: u64,
        offsets: Vec<u32>,
        block: u64,
        slot: usize,
    },
}

impl Stepper {
    /// Builds the stepper for `rule` with steps counted from `anchor`,
    /// positioned at the last step that does not pass `start`.
    fn for_rule(
        rule: &RecurrenceRule,
        anchor: NaiveDate,
        start: NaiveDate,
        week_start: Weekday,
    ) -> Self {
        let (Some(interval), Some(unit)) = (rule.interval(), rule.unit()) else {
            return Self::Once { done: false };
        };
        let interval = interval.get();
        let weekdays = rule.weekdays();
        let gap_days = days_between(anchor, start);

        match unit {
            RecurrenceUnit::Days if weekdays.is_empty() => Self::EveryDays {
                days: u64::from(interval),
                index: gap_days / u64::from(interval),
            },
            RecurrenceUnit::Days => {
                // A step that is a whole number of weeks never leaves the
                // anchor's weekday, so other selected days are unreachable.
                let reachable: Vec<Weekday> = if interval % 7 == 0 {
                    weekdays
                        .iter()
                        .copied()
                        .filter(|d| *d == anchor.weekday())
                        .collect()
                } else {
                    weekdays.to_vec()
                };
                if reachable.is_empty() {
                    return Self::Empty;
                }
                Self::FilteredDays {
                    days: u64::from(interval),
                    weekdays: reachable,
                    index: gap_days / u64::from(interval),
                }
            }
            RecurrenceUnit::Weeks if weekdays.is_empty() => {
                let days = u64::from(interval) * 7;
                Self::EveryDays {
                    days,
                    index: gap_days / days,
                }
            }
            RecurrenceUnit::Weeks => {
                let mut offsets: Vec<u32> = weekdays
                    .iter()
                    .map(|d| days_from(week_start, *d))
                    .collect();
                offsets.sort_unstable();
                offsets.dedup();
                let first_block = week_start_of(anchor, week_start);
                let block_days = u64::from(interval) * 7;
                Self::WeekBlocks {
                    first_block,
                    block_days,
                    offsets,
                    block: days_between(first_block, week_start_of(start, week_start)) / block_days,
                    slot: 0,
                }
            }
            RecurrenceUnit::Months => Self::EveryMonths {
                months: interval,
                index: months_between(anchor, start) / interval,
            },
            RecurrenceUnit::Years => match interval.checked_mul(12) {
                Some(months) => Self::EveryMonths {
                    months,
                    index: months_between(anchor, start) / months,
                },
                None => Self::Once { done: false },
            },
        }
    }

    /// Next candidate counted from `anchor`; may precede the series start.
    fn next_candidate(&mut self, anchor: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Empty => None,
            Self::Once { done } => {
                if *done {
                    return None;
                }
                *done = true;
                Some(anchor)
            }
            Self::EveryDays { days, index } => {
                let date = anchor.checked_add_days(Days::new(index.checked_mul(*days)?))?;
                *index += 1;
                Some(date)
            }
            Self::EveryMonths { months, index } => {
                let date = anchor.checked_add_months(Months::new(index.checked_mul(*months)?))?;
                *index += 1;
                Some(date)
            }
            Self::FilteredDays {
                days,
                weekdays,
                index,
            } => loop {
                let date = anchor.checked_add_days(Days::new(index.checked_mul(*days)?))?;
                *index += 1;
                if weekdays.contains(&date.weekday()) {
                    return Some(date);
                }
            },
            Self::WeekBlocks {
                first_block,
                block_days,
                offsets,
                block,
                slot,
            } => {
                if *slot == offsets.len() {
                    *slot = 0;
                    *block += 1;
                }
                let block_offset = block.checked_mul(*block_days)?;
                let offset = block_offset.checked_add(u64::from(offsets[*slot]))?;
                let date = first_block.checked_add_days(Days::new(offset))?;
                *slot += 1;
                Some(date)
            }
        }
    }
}

fn days_between(from: NaiveDate, to: NaiveDate) -> u64 {
    (to - from).num_days().max(0).unsigned_abs()
}

/// Whole calendar months from `from`'s month to `to`'s month.
fn months_between(from: NaiveDate, to: NaiveDate) -> u32 {
    let months = (i64::from(to.year()) - i64::from(from.year())) * 12 + i64::from(to.month())
        - i64::from(from.month());
    u32::try_from(months.max(0)).unwrap_or(u32::MAX)
}

/// The dates a series produces, in ascending order.
///
/// Created by [`RecurrenceExpander::series_dates`]. The iterator honours the
/// rule's end condition and is unbounded for `Never` rules.
#[derive(Debug, Clone)]
pub struct SeriesDates {
    anchor: NaiveDate,
    start: NaiveDate,
    stepper: Stepper,
    end: EndCondition,
    produced: u32,
    finished: bool,
}

impl SeriesDates {
    /// Number of dates yielded so far.
    pub fn produced(&self) -> u32 {
        self.produced
    }
}

impl Iterator for SeriesDates {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        if self.finished {
            return None;
        }
        if let EndCondition::AfterCount(limit) = self.end {
            if self.produced >= limit.get() {
                self.finished = true;
                return None;
            }
        }
        let date = loop {
            match self.stepper.next_candidate(self.anchor) {
                Some(date) if date < self.start => continue,
                Some(date) => break date,
                None => {
                    self.finished = true;
                    return None;
                }
            }
        };
        if let EndCondition::UntilDate(until) = self.end {
            if date > until {
                self.finished = true;
                return None;
            }
        }
        self.produced += 1;
        Some(date)
    }
}

impl FusedIterator for SeriesDates {}

/// Expands master events into concrete occurrences.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecurrenceExpander {
    options: ExpandOptions,
}

impl RecurrenceExpander {
    pub fn new(options: ExpandOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExpandOptions {
        &self.options
    }

    /// Raw series dates of `event` starting at its start date.
    ///
    /// Steps are counted from [`Event::anchor_date`], so a continued series
    /// keeps the day of month and week blocks of the series it came from.
    pub fn series_dates(&self, event: &Event) -> SeriesDates {
        let anchor = event.anchor_date();
        SeriesDates {
            anchor,
            start: event.start_date,
            stepper: Stepper::for_rule(
                &event.recurrence,
                anchor,
                event.start_date,
                self.options.week_start,
            ),
            end: event.recurrence.end_condition(),
            produced: 0,
            finished: false,
        }
    }

    /// Occurrences of `event` dated within `[range_start, range_end]`.
    ///
    /// The result is ordered by date then start time, all-day occurrences
    /// first within a day. An inverted range yields nothing.
    pub fn expand(
        &self,
        event: &Event,
        range_start: NaiveDate,
        range_end: NaiveDate,
        exceptions: &ExceptionMap,
    ) -> Vec<Occurrence> {
        if range_start > range_end {
            debug!(event_id = %event.id, %range_start, %range_end, "empty expansion range");
            return Vec::new();
        }

        let mut occurrences: Vec<Occurrence> = self
            .series_dates(event)
            .take_while(|date| *date <= range_end)
            .filter(|date| *date >= range_start)
            .filter_map(|date| resolve(event, date, exceptions))
            .collect();
        occurrences.sort_by_key(Occurrence::sort_key);

        debug!(
            event_id = %event.id,
            %range_start,
            %range_end,
            count = occurrences.len(),
            "expanded event"
        );
        occurrences
    }

    /// Same as [`expand`](Self::expand) over a [`DateRange`].
    pub fn expand_range(
        &self,
        event: &Event,
        range: &DateRange,
        exceptions: &ExceptionMap,
    ) -> Vec<Occurrence> {
        self.expand(event, range.start, range.end, exceptions)
    }

    /// Expands several masters and merges them into one ordered list.
    ///
    /// `exceptions_for` is asked once per event; its first error aborts the
    /// expansion. Ties keep the order of `events`.
    pub fn expand_all<'a, I, F, E>(
        &self,
        events: I,
        range: &DateRange,
        mut exceptions_for: F,
    ) -> Result<Vec<Occurrence>, E>
    where
        I: IntoIterator<Item = &'a Event>,
        F: FnMut(&Event) -> Result<ExceptionMap, E>,
    {
        let mut all = Vec::new();
        for event in events {
            let exceptions = exceptions_for(event)?;
            all.extend(self.expand_range(event, range, &exceptions));
        }
        all.sort_by_key(Occurrence::sort_key);
        Ok(all)
    }

    /// The next `limit` occurrences on or after `from`.
    pub fn upcoming(
        &self,
        event: &Event,
        from: NaiveDate,
        limit: usize,
        exceptions: &ExceptionMap,
    ) -> Vec<Occurrence> {
        let mut occurrences: Vec<Occurrence> = self
            .series_dates(event)
            .skip_while(|date| *date < from)
            .filter_map(|date| resolve(event, date, exceptions))
            .take(limit)
            .collect();
        occurrences.sort_by_key(Occurrence::sort_key);
        occurrences
    }

    /// Returns true if the rule produces `date`, ignoring exceptions.
    pub fn produces(&self, event: &Event, date: NaiveDate) -> bool {
        self.series_dates(event)
            .take_while(|d| *d <= date)
            .any(|d| d == date)
    }
}

fn resolve(event: &Event, date: NaiveDate, exceptions: &ExceptionMap) -> Option<Occurrence> {
    let mut occurrence = Occurrence::from_master(event, date);
    match exceptions.get(&date) {
        Some(OccurrenceException::Deleted) => {
            trace!(event_id = %event.id, %date, "occurrence deleted");
            None
        }
        Some(OccurrenceException::Modified(overrides)) => {
            occurrence.apply_overrides(overrides);
            Some(occurrence)
        }
        None => Some(occurrence),
    }
}
