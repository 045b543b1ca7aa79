//! Output formatting for occurrences and recurrence rules.
//!
//! This module provides:
//! - human-readable labels: recurrence summaries, time ranges, durations,
//!   reminder offsets
//! - [`OccurrenceFormatter`]: terminal lines and a JSON view of expanded
//!   occurrences and day layouts
//!
//! # Example
//!
//! ```rust
//! use cadence_core::format::recurrence_summary;
//! use cadence_core::{Event, RecurrenceRule};
//! use chrono::{NaiveDate, Weekday};
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let event = Event::new("evt", "Gym", start)
//!     .with_recurrence(RecurrenceRule::weekly(2, [Weekday::Mon, Weekday::Wed]).unwrap());
//! assert_eq!(
//!     recurrence_summary(&event),
//!     "Repeats every 2 weeks on Monday and Wednesday"
//! );
//! ```

use std::borrow::Cow;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::event::{Event, Occurrence};
use crate::layout::DayLayout;
use crate::recurrence::{EndCondition, RecurrenceRule};


/// Time format preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFormat {
    /// 24-hour format (e.g., "14:30").
    #[default]
    #[serde(alias = "24h")]
    H24,
    /// 12-hour format with AM/PM (e.g., "2:30 PM").
    #[serde(alias = "12h")]
    H12,
}

/// Configuration options for output formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatOptions {
    /// Maximum length for titles (truncated with ellipsis).
    pub max_title_length: Option<usize>,
    /// Hour separator character (e.g., ":", "h").
    pub hour_separator: String,
    pub time_format: TimeFormat,
    /// Whether to append the location to terminal lines.
    pub show_location: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            max_title_length: None,
            hour_separator: ":".to_string(),
            time_format: TimeFormat::H24,
            show_location: true,
        }
    }
}

/// Full English weekday name.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// English ordinal suffix for a day of month ("st", "nd", "rd", "th").
pub fn ordinal_suffix(day: u32) -> &'static str {
    if (11..=13).contains(&(day % 100)) {
        return "th";
    }
    match day % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

/// Formats a date like "Dec 31, 2026".
pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %d, %Y").to_string()
}

/// Joins names as "A", "A and B" or "A, B and C".
fn join_names(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [only] => (*only).to_string(),
        [head @ .., last] => format!("{} and {}", head.join(", "), last),
    }
}

fn every(interval: u32, singular: &str, plural: &str) -> String {
    if interval == 1 {
        format!("every {singular}")
    } else {
        format!("every {interval} {plural}")
    }
}

/// Human-readable description of an event's recurrence.
///
/// E.g. "Repeats every 2 weeks on Monday and Wednesday, until Dec 31, 2026".
pub fn recurrence_summary(event: &Event) -> String {
    let rule = &event.recurrence;
    let (Some(interval), Some(unit)) = (rule.interval(), rule.unit()) else {
        return "Does not repeat".to_string();
    };
    let interval = interval.get();
    let mut summary = String::from("Repeats ");
    summary.push_str(&every(interval, unit.singular(), unit.as_str()));

    let weekdays: Vec<&str> = rule.weekdays().iter().map(|d| weekday_name(*d)).collect();
    match rule {
        RecurrenceRule::Weekly { .. } if weekdays.is_empty() => {
            summary.push_str(" on ");
            summary.push_str(weekday_name(event.anchor_date().weekday()));
        }
        RecurrenceRule::Monthly { .. } => {
            let day = event.anchor_date().day();
            summary.push_str(&format!(" on the {day}{}", ordinal_suffix(day)));
        }
        RecurrenceRule::Yearly { .. } => {
            summary.push_str(&format!(" on {}", event.anchor_date().format("%b %d")));
        }
        _ if !weekdays.is_empty() => {
            summary.push_str(" on ");
            summary.push_str(&join_names(&weekdays));
        }
        _ => {}
    }

    match rule.end_condition() {
        EndCondition::Never => {}
        EndCondition::UntilDate(until) => {
            summary.push_str(&format!(", until {}", format_date(until)));
        }
        EndCondition::AfterCount(n) => {
            let n = n.get();
            summary.push_str(&format!(", {n} time{}", if n == 1 { "" } else { "s" }));
        }
    }
    summary
}

/// Formats a time of day per the options.
pub fn format_time(time: NaiveTime, options: &FormatOptions) -> String {
    let sep = &options.hour_separator;
    match options.time_format {
        TimeFormat::H24 => format!("{:02}{}{:02}", time.hour(), sep, time.minute()),
        TimeFormat::H12 => {
            let (pm, hour) = time.hour12();
            let suffix = if pm { "PM" } else { "AM" };
            format!("{}{}{:02} {}", hour, sep, time.minute(), suffix)
        }
    }
}

/// "10:00 – 11:30", "10:00" without an end, or "All day".
pub fn time_range_label(occurrence: &Occurrence, options: &FormatOptions) -> String {
    let Some(start) = occurrence.start_time.filter(|_| occurrence.is_timed()) else {
        return "All day".to_string();
    };
    match occurrence.end_time {
        Some(end) => format!("{} – {}", format_time(start, options), format_time(end, options)),
        None => format_time(start, options),
    }
}

/// "45 minutes", "1 hour", "2 hours 30 min"; empty for non-positive input.
pub fn duration_label(minutes: i64) -> String {
    if minutes <= 0 {
        return String::new();
    }
    let plural = |n: i64| if n == 1 { "" } else { "s" };
    if minutes < 60 {
        return format!("{minutes} minute{}", plural(minutes));
    }
    let (hours, rest) = (minutes / 60, minutes % 60);
    if rest == 0 {
        format!("{hours} hour{}", plural(hours))
    } else {
        format!("{hours} hour{} {rest} min", plural(hours))
    }
}

/// Describes a reminder offset, e.g. "15 min before" or "2 days before".
pub fn reminder_label(minutes: u32) -> String {
    let plural = |n: u32| if n == 1 { "" } else { "s" };
    match minutes {
        0 => "At time of event".to_string(),
        1..=59 => format!("{minutes} min before"),
        60..=1439 => {
            let hours = minutes / 60;
            format!("{hours} hour{} before", plural(hours))
        }
        _ => {
            let days = minutes / 1440;
            if days < 7 {
                format!("{days} day{} before", plural(days))
            } else {
                let weeks = days / 7;
                format!("{weeks} week{} before", plural(weeks))
            }
        }
    }
}

/// Truncates a string to `max_len` characters, ending with "...".
pub fn ellipsis(s: &str, max_len: usize) -> Cow<'_, str> {
    if s.chars().count() <= max_len {
        return Cow::Borrowed(s);
    }
    if max_len <= 3 {
        return Cow::Owned(s.chars().take(max_len).collect());
    }
    let mut truncated: String = s.chars().take(max_len - 3).collect();
    truncated.push_str("...");
    Cow::Owned(truncated)
}

/// One occurrence in JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonOccurrence {
    pub event_id: String,
    pub original_date: NaiveDate,
    pub date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    pub all_day: bool,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Formatted time range for display.
    pub time_display: String,
    pub is_recurring: bool,
    pub is_modified: bool,
}

/// JSON output of an expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonOutput {
    pub occurrences: Vec<JsonOccurrence>,
    pub count: usize,
}

/// One placed occurrence in a JSON day layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonPlacement {
    pub event_id: String,
    pub title: String,
    pub start_minute: u32,
    pub end_minute: u32,
    pub column_index: usize,
    pub column_count: usize,
    /// Left edge as a fraction of the day column.
    pub left: f64,
    /// Width as a fraction of the day column.
    pub width: f64,
}

/// JSON output of a day layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonDayLayout {
    pub date: NaiveDate,
    pub all_day: Vec<JsonOccurrence>,
    pub timed: Vec<JsonPlacement>,
}

/// Formatter for expanded occurrences.
#[derive(Debug, Clone, Default)]
pub struct OccurrenceFormatter {
    options: FormatOptions,
}

impl OccurrenceFormatter {
    pub fn new(options: FormatOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FormatOptions {
        &self.options
    }

    fn title<'a>(&self, title: &'a str) -> Cow<'a, str> {
        match self.options.max_title_length {
            Some(max) => ellipsis(title, max),
            None => Cow::Borrowed(title),
        }
    }

    fn describe(&self, occurrence: &Occurrence) -> String {
        let mut text = self.title(&occurrence.title).into_owned();
        if self.options.show_location {
            if let Some(location) = occurrence.location.as_deref().filter(|l| !l.is_empty()) {
                text.push_str(" @ ");
                text.push_str(location);
            }
        }
        if occurrence.is_modified {
            text.push_str(" (edited)");
        }
        text
    }

    /// One line per occurrence: date, time range, title.
    pub fn format_tty(&self, occurrences: &[Occurrence]) -> Vec<String> {
        occurrences
            .iter()
            .map(|occ| {
                format!(
                    "{}  {}  {}",
                    occ.date.format("%a %Y-%m-%d"),
                    time_range_label(occ, &self.options),
                    self.describe(occ)
                )
            })
            .collect()
    }

    /// Lines for one day: a header, the all-day banner, then placed slots.
    pub fn format_day_tty(&self, day: &DayLayout<'_>) -> Vec<String> {
        let mut lines = vec![day.date.format("%A %Y-%m-%d").to_string()];
        for occ in &day.all_day {
            lines.push(format!("  All day  {}", self.describe(occ)));
        }
        for placed in &day.timed {
            lines.push(format!(
                "  {}  [{}/{}]  {}",
                time_range_label(placed.occurrence, &self.options),
                placed.slot.column_index + 1,
                placed.slot.column_count,
                self.describe(placed.occurrence)
            ));
        }
        if day.is_empty() {
            lines.push("  No events".to_string());
        }
        lines
    }

    fn json_occurrence(&self, occ: &Occurrence) -> JsonOccurrence {
        let as_text = |t: NaiveTime| t.format("%H:%M").to_string();
        JsonOccurrence {
            event_id: occ.event_id.clone(),
            original_date: occ.original_date,
            date: occ.date,
            end_date: occ.end_date,
            start_time: occ.start_time.map(as_text),
            end_time: occ.end_time.map(as_text),
            all_day: occ.all_day,
            title: self.title(&occ.title).into_owned(),
            location: occ.location.clone(),
            time_display: time_range_label(occ, &self.options),
            is_recurring: occ.is_recurring,
            is_modified: occ.is_modified,
        }
    }

    /// JSON view of an occurrence list.
    pub fn format_json(&self, occurrences: &[Occurrence]) -> JsonOutput {
        let occurrences: Vec<JsonOccurrence> =
            occurrences.iter().map(|occ| self.json_occurrence(occ)).collect();
        JsonOutput {
            count: occurrences.len(),
            occurrences,
        }
    }

    /// JSON view of a day layout.
    pub fn format_day_json(&self, day: &DayLayout<'_>) -> JsonDayLayout {
        JsonDayLayout {
            date: day.date,
            all_day: day.all_day.iter().map(|occ| self.json_occurrence(occ)).collect(),
            timed: day
                .timed
                .iter()
                .map(|placed| JsonPlacement {
                    event_id: placed.occurrence.event_id.clone(),
                    title: self.title(&placed.occurrence.title).into_owned(),
                    start_minute: placed.span.start,
                    end_minute: placed.span.end,
                    column_index: placed.slot.column_index,
                    column_count: placed.slot.column_count,
                    left: placed.slot.left_fraction(),
                    width: placed.slot.width_fraction(),
                })
                .collect(),
        }
    }
}
