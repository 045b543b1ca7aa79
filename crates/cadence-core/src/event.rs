//! Event types for recurring calendars.
//!
//! This module provides the data model shared by expansion, layout and the
//! store:
//! - [`Event`]: a master event, possibly carrying a recurrence rule
//! - [`FieldOverrides`]: a subset of mutable fields applied to one occurrence
//! - [`OccurrenceException`]: a deletion or override keyed by original date
//! - [`Occurrence`]: one concrete, resolved instance of a master event

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::recurrence::RecurrenceRule;
use crate::time::TimeSpan;

/// Free-form data carried by an event and passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Reminder offsets in minutes before the start.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reminders: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Any other keys supplied by the caller.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A master event.
///
/// A master with [`RecurrenceRule::None`] is a one-off event; otherwise it
/// describes a whole series whose first occurrence is on `start_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier.
    pub id: String,
    /// Title shown for every occurrence unless overridden.
    pub title: String,
    /// Date of the first occurrence.
    pub start_date: NaiveDate,
    /// Start time; `None` for untimed events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    /// Last day of the first occurrence (same as `start_date` unless multi-day).
    pub end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    /// Whether this is an all-day event.
    #[serde(default)]
    pub all_day: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Recurrence rule; absent means a one-off event.
    #[serde(default)]
    pub recurrence: RecurrenceRule,
    #[serde(default)]
    pub payload: EventPayload,
    /// Date recurrence steps are counted from when it precedes `start_date`.
    ///
    /// Set on a series that continues an earlier one, so clamped month ends
    /// and week blocks keep the earlier series' alignment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_anchor: Option<NaiveDate>,
}

impl Event {
    /// Creates a one-off, untimed event on a single day.
    pub fn new(id: impl Into<String>, title: impl Into<String>, start_date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            start_date,
            start_time: None,
            end_date: start_date,
            end_time: None,
            all_day: false,
            location: None,
            recurrence: RecurrenceRule::None,
            payload: EventPayload::default(),
            series_anchor: None,
        }
    }

    /// Sets the start and optional end time.
    pub fn with_times(mut self, start: NaiveTime, end: Option<NaiveTime>) -> Self {
        self.start_time = Some(start);
        self.end_time = end;
        self
    }

    /// Sets the last day of the first occurrence.
    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = end_date;
        self
    }

    /// Marks the event as all-day and clears its times.
    pub fn with_all_day(mut self) -> Self {
        self.all_day = true;
        self.start_time = None;
        self.end_time = None;
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_recurrence(mut self, rule: RecurrenceRule) -> Self {
        self.recurrence = rule;
        self
    }

    pub fn with_payload(mut self, payload: EventPayload) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_series_anchor(mut self, anchor: NaiveDate) -> Self {
        self.series_anchor = Some(anchor);
        self
    }

    /// The date recurrence steps are counted from.
    ///
    /// An anchor after `start_date`, or on a one-off event, is ignored.
    pub fn anchor_date(&self) -> NaiveDate {
        match self.series_anchor {
            Some(anchor) if anchor <= self.start_date && self.is_recurring() => anchor,
            _ => self.start_date,
        }
    }

    /// Returns true if the event belongs to a recurring series.
    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_recurring()
    }

    /// Returns true if the event has a start time and is not all-day.
    pub fn is_timed(&self) -> bool {
        !self.all_day && self.start_time.is_some()
    }

    /// Number of days between start and end date (0 for single-day events).
    pub fn span_days(&self) -> u64 {
        (self.end_date - self.start_date).num_days().max(0).unsigned_abs()
    }

    /// Overwrites fields with the given overrides.
    pub fn apply(&mut self, overrides: &FieldOverrides) {
        overrides.write_into(OverridableFields {
            title: &mut self.title,
            start_time: &mut self.start_time,
            end_time: &mut self.end_time,
            location: &mut self.location,
            all_day: &mut self.all_day,
            payload: &mut self.payload,
        });
    }
}

/// A subset of an event's mutable fields.
///
/// `None` means "keep the master's value".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_day: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<EventPayload>,
}

impl FieldOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_times(mut self, start: NaiveTime, end: Option<NaiveTime>) -> Self {
        self.start_time = Some(start);
        self.end_time = end;
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_all_day(mut self, all_day: bool) -> Self {
        self.all_day = Some(all_day);
        self
    }

    pub fn with_payload(mut self, payload: EventPayload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Returns true if no field is overridden.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Writes every overridden field into `target`.
    fn write_into(&self, target: OverridableFields<'_>) {
        if let Some(title) = &self.title {
            target.title.clone_from(title);
        }
        if let Some(start) = self.start_time {
            *target.start_time = Some(start);
        }
        if let Some(end) = self.end_time {
            *target.end_time = Some(end);
        }
        if let Some(location) = &self.location {
            *target.location = Some(location.clone());
        }
        if let Some(all_day) = self.all_day {
            *target.all_day = all_day;
        }
        if let Some(payload) = &self.payload {
            target.payload.clone_from(payload);
        }
    }

    /// Layers `newer` on top of `self`; fields set in `newer` win.
    pub fn merge(&mut self, newer: &FieldOverrides) {
        if newer.title.is_some() {
            self.title.clone_from(&newer.title);
        }
        if newer.start_time.is_some() {
            self.start_time = newer.start_time;
        }
        if newer.end_time.is_some() {
            self.end_time = newer.end_time;
        }
        if newer.location.is_some() {
            self.location.clone_from(&newer.location);
        }
        if newer.all_day.is_some() {
            self.all_day = newer.all_day;
        }
        if newer.payload.is_some() {
            self.payload.clone_from(&newer.payload);
        }
    }
}

/// The fields of an event or occurrence that overrides can replace.
struct OverridableFields<'a> {
    title: &'a mut String,
    start_time: &'a mut Option<NaiveTime>,
    end_time: &'a mut Option<NaiveTime>,
    location: &'a mut Option<String>,
    all_day: &'a mut bool,
    payload: &'a mut EventPayload,
}

/// A per-date deviation from a recurring series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "overrides", rename_all = "snake_case")]
pub enum OccurrenceException {
    /// The occurrence on this date is cancelled.
    Deleted,
    /// The occurrence on this date uses these field values.
    Modified(FieldOverrides),
}

/// Exceptions of one event, keyed by original occurrence date.
pub type ExceptionMap = BTreeMap<NaiveDate, OccurrenceException>;

/// Identifies one occurrence of a series: `(event id, original date)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OccurrenceKey {
    pub event_id: String,
    pub date: NaiveDate,
}

/// A concrete instance of a master event on one date.
///
/// Occurrences are produced by the expander and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    /// Id of the master event.
    pub event_id: String,
    /// Date the rule generated; the exception key.
    pub original_date: NaiveDate,
    /// Resolved date.
    pub date: NaiveDate,
    /// Resolved last day (differs from `date` for multi-day events).
    pub end_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub all_day: bool,
    pub title: String,
    pub location: Option<String>,
    pub payload: EventPayload,
    /// Whether the master belongs to a recurring series.
    pub is_recurring: bool,
    /// Whether a `Modified` exception was applied.
    pub is_modified: bool,
}

impl Occurrence {
    /// Instantiates the master's fields on `date`.
    pub fn from_master(event: &Event, date: NaiveDate) -> Self {
        let end_date = date
            .checked_add_days(Days::new(event.span_days()))
            .unwrap_or(date);
        Self {
            event_id: event.id.clone(),
            original_date: date,
            date,
            end_date,
            start_time: event.start_time,
            end_time: event.end_time,
            all_day: event.all_day,
            title: event.title.clone(),
            location: event.location.clone(),
            payload: event.payload.clone(),
            is_recurring: event.is_recurring(),
            is_modified: false,
        }
    }

    /// Applies overrides and marks the occurrence as modified.
    pub fn apply_overrides(&mut self, overrides: &FieldOverrides) {
        overrides.write_into(OverridableFields {
            title: &mut self.title,
            start_time: &mut self.start_time,
            end_time: &mut self.end_time,
            location: &mut self.location,
            all_day: &mut self.all_day,
            payload: &mut self.payload,
        });
        self.is_modified = true;
    }

    pub fn key(&self) -> OccurrenceKey {
        OccurrenceKey {
            event_id: self.event_id.clone(),
            date: self.original_date,
        }
    }

    /// Returns true if the occurrence has a start time and is not all-day.
    pub fn is_timed(&self) -> bool {
        !self.all_day && self.start_time.is_some()
    }

    /// Ordering key: date, then start time with all-day/untimed first.
    pub fn sort_key(&self) -> (NaiveDate, Option<NaiveTime>) {
        let time = if self.is_timed() { self.start_time } else { None };
        (self.date, time)
    }

    /// Returns true if the occurrence covers `day` (multi-day aware).
    pub fn is_on(&self, day: NaiveDate) -> bool {
        self.date <= day && day <= self.end_date
    }

    /// Minute span within the first day's column, or `None` if untimed.
    ///
    /// An end on a later day is clipped to midnight.
    pub fn span(&self, default_duration_minutes: u32) -> Option<TimeSpan> {
        if !self.is_timed() {
            return None;
        }
        let start = self.start_time?;
        let span = TimeSpan::from_times(start, self.end_time, default_duration_minutes);
        if self.end_date > self.date && self.end_time.is_some() {
            return Some(TimeSpan::new(span.start, crate::time::MINUTES_PER_DAY));
        }
        Some(span)
    }

    /// Duration in minutes when both times are known and on the same day.
    pub fn duration_minutes(&self) -> Option<i64> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) if self.is_timed() => {
                let days = (self.end_date - self.date).num_days();
                Some((end - start).num_minutes() + days * 24 * 60)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn standup() -> Event {
        Event::new("evt-1", "Standup", date(2024, 1, 1))
            .with_times(time(9, 0), Some(time(9, 15)))
            .with_location("Room 4")
    }

    mod event {
        use super::*;

        #[test]
        fn apply_overrides() {
            let mut event = standup();
            event.apply(&FieldOverrides::new().with_title("Daily sync"));

            assert_eq!(event.title, "Daily sync");
            assert_eq!(event.location.as_deref(), Some("Room 4"));
            assert_eq!(event.start_time, Some(time(9, 0)));
        }

        #[test]
        fn anchor_date() {
            let weekly = standup().with_recurrence(RecurrenceRule::weekly(1, []).unwrap());
            assert_eq!(weekly.anchor_date(), date(2024, 1, 1));

            let continued = weekly.clone().with_series_anchor(date(2023, 10, 2));
            assert_eq!(continued.anchor_date(), date(2023, 10, 2));

            let later = weekly.with_series_anchor(date(2024, 6, 3));
            assert_eq!(later.anchor_date(), date(2024, 1, 1));

            let one_off = standup().with_series_anchor(date(2023, 10, 2));
            assert_eq!(one_off.anchor_date(), date(2024, 1, 1));
        }

        #[test]
        fn anchor_is_omitted_from_json_when_unset() {
            let json = serde_json::to_value(standup()).unwrap();
            assert!(json.get("series_anchor").is_none());

            let anchored = standup().with_series_anchor(date(2023, 12, 31));
            let json = serde_json::to_value(&anchored).unwrap();
            assert_eq!(json["series_anchor"], serde_json::json!("2023-12-31"));
        }

        #[test]
        fn all_day_clears_times() {
            let event = standup().with_all_day();
            assert!(event.all_day);
            assert!(!event.is_timed());
            assert_eq!(event.start_time, None);
        }

        #[test]
        fn span_days() {
            let event =
                Event::new("trip", "Trip", date(2024, 2, 27)).with_end_date(date(2024, 3, 1));
            assert_eq!(event.span_days(), 3);
            assert_eq!(standup().span_days(), 0);
        }

        #[test]
        fn payload_keeps_unknown_keys() {
            let json = r#"{
                "id": "e",
                "title": "Gym",
                "start_date": "2024-01-01",
                "end_date": "2024-01-01",
                "payload": {"color": "green", "reminders": [10], "priority": 3}
            }"#;
            let event: Event = serde_json::from_str(json).unwrap();
            assert_eq!(event.payload.color.as_deref(), Some("green"));
            assert_eq!(event.payload.reminders, vec![10]);
            assert_eq!(event.payload.extra["priority"], serde_json::json!(3));
            assert!(!event.is_recurring());

            let back = serde_json::to_value(&event).unwrap();
            assert_eq!(back["payload"]["priority"], serde_json::json!(3));
        }
    }

    mod overrides {
        use super::*;

        #[test]
        fn merge_prefers_newer_fields() {
            let mut base = FieldOverrides::new()
                .with_title("A")
                .with_location("Lobby");
            base.merge(&FieldOverrides::new().with_title("B"));

            assert_eq!(base.title.as_deref(), Some("B"));
            assert_eq!(base.location.as_deref(), Some("Lobby"));
        }

        #[test]
        fn merge_is_idempotent() {
            let edit = FieldOverrides::new().with_title("B").with_all_day(true);
            let mut once = FieldOverrides::new();
            once.merge(&edit);
            let mut twice = once.clone();
            twice.merge(&edit);
            assert_eq!(once, twice);
        }

        #[test]
        fn empty() {
            assert!(FieldOverrides::new().is_empty());
            assert!(!FieldOverrides::new().with_all_day(false).is_empty());
        }

        #[test]
        fn exception_serde() {
            let deleted = serde_json::to_value(OccurrenceException::Deleted).unwrap();
            assert_eq!(deleted, serde_json::json!({"kind": "deleted"}));

            let modified =
                OccurrenceException::Modified(FieldOverrides::new().with_title("Moved"));
            let json = serde_json::to_value(&modified).unwrap();
            assert_eq!(
                json,
                serde_json::json!({"kind": "modified", "overrides": {"title": "Moved"}})
            );
            let back: OccurrenceException = serde_json::from_value(json).unwrap();
            assert_eq!(back, modified);
        }
    }

    mod occurrence {
        use super::*;

        #[test]
        fn from_master_copies_fields() {
            let occ = Occurrence::from_master(&standup(), date(2024, 1, 8));
            assert_eq!(occ.event_id, "evt-1");
            assert_eq!(occ.date, date(2024, 1, 8));
            assert_eq!(occ.original_date, date(2024, 1, 8));
            assert_eq!(occ.end_date, date(2024, 1, 8));
            assert!(!occ.is_modified);
            assert_eq!(occ.duration_minutes(), Some(15));
        }

        #[test]
        fn multi_day_keeps_span() {
            let trip = Event::new("trip", "Trip", date(2024, 1, 1))
                .with_end_date(date(2024, 1, 3))
                .with_all_day();
            let occ = Occurrence::from_master(&trip, date(2024, 2, 28));
            assert_eq!(occ.end_date, date(2024, 3, 1));
            assert!(occ.is_on(date(2024, 2, 29)));
            assert!(!occ.is_on(date(2024, 3, 2)));
        }

        #[test]
        fn overrides_mark_modified() {
            let mut occ = Occurrence::from_master(&standup(), date(2024, 1, 8));
            occ.apply_overrides(&FieldOverrides::new().with_times(time(10, 0), Some(time(10, 30))));
            assert!(occ.is_modified);
            assert_eq!(occ.start_time, Some(time(10, 0)));
            assert_eq!(occ.title, "Standup");
        }

        #[test]
        fn overrides_match_master_edit() {
            let fields = FieldOverrides::new()
                .with_title("Sync")
                .with_location("Room 9")
                .with_times(time(11, 0), Some(time(11, 45)))
                .with_payload(EventPayload {
                    color: Some("red".to_string()),
                    ..EventPayload::default()
                });

            let mut occ = Occurrence::from_master(&standup(), date(2024, 1, 8));
            occ.apply_overrides(&fields);
            let mut master = standup();
            master.apply(&fields);
            let mut expected = Occurrence::from_master(&master, date(2024, 1, 8));
            expected.is_modified = true;

            assert_eq!(occ, expected);
        }

        #[test]
        fn sort_key_puts_all_day_first() {
            let timed = Occurrence::from_master(&standup(), date(2024, 1, 1));
            let all_day = Occurrence::from_master(&standup().with_all_day(), date(2024, 1, 1));
            assert!(all_day.sort_key() < timed.sort_key());
        }

        #[test]
        fn span_clips_overnight_end() {
            let late = Event::new("late", "Deploy", date(2024, 1, 1))
                .with_end_date(date(2024, 1, 2))
                .with_times(time(22, 0), Some(time(2, 0)));
            let occ = Occurrence::from_master(&late, date(2024, 1, 1));
            assert_eq!(occ.span(60), Some(TimeSpan::new(22 * 60, 24 * 60)));
            assert_eq!(occ.duration_minutes(), Some(240));

            let bare = Event::new("u", "U", date(2024, 1, 1));
            let untimed = Occurrence::from_master(&bare, date(2024, 1, 1));
            assert_eq!(untimed.span(60), None);
        }
    }
}
