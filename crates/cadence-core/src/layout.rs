//! Column layout for concurrent timed occurrences.
//!
//! [`TemporalLayoutResolver`] assigns every timed occurrence of a day a
//! column index and a column count. Two occurrences overlap when
//! `a.start < b.end && a.end > b.start`, so back-to-back occurrences share
//! a column.
//!
//! The assignment is greedy and order-dependent:
//! - `column_count` is the number of occurrences in the whole list that
//!   intersect this one, itself included;
//! - `column_index` is the number of earlier occurrences that intersect it.
//!
//! This is not a minimal colouring and is O(n²) per day, which is fine for a
//! day column.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::event::Occurrence;
use crate::time::{DateRange, TimeSpan};

/// Duration assumed for an occurrence without a usable end time.
pub const DEFAULT_DURATION_MINUTES: u32 = 60;

/// The horizontal slot of one occurrence in a day column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnSlot {
    /// Zero-based column position.
    pub column_index: usize,
    /// Number of columns the day column is split into for this occurrence.
    pub column_count: usize,
}

impl ColumnSlot {
    /// Left edge as a fraction of the column width.
    pub fn left_fraction(&self) -> f64 {
        self.column_index as f64 / self.column_count.max(1) as f64
    }

    /// Width as a fraction of the column width.
    pub fn width_fraction(&self) -> f64 {
        1.0 / self.column_count.max(1) as f64
    }
}

/// A timed occurrence with its span and slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedOccurrence<'a> {
    pub occurrence: &'a Occurrence,
    pub span: TimeSpan,
    pub slot: ColumnSlot,
}

/// Assigns columns to overlapping occurrences.
#[derive(Debug, Clone, Copy)]
pub struct TemporalLayoutResolver {
    default_duration_minutes: u32,
}

impl Default for TemporalLayoutResolver {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION_MINUTES)
    }
}

impl TemporalLayoutResolver {
    pub fn new(default_duration_minutes: u32) -> Self {
        Self {
            default_duration_minutes,
        }
    }

    pub fn default_duration_minutes(&self) -> u32 {
        self.default_duration_minutes
    }

    /// The minute span of an occurrence, or `None` when it is all-day or untimed.
    pub fn span_of(&self, occurrence: &Occurrence) -> Option<TimeSpan> {
        occurrence.span(self.default_duration_minutes)
    }

    /// Slots for raw spans, in input order.
    pub fn layout_spans(&self, spans: &[TimeSpan]) -> Vec<ColumnSlot> {
        spans
            .iter()
            .enumerate()
            .map(|(position, span)| {
                // An empty span does not overlap itself but still takes a column.
                let column_count = spans
                    .iter()
                    .enumerate()
                    .filter(|(other_position, other)| {
                        *other_position == position || span.overlaps(other)
                    })
                    .count();
                let column_index = spans[..position]
                    .iter()
                    .filter(|earlier| span.overlaps(earlier))
                    .count();
                ColumnSlot {
                    column_index,
                    column_count,
                }
            })
            .collect()
    }

    /// Places every timed occurrence; all-day and untimed ones are skipped.
    pub fn layout<'a, I>(&self, occurrences: I) -> Vec<PlacedOccurrence<'a>>
    where
        I: IntoIterator<Item = &'a Occurrence>,
    {
        let timed: Vec<(&Occurrence, TimeSpan)> = occurrences
            .into_iter()
            .filter_map(|occ| self.span_of(occ).map(|span| (occ, span)))
            .collect();
        let spans: Vec<TimeSpan> = timed.iter().map(|(_, span)| *span).collect();
        let slots = self.layout_spans(&spans);

        debug!(count = timed.len(), "laid out timed occurrences");
        timed
            .into_iter()
            .zip(slots)
            .map(|((occurrence, span), slot)| PlacedOccurrence {
                occurrence,
                span,
                slot,
            })
            .collect()
    }
}

/// One day split into an all-day banner and placed timed occurrences.
#[derive(Debug, Clone, PartialEq)]
pub struct DayLayout<'a> {
    pub date: NaiveDate,
    /// All-day or untimed occurrences covering the day.
    pub all_day: Vec<&'a Occurrence>,
    /// Timed occurrences starting on the day.
    pub timed: Vec<PlacedOccurrence<'a>>,
}

impl<'a> DayLayout<'a> {
    /// Builds the layout of `date` from an ordered occurrence list.
    pub fn build(
        resolver: &TemporalLayoutResolver,
        date: NaiveDate,
        occurrences: &'a [Occurrence],
    ) -> Self {
        let all_day = occurrences
            .iter()
            .filter(|occ| !occ.is_timed() && occ.is_on(date))
            .collect();
        let timed = resolver.layout(
            occurrences
                .iter()
                .filter(|occ| occ.is_timed() && occ.date == date),
        );
        Self {
            date,
            all_day,
            timed,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.all_day.is_empty() && self.timed.is_empty()
    }
}

/// Groups occurrences by every day they cover.
///
/// Multi-day occurrences appear under each of their days. With a `range`,
/// days outside it are dropped. Order within a day follows the input.
pub fn group_by_day<'a>(
    occurrences: &'a [Occurrence],
    range: Option<&DateRange>,
) -> BTreeMap<NaiveDate, Vec<&'a Occurrence>> {
    let mut days: BTreeMap<NaiveDate, Vec<&'a Occurrence>> = BTreeMap::new();
    for occ in occurrences {
        for day in occ.date.iter_days().take_while(|d| *d <= occ.end_date) {
            if range.is_some_and(|r| !r.contains(day)) {
                continue;
            }
            days.entry(day).or_default().push(occ);
        }
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use chrono::NaiveTime;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn slot(column_index: usize, column_count: usize) -> ColumnSlot {
        ColumnSlot {
            column_index,
            column_count,
        }
    }

    fn timed(id: &str, start: NaiveTime, end: Option<NaiveTime>) -> Occurrence {
        let event = Event::new(id, id, date(2024, 1, 1)).with_times(start, end);
        Occurrence::from_master(&event, date(2024, 1, 1))
    }

    mod spans {
        use super::*;

        #[test]
        fn two_overlapping_and_one_free() {
            let spans = [TimeSpan::new(0, 60), TimeSpan::new(30, 90), TimeSpan::new(100, 120)];
            let slots = TemporalLayoutResolver::default().layout_spans(&spans);
            assert_eq!(slots, vec![slot(0, 2), slot(1, 2), slot(0, 1)]);
        }

        #[test]
        fn back_to_back_do_not_overlap() {
            let spans = [TimeSpan::new(0, 60), TimeSpan::new(60, 120)];
            let slots = TemporalLayoutResolver::default().layout_spans(&spans);
            assert_eq!(slots, vec![slot(0, 1), slot(0, 1)]);
        }

        #[test]
        fn greedy_counts_whole_list() {
            // B overlaps A and C, but A and C are disjoint.
            let spans = [TimeSpan::new(0, 60), TimeSpan::new(30, 120), TimeSpan::new(90, 150)];
            let slots = TemporalLayoutResolver::default().layout_spans(&spans);
            assert_eq!(slots, vec![slot(0, 2), slot(1, 3), slot(1, 2)]);
        }

        #[test]
        fn empty_span_keeps_a_column() {
            let spans = [TimeSpan::new(30, 30), TimeSpan::new(60, 90)];
            let slots = TemporalLayoutResolver::default().layout_spans(&spans);
            assert_eq!(slots, vec![slot(0, 1), slot(0, 1)]);
        }

        #[test]
        fn empty_input() {
            assert!(TemporalLayoutResolver::default().layout_spans(&[]).is_empty());
        }

        #[test]
        fn fractions() {
            let s = slot(1, 4);
            assert!((s.left_fraction() - 0.25).abs() < f64::EPSILON);
            assert!((s.width_fraction() - 0.25).abs() < f64::EPSILON);
        }
    }

    mod occurrences {
        use super::*;

        #[test]
        fn missing_end_uses_default_duration() {
            let a = timed("a", time(9, 0), None);
            let b = timed("b", time(9, 45), Some(time(10, 0)));
            let list = [a, b];

            let placed = TemporalLayoutResolver::new(60).layout(&list);
            assert_eq!(placed[0].span, TimeSpan::new(540, 600));
            assert_eq!(placed[0].slot, slot(0, 2));

            let placed = TemporalLayoutResolver::new(30).layout(&list);
            assert_eq!(placed[0].slot, slot(0, 1));
        }

        #[test]
        fn extreme_default_durations() {
            let list = [timed("a", time(9, 0), None), timed("b", time(20, 0), Some(time(21, 0)))];

            let placed = TemporalLayoutResolver::new(u32::MAX).layout(&list);
            assert_eq!(placed[0].span, TimeSpan::new(540, 24 * 60));
            assert_eq!(placed[0].slot, slot(0, 2));
            assert_eq!(placed[1].slot, slot(1, 2));

            let placed = TemporalLayoutResolver::new(0).layout(&list);
            assert_eq!(placed[0].slot, slot(0, 1));
            assert_eq!(placed[1].slot, slot(0, 1));
        }

        #[test]
        fn all_day_is_excluded() {
            let mut holiday = timed("h", time(0, 0), None);
            holiday.all_day = true;
            let list = [holiday, timed("a", time(9, 0), Some(time(10, 0)))];

            let placed = TemporalLayoutResolver::default().layout(&list);
            assert_eq!(placed.len(), 1);
            assert_eq!(placed[0].occurrence.event_id, "a");
        }
    }

    mod days {
        use super::*;

        #[test]
        fn day_layout_splits_banner_and_timed() {
            let trip = Event::new("trip", "Trip", date(2023, 12, 31))
                .with_end_date(date(2024, 1, 2))
                .with_all_day();
            let list = vec![
                Occurrence::from_master(&trip, date(2023, 12, 31)),
                timed("a", time(9, 0), Some(time(10, 0))),
                timed("b", time(9, 30), Some(time(10, 30))),
            ];

            let day = DayLayout::build(&TemporalLayoutResolver::default(), date(2024, 1, 1), &list);
            assert_eq!(day.all_day.len(), 1);
            assert_eq!(day.all_day[0].event_id, "trip");
            let slots: Vec<_> = day.timed.iter().map(|p| p.slot).collect();
            assert_eq!(slots, vec![slot(0, 2), slot(1, 2)]);

            let other =
                DayLayout::build(&TemporalLayoutResolver::default(), date(2024, 1, 5), &list);
            assert!(other.is_empty());
        }

        #[test]
        fn group_by_day_spreads_multi_day() {
            let trip = Event::new("trip", "Trip", date(2024, 1, 1))
                .with_end_date(date(2024, 1, 3))
                .with_all_day();
            let list = vec![
                Occurrence::from_master(&trip, date(2024, 1, 1)),
                timed("a", time(9, 0), None),
            ];

            let all = group_by_day(&list, None);
            assert_eq!(all.len(), 3);
            assert_eq!(all[&date(2024, 1, 1)].len(), 2);
            assert_eq!(all[&date(2024, 1, 3)].len(), 1);

            let range = DateRange::new(date(2024, 1, 2), date(2024, 1, 31));
            let clipped = group_by_day(&list, Some(&range));
            assert_eq!(
                clipped.keys().copied().collect::<Vec<_>>(),
                vec![date(2024, 1, 2), date(2024, 1, 3)]
            );
        }
    }
}
