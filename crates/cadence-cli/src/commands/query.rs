//! Read-only commands: expand, layout and show.

use cadence_core::format::reminder_label;
use cadence_core::{
    DateRange, DayLayout, Event, Occurrence, OccurrenceException, OccurrenceFormatter,
    RecurrenceExpander, duration_label, recurrence_summary, time_range_label,
};
use cadence_store::{EventStore, ResolverError};
use chrono::{Days, NaiveDate};
use tracing::debug;

use crate::cli::{ExpandArgs, FilterArgs, LayoutArgs, ShowArgs};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Text printed when nothing matches.
const NO_EVENTS: &str = "No events";

/// Expands one event, or every event in the store, over `range`.
pub fn occurrences<S: EventStore>(
    store: &S,
    expander: &RecurrenceExpander,
    range: &DateRange,
    event_id: Option<&str>,
) -> ClientResult<Vec<Occurrence>> {
    let events = match event_id {
        Some(id) => vec![
            store
                .get_event(id)?
                .ok_or_else(|| ResolverError::event_not_found(id))?,
        ],
        None => store.list_events()?,
    };
    let occurrences = expander.expand_all(&events, range, |event| store.get_exceptions(&event.id))?;
    debug!(
        events = events.len(),
        occurrences = occurrences.len(),
        start = %range.start,
        end = %range.end,
        "expanded catalog"
    );
    Ok(occurrences)
}

/// Runs `cadence expand`.
pub fn expand<S: EventStore>(
    store: &S,
    config: &ClientConfig,
    args: &ExpandArgs,
    today: NaiveDate,
) -> ClientResult<String> {
    let from = args.from.unwrap_or(today);
    let to = args
        .to
        .unwrap_or_else(|| from.checked_add_days(Days::new(6)).unwrap_or(from));
    let range = DateRange::checked(from, to)
        .ok_or_else(|| ClientError::Usage(format!("--to {} is before --from {}", to, from)))?;

    let mut filter = config.filter(&args.filters)?;
    if let Some(query) = &args.search {
        filter = filter.with_query(query.clone());
    }

    let expander = RecurrenceExpander::new(config.expand_options());
    let found = filter.apply(occurrences(store, &expander, &range, args.event.as_deref())?);
    let formatter = OccurrenceFormatter::new(config.format_options());

    if args.json {
        return Ok(serde_json::to_string_pretty(&formatter.format_json(&found))?);
    }
    if found.is_empty() {
        return Ok(NO_EVENTS.to_string());
    }
    Ok(formatter.format_tty(&found).join("\n"))
}

/// Runs `cadence layout`.
pub fn layout<S: EventStore>(
    store: &S,
    config: &ClientConfig,
    args: &LayoutArgs,
    today: NaiveDate,
) -> ClientResult<String> {
    let date = args.date.unwrap_or(today);

    // Multi-day occurrences that started earlier still cover `date`.
    let events = store.list_events()?;
    let lookback = events.iter().map(Event::span_days).max().unwrap_or(0);
    let first = date.checked_sub_days(Days::new(lookback)).unwrap_or(date);
    let range = DateRange::new(first, date);

    let expander = RecurrenceExpander::new(config.expand_options());
    let filter = config.filter(&FilterArgs::default())?.with_limit(None);
    let expanded = expander.expand_all(&events, &range, |event| store.get_exceptions(&event.id))?;
    let found = filter.apply(expanded);

    let resolver = config.layout_resolver();
    let day = DayLayout::build(&resolver, date, &found);
    let formatter = OccurrenceFormatter::new(config.format_options());

    if args.json {
        return Ok(serde_json::to_string_pretty(&formatter.format_day_json(&day))?);
    }
    Ok(formatter.format_day_tty(&day).join("\n"))
}

/// Runs `cadence show`.
pub fn show<S: EventStore>(
    store: &S,
    config: &ClientConfig,
    args: &ShowArgs,
    today: NaiveDate,
) -> ClientResult<String> {
    let event = store
        .get_event(&args.event)?
        .ok_or_else(|| ResolverError::event_not_found(&args.event))?;
    let exceptions = store.get_exceptions(&event.id)?;
    let options = config.format_options();
    let first = Occurrence::from_master(&event, event.start_date);

    let mut lines = vec![
        format!("{} ({})", event.title, event.id),
        format!("  {}", recurrence_summary(&event)),
        format!("  Starts: {}", event.start_date.format("%a %Y-%m-%d")),
        format!("  Time: {}", time_range_label(&first, &options)),
    ];
    if let Some(minutes) = first.duration_minutes().filter(|m| *m > 0) {
        lines.push(format!("  Duration: {}", duration_label(minutes)));
    }
    if let Some(location) = &event.location {
        lines.push(format!("  Location: {}", location));
    }
    if let Some(notes) = &event.payload.notes {
        lines.push(format!("  Notes: {}", notes));
    }
    if !event.payload.reminders.is_empty() {
        let reminders: Vec<String> = event
            .payload
            .reminders
            .iter()
            .map(|m| reminder_label(*m))
            .collect();
        lines.push(format!("  Reminders: {}", reminders.join(", ")));
    }
    if !exceptions.is_empty() {
        let deleted = exceptions
            .values()
            .filter(|e| matches!(e, OccurrenceException::Deleted))
            .count();
        lines.push(format!(
            "  Exceptions: {} ({} deleted, {} edited)",
            exceptions.len(),
            deleted,
            exceptions.len() - deleted
        ));
    }

    let from = args.from.unwrap_or(today);
    let expander = RecurrenceExpander::new(config.expand_options());
    let upcoming = expander.upcoming(&event, from, args.limit, &exceptions);
    lines.push(format!("  Next from {}:", from));
    if upcoming.is_empty() {
        lines.push("    none".to_string());
    }
    let formatter = OccurrenceFormatter::new(options);
    lines.extend(formatter.format_tty(&upcoming).into_iter().map(|line| format!("    {}", line)));

    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Command;
    use crate::commands::testing::command;
    use cadence_core::{FieldOverrides, RecurrenceRule};
    use cadence_store::{MemoryStore, OccurrenceExceptionResolver};
    use chrono::NaiveTime;
    use insta::assert_snapshot;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    /// A week of 2024-01-01 with a daily standup, a weekly review and an offsite.
    fn calendar() -> MemoryStore {
        let mut store = MemoryStore::with_events([
            Event::new("standup", "Standup", date(2024, 1, 1))
                .with_times(time(9, 0), Some(time(9, 15)))
                .with_recurrence(RecurrenceRule::daily(1).unwrap()),
            Event::new("review", "Review", date(2024, 1, 1))
                .with_times(time(9, 0), Some(time(10, 0)))
                .with_location("Room 2")
                .with_recurrence(RecurrenceRule::weekly(1, []).unwrap()),
            Event::new("offsite", "Offsite", date(2023, 12, 31))
                .with_all_day()
                .with_end_date(date(2024, 1, 2)),
        ]);
        let resolver = OccurrenceExceptionResolver::default();
        resolver.delete_single(&mut store, "standup", date(2024, 1, 2)).unwrap();
        resolver
            .edit_single(
                &mut store,
                "standup",
                date(2024, 1, 3),
                &FieldOverrides::new().with_times(time(9, 30), Some(time(9, 45))),
            )
            .unwrap();
        store
    }

    fn expand_args(args: &[&str]) -> ExpandArgs {
        let mut line = vec!["expand"];
        line.extend_from_slice(args);
        match command(&line) {
            Command::Expand(args) => args,
            other => panic!("expected expand, got {other:?}"),
        }
    }

    mod expanding {
        use super::*;

        #[test]
        fn week_listing() {
            let out = expand(
                &calendar(),
                &ClientConfig::default(),
                &expand_args(&["--to", "2024-01-04"]),
                date(2024, 1, 1),
            )
            .unwrap();
            assert_snapshot!(out, @r"
            Mon 2024-01-01  09:00 – 10:00  Review @ Room 2
            Mon 2024-01-01  09:00 – 09:15  Standup
            Wed 2024-01-03  09:30 – 09:45  Standup (edited)
            Thu 2024-01-04  09:00 – 09:15  Standup
            ");
        }

        #[test]
        fn single_event_with_limit() {
            let out = expand(
                &calendar(),
                &ClientConfig::default(),
                &expand_args(&[
                    "--event",
                    "review",
                    "--from",
                    "2024-01-01",
                    "--to",
                    "2024-01-31",
                    "--limit",
                    "2",
                ]),
                date(2024, 1, 1),
            )
            .unwrap();
            assert_eq!(out.lines().count(), 2);
            assert!(out.lines().all(|l| l.contains("Review")));
        }

        #[test]
        fn search_and_exclude() {
            let store = calendar();
            let config = ClientConfig::default();
            let today = date(2024, 1, 1);

            let out = expand(&store, &config, &expand_args(&["--search", "room"]), today).unwrap();
            assert!(out.lines().all(|l| l.contains("Review")));

            let args = expand_args(&["--exclude-title", "^(standup|review)$"]);
            let out = expand(&store, &config, &args, today).unwrap();
            assert_eq!(out, NO_EVENTS);
        }

        #[test]
        fn category_filter() {
            let mut store = calendar();
            let mut review = store.get_event("review").unwrap().unwrap();
            review.payload.category = Some("work".to_string());
            store.put_event(review).unwrap();

            let out = expand(
                &store,
                &ClientConfig::default(),
                &expand_args(&["--to", "2024-01-14", "--category", "work"]),
                date(2024, 1, 1),
            )
            .unwrap();
            assert_snapshot!(out, @r"
            Mon 2024-01-01  09:00 – 10:00  Review @ Room 2
            Mon 2024-01-08  09:00 – 10:00  Review @ Room 2
            ");

            let mut config = ClientConfig::default();
            config.filters.categories = vec!["travel".to_string()];
            let args = expand_args(&["--category", "work"]);
            let out = expand(&store, &config, &args, date(2024, 1, 1)).unwrap();
            assert!(out.contains("Review"));
        }

        #[test]
        fn json_output() {
            let out = expand(
                &calendar(),
                &ClientConfig::default(),
                &expand_args(&["--from", "2024-01-03", "--to", "2024-01-03", "--json"]),
                date(2024, 1, 1),
            )
            .unwrap();
            let value: serde_json::Value = serde_json::from_str(&out).unwrap();
            assert_eq!(value["count"], 1);
            assert_eq!(value["occurrences"][0]["is_modified"], true);
            assert_eq!(value["occurrences"][0]["start_time"], "09:30");
        }

        #[test]
        fn unknown_event() {
            let err = expand(
                &calendar(),
                &ClientConfig::default(),
                &expand_args(&["--event", "nope"]),
                date(2024, 1, 1),
            )
            .unwrap_err();
            assert_eq!(err.to_string(), "Event not found: nope");
        }

        #[test]
        fn inverted_range() {
            let err = expand(
                &calendar(),
                &ClientConfig::default(),
                &expand_args(&["--from", "2024-02-01", "--to", "2024-01-01"]),
                date(2024, 1, 1),
            )
            .unwrap_err();
            assert!(matches!(err, ClientError::Usage(_)));
        }
    }

    mod day_layout {
        use super::*;

        #[test]
        fn overlapping_meetings_share_columns() {
            let args = LayoutArgs {
                date: Some(date(2024, 1, 1)),
                json: false,
            };
            let out =
                layout(&calendar(), &ClientConfig::default(), &args, date(2024, 1, 1)).unwrap();
            assert_snapshot!(out, @r"
            Monday 2024-01-01
              All day  Offsite
              09:00 – 10:00  [1/2]  Review @ Room 2
              09:00 – 09:15  [2/2]  Standup
            ");
        }

        #[test]
        fn multi_day_event_started_earlier() {
            let args = LayoutArgs {
                date: Some(date(2024, 1, 2)),
                json: true,
            };
            let out =
                layout(&calendar(), &ClientConfig::default(), &args, date(2024, 1, 1)).unwrap();
            let value: serde_json::Value = serde_json::from_str(&out).unwrap();
            assert_eq!(value["all_day"][0]["title"], "Offsite");
            assert_eq!(value["timed"].as_array().unwrap().len(), 0);
        }

        #[test]
        fn empty_day() {
            let args = LayoutArgs {
                date: Some(date(2024, 1, 2)),
                json: false,
            };
            let out = layout(&MemoryStore::new(), &ClientConfig::default(), &args, date(2024, 1, 1))
                .unwrap();
            assert_snapshot!(out, @r"
            Tuesday 2024-01-02
              No events
            ");
        }
    }

    mod showing {
        use super::*;

        #[test]
        fn series_details() {
            let args = ShowArgs {
                event: "standup".to_string(),
                limit: 3,
                from: None,
            };
            let out = show(&calendar(), &ClientConfig::default(), &args, date(2024, 1, 1)).unwrap();
            assert_snapshot!(out, @r"
            Standup (standup)
              Repeats every day
              Starts: Mon 2024-01-01
              Time: 09:00 – 09:15
              Duration: 15 minutes
              Exceptions: 2 (1 deleted, 1 edited)
              Next from 2024-01-01:
                Mon 2024-01-01  09:00 – 09:15  Standup
                Wed 2024-01-03  09:30 – 09:45  Standup (edited)
                Thu 2024-01-04  09:00 – 09:15  Standup
            ");
        }

        #[test]
        fn one_off_without_upcoming() {
            let args = ShowArgs {
                event: "offsite".to_string(),
                limit: 3,
                from: Some(date(2024, 6, 1)),
            };
            let out = show(&calendar(), &ClientConfig::default(), &args, date(2024, 1, 1)).unwrap();
            assert!(out.contains("Does not repeat"));
            assert!(out.contains("Time: All day"));
            assert!(out.ends_with("    none"));
        }
    }
}
