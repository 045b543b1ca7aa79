//! Add command.

use cadence_core::{EndCondition, Event, EventPayload, RecurrenceRule, recurrence_summary};
use cadence_store::{EventStore, Transactional, new_event_id};
use tracing::info;

use crate::cli::{AddArgs, Repeat};
use crate::error::{ClientError, ClientResult};

/// Builds the recurrence rule described by the repeat options.
pub fn recurrence_rule(args: &AddArgs) -> ClientResult<RecurrenceRule> {
    let end = EndCondition::from_parts(args.until, args.count)?;
    let weekdays = args.weekdays.iter().copied();

    if args.unit.is_some() && args.repeat != Repeat::Custom {
        return Err(ClientError::Usage("--unit only applies to --repeat custom".into()));
    }

    let rule = match args.repeat {
        Repeat::None => {
            if end != EndCondition::Never || !args.weekdays.is_empty() {
                return Err(ClientError::Usage("repeat options need --repeat".into()));
            }
            return Ok(RecurrenceRule::None);
        }
        Repeat::Weekly => RecurrenceRule::weekly(args.interval, weekdays)?,
        Repeat::Custom => {
            let unit = args
                .unit
                .ok_or_else(|| ClientError::Usage("--repeat custom needs --unit".into()))?;
            return Ok(RecurrenceRule::custom(args.interval, unit.into(), weekdays, end)?);
        }
        _ if !args.weekdays.is_empty() => {
            return Err(ClientError::Usage(
                "--weekdays only applies to weekly or custom repeats".into(),
            ));
        }
        Repeat::Daily => RecurrenceRule::daily(args.interval)?,
        Repeat::Monthly => RecurrenceRule::monthly(args.interval)?,
        Repeat::Yearly => RecurrenceRule::yearly(args.interval)?,
    };
    Ok(rule.with_end(end))
}

/// Builds the master event described by `args`.
pub fn build_event(args: &AddArgs, id: String) -> ClientResult<Event> {
    let title = args.title.trim();
    if title.is_empty() {
        return Err(ClientError::Usage("title must not be empty".into()));
    }

    let mut event = Event::new(id, title, args.start_date);
    if let Some(end_date) = args.end_date {
        if end_date < args.start_date {
            return Err(ClientError::Usage(format!(
                "--end-date {} is before --start-date {}",
                end_date, args.start_date
            )));
        }
        event = event.with_end_date(end_date);
    }

    if args.all_day {
        event = event.with_all_day();
    } else if let Some(start) = args.start_time {
        event = event.with_times(start, args.end_time);
    } else if args.end_time.is_some() {
        return Err(ClientError::Usage("--end-time needs --start-time".into()));
    }

    if let Some(location) = &args.location {
        event = event.with_location(location.clone());
    }
    if args.notes.is_some() || args.category.is_some() || !args.reminders.is_empty() {
        event = event.with_payload(EventPayload {
            category: args.category.clone(),
            notes: args.notes.clone(),
            reminders: args.reminders.clone(),
            ..Default::default()
        });
    }

    Ok(event.with_recurrence(recurrence_rule(args)?))
}

/// Stores a new event and returns it.
pub fn add<T: Transactional>(store: &mut T, args: &AddArgs) -> ClientResult<Event> {
    let id = args.id.clone().unwrap_or_else(new_event_id);
    let event = build_event(args, id)?;

    store.transact(|s| {
        if s.get_event(&event.id)?.is_some() {
            return Err(ClientError::Usage(format!("event {} already exists", event.id)));
        }
        s.put_event(event.clone())?;
        Ok(())
    })?;

    info!(event_id = %event.id, recurring = event.is_recurring(), "added event");
    Ok(event)
}

/// Runs `cadence add` and returns the confirmation line.
pub fn run<T: Transactional>(store: &mut T, args: &AddArgs) -> ClientResult<String> {
    let event = add(store, args)?;
    Ok(format!("{}  {}", event.id, recurrence_summary(&event)))
}
