//! Edit and delete commands.

use cadence_core::{ExpandOptions, FieldOverrides};
use cadence_store::{EditOutcome, OccurrenceExceptionResolver, Transactional};
use chrono::NaiveDate;

use crate::cli::{DeleteArgs, EditArgs, Scope};
use crate::error::{ClientError, ClientResult};

/// The occurrence date an operation targets; only the whole-series scope
/// can do without one.
fn target_date(scope: Scope, date: Option<NaiveDate>) -> ClientResult<NaiveDate> {
    match (scope, date) {
        (_, Some(date)) => Ok(date),
        (Scope::All, None) => Ok(NaiveDate::MIN),
        (_, None) => Err(ClientError::Usage("--date is required unless --scope all".into())),
    }
}

/// Field overrides requested by `args`.
pub fn overrides(args: &EditArgs) -> FieldOverrides {
    FieldOverrides {
        title: args.title.clone(),
        start_time: args.start_time,
        end_time: args.end_time,
        location: args.location.clone(),
        all_day: args.all_day,
        payload: None,
    }
}

/// Runs `cadence edit`.
pub fn edit<T: Transactional>(
    store: &mut T,
    options: ExpandOptions,
    args: &EditArgs,
) -> ClientResult<String> {
    let fields = overrides(args);
    if fields.is_empty() {
        return Err(ClientError::Usage("nothing to change".into()));
    }
    let date = target_date(args.scope, args.date)?;

    let resolver = OccurrenceExceptionResolver::new(options);
    let message = match resolver.edit(store, &args.event, date, args.scope.into(), &fields)? {
        EditOutcome::Exception { event_id, date } => format!("Edited {} on {}", event_id, date),
        EditOutcome::Updated(event) => format!("Updated {}", event.id),
        EditOutcome::Split(split) => {
            let mut message = format!(
                "Split {}: {} continues from {}",
                args.event, split.continuation.id, split.continuation.start_date
            );
            if split.truncated.is_none() {
                message.push_str(&format!(" ({} replaced)", args.event));
            }
            message
        }
    };
    Ok(message)
}

/// Runs `cadence delete`.
pub fn delete<T: Transactional>(
    store: &mut T,
    options: ExpandOptions,
    args: &DeleteArgs,
) -> ClientResult<String> {
    let date = target_date(args.scope, args.date)?;
    let resolver = OccurrenceExceptionResolver::new(options);
    resolver.delete(store, &args.event, date, args.scope.into())?;

    Ok(match args.scope {
        Scope::Single => format!("Deleted {} on {}", args.event, date),
        Scope::Future => format!("Deleted {} from {}", args.event, date),
        Scope::All => format!("Deleted {}", args.event),
    })
}
