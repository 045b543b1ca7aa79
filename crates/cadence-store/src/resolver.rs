//! Edit and delete scopes for recurring events.
//!
//! [`OccurrenceExceptionResolver`] implements the three scopes a calendar
//! offers when a recurring occurrence is changed:
//! - *this occurrence*: an exception record at `(event id, date)`
//! - *this and future*: the series is cut before the split date and, for an
//!   edit, a continuation series starts at the first occurrence on or after it
//! - *all*: the master itself is rewritten or removed
//!
//! Scoped operations on a one-off event fall back to the *all* scope. Every
//! operation runs as one transaction of the given store.

use std::num::NonZeroU32;

use cadence_core::{
    Event, ExpandOptions, FieldOverrides, OccurrenceException, RecurrenceExpander,
};
use chrono::{Days, NaiveDate};
use tracing::{debug, info};

use crate::error::{ResolverError, ResolverResult};
use crate::store::{EventStore, Transactional, new_event_id};

/// Which occurrences an edit or delete applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditScope {
    /// Only the occurrence on the given date.
    Single,
    /// The occurrence on the given date and every later one.
    Future,
    /// The whole series.
    All,
}

/// The result of a "this and future" edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesSplit {
    /// The original series after truncation; `None` when the split was at
    /// its first occurrence and the master was removed.
    pub truncated: Option<Event>,
    /// The new series starting on or after the split date.
    pub continuation: Event,
    /// Number of exceptions moved to the continuation.
    pub migrated_exceptions: usize,
}

/// What an edit produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// An exception was recorded for one occurrence.
    Exception { event_id: String, date: NaiveDate },
    /// The master event was rewritten in place.
    Updated(Event),
    /// The series was split in two.
    Split(SeriesSplit),
}

/// Where a split date falls in a series.
struct SplitPoint {
    /// Occurrences produced strictly before the split date.
    consumed: u32,
    /// First series date on or after the split date.
    next: Option<NaiveDate>,
}

/// Applies edit and delete scopes to events held in a store.
#[derive(Debug, Clone, Copy, Default)]
pub struct OccurrenceExceptionResolver {
    expander: RecurrenceExpander,
}

impl OccurrenceExceptionResolver {
    pub fn new(options: ExpandOptions) -> Self {
        Self {
            expander: RecurrenceExpander::new(options),
        }
    }

    /// Dispatches an edit by scope. `date` is ignored for [`EditScope::All`].
    pub fn edit<T: Transactional>(
        &self,
        store: &mut T,
        event_id: &str,
        date: NaiveDate,
        scope: EditScope,
        fields: &FieldOverrides,
    ) -> ResolverResult<EditOutcome> {
        match scope {
            EditScope::Single => self.edit_single(store, event_id, date, fields),
            EditScope::Future => self.edit_future(store, event_id, date, fields),
            EditScope::All => self.edit_all(store, event_id, fields).map(EditOutcome::Updated),
        }
    }

    /// Dispatches a delete by scope. `date` is ignored for [`EditScope::All`].
    pub fn delete<T: Transactional>(
        &self,
        store: &mut T,
        event_id: &str,
        date: NaiveDate,
        scope: EditScope,
    ) -> ResolverResult<()> {
        match scope {
            EditScope::Single => self.delete_single(store, event_id, date),
            EditScope::Future => self.delete_future(store, event_id, date),
            EditScope::All => self.delete_all(store, event_id),
        }
    }

    /// Overrides fields of the occurrence on `date`.
    ///
    /// Repeated edits of the same date merge, later fields winning. An edit
    /// of a deleted occurrence brings it back with the new fields.
    pub fn edit_single<T: Transactional>(
        &self,
        store: &mut T,
        event_id: &str,
        date: NaiveDate,
        fields: &FieldOverrides,
    ) -> ResolverResult<EditOutcome> {
        store.transact(|s| {
            let master = require(s, event_id)?;
            if !master.is_recurring() {
                debug!(event_id, "single edit on one-off event, editing master");
                return apply_to_master(s, master, fields).map(EditOutcome::Updated);
            }

            let mut overrides = match s.get_exceptions(event_id)?.remove(&date) {
                Some(OccurrenceException::Modified(existing)) => existing,
                _ => FieldOverrides::default(),
            };
            overrides.merge(fields);
            s.put_exception(event_id, date, OccurrenceException::Modified(overrides))?;

            info!(event_id, %date, "edited single occurrence");
            Ok(EditOutcome::Exception {
                event_id: event_id.to_string(),
                date,
            })
        })
    }

    /// Splits the series at `split` and applies `fields` to the new half.
    pub fn edit_future<T: Transactional>(
        &self,
        store: &mut T,
        event_id: &str,
        split: NaiveDate,
        fields: &FieldOverrides,
    ) -> ResolverResult<EditOutcome> {
        store.transact(|s| {
            let master = require(s, event_id)?;
            if !master.is_recurring() {
                debug!(event_id, "future edit on one-off event, editing master");
                return apply_to_master(s, master, fields).map(EditOutcome::Updated);
            }
            check_split(&master, split)?;

            let point = self.split_point(&master, split);
            let Some(next) = point.next else {
                return Err(ResolverError::series_ended(event_id, split));
            };
            let rule = master.recurrence.clone();
            let Some(continuation_end) = rule.end_condition().remaining_after(point.consumed) else {
                return Err(ResolverError::series_ended(event_id, split));
            };

            let mut continuation = master.clone();
            continuation.id = new_event_id();
            continuation.apply(fields);
            continuation.start_date = next;
            continuation.series_anchor = Some(master.anchor_date());
            continuation.end_date = next
                .checked_add_days(Days::new(master.span_days()))
                .unwrap_or(next);
            continuation.recurrence = rule.clone().with_end(continuation_end);
            continuation.recurrence.validate()?;

            let moved = s.delete_exceptions_from(event_id, split)?;
            let truncated = match NonZeroU32::new(point.consumed) {
                Some(consumed) => {
                    let end = rule.end_condition().truncated(split, consumed);
                    let mut truncated = master;
                    truncated.recurrence = rule.with_end(end);
                    s.put_event(truncated.clone())?;
                    Some(truncated)
                }
                None => {
                    s.delete_event(event_id)?;
                    s.delete_exceptions(event_id)?;
                    None
                }
            };

            s.put_event(continuation.clone())?;
            let migrated_exceptions = moved.len();
            for (date, exception) in moved {
                s.put_exception(&continuation.id, date, exception)?;
            }

            info!(
                event_id,
                %split,
                new_event_id = %continuation.id,
                consumed = point.consumed,
                migrated_exceptions,
                "split series"
            );
            Ok(EditOutcome::Split(SeriesSplit {
                truncated,
                continuation,
                migrated_exceptions,
            }))
        })
    }

    /// Rewrites the master; existing exceptions are kept.
    pub fn edit_all<T: Transactional>(
        &self,
        store: &mut T,
        event_id: &str,
        fields: &FieldOverrides,
    ) -> ResolverResult<Event> {
        store.transact(|s| {
            let master = require(s, event_id)?;
            apply_to_master(s, master, fields)
        })
    }

    /// Cancels the occurrence on `date`.
    pub fn delete_single<T: Transactional>(
        &self,
        store: &mut T,
        event_id: &str,
        date: NaiveDate,
    ) -> ResolverResult<()> {
        store.transact(|s| {
            let master = require(s, event_id)?;
            if !master.is_recurring() {
                return remove_series(s, event_id);
            }
            s.put_exception(event_id, date, OccurrenceException::Deleted)?;
            info!(event_id, %date, "deleted single occurrence");
            Ok(())
        })
    }

    /// Ends the series before `split`, dropping exceptions on or after it.
    pub fn delete_future<T: Transactional>(
        &self,
        store: &mut T,
        event_id: &str,
        split: NaiveDate,
    ) -> ResolverResult<()> {
        store.transact(|s| {
            let master = require(s, event_id)?;
            if !master.is_recurring() {
                return remove_series(s, event_id);
            }
            check_split(&master, split)?;

            let point = self.split_point(&master, split);
            let Some(consumed) = NonZeroU32::new(point.consumed) else {
                debug!(event_id, %split, "split at first occurrence, removing series");
                return remove_series(s, event_id);
            };

            let end = master.recurrence.end_condition().truncated(split, consumed);
            let mut truncated = master;
            truncated.recurrence = truncated.recurrence.with_end(end);
            s.put_event(truncated)?;
            let dropped = s.delete_exceptions_from(event_id, split)?;

            info!(
                event_id,
                %split,
                consumed = point.consumed,
                dropped = dropped.len(),
                "truncated series"
            );
            Ok(())
        })
    }

    /// Removes the master and all its exceptions.
    pub fn delete_all<T: Transactional>(
        &self,
        store: &mut T,
        event_id: &str,
    ) -> ResolverResult<()> {
        store.transact(|s| {
            require(s, event_id)?;
            remove_series(s, event_id)
        })
    }

    fn split_point(&self, master: &Event, split: NaiveDate) -> SplitPoint {
        let mut dates = self.expander.series_dates(master);
        let mut consumed = 0;
        let next = loop {
            match dates.next() {
                Some(date) if date < split => consumed += 1,
                other => break other,
            }
        };
        SplitPoint { consumed, next }
    }
}

fn require<S: EventStore>(store: &S, event_id: &str) -> ResolverResult<Event> {
    store
        .get_event(event_id)?
        .ok_or_else(|| ResolverError::event_not_found(event_id))
}

fn check_split(master: &Event, split: NaiveDate) -> ResolverResult<()> {
    if split < master.start_date {
        return Err(ResolverError::InvalidSplitDate {
            split,
            start: master.start_date,
        });
    }
    Ok(())
}

fn apply_to_master<S: EventStore>(
    store: &mut S,
    mut master: Event,
    fields: &FieldOverrides,
) -> ResolverResult<Event> {
    master.apply(fields);
    store.put_event(master.clone())?;
    info!(event_id = %master.id, "edited master event");
    Ok(master)
}

fn remove_series<S: EventStore>(store: &mut S, event_id: &str) -> ResolverResult<()> {
    store.delete_event(event_id)?;
    let exceptions = store.delete_exceptions(event_id)?;
    info!(event_id, exceptions = exceptions.len(), "deleted series");
    Ok(())
}
