//! Event store abstraction and in-memory implementations.
//!
//! The engine never owns events: it reads and writes through an
//! [`EventStore`] keyed by event id, with exceptions kept in a sparse side
//! table keyed by `(event id, original date)`. Multi-write operations run
//! through [`Transactional::transact`] so that either every write of an
//! operation lands or none does.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use cadence_core::{Event, ExceptionMap, OccurrenceException};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Storage for master events and their exceptions.
pub trait EventStore {
    /// Fetches a master event.
    fn get_event(&self, id: &str) -> StoreResult<Option<Event>>;

    /// Returns every master event, ordered by id.
    fn list_events(&self) -> StoreResult<Vec<Event>>;

    /// Returns a snapshot of an event's exceptions.
    fn get_exceptions(&self, id: &str) -> StoreResult<ExceptionMap>;

    /// Inserts or replaces a master event.
    fn put_event(&mut self, event: Event) -> StoreResult<()>;

    /// Removes a master event; returns whether it existed.
    ///
    /// Exceptions are left alone, see [`delete_exceptions`](Self::delete_exceptions).
    fn delete_event(&mut self, id: &str) -> StoreResult<bool>;

    /// Inserts or replaces the exception at `(id, date)`.
    fn put_exception(
        &mut self,
        id: &str,
        date: NaiveDate,
        exception: OccurrenceException,
    ) -> StoreResult<()>;

    /// Removes and returns exceptions of `id` dated on or after `date`.
    fn delete_exceptions_from(&mut self, id: &str, date: NaiveDate) -> StoreResult<ExceptionMap>;

    /// Removes and returns every exception of `id`.
    fn delete_exceptions(&mut self, id: &str) -> StoreResult<ExceptionMap>;
}

/// A store whose mutations can be grouped atomically.
pub trait Transactional {
    /// The store handed to the transaction body.
    type Store: EventStore;

    /// Runs `f` against the store; its writes are kept only if it succeeds.
    fn transact<R, E, F>(&mut self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut Self::Store) -> Result<R, E>,
        E: From<StoreError>;

    /// Runs `f` against a consistent view of the store.
    fn read<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&Self::Store) -> Result<R, E>,
        E: From<StoreError>;
}

/// Generates a fresh event id.
pub fn new_event_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("evt_{}", &id[..12])
}

/// An exception as stored in a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredException {
    pub event_id: String,
    pub date: NaiveDate,
    pub exception: OccurrenceException,
}

/// Serializable snapshot of a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub exceptions: Vec<StoredException>,
}

/// Events and exceptions held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    events: BTreeMap<String, Event>,
    exceptions: BTreeMap<String, ExceptionMap>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from events, with no exceptions.
    pub fn with_events(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            events: events.into_iter().map(|e| (e.id.clone(), e)).collect(),
            exceptions: BTreeMap::new(),
        }
    }

    /// Number of master events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of exception records across all events.
    pub fn exception_count(&self) -> usize {
        self.exceptions.values().map(BTreeMap::len).sum()
    }

    /// Removes exceptions dated before `cutoff`; returns how many went.
    pub fn prune_exceptions_before(&mut self, cutoff: NaiveDate) -> usize {
        let mut removed = 0;
        for map in self.exceptions.values_mut() {
            let keep = map.split_off(&cutoff);
            removed += map.len();
            *map = keep;
        }
        self.exceptions.retain(|_, map| !map.is_empty());
        debug!(%cutoff, removed, "pruned exceptions");
        removed
    }

    /// Snapshot in catalog form.
    pub fn to_catalog(&self) -> Catalog {
        Catalog {
            events: self.events.values().cloned().collect(),
            exceptions: self
                .exceptions
                .iter()
                .flat_map(|(id, map)| {
                    map.iter().map(move |(date, exception)| StoredException {
                        event_id: id.clone(),
                        date: *date,
                        exception: exception.clone(),
                    })
                })
                .collect(),
        }
    }

    /// Rebuilds a store from a catalog.
    ///
    /// Duplicate event ids are rejected; exceptions of unknown events are
    /// kept so that a later re-import of the event sees them again.
    pub fn from_catalog(catalog: Catalog) -> StoreResult<Self> {
        let mut store = Self::new();
        for event in catalog.events {
            if store.events.contains_key(&event.id) {
                return Err(StoreError::corrupt(format!("duplicate event id {}", event.id)));
            }
            event
                .recurrence
                .validate()
                .map_err(|e| StoreError::corrupt(format!("event {}: {e}", event.id)))?;
            store.events.insert(event.id.clone(), event);
        }
        for stored in catalog.exceptions {
            store
                .exceptions
                .entry(stored.event_id)
                .or_default()
                .insert(stored.date, stored.exception);
        }
        Ok(store)
    }
}

impl EventStore for MemoryStore {
    fn get_event(&self, id: &str) -> StoreResult<Option<Event>> {
        Ok(self.events.get(id).cloned())
    }

    fn list_events(&self) -> StoreResult<Vec<Event>> {
        Ok(self.events.values().cloned().collect())
    }

    fn get_exceptions(&self, id: &str) -> StoreResult<ExceptionMap> {
        Ok(self.exceptions.get(id).cloned().unwrap_or_default())
    }

    fn put_event(&mut self, event: Event) -> StoreResult<()> {
        self.events.insert(event.id.clone(), event);
        Ok(())
    }

    fn delete_event(&mut self, id: &str) -> StoreResult<bool> {
        Ok(self.events.remove(id).is_some())
    }

    fn put_exception(
        &mut self,
        id: &str,
        date: NaiveDate,
        exception: OccurrenceException,
    ) -> StoreResult<()> {
        self.exceptions
            .entry(id.to_string())
            .or_default()
            .insert(date, exception);
        Ok(())
    }

    fn delete_exceptions_from(&mut self, id: &str, date: NaiveDate) -> StoreResult<ExceptionMap> {
        let Some(map) = self.exceptions.get_mut(id) else {
            return Ok(ExceptionMap::new());
        };
        let removed = map.split_off(&date);
        if map.is_empty() {
            self.exceptions.remove(id);
        }
        Ok(removed)
    }

    fn delete_exceptions(&mut self, id: &str) -> StoreResult<ExceptionMap> {
        Ok(self.exceptions.remove(id).unwrap_or_default())
    }
}

impl Transactional for MemoryStore {
    type Store = MemoryStore;

    fn transact<R, E, F>(&mut self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut MemoryStore) -> Result<R, E>,
        E: From<StoreError>,
    {
        let mut working = self.clone();
        let result = f(&mut working)?;
        *self = working;
        Ok(result)
    }

    fn read<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&MemoryStore) -> Result<R, E>,
        E: From<StoreError>,
    {
        f(self)
    }
}

/// A [`MemoryStore`] shared between threads.
///
/// Cloning the handle shares the same state. Transactions hold the write
/// lock for their whole duration and swap the working copy in on success.
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<RwLock<MemoryStore>>,
}

impl SharedStore {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Copies the current state.
    pub fn snapshot(&self) -> StoreResult<MemoryStore> {
        self.inner
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| StoreError::LockPoisoned)
    }
}

impl Transactional for SharedStore {
    type Store = MemoryStore;

    fn transact<R, E, F>(&mut self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut MemoryStore) -> Result<R, E>,
        E: From<StoreError>,
    {
        let mut guard = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        guard.transact(f)
    }

    fn read<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&MemoryStore) -> Result<R, E>,
        E: From<StoreError>,
    {
        let guard = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        f(&guard)
    }
}
