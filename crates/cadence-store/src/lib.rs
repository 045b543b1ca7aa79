//! Event storage and scoped edits of recurring series.
//!
//! This crate provides:
//! - The [`EventStore`] trait and its in-memory implementations
//! - A JSON catalog file store with atomic saves
//! - [`OccurrenceExceptionResolver`] for single, future, and whole-series
//!   edits and deletes
//!
//! # Example
//!
//! ```rust
//! use cadence_core::{Event, FieldOverrides, RecurrenceRule};
//! use cadence_store::{EditScope, EventStore, MemoryStore, OccurrenceExceptionResolver};
//! use chrono::NaiveDate;
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let standup = Event::new("standup", "Standup", start)
//!     .with_recurrence(RecurrenceRule::daily(1).unwrap());
//! let mut store = MemoryStore::with_events([standup]);
//!
//! let resolver = OccurrenceExceptionResolver::default();
//! let moved = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
//! resolver
//!     .edit(
//!         &mut store,
//!         "standup",
//!         moved,
//!         EditScope::Single,
//!         &FieldOverrides::new().with_title("Planning"),
//!     )
//!     .unwrap();
//!
//! assert_eq!(store.get_exceptions("standup").unwrap().len(), 1);
//! ```

mod config;
mod error;
mod file;
mod resolver;
mod store;

pub use config::{StoreConfig, default_catalog_path};
pub use error::{ResolverError, ResolverResult, StoreError, StoreResult};
pub use file::FileStore;
pub use resolver::{EditOutcome, EditScope, OccurrenceExceptionResolver, SeriesSplit};
pub use store::{
    Catalog, EventStore, MemoryStore, SharedStore, StoredException, Transactional, new_event_id,
};
