//! Store and resolver error types.

use std::io;
use std::path::PathBuf;

use cadence_core::RuleError;
use chrono::NaiveDate;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for resolver operations.
pub type ResolverResult<T> = Result<T, ResolverError>;

/// Errors raised by an event store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error while reading or writing the catalog.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The catalog could not be encoded or decoded.
    #[error("Catalog serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The catalog holds data that violates store invariants.
    #[error("Corrupt catalog: {message}")]
    Corrupt { message: String },

    /// A shared store lock was poisoned by a panicking writer.
    #[error("Store lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    /// Creates an IO error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a corrupt catalog error.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }
}

/// Errors raised by [`OccurrenceExceptionResolver`](crate::OccurrenceExceptionResolver).
#[derive(Debug, Error)]
pub enum ResolverError {
    /// No master event with this id.
    #[error("Event not found: {id}")]
    EventNotFound { id: String },

    /// A series split was requested before the series starts.
    #[error("Split date {split} is before the series start {start}")]
    InvalidSplitDate { split: NaiveDate, start: NaiveDate },

    /// The series produces nothing on or after the split date.
    #[error("Series {id} has no occurrences on or after {split}")]
    SeriesEnded { id: String, split: NaiveDate },

    /// The rule resulting from an edit is invalid.
    #[error(transparent)]
    InvalidRule(#[from] RuleError),

    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ResolverError {
    /// Creates an event not found error.
    pub fn event_not_found(id: impl Into<String>) -> Self {
        Self::EventNotFound { id: id.into() }
    }

    /// Creates a series ended error.
    pub fn series_ended(id: impl Into<String>, split: NaiveDate) -> Self {
        Self::SeriesEnded {
            id: id.into(),
            split,
        }
    }
}
