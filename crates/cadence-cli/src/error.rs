//! Client error types.

use std::fmt;

use cadence_core::{FilterError, RuleError};
use cadence_store::{ResolverError, StoreError};

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// Invalid combination of arguments.
    Usage(String),
    /// IO error.
    Io(std::io::Error),
    /// Event store error.
    Store(StoreError),
    /// Scoped edit or delete failed.
    Resolver(ResolverError),
    /// Recurrence options do not form a valid rule.
    Rule(RuleError),
    /// A title filter pattern is invalid.
    Filter(FilterError),
    /// JSON output could not be produced.
    Json(serde_json::Error),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Usage(msg) => write!(f, "invalid arguments: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Store(err) => write!(f, "store error: {}", err),
            Self::Resolver(err) => write!(f, "{}", err),
            Self::Rule(err) => write!(f, "{}", err),
            Self::Filter(err) => write!(f, "filter error: {}", err),
            Self::Json(err) => write!(f, "JSON error: {}", err),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Resolver(err) => Some(err),
            Self::Rule(err) => Some(err),
            Self::Filter(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Config(_) | Self::Usage(_) => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<StoreError> for ClientError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<ResolverError> for ClientError {
    fn from(err: ResolverError) -> Self {
        Self::Resolver(err)
    }
}

impl From<RuleError> for ClientError {
    fn from(err: RuleError) -> Self {
        Self::Rule(err)
    }
}

impl From<FilterError> for ClientError {
    fn from(err: FilterError) -> Self {
        Self::Filter(err)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}
