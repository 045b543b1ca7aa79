//! Core types: events, recurrence rules, expansion, layout, filters, formatting

pub mod event;
pub mod expand;
pub mod filter;
pub mod format;
pub mod layout;
pub mod recurrence;
pub mod time;
pub mod tracing;

pub use event::{
    Event, EventPayload, ExceptionMap, FieldOverrides, Occurrence, OccurrenceException,
    OccurrenceKey,
};
pub use expand::{ExpandOptions, RecurrenceExpander, SeriesDates};
pub use filter::{FilterError, OccurrenceFilter, matches_search};
pub use format::{
    FormatOptions, JsonDayLayout, JsonOccurrence, JsonOutput, JsonPlacement, OccurrenceFormatter,
    TimeFormat, duration_label, ellipsis, recurrence_summary, time_range_label,
};
pub use layout::{
    ColumnSlot, DEFAULT_DURATION_MINUTES, DayLayout, PlacedOccurrence, TemporalLayoutResolver,
    group_by_day,
};
pub use recurrence::{EndCondition, RecurrenceRule, RecurrenceUnit, RuleError, RuleResult};
pub use time::{DateRange, TimeSpan};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
