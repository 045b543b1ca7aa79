//! Recurrence rules and end conditions.
//!
//! A [`RecurrenceRule`] is a closed set of variants. Invalid combinations are
//! rejected when a rule is built through the constructors and when a rule is
//! deserialized, so an expander never sees a zero interval or a weekday set
//! on a month-based unit.

use std::fmt;
use std::num::NonZeroU32;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building a recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// The repeat interval was zero, negative or out of range.
    #[error("invalid recurrence rule: interval must be a positive integer, got {0}")]
    InvalidInterval(i64),

    /// An occurrence count of zero was requested.
    #[error("invalid recurrence rule: occurrence count must be at least 1")]
    ZeroCount,

    /// Both an until date and an occurrence count were requested.
    #[error("invalid recurrence rule: an until date and an occurrence count cannot be combined")]
    ConflictingEndConditions,

    /// A weekday set was given for a unit that cannot honour it.
    #[error("invalid recurrence rule: weekdays cannot be combined with a {0} unit")]
    WeekdaysNotSupported(RecurrenceUnit),
}

/// Result type for rule construction.
pub type RuleResult<T> = Result<T, RuleError>;

/// Unit of a custom recurrence interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceUnit {
    Days,
    Weeks,
    Months,
    Years,
}

impl RecurrenceUnit {
    /// Plural lowercase name ("days").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Days => "days",
            Self::Weeks => "weeks",
            Self::Months => "months",
            Self::Years => "years",
        }
    }

    /// Singular lowercase name ("day").
    pub fn singular(&self) -> &'static str {
        match self {
            Self::Days => "day",
            Self::Weeks => "week",
            Self::Months => "month",
            Self::Years => "year",
        }
    }

    /// Whether a weekday set is meaningful for this unit.
    pub fn accepts_weekdays(&self) -> bool {
        matches!(self, Self::Days | Self::Weeks)
    }
}

impl fmt::Display for RecurrenceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When a recurring series stops producing occurrences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum EndCondition {
    /// The series repeats forever.
    #[default]
    Never,
    /// The last possible occurrence date (inclusive).
    UntilDate(NaiveDate),
    /// Total number of occurrences, counted from the series start.
    AfterCount(NonZeroU32),
}

impl EndCondition {
    /// Builds an end condition from optional until/count inputs.
    pub fn from_parts(until: Option<NaiveDate>, count: Option<u32>) -> RuleResult<Self> {
        match (until, count) {
            (Some(_), Some(_)) => Err(RuleError::ConflictingEndConditions),
            (Some(date), None) => Ok(Self::UntilDate(date)),
            (None, Some(count)) => Self::after_count(count),
            (None, None) => Ok(Self::Never),
        }
    }

    /// An `AfterCount` condition, rejecting zero.
    pub fn after_count(count: u32) -> RuleResult<Self> {
        NonZeroU32::new(count)
            .map(Self::AfterCount)
            .ok_or(RuleError::ZeroCount)
    }

    /// The until date, if any.
    pub fn until(&self) -> Option<NaiveDate> {
        match self {
            Self::UntilDate(date) => Some(*date),
            _ => None,
        }
    }

    /// The occurrence count, if any.
    pub fn count(&self) -> Option<u32> {
        match self {
            Self::AfterCount(n) => Some(n.get()),
            _ => None,
        }
    }

    /// Condition for a series cut so that nothing on or after `split` remains.
    ///
    /// `consumed` is the number of occurrences produced before `split`. An
    /// until date is only ever moved earlier.
    pub fn truncated(self, split: NaiveDate, consumed: NonZeroU32) -> Self {
        let Some(last) = split.pred_opt() else {
            return self;
        };
        match self {
            Self::Never => Self::UntilDate(last),
            Self::UntilDate(until) => Self::UntilDate(until.min(last)),
            Self::AfterCount(n) => Self::AfterCount(n.min(consumed)),
        }
    }

    /// Condition for the continuation of a series after `consumed`
    /// occurrences were used up, or `None` when nothing is left.
    pub fn remaining_after(self, consumed: u32) -> Option<Self> {
        match self {
            Self::AfterCount(n) => n
                .get()
                .checked_sub(consumed)
                .and_then(NonZeroU32::new)
                .map(Self::AfterCount),
            other => Some(other),
        }
    }
}

/// A recurrence rule attached to a master event.
///
/// Named variants default to an end condition of [`EndCondition::Never`];
/// `Custom` always carries its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RuleRepr", into = "RuleRepr")]
pub enum RecurrenceRule {
    /// A one-off event.
    #[default]
    None,
    Daily {
        interval: NonZeroU32,
        end: EndCondition,
    },
    Weekly {
        interval: NonZeroU32,
        weekdays: Vec<Weekday>,
        end: EndCondition,
    },
    Monthly {
        interval: NonZeroU32,
        end: EndCondition,
    },
    Yearly {
        interval: NonZeroU32,
        end: EndCondition,
    },
    Custom {
        interval: NonZeroU32,
        unit: RecurrenceUnit,
        weekdays: Vec<Weekday>,
        end: EndCondition,
    },
}

fn positive_interval(value: i64) -> RuleResult<NonZeroU32> {
    u32::try_from(value)
        .ok()
        .and_then(NonZeroU32::new)
        .ok_or(RuleError::InvalidInterval(value))
}

/// Sorts weekdays Monday-first and drops duplicates.
pub fn normalize_weekdays(weekdays: impl IntoIterator<Item = Weekday>) -> Vec<Weekday> {
    let mut days: Vec<Weekday> = weekdays.into_iter().collect();
    days.sort_by_key(|d| d.num_days_from_monday());
    days.dedup();
    days
}

impl RecurrenceRule {
    /// Every `interval` days.
    pub fn daily(interval: i64) -> RuleResult<Self> {
        Ok(Self::Daily {
            interval: positive_interval(interval)?,
            end: EndCondition::Never,
        })
    }

    /// Every `interval` weeks, optionally on a set of weekdays.
    pub fn weekly(interval: i64, weekdays: impl IntoIterator<Item = Weekday>) -> RuleResult<Self> {
        Ok(Self::Weekly {
            interval: positive_interval(interval)?,
            weekdays: normalize_weekdays(weekdays),
            end: EndCondition::Never,
        })
    }

    /// Every `interval` months on the start's day of month.
    pub fn monthly(interval: i64) -> RuleResult<Self> {
        Ok(Self::Monthly {
            interval: positive_interval(interval)?,
            end: EndCondition::Never,
        })
    }

    /// Every `interval` years on the start's month and day.
    pub fn yearly(interval: i64) -> RuleResult<Self> {
        Ok(Self::Yearly {
            interval: positive_interval(interval)?,
            end: EndCondition::Never,
        })
    }

    /// A custom rule with an explicit unit and end condition.
    pub fn custom(
        interval: i64,
        unit: RecurrenceUnit,
        weekdays: impl IntoIterator<Item = Weekday>,
        end: EndCondition,
    ) -> RuleResult<Self> {
        let interval = positive_interval(interval)?;
        let weekdays = normalize_weekdays(weekdays);
        if !weekdays.is_empty() && !unit.accepts_weekdays() {
            return Err(RuleError::WeekdaysNotSupported(unit));
        }
        Ok(Self::Custom {
            interval,
            unit,
            weekdays,
            end,
        })
    }

    /// Replaces the end condition. A `None` rule is returned unchanged.
    #[must_use]
    pub fn with_end(mut self, new_end: EndCondition) -> Self {
        match &mut self {
            Self::None => {}
            Self::Daily { end, .. }
            | Self::Weekly { end, .. }
            | Self::Monthly { end, .. }
            | Self::Yearly { end, .. }
            | Self::Custom { end, .. } => *end = new_end,
        }
        self
    }

    /// Whether the rule produces more than the start date.
    pub fn is_recurring(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// The end condition; `Never` for a `None` rule.
    pub fn end_condition(&self) -> EndCondition {
        match self {
            Self::None => EndCondition::Never,
            Self::Daily { end, .. }
            | Self::Weekly { end, .. }
            | Self::Monthly { end, .. }
            | Self::Yearly { end, .. }
            | Self::Custom { end, .. } => *end,
        }
    }

    pub fn interval(&self) -> Option<NonZeroU32> {
        match self {
            Self::None => None,
            Self::Daily { interval, .. }
            | Self::Weekly { interval, .. }
            | Self::Monthly { interval, .. }
            | Self::Yearly { interval, .. }
            | Self::Custom { interval, .. } => Some(*interval),
        }
    }

    /// The stepping unit of the rule.
    pub fn unit(&self) -> Option<RecurrenceUnit> {
        match self {
            Self::None => None,
            Self::Daily { .. } => Some(RecurrenceUnit::Days),
            Self::Weekly { .. } => Some(RecurrenceUnit::Weeks),
            Self::Monthly { .. } => Some(RecurrenceUnit::Months),
            Self::Yearly { .. } => Some(RecurrenceUnit::Years),
            Self::Custom { unit, .. } => Some(*unit),
        }
    }

    /// Selected weekdays; empty when the rule has none.
    pub fn weekdays(&self) -> &[Weekday] {
        match self {
            Self::Weekly { weekdays, .. } | Self::Custom { weekdays, .. } => weekdays,
            _ => &[],
        }
    }

    /// Re-checks the invariants of a rule assembled by hand.
    pub fn validate(&self) -> RuleResult<()> {
        match self {
            Self::Custom { unit, weekdays, .. }
                if !weekdays.is_empty() && !unit.accepts_weekdays() =>
            {
                Err(RuleError::WeekdaysNotSupported(*unit))
            }
            _ => Ok(()),
        }
    }
}

fn default_interval() -> NonZeroU32 {
    NonZeroU32::MIN
}

/// Wire form of [`RecurrenceRule`]; conversion re-validates.
#[derive(Serialize, Deserialize)]
#[serde(tag = "freq", rename_all = "snake_case")]
enum RuleRepr {
    None,
    Daily {
        #[serde(default = "default_interval")]
        interval: NonZeroU32,
        #[serde(default)]
        end: EndCondition,
    },
    Weekly {
        #[serde(default = "default_interval")]
        interval: NonZeroU32,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        weekdays: Vec<Weekday>,
        #[serde(default)]
        end: EndCondition,
    },
    Monthly {
        #[serde(default = "default_interval")]
        interval: NonZeroU32,
        #[serde(default)]
        end: EndCondition,
    },
    Yearly {
        #[serde(default = "default_interval")]
        interval: NonZeroU32,
        #[serde(default)]
        end: EndCondition,
    },
    Custom {
        #[serde(default = "default_interval")]
        interval: NonZeroU32,
        unit: RecurrenceUnit,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        weekdays: Vec<Weekday>,
        #[serde(default)]
        end: EndCondition,
    },
}

impl TryFrom<RuleRepr> for RecurrenceRule {
    type Error = RuleError;

    fn try_from(repr: RuleRepr) -> RuleResult<Self> {
        let rule = match repr {
            RuleRepr::None => Self::None,
            RuleRepr::Daily { interval, end } => Self::Daily { interval, end },
            RuleRepr::Weekly {
                interval,
                weekdays,
                end,
            } => Self::Weekly {
                interval,
                weekdays: normalize_weekdays(weekdays),
                end,
            },
            RuleRepr::Monthly { interval, end } => Self::Monthly { interval, end },
            RuleRepr::Yearly { interval, end } => Self::Yearly { interval, end },
            RuleRepr::Custom {
                interval,
                unit,
                weekdays,
                end,
            } => Self::Custom {
                interval,
                unit,
                weekdays: normalize_weekdays(weekdays),
                end,
            },
        };
        rule.validate()?;
        Ok(rule)
    }
}

impl From<RecurrenceRule> for RuleRepr {
    fn from(rule: RecurrenceRule) -> Self {
        match rule {
            RecurrenceRule::None => Self::None,
            RecurrenceRule::Daily { interval, end } => Self::Daily { interval, end },
            RecurrenceRule::Weekly {
                interval,
                weekdays,
                end,
            } => Self::Weekly {
                interval,
                weekdays,
                end,
            },
            RecurrenceRule::Monthly { interval, end } => Self::Monthly { interval, end },
            RecurrenceRule::Yearly { interval, end } => Self::Yearly { interval, end },
            RecurrenceRule::Custom {
                interval,
                unit,
                weekdays,
                end,
            } => Self::Custom {
                interval,
                unit,
                weekdays,
                end,
            },
        }
    }
}
