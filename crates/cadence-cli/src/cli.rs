//! Command-line interface definition.

use std::path::PathBuf;

use cadence_core::RecurrenceUnit;
use cadence_store::EditScope;
use chrono::{NaiveDate, NaiveTime, Weekday};
use clap::{Args, Parser, Subcommand, ValueEnum};

/// cadence - recurring events from the terminal
#[derive(Debug, Parser)]
#[command(name = "cadence")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "CADENCE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Path to the event catalog (overrides the configuration)
    #[arg(long, env = "CADENCE_STORE", global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add an event or a recurring series
    Add(AddArgs),

    /// List occurrences in a date range
    Expand(ExpandArgs),

    /// Show the column layout of one day
    Layout(LayoutArgs),

    /// Describe an event and its next occurrences
    Show(ShowArgs),

    /// Edit one occurrence, the rest of a series, or the whole series
    Edit(EditArgs),

    /// Delete one occurrence, the rest of a series, or the whole series
    Delete(DeleteArgs),

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Event title
    #[arg(long, short)]
    pub title: String,

    /// Date of the first occurrence (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub start_date: NaiveDate,

    /// Start time (HH:MM)
    #[arg(long, value_parser = parse_time)]
    pub start_time: Option<NaiveTime>,

    /// End time (HH:MM)
    #[arg(long, value_parser = parse_time)]
    pub end_time: Option<NaiveTime>,

    /// Last day of a multi-day event (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub end_date: Option<NaiveDate>,

    /// Mark the event as all-day
    #[arg(long, conflicts_with_all = ["start_time", "end_time"])]
    pub all_day: bool,

    #[arg(long)]
    pub location: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,

    /// Category id stored with the event
    #[arg(long)]
    pub category: Option<String>,

    /// Reminder in minutes before the start (can be repeated)
    #[arg(long = "reminder", action = clap::ArgAction::Append)]
    pub reminders: Vec<u32>,

    /// Explicit event id (generated when omitted)
    #[arg(long)]
    pub id: Option<String>,

    /// Repeat frequency
    #[arg(long, value_enum, default_value_t = Repeat::None)]
    pub repeat: Repeat,

    /// Repeat every N units
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub interval: i64,

    /// Unit of a custom repeat
    #[arg(long, value_enum)]
    pub unit: Option<Unit>,

    /// Weekdays of a weekly repeat (e.g. mon,wed)
    #[arg(long, value_delimiter = ',', value_parser = parse_weekday)]
    pub weekdays: Vec<Weekday>,

    /// Last possible occurrence date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date, conflicts_with = "count")]
    pub until: Option<NaiveDate>,

    /// Total number of occurrences
    #[arg(long)]
    pub count: Option<u32>,
}

#[derive(Debug, Args)]
pub struct ExpandArgs {
    /// First day (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub from: Option<NaiveDate>,

    /// Last day (YYYY-MM-DD, defaults to six days after --from)
    #[arg(long, value_parser = parse_date)]
    pub to: Option<NaiveDate>,

    /// Only expand this event
    #[arg(long)]
    pub event: Option<String>,

    /// Case-insensitive search in title, location and notes
    #[arg(long, short)]
    pub search: Option<String>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub filters: FilterArgs,
}

/// Filters merged with the `[filters]` configuration section.
#[derive(Debug, Default, Args)]
pub struct FilterArgs {
    /// Maximum number of occurrences to display
    #[arg(long)]
    pub limit: Option<usize>,

    /// Skip all-day occurrences
    #[arg(long)]
    pub skip_all_day: bool,

    /// Only include occurrences matching this title pattern (can be repeated)
    #[arg(long, action = clap::ArgAction::Append)]
    pub include_title: Vec<String>,

    /// Exclude occurrences matching this title pattern (can be repeated)
    #[arg(long, action = clap::ArgAction::Append)]
    pub exclude_title: Vec<String>,

    /// Only include occurrences in this category (can be repeated)
    #[arg(long, action = clap::ArgAction::Append)]
    pub category: Vec<String>,
}

#[derive(Debug, Args)]
pub struct LayoutArgs {
    /// Day to lay out (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Event id
    #[arg(long, short)]
    pub event: String,

    /// Number of upcoming occurrences to list
    #[arg(long, default_value_t = 5)]
    pub limit: usize,

    /// List occurrences from this day (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub from: Option<NaiveDate>,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Event id
    #[arg(long, short)]
    pub event: String,

    /// Original date of the targeted occurrence
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    #[arg(long, value_enum, default_value_t = Scope::Single)]
    pub scope: Scope,

    #[arg(long, short)]
    pub title: Option<String>,

    #[arg(long, value_parser = parse_time)]
    pub start_time: Option<NaiveTime>,

    #[arg(long, value_parser = parse_time)]
    pub end_time: Option<NaiveTime>,

    #[arg(long)]
    pub location: Option<String>,

    /// Set or clear the all-day flag
    #[arg(long)]
    pub all_day: Option<bool>,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Event id
    #[arg(long, short)]
    pub event: String,

    /// Original date of the targeted occurrence
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    #[arg(long, value_enum, default_value_t = Scope::Single)]
    pub scope: Scope,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration and catalog paths
    Path,
}

/// Repeat frequency of a new event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Repeat {
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Custom,
}

/// Unit of a custom repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Unit {
    Days,
    Weeks,
    Months,
    Years,
}

impl From<Unit> for RecurrenceUnit {
    fn from(unit: Unit) -> Self {
        match unit {
            Unit::Days => Self::Days,
            Unit::Weeks => Self::Weeks,
            Unit::Months => Self::Months,
            Unit::Years => Self::Years,
        }
    }
}

/// Which occurrences an edit or delete targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scope {
    /// Only the occurrence on --date
    Single,
    /// The occurrence on --date and every later one
    Future,
    /// The whole series
    All,
}

impl From<Scope> for EditScope {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::Single => Self::Single,
            Scope::Future => Self::Future,
            Scope::All => Self::All,
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|e| format!("expected HH:MM: {}", e))
}

fn parse_weekday(s: &str) -> Result<Weekday, String> {
    s.trim()
        .parse::<Weekday>()
        .map_err(|_| format!("unknown weekday: {}", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("cadence").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn add_weekly_series() {
        let cli = parse(&[
            "add",
            "--title",
            "Review",
            "--start-date",
            "2024-01-01",
            "--start-time",
            "14:00",
            "--repeat",
            "weekly",
            "--interval",
            "2",
            "--weekdays",
            "mon,Wednesday",
            "--count",
            "6",
        ]);
        let Some(Command::Add(args)) = cli.command else {
            panic!("expected add");
        };
        assert_eq!(args.repeat, Repeat::Weekly);
        assert_eq!(args.interval, 2);
        assert_eq!(args.weekdays, vec![Weekday::Mon, Weekday::Wed]);
        assert_eq!(args.start_time, NaiveTime::from_hms_opt(14, 0, 0));
        assert_eq!(args.count, Some(6));
    }

    #[test]
    fn negative_interval_reaches_rule_validation() {
        let cli = parse(&["add", "-t", "x", "--start-date", "2024-01-01", "--interval", "-1"]);
        let Some(Command::Add(args)) = cli.command else {
            panic!("expected add");
        };
        assert_eq!(args.interval, -1);
    }

    #[test]
    fn until_conflicts_with_count() {
        let result = Cli::try_parse_from([
            "cadence",
            "add",
            "-t",
            "x",
            "--start-date",
            "2024-01-01",
            "--until",
            "2024-02-01",
            "--count",
            "3",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn bad_date_is_rejected() {
        let result = Cli::try_parse_from(["cadence", "layout", "--date", "01/02/2024"]);
        assert!(result.is_err());
    }

    #[test]
    fn delete_defaults_to_single() {
        let cli = parse(&["delete", "--event", "evt_1", "--date", "2024-01-08"]);
        let Some(Command::Delete(args)) = cli.command else {
            panic!("expected delete");
        };
        assert_eq!(args.scope, Scope::Single);
        assert_eq!(EditScope::from(args.scope), EditScope::Single);
    }

    #[test]
    fn store_flag_is_global() {
        let cli = parse(&["expand", "--store", "/tmp/cal.json", "--json"]);
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/cal.json")));
    }

    #[test]
    fn no_subcommand() {
        assert!(parse(&[]).command.is_none());
    }
}
