//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/cadence/config.toml` by default. Every section is optional.
//!
//! ```toml
//! [store]
//! path = "/home/me/calendar/events.json"
//!
//! [calendar]
//! week_start = "sun"
//! default_duration_minutes = 30
//!
//! [display]
//! time_format = "12h"
//!
//! [filters]
//! exclude_titles = ["^Lunch"]
//! categories = ["work"]
//! ```

use std::path::{Path, PathBuf};

use cadence_core::time::MINUTES_PER_DAY;
use cadence_core::{
    ExpandOptions, FilterError, FormatOptions, OccurrenceFilter, TemporalLayoutResolver, TimeFormat,
};
use cadence_store::{StoreConfig, default_catalog_path};
use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::cli::FilterArgs;

/// Configuration for the cadence client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Debug mode.
    pub debug: bool,

    /// Event catalog settings.
    pub store: StoreSettings,

    /// Calendar conventions.
    pub calendar: CalendarSettings,

    /// Display settings.
    pub display: DisplaySettings,

    /// Filter settings.
    pub filters: FilterSettings,
}

/// Where and how the event catalog is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Catalog path; the user data directory when unset.
    pub path: Option<PathBuf>,

    /// Pretty-print the catalog.
    pub pretty: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: None,
            pretty: true,
        }
    }
}

/// Calendar conventions used by expansion and layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    /// First day of the week for weekly series.
    pub week_start: Weekday,

    /// Duration given to timed events without an end time.
    pub default_duration_minutes: u32,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            week_start: Weekday::Mon,
            default_duration_minutes: cadence_core::DEFAULT_DURATION_MINUTES,
        }
    }
}

/// Display settings for output formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Maximum title length (truncated with ellipsis).
    pub max_title_length: Option<usize>,

    pub time_format: TimeFormat,

    /// Separator between hours and minutes.
    pub hour_separator: String,

    /// Append the location to terminal lines.
    pub show_location: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        let defaults = FormatOptions::default();
        Self {
            max_title_length: defaults.max_title_length,
            time_format: defaults.time_format,
            hour_separator: defaults.hour_separator,
            show_location: defaults.show_location,
        }
    }
}

/// Filter settings for occurrence selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Maximum number of occurrences to display.
    pub limit: Option<usize>,

    /// Skip all-day occurrences.
    pub skip_all_day: bool,

    /// Only include occurrences matching these title patterns.
    pub include_titles: Vec<String>,

    /// Exclude occurrences matching these title patterns.
    pub exclude_titles: Vec<String>,

    /// Only include occurrences in these categories.
    pub categories: Vec<String>,
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse {}: {}", path.display(), e))
    }

    /// The configuration a command runs with: `path` when given, otherwise
    /// the default file if it parses. The result is validated.
    pub fn resolve(path: Option<&Path>) -> Result<Self, String> {
        let config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load().unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Whether debug logging is on, from either the flag or the file.
    pub fn debug_enabled(&self, flag: bool) -> bool {
        flag || self.debug
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cadence")
    }

    /// Checks values that deserialization alone cannot.
    pub fn validate(&self) -> Result<(), String> {
        let minutes = self.calendar.default_duration_minutes;
        if minutes == 0 || minutes > MINUTES_PER_DAY {
            return Err(format!(
                "default_duration_minutes must be between 1 and {}, got {}",
                MINUTES_PER_DAY, minutes
            ));
        }
        if self.display.max_title_length == Some(0) {
            return Err("max_title_length must be positive".to_string());
        }
        self.filter(&FilterArgs::default())
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    /// Store configuration, with `path_override` taking precedence.
    pub fn store_config(&self, path_override: Option<&Path>) -> StoreConfig {
        let path = path_override
            .map(Path::to_path_buf)
            .or_else(|| self.store.path.clone())
            .unwrap_or_else(default_catalog_path);
        StoreConfig::new(path).with_pretty(self.store.pretty)
    }

    pub fn expand_options(&self) -> ExpandOptions {
        ExpandOptions::default().with_week_start(self.calendar.week_start)
    }

    pub fn layout_resolver(&self) -> TemporalLayoutResolver {
        TemporalLayoutResolver::new(self.calendar.default_duration_minutes)
    }

    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            max_title_length: self.display.max_title_length,
            hour_separator: self.display.hour_separator.clone(),
            time_format: self.display.time_format,
            show_location: self.display.show_location,
        }
    }

    /// Builds the occurrence filter from the `[filters]` section merged
    /// with command-line flags. Patterns add up; flags win for scalars.
    pub fn filter(&self, args: &FilterArgs) -> Result<OccurrenceFilter, FilterError> {
        let settings = &self.filters;
        let filter = OccurrenceFilter::new()
            .with_include_patterns(settings.include_titles.iter().chain(&args.include_title))?
            .with_exclude_patterns(settings.exclude_titles.iter().chain(&args.exclude_title))?
            .with_categories(settings.categories.iter().chain(&args.category).cloned())
            .with_skip_all_day(settings.skip_all_day || args.skip_all_day)
            .with_limit(args.limit.or(settings.limit));
        Ok(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_file_gives_defaults() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config.calendar.week_start, Weekday::Mon);
        assert_eq!(config.calendar.default_duration_minutes, 60);
        assert!(config.store.pretty);
        assert!(config.display.show_location);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn full_file() {
        let toml_content = r#"
[store]
path = "/srv/cal/events.json"
pretty = false

[calendar]
week_start = "sun"
default_duration_minutes = 30

[display]
max_title_length = 20
time_format = "12h"

[filters]
skip_all_day = true
exclude_titles = ["^Lunch"]
limit = 10
"#;
        let config: ClientConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.calendar.week_start, Weekday::Sun);
        assert_eq!(config.expand_options().week_start, Weekday::Sun);
        assert_eq!(config.layout_resolver().default_duration_minutes(), 30);
        assert_eq!(config.format_options().time_format, TimeFormat::H12);
        assert_eq!(config.format_options().max_title_length, Some(20));

        let store = config.store_config(None);
        assert_eq!(store.path, PathBuf::from("/srv/cal/events.json"));
        assert!(!store.pretty);
    }

    #[test]
    fn store_path_override_wins() {
        let config = ClientConfig::default();
        let store = config.store_config(Some(Path::new("/tmp/other.json")));
        assert_eq!(store.path, PathBuf::from("/tmp/other.json"));
        assert!(config.store_config(None).path.ends_with("events.json"));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = ClientConfig::default();
        config.calendar.default_duration_minutes = 0;
        assert!(config.validate().unwrap_err().contains("default_duration_minutes"));

        let mut config = ClientConfig::default();
        config.filters.include_titles = vec!["(unclosed".to_string()];
        assert!(config.validate().unwrap_err().contains("(unclosed"));
    }

    #[test]
    fn flags_merge_with_filters() {
        let mut config = ClientConfig::default();
        config.filters.limit = Some(10);
        let args = FilterArgs {
            limit: Some(3),
            ..Default::default()
        };
        assert!(config.filter(&args).is_ok());
    }

    #[test]
    fn load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[display]\nshow_location = false\n").unwrap();

        let config = ClientConfig::load_from(&path).unwrap();
        assert!(!config.display.show_location);

        let missing = ClientConfig::load_from(&dir.path().join("nope.toml")).unwrap_err();
        assert!(missing.starts_with("failed to read"));
    }

    #[test]
    fn resolve_rejects_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[calendar]\ndefault_duration_minutes = 4294967295\n").unwrap();

        let err = ClientConfig::resolve(Some(path.as_path())).unwrap_err();
        assert!(err.contains("default_duration_minutes"), "{err}");

        std::fs::write(&path, "debug = true\n[calendar]\ndefault_duration_minutes = 45\n").unwrap();
        let config = ClientConfig::resolve(Some(path.as_path())).unwrap();
        assert_eq!(config.layout_resolver().default_duration_minutes(), 45);
        assert!(config.debug_enabled(false));
    }

    #[test]
    fn debug_flag_or_file() {
        let config = ClientConfig::default();
        assert!(!config.debug_enabled(false));
        assert!(config.debug_enabled(true));
    }

    #[test]
    fn dump_round_trips() {
        let mut config = ClientConfig::default();
        config.calendar.week_start = Weekday::Sat;
        config.filters.exclude_titles = vec!["^Focus".to_string()];

        let text = toml::to_string_pretty(&config).unwrap();
        let back: ClientConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.calendar.week_start, Weekday::Sat);
        assert_eq!(back.filters.exclude_titles, config.filters.exclude_titles);
    }
}
