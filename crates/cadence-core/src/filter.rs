//! Occurrence filtering.
//!
//! [`OccurrenceFilter`] narrows an expanded occurrence list by title
//! patterns, category, all-day status, free-text search and a result limit.

use regex::{Regex, RegexBuilder};
use thiserror::Error;
use tracing::debug;

use crate::event::Occurrence;

/// Errors raised while building a filter.
#[derive(Debug, Error)]
pub enum FilterError {
    /// A title pattern is not a valid regular expression.
    #[error("invalid title pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

fn compile(pattern: &str) -> Result<Regex, FilterError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| FilterError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// Case-insensitive substring search over title, location and notes.
///
/// An empty or blank query matches everything.
pub fn matches_search(occurrence: &Occurrence, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    let haystacks = [
        Some(occurrence.title.as_str()),
        occurrence.location.as_deref(),
        occurrence.payload.notes.as_deref(),
    ];
    haystacks
        .into_iter()
        .flatten()
        .any(|text| text.to_lowercase().contains(&query))
}

/// Filter applied to an ordered occurrence list.
#[derive(Debug, Clone, Default)]
pub struct OccurrenceFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
    categories: Vec<String>,
    skip_all_day: bool,
    query: Option<String>,
    limit: Option<usize>,
}

impl OccurrenceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps only titles matching at least one of `patterns`.
    pub fn with_include_patterns<I, S>(mut self, patterns: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self.include.push(compile(pattern.as_ref())?);
        }
        Ok(self)
    }

    /// Drops titles matching any of `patterns`.
    pub fn with_exclude_patterns<I, S>(mut self, patterns: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self.exclude.push(compile(pattern.as_ref())?);
        }
        Ok(self)
    }

    /// Keeps only occurrences whose payload category is one of `categories`.
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories.extend(categories.into_iter().map(Into::into));
        self
    }

    pub fn with_skip_all_day(mut self, skip: bool) -> Self {
        self.skip_all_day = skip;
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Returns true if `occurrence` passes every predicate (limit aside).
    pub fn matches(&self, occurrence: &Occurrence) -> bool {
        if self.skip_all_day && !occurrence.is_timed() {
            return false;
        }
        if !self.include.is_empty()
            && !self.include.iter().any(|re| re.is_match(&occurrence.title))
        {
            return false;
        }
        if self.exclude.iter().any(|re| re.is_match(&occurrence.title)) {
            return false;
        }
        if !self.categories.is_empty() {
            let Some(category) = occurrence.payload.category.as_deref() else {
                return false;
            };
            if !self.categories.iter().any(|c| c == category) {
                return false;
            }
        }
        match &self.query {
            Some(query) => matches_search(occurrence, query),
            None => true,
        }
    }

    /// Filters `occurrences`, keeping order, then applies the limit.
    pub fn apply(&self, occurrences: Vec<Occurrence>) -> Vec<Occurrence> {
        let before = occurrences.len();
        let kept: Vec<Occurrence> = occurrences
            .into_iter()
            .filter(|occ| self.matches(occ))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect();
        debug!(before, after = kept.len(), "filtered occurrences");
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use chrono::{NaiveDate, NaiveTime};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn occ(title: &str) -> Occurrence {
        let event = Event::new(title, title, date(2024, 1, 1))
            .with_times(NaiveTime::from_hms_opt(9, 0, 0).unwrap(), None);
        Occurrence::from_master(&event, date(2024, 1, 1))
    }

    #[test]
    fn include_and_exclude() {
        let filter = OccurrenceFilter::new()
            .with_include_patterns(["standup", "review"])
            .unwrap()
            .with_exclude_patterns(["^skip"])
            .unwrap();

        assert!(filter.matches(&occ("Daily Standup")));
        assert!(filter.matches(&occ("Code review")));
        assert!(!filter.matches(&occ("Lunch")));
        assert!(!filter.matches(&occ("skip review")));
    }

    #[test]
    fn invalid_pattern() {
        let err = OccurrenceFilter::new()
            .with_include_patterns(["("])
            .unwrap_err();
        assert!(err.to_string().starts_with("invalid title pattern \"(\""));
    }

    #[test]
    fn skip_all_day_and_limit() {
        let mut holiday = occ("Holiday");
        holiday.all_day = true;
        let list = vec![holiday, occ("A"), occ("B"), occ("C")];

        let kept = OccurrenceFilter::new()
            .with_skip_all_day(true)
            .with_limit(Some(2))
            .apply(list);
        let titles: Vec<_> = kept.iter().map(|o| o.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn categories() {
        let mut work = occ("Standup");
        work.payload.category = Some("work".into());
        let mut gym = occ("Gym");
        gym.payload.category = Some("health".into());
        let plain = occ("Errand");

        let filter = OccurrenceFilter::new().with_categories(["work", "travel"]);
        assert!(filter.matches(&work));
        assert!(!filter.matches(&gym));
        assert!(!filter.matches(&plain));

        let titles: Vec<_> = OccurrenceFilter::new()
            .with_categories(["health"])
            .apply(vec![work, gym, plain])
            .into_iter()
            .map(|o| o.title)
            .collect();
        assert_eq!(titles, vec!["Gym"]);
    }

    #[test]
    fn search_covers_location_and_notes() {
        let mut o = occ("Sync");
        o.location = Some("Blue Room".into());
        o.payload.notes = Some("bring slides".into());

        assert!(matches_search(&o, "blue"));
        assert!(matches_search(&o, "SLIDES"));
        assert!(matches_search(&o, "  "));
        assert!(!matches_search(&o, "green"));

        let filter = OccurrenceFilter::new().with_query("room");
        assert!(filter.matches(&o));
    }
}
