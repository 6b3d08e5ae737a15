use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::errors::ConfigError;

use super::model::{IntakeDataset, Record};

// ---------------------------------------------------------------------------
// Filter criteria
// ---------------------------------------------------------------------------

/// Inclusive submission-date interval. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ConfigError> {
        if start > end {
            return Err(ConfigError::InvertedDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Per-column allow-sets: column name → allowed trimmed values.
/// If a column is absent or its set is empty, it means "no filter" (show all).
pub type CategoryFilter = BTreeMap<String, BTreeSet<String>>;

/// Everything a record must satisfy to stay visible.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub date_range: DateRange,
    pub categories: CategoryFilter,
    /// Lower-cased, non-blank keywords. Empty means no keyword constraint.
    keywords: BTreeSet<String>,
}

impl FilterCriteria {
    /// Criteria with only a date range; fails if `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ConfigError> {
        Ok(Self::from_range(DateRange::new(start, end)?))
    }

    pub fn from_range(date_range: DateRange) -> Self {
        Self {
            date_range,
            categories: CategoryFilter::new(),
            keywords: BTreeSet::new(),
        }
    }

    /// Criteria covering the dataset's full date span with no other constraint.
    /// `None` when no record has a parseable submission date.
    pub fn spanning(dataset: &IntakeDataset) -> Option<Self> {
        let (start, end) = dataset.date_bounds()?;
        Some(Self::from_range(DateRange { start, end }))
    }

    /// Restrict `column` to `values`. An empty iterator lifts the restriction.
    pub fn with_allowed<I, S>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_allowed(column, values);
        self
    }

    pub fn set_allowed<I, S>(&mut self, column: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed: BTreeSet<String> = values
            .into_iter()
            .map(|v| v.into().trim().to_string())
            .collect();
        self.categories.insert(column.to_string(), allowed);
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.set_keywords(keywords);
        self
    }

    pub fn set_keywords<I, S>(&mut self, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
    }

    pub fn keywords(&self) -> &BTreeSet<String> {
        &self.keywords
    }

    // -- Predicates. All three are conjunctive, so their order is free. --

    /// The record has a submission date inside the range.
    pub fn passes_date(&self, record: &Record) -> bool {
        record
            .date_submitted
            .is_some_and(|d| self.date_range.contains(d))
    }

    /// Every non-empty allow-set contains the record's trimmed value.
    pub fn passes_categories(&self, record: &Record) -> bool {
        self.categories
            .iter()
            .filter(|(_, allowed)| !allowed.is_empty())
            .all(|(col, allowed)| allowed.contains(record.category(col)))
    }

    /// At least one keyword occurs in the record text, ignoring case.
    pub fn passes_keywords(&self, record: &Record) -> bool {
        if self.keywords.is_empty() {
            return true;
        }
        let text = record.search_text().to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.passes_date(record) && self.passes_categories(record) && self.passes_keywords(record)
    }
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Return indices of records that pass all criteria, in input order.
pub fn filtered_indices(records: &[Record], criteria: &FilterCriteria) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| criteria.matches(r))
        .map(|(i, _)| i)
        .collect()
}

/// Return the records that pass all criteria. The input is left untouched.
pub fn filter(records: &[Record], criteria: &FilterCriteria) -> Vec<Record> {
    records
        .iter()
        .filter(|r| criteria.matches(r))
        .cloned()
        .collect()
}
