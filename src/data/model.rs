use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::errors::ParseWarning;

use super::normalize::parse_date;

// ---------------------------------------------------------------------------
// Column names of the intake export
// ---------------------------------------------------------------------------

pub mod columns {
    pub const REQUEST_ID: &str = "Request ID";
    pub const REQUEST_NAME: &str = "Request Name";
    pub const REQUESTER: &str = "Requester";
    pub const CONTRACT_TYPE: &str = "Contract Type";
    pub const PRIORITY: &str = "Priority";
    pub const STATUS: &str = "Status";
    pub const ASSIGNED_COUNSEL: &str = "Assigned Counsel";
    pub const DATE_SUBMITTED: &str = "Date Submitted";
    pub const TARGET_COMPLETION: &str = "Target Completion Date";
    pub const ACTUAL_COMPLETION: &str = "Actual Completion Date";
    pub const TURNAROUND_DAYS: &str = "Turnaround Time (Days)";
}

/// Every column the intake export is expected to carry, in export order.
pub const EXPECTED_COLUMNS: [&str; 11] = [
    columns::REQUEST_ID,
    columns::REQUEST_NAME,
    columns::REQUESTER,
    columns::CONTRACT_TYPE,
    columns::PRIORITY,
    columns::STATUS,
    columns::ASSIGNED_COUNSEL,
    columns::DATE_SUBMITTED,
    columns::TARGET_COMPLETION,
    columns::ACTUAL_COMPLETION,
    columns::TURNAROUND_DAYS,
];

/// Free-text columns that filters and charts treat as categories.
pub const CATEGORICAL_COLUMNS: [&str; 4] = [
    columns::CONTRACT_TYPE,
    columns::PRIORITY,
    columns::STATUS,
    columns::ASSIGNED_COUNSEL,
];

/// One data row as read from the input: column name → raw cell text.
pub type RawFields = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Record – one intake request
// ---------------------------------------------------------------------------

/// A single intake request with its raw cells and the values derived from them.
///
/// Derived fields are either a validly parsed value or `None`; a record whose
/// submission date did not parse is kept but never passes a date filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// 1-based source line (CSV) or entry (JSON) number.
    pub line: u64,
    /// Raw cells, unchanged from the input.
    pub fields: RawFields,
    pub date_submitted: Option<NaiveDate>,
    pub turnaround_days: Option<f64>,
}

impl Record {
    /// Raw cell text, or `""` when the column is absent.
    pub fn field(&self, column: &str) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }

    /// Trimmed cell text, as used for category comparisons.
    pub fn category(&self, column: &str) -> &str {
        self.field(column).trim()
    }

    pub fn id(&self) -> &str {
        self.field(columns::REQUEST_ID)
    }

    pub fn name(&self) -> &str {
        self.field(columns::REQUEST_NAME)
    }

    pub fn requester(&self) -> &str {
        self.field(columns::REQUESTER)
    }

    pub fn contract_type(&self) -> &str {
        self.category(columns::CONTRACT_TYPE)
    }

    pub fn priority(&self) -> &str {
        self.category(columns::PRIORITY)
    }

    pub fn status(&self) -> &str {
        self.category(columns::STATUS)
    }

    pub fn assigned_counsel(&self) -> &str {
        self.category(columns::ASSIGNED_COUNSEL)
    }

    /// Target completion date, parsed on demand.
    pub fn target_completion(&self) -> Option<NaiveDate> {
        parse_date(self.field(columns::TARGET_COMPLETION))
    }

    /// Actual completion date, parsed on demand.
    pub fn actual_completion(&self) -> Option<NaiveDate> {
        parse_date(self.field(columns::ACTUAL_COMPLETION))
    }

    /// All cell values joined into one searchable text, one cell per line.
    pub fn search_text(&self) -> String {
        self.fields
            .values()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ---------------------------------------------------------------------------
// IntakeDataset – the complete loaded export
// ---------------------------------------------------------------------------

/// All records from one load, plus indices the filter panel needs.
#[derive(Debug, Clone, Default)]
pub struct IntakeDataset {
    pub records: Vec<Record>,
    /// Header names in file order.
    pub column_names: Vec<String>,
    /// For each categorical column, the sorted set of trimmed non-empty values.
    pub unique_values: BTreeMap<String, BTreeSet<String>>,
    /// Rows and fields that were skipped or could not be parsed.
    pub warnings: Vec<ParseWarning>,
}

impl IntakeDataset {
    /// Build category indices from normalised records.
    pub fn from_records(
        records: Vec<Record>,
        column_names: Vec<String>,
        warnings: Vec<ParseWarning>,
    ) -> Self {
        let mut unique_values: BTreeMap<String, BTreeSet<String>> = CATEGORICAL_COLUMNS
            .iter()
            .map(|col| (col.to_string(), BTreeSet::new()))
            .collect();

        for record in &records {
            for (col, values) in unique_values.iter_mut() {
                let value = record.category(col);
                if !value.is_empty() {
                    values.insert(value.to_string());
                }
            }
        }

        IntakeDataset {
            records,
            column_names,
            unique_values,
            warnings,
        }
    }

    /// Earliest and latest parsed submission dates, if any record has one.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.records.iter().filter_map(|r| r.date_submitted);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }

    /// Number of warnings that dropped a whole row.
    pub fn skipped_rows(&self) -> usize {
        self.warnings.iter().filter(|w| w.skipped_row()).count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
