use std::io;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Fatal failure to read an input file. The pipeline stops here.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("input file '{}' does not exist", path.display())]
    NotFound { path: PathBuf },
    #[error("input file '{}' could not be read: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("input has no header row")]
    MissingHeader,
    #[error("failed to read delimited input: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to parse JSON input: {0}")]
    Json(#[from] serde_json::Error),
    #[error("JSON input must be a top-level array of objects")]
    UnsupportedJson,
}

/// Invalid caller-supplied settings, rejected before any filtering happens.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("date range start {start} is after end {end}")]
    InvertedDateRange { start: NaiveDate, end: NaiveDate },
    #[error("histogram bins must be at least two strictly increasing finite edges, got {0:?}")]
    InvalidHistogramBins(Vec<f64>),
    #[error("config file '{}' could not be read: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("config file '{}' is not valid: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure while serialising records back to delimited text.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write delimited output: {0}")]
    Csv(#[from] csv::Error),
    #[error("export buffer was not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("export buffer could not be flushed: {0}")]
    Io(#[from] io::Error),
}

/// A row or field that could not be used. Recorded and skipped, never raised.
///
/// `line` is the 1-based line (CSV) or entry (JSON) number in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseWarning {
    #[error("line {line}: expected {expected} fields, found {found}; row skipped")]
    MalformedRow {
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: {message}; row skipped")]
    UnreadableRow { line: u64, message: String },
    #[error("line {line}: '{value}' in '{column}' is not a recognised date")]
    InvalidDate {
        line: u64,
        column: String,
        value: String,
    },
    #[error("line {line}: '{value}' in '{column}' is not a number")]
    InvalidNumber {
        line: u64,
        column: String,
        value: String,
    },
}

impl ParseWarning {
    /// Whether the whole row was dropped (as opposed to a single field).
    pub fn skipped_row(&self) -> bool {
        matches!(
            self,
            ParseWarning::MalformedRow { .. } | ParseWarning::UnreadableRow { .. }
        )
    }
}
