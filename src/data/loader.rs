use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use serde_json::Value as JsonValue;

use crate::errors::{InputError, ParseWarning};

use super::model::{IntakeDataset, RawFields, Record};
use super::normalize::normalize_row;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Raw rows read from an input, before any field parsing.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Header names in file order.
    pub headers: Vec<String>,
    /// Data rows as `(line, cells)`, in file order.
    pub rows: Vec<(u64, RawFields)>,
    pub warnings: Vec<ParseWarning>,
}

/// Input layouts the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Delimited text with a header row.
    Delimited(u8),
    /// `[{ "Request ID": "...", ... }, ...]`
    JsonRecords,
}

impl InputFormat {
    /// Pick a layout from the file extension; unknown extensions are comma-separated.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "json" => InputFormat::JsonRecords,
            "tsv" | "tab" => InputFormat::Delimited(b'\t'),
            _ => InputFormat::Delimited(b','),
        }
    }
}

/// Load and normalise an intake export from a file. Dispatch by extension.
pub fn load_file(path: &Path) -> Result<IntakeDataset, InputError> {
    let file = File::open(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => InputError::NotFound {
            path: path.to_path_buf(),
        },
        _ => InputError::Unreadable {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let dataset = load_reader(file, InputFormat::from_path(path))?;
    log::info!(
        "Loaded {} records from {} with columns {:?} ({} warnings)",
        dataset.len(),
        path.display(),
        dataset.column_names,
        dataset.warnings.len()
    );
    Ok(dataset)
}

/// Load and normalise an intake export from any reader.
pub fn load_reader<R: Read>(reader: R, format: InputFormat) -> Result<IntakeDataset, InputError> {
    let table = match format {
        InputFormat::Delimited(delimiter) => read_delimited(reader, delimiter)?,
        InputFormat::JsonRecords => read_json(reader)?,
    };
    Ok(normalize_table(table))
}

/// Run every raw row through the field normaliser, keeping file order.
pub fn normalize_table(table: RawTable) -> IntakeDataset {
    let RawTable {
        headers,
        rows,
        mut warnings,
    } = table;

    let mut records: Vec<Record> = Vec::with_capacity(rows.len());
    for (line, fields) in rows {
        let (record, field_warnings) = normalize_row(line, fields);
        warnings.extend(field_warnings);
        records.push(record);
    }
    // Row and field warnings come from separate passes; report them in file order.
    warnings.sort_by_key(warning_line);

    IntakeDataset::from_records(records, headers, warnings)
}

fn warning_line(warning: &ParseWarning) -> u64 {
    match warning {
        ParseWarning::MalformedRow { line, .. }
        | ParseWarning::UnreadableRow { line, .. }
        | ParseWarning::InvalidDate { line, .. }
        | ParseWarning::InvalidNumber { line, .. } => *line,
    }
}

// ---------------------------------------------------------------------------
// Delimited text reader
// ---------------------------------------------------------------------------

/// Header row required. A row with the wrong number of cells is skipped with a
/// warning; I/O failures abort the load.
pub fn read_delimited<R: Read>(reader: R, delimiter: u8) -> Result<RawTable, InputError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(InputError::MissingHeader);
    }

    let mut rows = Vec::new();
    let mut warnings = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1; used only when the reader has no position to report.
        let fallback_line = idx as u64 + 2;
        let record = match result {
            Ok(record) => record,
            Err(err) if err.is_io_error() => return Err(InputError::Csv(err)),
            Err(err) => {
                let line = err
                    .position()
                    .map(|p| p.line())
                    .unwrap_or(fallback_line);
                log::warn!("Skipping unreadable row at line {line}: {err}");
                warnings.push(ParseWarning::UnreadableRow {
                    line,
                    message: err.to_string(),
                });
                continue;
            }
        };

        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(fallback_line);

        if record.len() != headers.len() {
            log::warn!(
                "Skipping row at line {line}: {} fields, header has {}",
                record.len(),
                headers.len()
            );
            warnings.push(ParseWarning::MalformedRow {
                line,
                expected: headers.len(),
                found: record.len(),
            });
            continue;
        }

        let fields: RawFields = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        rows.push((line, fields));
    }

    Ok(RawTable {
        headers,
        rows,
        warnings,
    })
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented):
///
/// ```json
/// [
///   { "Request ID": "R-1", "Status": "Open", "Turnaround Time (Days)": 4 },
///   ...
/// ]
/// ```
///
/// Headers are the union of all entry keys. `null` cells become empty strings.
pub fn read_json<R: Read>(reader: R) -> Result<RawTable, InputError> {
    let root: JsonValue = serde_json::from_reader(reader)?;
    let entries = root.as_array().ok_or(InputError::UnsupportedJson)?;

    let mut headers: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(entries.len());
    let mut warnings = Vec::new();

    for (idx, entry) in entries.iter().enumerate() {
        let line = idx as u64 + 1;
        let Some(obj) = entry.as_object() else {
            log::warn!("Skipping JSON entry {line}: not an object");
            warnings.push(ParseWarning::UnreadableRow {
                line,
                message: "entry is not a JSON object".to_string(),
            });
            continue;
        };

        let mut fields = RawFields::new();
        for (key, val) in obj {
            let key = key.trim().to_string();
            if !headers.contains(&key) {
                headers.push(key.clone());
            }
            fields.insert(key, json_to_text(val));
        }
        rows.push((line, fields));
    }

    if headers.is_empty() && entries.is_empty() {
        return Err(InputError::MissingHeader);
    }

    Ok(RawTable {
        headers,
        rows,
        warnings,
    })
}

fn json_to_text(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chrono::NaiveDate;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::data::model::columns;

    const SAMPLE: &str = "\
Request ID,Request Name,Status,Date Submitted,Turnaround Time (Days)
R-1,NDA review,Completed,03/04/2025,5
R-2,MSA draft,Open
R-3,\"Lease, renewal\",Closed,2025-04-10,oops
";

    #[test]
    fn malformed_rows_are_skipped_with_a_warning() {
        let ds = load_reader(SAMPLE.as_bytes(), InputFormat::Delimited(b',')).unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].id(), "R-1");
        assert_eq!(ds.records[1].name(), "Lease, renewal");
        assert_eq!(
            ds.records[0].date_submitted,
            NaiveDate::from_ymd_opt(2025, 4, 3)
        );
        assert_eq!(ds.records[1].turnaround_days, None);

        assert_eq!(ds.warnings.len(), 2);
        assert_eq!(
            ds.warnings[0],
            ParseWarning::MalformedRow {
                line: 3,
                expected: 5,
                found: 3
            }
        );
        assert!(matches!(
            ds.warnings[1],
            ParseWarning::InvalidNumber { line: 4, .. }
        ));
        assert_eq!(ds.skipped_rows(), 1);
    }

    #[test]
    fn header_order_is_preserved() {
        let ds = load_reader(SAMPLE.as_bytes(), InputFormat::Delimited(b',')).unwrap();
        assert_eq!(ds.column_names[0], columns::REQUEST_ID);
        assert_eq!(ds.column_names[4], columns::TURNAROUND_DAYS);
    }

    #[test]
    fn empty_input_has_no_header() {
        let err = load_reader("".as_bytes(), InputFormat::Delimited(b',')).unwrap_err();
        assert!(matches!(err, InputError::MissingHeader));
    }

    #[test]
    fn missing_file_is_fatal() {
        let err = load_file(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, InputError::NotFound { .. }));
    }

    #[test]
    fn tsv_extension_switches_delimiter() {
        let mut file = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
        writeln!(file, "Request ID\tStatus").unwrap();
        writeln!(file, "R-9\tDone").unwrap();
        file.flush().unwrap();

        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records[0].status(), "Done");
    }

    #[test]
    fn csv_file_round_trips_from_disk() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        file.flush().unwrap();

        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn json_records_are_stringified() {
        let text = r#"[
            {"Request ID": "R-1", "Turnaround Time (Days)": 4, "Status": null},
            "not a row",
            {"Request ID": "R-2", "Priority": "High"}
        ]"#;
        let ds = load_reader(text.as_bytes(), InputFormat::JsonRecords).unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].turnaround_days, Some(4.0));
        assert_eq!(ds.records[0].status(), "");
        assert_eq!(ds.records[1].priority(), "High");
        assert!(ds.column_names.contains(&columns::PRIORITY.to_string()));
        assert!(matches!(
            ds.warnings[0],
            ParseWarning::UnreadableRow { line: 2, .. }
        ));
    }

    #[test]
    fn json_must_be_an_array() {
        let err = load_reader(r#"{"a": 1}"#.as_bytes(), InputFormat::JsonRecords).unwrap_err();
        assert!(matches!(err, InputError::UnsupportedJson));
    }
}
