use chrono::NaiveDate;

use crate::errors::ParseWarning;

use super::model::{columns, RawFields, Record};

/// Accepted date layouts, tried in this order. The first full match wins, so
/// `03/04/2025` is 3 April.
pub const DATE_FORMATS: [&str; 3] = ["%d/%m/%Y", "%Y-%m-%d", "%m/%d/%Y"];

/// Parse a free-text date. Empty or unrecognised input yields `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if !has_date_shape(s) {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// `YYYY-M-D`, `D/M/YYYY` or `M/D/YYYY`: ASCII digits only, four-digit year,
/// one or two digits for day and month. chrono alone would also take short
/// years, signs and padding spaces.
fn has_date_shape(s: &str) -> bool {
    let (sep, widths) = if s.contains('-') {
        ('-', [4..=4, 1..=2, 1..=2])
    } else {
        ('/', [1..=2, 1..=2, 4..=4])
    };
    let parts: Vec<&str> = s.split(sep).collect();
    parts.len() == 3
        && parts.iter().zip(widths).all(|(part, width)| {
            width.contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit())
        })
}

/// Parse a free-text real number. Empty or non-numeric input yields `None`.
///
/// Values are not clamped; a negative turnaround passes through unchanged.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Attach derived values to one raw row.
///
/// Never fails: a cell that does not parse becomes `None` and, if it was not
/// blank, produces a warning.
pub fn normalize_row(line: u64, fields: RawFields) -> (Record, Vec<ParseWarning>) {
    let mut warnings = Vec::new();

    let date_raw = fields
        .get(columns::DATE_SUBMITTED)
        .map(String::as_str)
        .unwrap_or("");
    let date_submitted = parse_date(date_raw);
    if date_submitted.is_none() && !date_raw.trim().is_empty() {
        log::debug!("line {line}: unparseable submission date '{date_raw}'");
        warnings.push(ParseWarning::InvalidDate {
            line,
            column: columns::DATE_SUBMITTED.to_string(),
            value: date_raw.to_string(),
        });
    }

    let turnaround_raw = fields
        .get(columns::TURNAROUND_DAYS)
        .map(String::as_str)
        .unwrap_or("");
    let turnaround_days = parse_number(turnaround_raw);
    if turnaround_days.is_none() && !turnaround_raw.trim().is_empty() {
        log::debug!("line {line}: unparseable turnaround '{turnaround_raw}'");
        warnings.push(ParseWarning::InvalidNumber {
            line,
            column: columns::TURNAROUND_DAYS.to_string(),
            value: turnaround_raw.to_string(),
        });
    }

    let record = Record {
        line,
        fields,
        date_submitted,
        turnaround_days,
    };
    (record, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn day_month_year_wins_on_ambiguous_dates() {
        assert_eq!(parse_date("03/04/2025"), ymd(2025, 4, 3));
        assert_eq!(parse_date("01/02/2025"), ymd(2025, 2, 1));
    }

    #[test]
    fn iso_and_month_first_are_fallbacks() {
        assert_eq!(parse_date("2025-03-04"), ymd(2025, 3, 4));
        // 25 cannot be a month, so only month/day/year matches.
        assert_eq!(parse_date("12/25/2025"), ymd(2025, 12, 25));
        assert_eq!(parse_date("  2025-01-31 "), ymd(2025, 1, 31));
    }

    #[test]
    fn bad_dates_are_absent() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("   "), None);
        assert_eq!(parse_date("next week"), None);
        assert_eq!(parse_date("31/02/2025"), None);
        assert_eq!(parse_date("2025-01-01 extra"), None);
    }

    #[test]
    fn only_four_digit_years_without_padding_are_dates() {
        assert_eq!(parse_date("01/02/25"), None);
        assert_eq!(parse_date("25-01-01"), None);
        assert_eq!(parse_date("+2025-01-01"), None);
        assert_eq!(parse_date("03/ 4/2025"), None);
        assert_eq!(parse_date("2025/01/01"), None);
        assert_eq!(parse_date("12025-01-01"), None);
        assert_eq!(parse_date("3/4/2025"), ymd(2025, 4, 3));
    }

    #[test]
    fn numbers_parse_without_clamping() {
        assert_eq!(parse_number(" 5 "), Some(5.0));
        assert_eq!(parse_number("7.5"), Some(7.5));
        assert_eq!(parse_number("-2"), Some(-2.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn normalize_keeps_raw_cells_and_reports_bad_fields() {
        let fields: RawFields = [
            (columns::DATE_SUBMITTED, "soon"),
            (columns::TURNAROUND_DAYS, "three"),
            (columns::STATUS, "Open"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let (record, warnings) = normalize_row(4, fields.clone());
        assert_eq!(record.fields, fields);
        assert_eq!(record.date_submitted, None);
        assert_eq!(record.turnaround_days, None);
        assert_eq!(warnings.len(), 2);
        assert!(matches!(warnings[0], ParseWarning::InvalidDate { line: 4, .. }));
        assert!(matches!(warnings[1], ParseWarning::InvalidNumber { line: 4, .. }));
    }

    #[test]
    fn blank_fields_are_absent_without_warnings() {
        let (record, warnings) = normalize_row(2, RawFields::new());
        assert_eq!(record.date_submitted, None);
        assert_eq!(record.turnaround_days, None);
        assert!(warnings.is_empty());
    }
}
