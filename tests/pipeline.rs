use std::collections::BTreeSet;
use std::io::Write;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

use touchpoint_dash::data::loader::{load_reader, InputFormat};
use touchpoint_dash::data::model::{columns, EXPECTED_COLUMNS};
use touchpoint_dash::{
    aggregate, export_csv, filter, load_file, AnalyticsConfig, FilterCriteria, InputError,
    ParseWarning, Record,
};

const INTAKE: &str = "\
Request ID,Request Name,Requester,Contract Type,Priority,Status,Assigned Counsel,Date Submitted,Target Completion Date,Actual Completion Date,Turnaround Time (Days)
REQ-1,Acme NDA,Sales,NDA,High,Completed,M. Chen,03/04/2025,10/04/2025,08/04/2025,5
REQ-2,\"Vendor \"\"Gold\"\" MSA\",Procurement,MSA,Low,Open,J. Okafor,2025-04-05,2025-04-20,,10
REQ-3,Office lease,Operations,Lease,Urgent,Closed,M. Chen,04/20/2025,2025-05-01,2025-04-27,7
REQ-4,Broken row,HR
REQ-5,Undated,HR,NDA,High,Open,S. Patel,someday,,,abc
";

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn write_temp(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn ids(records: &[Record]) -> Vec<&str> {
    records.iter().map(Record::id).collect()
}

#[test]
fn load_keeps_undated_rows_and_reports_problems() {
    let file = write_temp(INTAKE);
    let ds = load_file(file.path()).unwrap();

    assert_eq!(ids(&ds.records), vec!["REQ-1", "REQ-2", "REQ-3", "REQ-5"]);
    assert_eq!(ds.records[0].date_submitted, Some(ymd(2025, 4, 3)));
    assert_eq!(ds.records[2].date_submitted, Some(ymd(2025, 4, 20)));
    assert_eq!(ds.records[3].date_submitted, None);
    assert_eq!(ds.date_bounds(), Some((ymd(2025, 4, 3), ymd(2025, 4, 20))));

    assert_eq!(ds.warnings.len(), 3);
    assert!(matches!(ds.warnings[0], ParseWarning::MalformedRow { line: 5, .. }));
    assert!(matches!(ds.warnings[1], ParseWarning::InvalidDate { line: 6, .. }));
    assert!(matches!(ds.warnings[2], ParseWarning::InvalidNumber { line: 6, .. }));
}

#[test]
fn filtered_summary_end_to_end() {
    let file = write_temp(INTAKE);
    let ds = load_file(file.path()).unwrap();
    let criteria = FilterCriteria::spanning(&ds).unwrap();
    let visible = filter(&ds.records, &criteria);
    assert_eq!(ids(&visible), vec!["REQ-1", "REQ-2", "REQ-3"]);

    let report = aggregate(&visible, &AnalyticsConfig::default(), ymd(2025, 4, 20));
    let k = &report.kpis;
    assert_eq!(k.total_count, 3);
    assert_eq!(k.completed_count, 2);
    assert_eq!(k.on_time_count, 2);
    assert!((k.on_time_percentage - 100.0).abs() < 1e-9);
    assert!((k.average_turnaround - 22.0 / 3.0).abs() < 1e-9);
    // MSA, NDA and Lease each appear once; Lease sorts first.
    assert_eq!(k.most_common_contract_type.as_deref(), Some("Lease"));
    assert_eq!(k.overdue_count, 0);
    assert_eq!(k.urgent_count, 2);

    // REQ-2 is still open and its target (20 April) has now passed.
    let later = aggregate(&visible, &AnalyticsConfig::default(), ymd(2025, 4, 21));
    assert_eq!(later.kpis.overdue_count, 1);

    let counsel: Vec<(&str, usize)> = report
        .by_counsel
        .iter()
        .map(|c| (c.label.as_str(), c.count))
        .collect();
    assert_eq!(counsel, vec![("M. Chen", 2), ("J. Okafor", 1)]);
    assert!((report.turnaround_by_counsel["M. Chen"] - 6.0).abs() < 1e-9);
    assert_eq!(report.submissions_per_day.len(), 3);
}

#[test]
fn allow_sets_and_keywords_combine() {
    let file = write_temp(INTAKE);
    let ds = load_file(file.path()).unwrap();
    let base = FilterCriteria::new(ymd(2025, 1, 1), ymd(2025, 12, 31)).unwrap();

    let unrestricted = base.clone().with_allowed(columns::PRIORITY, BTreeSet::<String>::new());
    assert_eq!(ids(&filter(&ds.records, &unrestricted)).len(), 3);

    let high = base.clone().with_allowed(columns::PRIORITY, ["High"]);
    assert_eq!(ids(&filter(&ds.records, &high)), vec!["REQ-1"]);

    let gold = base.with_keywords(["gold"]);
    assert_eq!(ids(&filter(&ds.records, &gold)), vec!["REQ-2"]);
}

#[test]
fn export_then_reload_reproduces_the_cells() {
    let ds = load_reader(INTAKE.as_bytes(), InputFormat::Delimited(b',')).unwrap();
    let criteria = FilterCriteria::spanning(&ds).unwrap();
    let visible = filter(&ds.records, &criteria);

    let text = export_csv(&visible, &EXPECTED_COLUMNS).unwrap();
    assert!(text.starts_with("\"Request ID\",\"Request Name\""));
    assert!(text.contains("\"Vendor \"\"Gold\"\" MSA\""));

    let reloaded = load_reader(text.as_bytes(), InputFormat::Delimited(b',')).unwrap();
    assert!(reloaded.warnings.is_empty());
    assert_eq!(reloaded.len(), visible.len());
    for (before, after) in visible.iter().zip(&reloaded.records) {
        for col in EXPECTED_COLUMNS {
            assert_eq!(before.field(col), after.field(col), "column {col}");
        }
        assert_eq!(before.date_submitted, after.date_submitted);
        assert_eq!(before.turnaround_days, after.turnaround_days);
    }
}

#[test]
fn header_only_file_loads_empty() {
    let file = write_temp("Request ID,Status\n");
    let ds = load_file(file.path()).unwrap();
    assert!(ds.is_empty());
    assert!(FilterCriteria::spanning(&ds).is_none());
}

#[test]
fn empty_file_is_an_input_error() {
    let file = write_temp("");
    assert!(matches!(
        load_file(file.path()),
        Err(InputError::MissingHeader)
    ));
}
