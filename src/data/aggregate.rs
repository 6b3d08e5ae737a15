use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::AnalyticsConfig;

use super::model::{columns, Record};

/// Status values (case-folded, trimmed) that count as completed.
pub const COMPLETED_STATUSES: [&str; 3] = ["completed", "done", "closed"];

/// A completed request is on time when its turnaround is at most this many days.
pub const ON_TIME_THRESHOLD_DAYS: f64 = 7.0;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Headline numbers for a record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiBundle {
    pub total_count: usize,
    pub completed_count: usize,
    pub on_time_count: usize,
    /// Mean of every present turnaround in the set, `0` when there is none.
    pub average_turnaround: f64,
    /// On-time share of completed requests, `0..=100`, `0` when none completed.
    pub on_time_percentage: f64,
    /// `None` when no record has a contract type.
    pub most_common_contract_type: Option<String>,
    /// Depends on the evaluation date, not only on the data.
    pub overdue_count: usize,
    pub urgent_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateCount {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub label: String,
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Everything a dashboard needs to draw one view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    pub kpis: KpiBundle,
    pub by_contract_type: Vec<CategoryCount>,
    pub by_priority: Vec<CategoryCount>,
    pub by_status: Vec<CategoryCount>,
    pub by_counsel: Vec<CategoryCount>,
    pub submissions_per_day: Vec<DateCount>,
    pub turnaround_by_contract_type: BTreeMap<String, f64>,
    pub turnaround_by_counsel: BTreeMap<String, f64>,
    pub turnaround_histogram: Vec<HistogramBin>,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

pub fn is_completed(record: &Record) -> bool {
    let status = record.status().to_lowercase();
    COMPLETED_STATUSES.contains(&status.as_str())
}

pub fn is_on_time(record: &Record) -> bool {
    is_completed(record)
        && record
            .turnaround_days
            .is_some_and(|t| t <= ON_TIME_THRESHOLD_DAYS)
}

/// Not completed, has a target date, and that date is before `today`.
pub fn is_overdue(record: &Record, today: NaiveDate) -> bool {
    !is_completed(record) && record.target_completion().is_some_and(|t| t < today)
}

// ---------------------------------------------------------------------------
// Scalar statistics
// ---------------------------------------------------------------------------

fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Mean turnaround over all records with a value, completed or not.
pub fn average_turnaround(records: &[Record]) -> f64 {
    mean(records.iter().filter_map(|r| r.turnaround_days))
}

/// Share of completed records that were on time, as a percentage.
pub fn on_time_percentage(records: &[Record]) -> f64 {
    let completed = records.iter().filter(|r| is_completed(r)).count();
    if completed == 0 {
        return 0.0;
    }
    let on_time = records.iter().filter(|r| is_on_time(r)).count();
    on_time as f64 / completed as f64 * 100.0
}

pub fn overdue_count(records: &[Record], today: NaiveDate) -> usize {
    records.iter().filter(|r| is_overdue(r, today)).count()
}

/// Highest count wins; ties go to the lexicographically smallest label.
pub fn most_common_label(counts: &BTreeMap<String, usize>) -> Option<String> {
    let mut best: Option<(&String, usize)> = None;
    // BTreeMap iterates in ascending label order, so only a strictly higher
    // count may replace the current best.
    for (label, &count) in counts {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label.clone())
}

pub fn most_common(records: &[Record], column: &str) -> Option<String> {
    most_common_label(&category_counts(records, column))
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Frequency of each trimmed, non-empty value of `column`.
pub fn category_counts(records: &[Record], column: &str) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        let value = record.category(column);
        if !value.is_empty() {
            *counts.entry(value.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

/// Display order: count descending, then label ascending.
pub fn ranked_counts(counts: &BTreeMap<String, usize>) -> Vec<CategoryCount> {
    let mut ranked: Vec<CategoryCount> = counts
        .iter()
        .map(|(label, &count)| CategoryCount {
            label: label.clone(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    ranked
}

/// Submissions per parsed date, oldest first. Undated records are left out.
pub fn date_counts(records: &[Record]) -> Vec<DateCount> {
    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for date in records.iter().filter_map(|r| r.date_submitted) {
        *counts.entry(date).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(date, count)| DateCount { date, count })
        .collect()
}

/// Mean turnaround per value of `column`. A group with no turnaround reports `0`.
pub fn average_turnaround_by(records: &[Record], column: &str) -> BTreeMap<String, f64> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for record in records {
        let key = record.category(column);
        if key.is_empty() {
            continue;
        }
        let values = groups.entry(key.to_string()).or_default();
        if let Some(t) = record.turnaround_days {
            values.push(t);
        }
    }
    groups
        .into_iter()
        .map(|(key, values)| (key, mean(values)))
        .collect()
}

/// Count present turnarounds into `[edges[i], edges[i + 1])` bins.
/// Values outside every bin are not counted.
pub fn turnaround_histogram(records: &[Record], edges: &[f64]) -> Vec<HistogramBin> {
    let mut bins: Vec<HistogramBin> = edges
        .windows(2)
        .map(|w| HistogramBin {
            label: format!("{}-{} days", w[0], w[1]),
            lower: w[0],
            upper: w[1],
            count: 0,
        })
        .collect();

    for t in records.iter().filter_map(|r| r.turnaround_days) {
        if let Some(bin) = bins.iter_mut().find(|b| b.lower <= t && t < b.upper) {
            bin.count += 1;
        }
    }
    bins
}

// ---------------------------------------------------------------------------
// Bundles
// ---------------------------------------------------------------------------

pub fn kpis(records: &[Record], config: &AnalyticsConfig, today: NaiveDate) -> KpiBundle {
    KpiBundle {
        total_count: records.len(),
        completed_count: records.iter().filter(|r| is_completed(r)).count(),
        on_time_count: records.iter().filter(|r| is_on_time(r)).count(),
        average_turnaround: average_turnaround(records),
        on_time_percentage: on_time_percentage(records),
        most_common_contract_type: most_common(records, columns::CONTRACT_TYPE),
        overdue_count: overdue_count(records, today),
        urgent_count: records
            .iter()
            .filter(|r| config.urgent_priorities.contains(r.priority()))
            .count(),
    }
}

/// Compute the KPIs and every chart table for `records`, evaluated as of `today`.
pub fn aggregate(records: &[Record], config: &AnalyticsConfig, today: NaiveDate) -> AggregateReport {
    AggregateReport {
        kpis: kpis(records, config, today),
        by_contract_type: ranked_counts(&category_counts(records, columns::CONTRACT_TYPE)),
        by_priority: ranked_counts(&category_counts(records, columns::PRIORITY)),
        by_status: ranked_counts(&category_counts(records, columns::STATUS)),
        by_counsel: ranked_counts(&category_counts(records, columns::ASSIGNED_COUNSEL)),
        submissions_per_day: date_counts(records),
        turnaround_by_contract_type: average_turnaround_by(records, columns::CONTRACT_TYPE),
        turnaround_by_counsel: average_turnaround_by(records, columns::ASSIGNED_COUNSEL),
        turnaround_histogram: turnaround_histogram(records, &config.histogram_bins),
    }
}
