use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use touchpoint_dash::data::aggregate::{aggregate, AggregateReport, CategoryCount};
use touchpoint_dash::data::export::write_csv;
use touchpoint_dash::data::model::EXPECTED_COLUMNS;
use touchpoint_dash::state::DashboardState;
use touchpoint_dash::AnalyticsConfig;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "touchpoint-dash")]
#[command(about = "Summarise and export legal intake request exports")]
#[command(version)]
pub struct Cli {
    /// JSON file with analytics settings (urgent priorities, histogram bins)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print KPIs and chart tables for the filtered records
    Summary {
        /// Intake export (.csv, .tsv or .json)
        file: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the filtered records as quoted CSV
    Export {
        /// Intake export (.csv, .tsv or .json)
        file: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,

        /// Columns to write, in order (defaults to the standard intake columns)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Default)]
pub struct FilterArgs {
    /// First submission date to include (YYYY-MM-DD); defaults to the earliest
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last submission date to include (YYYY-MM-DD); defaults to the latest
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Allow only COLUMN=VALUE; repeat to allow several values
    #[arg(long = "only", value_name = "COLUMN=VALUE", value_parser = parse_allow)]
    pub allow: Vec<(String, String)>,

    /// Keep records mentioning any of these words (case-insensitive)
    #[arg(long = "keyword")]
    pub keywords: Vec<String>,
}

fn parse_allow(s: &str) -> Result<(String, String), String> {
    let (column, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected COLUMN=VALUE, got '{s}'"))?;
    if column.trim().is_empty() {
        return Err(format!("missing column name in '{s}'"));
    }
    Ok((column.trim().to_string(), value.trim().to_string()))
}

/// Collect `--only` pairs into one allow-set per column.
fn allow_sets(pairs: &[(String, String)]) -> BTreeMap<&str, BTreeSet<&str>> {
    let mut sets: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for (column, value) in pairs {
        sets.entry(column.as_str()).or_default().insert(value.as_str());
    }
    sets
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

pub fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => AnalyticsConfig::from_file(path)?,
        None => AnalyticsConfig::default(),
    };

    match cli.command {
        Command::Summary {
            file,
            filters,
            json,
        } => {
            let state = prepare(&file, &filters)?;
            // Overdue is relative to the day the report is produced.
            let today = Local::now().date_naive();
            let report = aggregate(&state.visible_records(), &config, today);
            if json {
                note_warnings(&state);
                let text = serde_json::to_string_pretty(&SummaryOutput::new(&report, &state))?;
                println!("{text}");
            } else {
                print_report(&report, &state)?;
            }
        }
        Command::Export {
            file,
            filters,
            columns,
            output,
        } => {
            let state = prepare(&file, &filters)?;
            let columns: Vec<String> = if columns.is_empty() {
                EXPECTED_COLUMNS.iter().map(|c| c.to_string()).collect()
            } else {
                columns
            };
            note_warnings(&state);
            let records = state.visible_records();
            match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("creating {}", path.display()))?;
                    write_csv(BufWriter::new(file), &records, &columns)?;
                    log::info!("Exported {} records to {}", records.len(), path.display());
                }
                None => write_csv(io::stdout().lock(), &records, &columns)?,
            }
        }
    }
    Ok(())
}

/// Load the file and apply command-line filters on top of the default view.
fn prepare(file: &Path, filters: &FilterArgs) -> Result<DashboardState> {
    let mut state = DashboardState::default();
    state.load(file)?;

    if filters.from.is_some() || filters.to.is_some() {
        let bounds = state.dataset.as_ref().and_then(|ds| ds.date_bounds());
        let (Some(start), Some(end)) = (
            filters.from.or(bounds.map(|b| b.0)),
            filters.to.or(bounds.map(|b| b.1)),
        ) else {
            bail!("no record has a submission date; pass both --from and --to");
        };
        state.set_date_range(start, end)?;
    }

    for (column, values) in allow_sets(&filters.allow) {
        state.set_allowed(column, values);
    }
    if !filters.keywords.is_empty() {
        state.set_keywords(&filters.keywords);
    }
    Ok(state)
}

/// Non-blocking notice about skipped rows and unparsed fields, kept off stdout.
fn note_warnings(state: &DashboardState) {
    if let Some(msg) = &state.status_message {
        eprintln!("Note: {msg}");
    }
}

// ---------------------------------------------------------------------------
// JSON report
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SummaryOutput<'a> {
    #[serde(flatten)]
    report: &'a AggregateReport,
    /// Rows skipped plus fields that did not parse.
    warnings: usize,
    skipped_rows: usize,
}

impl<'a> SummaryOutput<'a> {
    fn new(report: &'a AggregateReport, state: &DashboardState) -> Self {
        let (warnings, skipped_rows) = state
            .dataset
            .as_ref()
            .map(|ds| (ds.warnings.len(), ds.skipped_rows()))
            .unwrap_or((0, 0));
        Self {
            report,
            warnings,
            skipped_rows,
        }
    }
}

// ---------------------------------------------------------------------------
// Plain-text report
// ---------------------------------------------------------------------------

fn print_report(report: &AggregateReport, state: &DashboardState) -> Result<()> {
    let mut out = io::stdout().lock();
    let k = &report.kpis;

    writeln!(out, "Total requests       {}", k.total_count)?;
    writeln!(out, "Completed            {}", k.completed_count)?;
    writeln!(out, "On time              {:.0}%", k.on_time_percentage)?;
    writeln!(out, "Avg turnaround       {:.1} days", k.average_turnaround)?;
    writeln!(
        out,
        "Top contract type    {}",
        k.most_common_contract_type.as_deref().unwrap_or("(no data)")
    )?;
    writeln!(out, "Overdue              {}", k.overdue_count)?;
    writeln!(out, "Urgent               {}", k.urgent_count)?;

    print_counts(&mut out, "By contract type", &report.by_contract_type)?;
    print_counts(&mut out, "By priority", &report.by_priority)?;
    print_counts(&mut out, "By status", &report.by_status)?;
    print_counts(&mut out, "By counsel", &report.by_counsel)?;

    writeln!(out, "\nAvg turnaround by contract type")?;
    for (label, avg) in &report.turnaround_by_contract_type {
        writeln!(out, "  {label:<24} {avg:>6.1}")?;
    }

    writeln!(out, "\nTurnaround distribution")?;
    for bin in &report.turnaround_histogram {
        writeln!(out, "  {:<24} {:>6}", bin.label, bin.count)?;
    }

    if let Some(msg) = &state.status_message {
        writeln!(out, "\nNote: {msg}")?;
    }
    Ok(())
}

fn print_counts(out: &mut impl Write, title: &str, counts: &[CategoryCount]) -> Result<()> {
    writeln!(out, "\n{title}")?;
    if counts.is_empty() {
        writeln!(out, "  (no data)")?;
    }
    for c in counts {
        writeln!(out, "  {:<24} {:>6}", c.label, c.count)?;
    }
    Ok(())
}
