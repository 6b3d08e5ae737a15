use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::data::filter::{filtered_indices, DateRange, FilterCriteria};
use crate::data::loader::load_file;
use crate::data::model::{IntakeDataset, Record};

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

/// The full view state a front-end drives, independent of rendering.
#[derive(Default)]
pub struct DashboardState {
    /// Loaded dataset (None until a file is loaded).
    pub dataset: Option<IntakeDataset>,

    /// File the dataset came from, kept for reloads.
    pub source: Option<PathBuf>,

    /// Active filter. None when the dataset has no dated records.
    pub criteria: Option<FilterCriteria>,

    /// Indices of records passing the current filter (cached).
    pub visible_indices: Vec<usize>,

    /// Status / error message for the front-end.
    pub status_message: Option<String>,
}

impl DashboardState {
    /// Load `path` and replace the current dataset. On failure the previous
    /// dataset is kept and the error is recorded in `status_message`.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        match load_file(path) {
            Ok(dataset) => {
                self.source = Some(path.to_path_buf());
                self.set_dataset(dataset);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
                Err(e).with_context(|| format!("loading {}", path.display()))
            }
        }
    }

    /// Re-run the whole pipeline from the last source file and swap the
    /// result in. Filters are reset to span the new data.
    pub fn reload(&mut self) -> Result<()> {
        let path = self
            .source
            .clone()
            .context("nothing loaded yet, cannot reload")?;
        self.load(&path)
    }

    /// Ingest a newly loaded dataset and reset the filter to show everything dated.
    pub fn set_dataset(&mut self, dataset: IntakeDataset) {
        self.criteria = FilterCriteria::spanning(&dataset);
        if self.criteria.is_none() {
            log::warn!("No record has a parseable submission date; nothing is visible");
        }

        self.status_message = match dataset.warnings.len() {
            0 => None,
            n => Some(format!(
                "{n} items could not be parsed ({} rows skipped)",
                dataset.skipped_rows()
            )),
        };
        self.dataset = Some(dataset);
        self.refilter();
    }

    /// Recompute `visible_indices` after a filter change.
    pub fn refilter(&mut self) {
        self.visible_indices = match (&self.dataset, &self.criteria) {
            (Some(ds), Some(criteria)) => filtered_indices(&ds.records, criteria),
            _ => Vec::new(),
        };
    }

    /// Replace the date range. Other constraints are kept.
    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) -> Result<()> {
        let range = DateRange::new(start, end)?;
        match &mut self.criteria {
            Some(criteria) => criteria.date_range = range,
            None => self.criteria = Some(FilterCriteria::from_range(range)),
        }
        self.refilter();
        Ok(())
    }

    /// Toggle a single value in a column's allow-set.
    pub fn toggle_filter_value(&mut self, column: &str, value: &str) {
        let Some(criteria) = &mut self.criteria else {
            return;
        };
        let selected = criteria.categories.entry(column.to_string()).or_default();
        let value = value.trim();
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        self.refilter();
    }

    /// Replace a column's allow-set. Repeated values collapse into one entry.
    pub fn set_allowed<I, S>(&mut self, column: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(criteria) = &mut self.criteria {
            criteria.set_allowed(column, values);
        }
        self.refilter();
    }

    /// Lift the restriction on a column (an empty allow-set shows every value).
    pub fn clear_filter(&mut self, column: &str) {
        if let Some(criteria) = &mut self.criteria {
            criteria.categories.remove(column);
        }
        self.refilter();
    }

    pub fn set_keywords(&mut self, keywords: &[String]) {
        if let Some(criteria) = &mut self.criteria {
            criteria.set_keywords(keywords);
        }
        self.refilter();
    }

    /// Records passing the current filter, in file order.
    pub fn visible_records(&self) -> Vec<Record> {
        match &self.dataset {
            Some(ds) => self
                .visible_indices
                .iter()
                .map(|&i| ds.records[i].clone())
                .collect(),
            None => Vec::new(),
        }
    }
}
