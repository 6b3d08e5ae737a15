use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::errors::ConfigError;

/// Tunables for the aggregation step.
///
/// Loaded from an optional JSON file; every field has a default, so `{}` is a
/// valid config.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Priority labels counted as urgent (exact, trimmed match).
    #[serde(deserialize_with = "trimmed_labels")]
    pub urgent_priorities: BTreeSet<String>,
    /// Turnaround histogram edges in days; bin `i` is `[edges[i], edges[i + 1])`.
    pub histogram_bins: Vec<f64>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            urgent_priorities: ["High", "Urgent"].iter().map(|s| s.to_string()).collect(),
            histogram_bins: vec![0.0, 3.0, 7.0, 14.0, 30.0],
        }
    }
}

/// Labels are compared against trimmed cells, so trim them too and drop blanks.
fn trimmed_labels<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<String>::deserialize(deserializer)?;
    Ok(raw
        .iter()
        .map(|label| label.trim())
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect())
}

impl AnalyticsConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        log::debug!("Loaded analytics config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bins = &self.histogram_bins;
        let increasing = bins.windows(2).all(|w| w[0] < w[1]);
        if bins.len() < 2 || !increasing || bins.iter().any(|b| !b.is_finite()) {
            return Err(ConfigError::InvalidHistogramBins(bins.clone()));
        }
        Ok(())
    }
}
