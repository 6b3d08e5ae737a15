//! Analytics pipeline for legal intake request exports.
//!
//! `load → filter → aggregate / export`, each stage a plain function over
//! plain data so any front-end can drive it.

pub mod config;
pub mod data;
pub mod errors;
pub mod state;

pub use config::AnalyticsConfig;
pub use data::aggregate::{aggregate, AggregateReport, KpiBundle};
pub use data::export::export_csv;
pub use data::filter::{filter, FilterCriteria};
pub use data::loader::load_file;
pub use data::model::{IntakeDataset, Record};
pub use errors::{ConfigError, ExportError, InputError, ParseWarning};
