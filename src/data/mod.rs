/// Data layer: core types, loading, normalising, filtering, aggregation and export.
///
/// Architecture:
/// ```text
///  .csv / .tsv / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  header + rows → raw cell maps (bad rows → warnings)
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ normalize  │  parse dates / turnaround → Record, IntakeDataset
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  date range ∧ allow-sets ∧ keywords → records
///   └──────────┘
///        │
///        ├──────────────┐
///        ▼              ▼
///   ┌───────────┐  ┌──────────┐
///   │ aggregate  │  │  export   │
///   └───────────┘  └──────────┘
/// ```

pub mod aggregate;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod normalize;
