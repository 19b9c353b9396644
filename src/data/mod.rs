/// Data layer: loading, schema normalisation, filtering and aggregation.
///
/// Nothing here depends on the UI, so a whole render cycle can be run and
/// tested on its own.
///
/// Architecture:
/// ```text
///  .csv / .tsv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  read file → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  schema   │  canonical names, logical fields, births → BirthTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  month ∧ gender ∧ state selections → filtered BirthTable
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  Σ births per (state, gender)
///   └───────────┘
/// ```
///
/// `pipeline` chains the stages into one render cycle.

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod schema;
