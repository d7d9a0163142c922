/// Data layer: parsing, reduction, tabulation and output.
///
/// Architecture:
/// ```text
///  barfiber *.out / results *.txt / any whitespace table
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  split lines → columns, scans, ResultsTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  model    │  Cell, Category, Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐     ┌───────────┐
///   │  reduce   │ ──▶ │ tabulate   │  rows for each output file
///   └──────────┘     └───────────┘
///                          │
///                          ▼
///                    ┌──────────┐
///                    │  writer   │  tab-separated tables, error logs
///                    └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod reduce;
pub mod tabulate;
pub mod writer;
