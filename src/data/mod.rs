/// Data layer: record types, record → table conversion, and file loading.
///
/// Architecture:
/// ```text
///  {"data": [...]}        .json / .csv / .parquet
///        │                        │
///        ▼                        ▼
///   ┌──────────┐            ┌──────────┐
///   │ convert  │ ◄───────── │  loader  │
///   └──────────┘            └──────────┘
///        │
///        ▼
///   ┌──────────────────────┐
///   │ Table (arrow batch)  │  rows × typed, named columns
///   └──────────────────────┘
/// ```

pub mod convert;
pub mod loader;
pub mod model;

pub use convert::records_to_table;
pub use model::{CellValue, Record, Table};
