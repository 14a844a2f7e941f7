/// Data layer: core types, fixture contract, loading, writing and row selection.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Matrix / ColumnLabels
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ ReactiveFlow  │  state + labels + mesh + fluid, checked against schema
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  apply column-range predicates → selected rows
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod schema;
pub mod writer;
