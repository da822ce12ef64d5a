/// Data layer: loading, normalisation, merging and statistics.
///
/// Architecture:
/// ```text
///  files / URLs (.json / .csv / .parquet)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  fetch each source → raw records (JSON via normalize)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  series   │  timestamp + fields per record → sorted SeriesSet
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  optional day range
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  stats    │  moving average, min / max / avg
///   └──────────┘
/// ```

pub mod fields;
pub mod filter;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod series;
pub mod stats;
pub mod timestamp;
