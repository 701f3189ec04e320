//! Monthly deforestation and air-quality data pipeline.
//!
//! Acquires two public raw feeds (an event-log CSV export and a station
//! dataset fetched through an external tool), normalizes both into monthly
//! series over a fixed analysis window, joins them on month starts, and
//! persists each series to its own SQLite store for downstream notebooks.

pub mod align;
pub mod analysis;
pub mod config;
pub mod dev_mode;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod pollutants;
pub mod retry;
pub mod store;
