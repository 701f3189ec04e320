/// Normalization of raw feeds onto the monthly calendar.
///
/// Each submodule owns one raw table end to end: it loads the delimited
/// text, applies the per-source cleaning rules, and produces an ordered
/// monthly series. Raw records are not retained after the series is built.
///
/// Submodules:
/// - `deforestation`: event-log filtering, monthly totals, gap interpolation.
/// - `pollution`: column mapping, two-stage mean aggregation, zero-fill.

use std::fmt;

pub mod deforestation;
pub mod pollution;

/// Numeric coercion for delimited-text fields. Empty cells, `null`
/// markers, and garbage all become missing rather than zero or an error;
/// non-finite parses (`nan`, `inf`) are missing too.
pub fn coerce_numeric(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Round to 2 fractional digits, the precision of every persisted value.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Load errors
// ---------------------------------------------------------------------------

/// Errors raised while loading a raw CSV into records. Unlike per-record
/// parse problems (recovered by dropping the row), these mean the file
/// itself is unusable and the run cannot proceed to persistence.
#[derive(Debug)]
pub enum LoadError {
    Csv(String),
    MissingColumn(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Csv(msg) => write!(f, "CSV error: {}", msg),
            LoadError::MissingColumn(name) => {
                write!(f, "required column '{}' not found in input", name)
            }
        }
    }
}

impl std::error::Error for LoadError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
