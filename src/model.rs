/// Core data types for the deforestation / air-quality pipeline.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O and no external services, only types plus the
/// calendar-month arithmetic and analysis-window constants that both
/// normalizers must share.

use std::fmt;
use std::path::PathBuf;

use chrono::{Datelike, NaiveDate};

// ---------------------------------------------------------------------------
// Timestamp formats
// ---------------------------------------------------------------------------

/// Timestamp format of the raw deforestation event log, e.g.
/// `2016/03/14 00:00:00+00`. The `%#z` specifier accepts the hour-only
/// UTC offset that the upstream export emits.
pub const DEFORESTATION_TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S%#z";

/// Timestamp format of the raw air-quality feed, e.g. `2016-03-14 13:00:00`.
/// Naive local time; the feed carries no offset.
pub const POLLUTION_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Event-type tag of the primary deforestation category. Rows carrying any
/// other tag (e.g. degradation) are excluded entirely, never merged.
pub const PRIMARY_EVENT_TYPE: &str = "deforestation";

// ---------------------------------------------------------------------------
// Calendar months
// ---------------------------------------------------------------------------

/// A calendar month, the unit both series are normalized onto.
///
/// Ordered chronologically via the derived lexicographic order over
/// (year, month). The month-start date from [`YearMonth::first_day`] is the
/// join key for alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    /// 1-based month, always in `1..=12`.
    pub month: u32,
}

impl YearMonth {
    pub const fn new(year: i32, month: u32) -> Self {
        assert!(month >= 1 && month <= 12);
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Months since year zero. Treats months as evenly spaced ordinal
    /// positions, which is the axis gap interpolation runs on.
    pub fn index(self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    /// The next calendar month.
    pub fn succ(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// First day of the month, the month-start timestamp used as the
    /// alignment key and the persisted `Date` column.
    pub fn first_day(self) -> NaiveDate {
        // month is validated at construction, so day 1 always exists
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("YearMonth holds a valid calendar month")
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

// ---------------------------------------------------------------------------
// Analysis window
// ---------------------------------------------------------------------------

/// First month of the closed analysis window.
pub const ANALYSIS_WINDOW_START: YearMonth = YearMonth::new(2013, 5);

/// Last month of the closed analysis window.
pub const ANALYSIS_WINDOW_END: YearMonth = YearMonth::new(2018, 12);

/// Whether a month lies inside the closed window
/// `[2013-05 ..= 2018-12]`. Both normalizers must apply exactly this
/// predicate so that the aligned output cannot leak out-of-window months.
pub fn in_analysis_window(month: YearMonth) -> bool {
    month >= ANALYSIS_WINDOW_START && month <= ANALYSIS_WINDOW_END
}

// ---------------------------------------------------------------------------
// Raw records
// ---------------------------------------------------------------------------

/// One row of the raw deforestation event log, as loaded from the CSV
/// export. Geometry and bookkeeping columns are not carried; the timestamp
/// stays a string until the normalizer parses it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDeforestationRecord {
    pub object_id: Option<i64>,
    /// Event timestamp string, `YYYY/MM/DD HH:MM:SS±HH`.
    pub date: String,
    /// Event-type tag; only [`PRIMARY_EVENT_TYPE`] rows are retained.
    pub data_type: String,
    /// Affected area in hectares. `None` when the cell was empty or not
    /// numeric; such rows are dropped by the normalizer, never zero-filled.
    pub area_ha: Option<f64>,
}

/// The nine pollutant concentrations of one reading. `None` is the missing
/// marker at every stage (raw reading, daily mean, monthly mean); it never
/// silently becomes zero except where the zero-fill allow-list applies at
/// final output.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PollutantValues {
    pub pm10: Option<f64>,
    pub pm2_5: Option<f64>,
    pub o3: Option<f64>,
    pub no2: Option<f64>,
    pub co: Option<f64>,
    pub so2: Option<f64>,
    pub trs: Option<f64>,
    pub benzene: Option<f64>,
    pub toluene: Option<f64>,
}

/// One row of the raw air-quality feed: a measurement instant at the fixed
/// monitoring station.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPollutionRecord {
    pub seq: Option<i64>,
    /// Measurement timestamp string, `YYYY-MM-DD HH:MM:SS`, naive local.
    pub time: String,
    pub station_id: String,
    pub values: PollutantValues,
}

// ---------------------------------------------------------------------------
// Monthly series
// ---------------------------------------------------------------------------

/// Total affected area for one calendar month of the deforestation series.
/// The normalizer guarantees one point per month with no gaps across its
/// output domain; gap months carry linearly interpolated totals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyDeforestationPoint {
    pub month: YearMonth,
    pub area_ha: f64,
}

/// Mean concentrations for one calendar month of the air-quality series.
/// Unlike the deforestation series this sequence is not gap-free: only
/// months that survive the two aggregation stages appear.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyPollutionPoint {
    pub month: YearMonth,
    pub values: PollutantValues,
}

/// The inner join of the two monthly series on month-start equality.
/// This is the only structure the analysis layer consumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedObservation {
    pub month: YearMonth,
    pub area_ha: f64,
    pub pollution: PollutantValues,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise while acquiring either raw feed. Every variant is
/// retryable; exhausting the retry budget is the only terminal outcome.
#[derive(Debug, PartialEq)]
pub enum AcquireError {
    /// Non-2xx HTTP response from the export endpoint.
    HttpStatus(u16),
    /// Connection-level failure (DNS, timeout, reset, body read).
    Transport(String),
    /// The external retrieval tool could not be launched or exited nonzero.
    Tool(String),
    /// The expected file was not present after download and extraction.
    MissingFile(PathBuf),
    /// Local filesystem failure while staging the payload.
    Io(String),
}

impl fmt::Display for AcquireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquireError::HttpStatus(code) => write!(f, "HTTP error: {}", code),
            AcquireError::Transport(msg) => write!(f, "Transport error: {}", msg),
            AcquireError::Tool(msg) => write!(f, "Retrieval tool error: {}", msg),
            AcquireError::MissingFile(path) => {
                write!(f, "Expected file not found: {}", path.display())
            }
            AcquireError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for AcquireError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
