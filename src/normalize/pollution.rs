/// Air-quality feed normalizer
///
/// Collapses hourly station readings into monthly mean concentrations per
/// pollutant. Aggregation is a two-stage mean: readings collapse to daily
/// means first, daily means collapse to monthly means second. The stages
/// are not equivalent to one direct monthly mean; a day with three
/// readings and a day with twenty-four weigh the same in stage two, which
/// is the intended damping of uneven sampling density.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};

use crate::logging::{self, DataSource};
use crate::model::{
    in_analysis_window, MonthlyPollutionPoint, PollutantValues, RawPollutionRecord, YearMonth,
    POLLUTION_TIMESTAMP_FORMAT,
};
use crate::normalize::{coerce_numeric, round2, LoadError};
use crate::pollutants::POLLUTANT_REGISTRY;

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load raw readings from the extracted feed CSV. The nine pollutant
/// columns are required under their upstream headers; the unnamed leading
/// sequence column and the station-id column are optional. Rows the
/// reader cannot decode are skipped with a counted diagnostic.
pub fn load_records(path: &Path) -> Result<Vec<RawPollutionRecord>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| LoadError::Csv(e.to_string()))?;

    let headers = reader
        .headers()
        .map_err(|e| LoadError::Csv(e.to_string()))?
        .clone();
    let position = |name: &str| headers.iter().position(|h| h == name);

    let time_col =
        position("time").ok_or_else(|| LoadError::MissingColumn("time".to_string()))?;
    let station_col = position("id");
    let seq_col = headers.iter().position(|h| h.trim().is_empty());

    let mut pollutant_cols = [0usize; 9];
    for (i, spec) in POLLUTANT_REGISTRY.iter().enumerate() {
        pollutant_cols[i] = position(spec.raw_column)
            .ok_or_else(|| LoadError::MissingColumn(spec.raw_column.to_string()))?;
    }

    let mut records = Vec::new();
    let mut unreadable = 0usize;
    for row in reader.records() {
        let row = match row {
            Ok(r) => r,
            Err(_) => {
                unreadable += 1;
                continue;
            }
        };

        let mut values = PollutantValues::default();
        for (i, spec) in POLLUTANT_REGISTRY.iter().enumerate() {
            let cell = row.get(pollutant_cols[i]).unwrap_or("");
            values.set(spec.pollutant, coerce_numeric(cell));
        }

        records.push(RawPollutionRecord {
            seq: seq_col
                .and_then(|i| row.get(i))
                .and_then(|s| s.trim().parse().ok()),
            time: row.get(time_col).unwrap_or("").to_string(),
            station_id: station_col
                .and_then(|i| row.get(i))
                .unwrap_or("")
                .to_string(),
            values,
        });
    }

    if unreadable > 0 {
        logging::warn(
            DataSource::Kaggle,
            None,
            &format!("{} unreadable rows skipped in {}", unreadable, path.display()),
        );
    }

    Ok(records)
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Per-reason counts of readings dropped during cleaning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropCounts {
    pub input: usize,
    pub bad_timestamp: usize,
    pub all_missing: usize,
}

impl DropCounts {
    pub fn kept(&self) -> usize {
        self.input - self.bad_timestamp - self.all_missing
    }
}

/// Reading-level drop trace, shown only at debug level.
fn debug_drop(record: &RawPollutionRecord, reason: &str) {
    let seq = record.seq.map(|s| s.to_string());
    logging::debug(DataSource::Kaggle, seq.as_deref(), reason);
}

/// Missing-aware running mean over the nine pollutant fields. A missing
/// value contributes to neither the sum nor the denominator.
#[derive(Debug, Clone, Copy, Default)]
struct MeanAcc {
    sums: [f64; 9],
    counts: [u32; 9],
}

impl MeanAcc {
    fn add(&mut self, values: &PollutantValues) {
        for (i, spec) in POLLUTANT_REGISTRY.iter().enumerate() {
            if let Some(v) = values.get(spec.pollutant) {
                self.sums[i] += v;
                self.counts[i] += 1;
            }
        }
    }

    fn means(&self) -> PollutantValues {
        let mut out = PollutantValues::default();
        for (i, spec) in POLLUTANT_REGISTRY.iter().enumerate() {
            if self.counts[i] > 0 {
                out.set(spec.pollutant, Some(self.sums[i] / self.counts[i] as f64));
            }
        }
        out
    }
}

/// Build the monthly mean series from raw readings.
///
/// Steps, in order: parse the naive timestamp (unparsable rows dropped);
/// drop readings with all nine fields missing; stage one groups by
/// calendar day with missing-aware means; stage two averages the daily
/// means per month; restrict to the analysis window; zero-fill the three
/// allow-listed pollutants where a month still has no mean; round to 2
/// decimals. Repeated runs on the same records produce identical output.
pub fn monthly_means(records: &[RawPollutionRecord]) -> (Vec<MonthlyPollutionPoint>, DropCounts) {
    let mut drops = DropCounts {
        input: records.len(),
        ..DropCounts::default()
    };

    let mut readings: Vec<(NaiveDateTime, PollutantValues)> = Vec::new();
    for record in records {
        let timestamp =
            match NaiveDateTime::parse_from_str(record.time.trim(), POLLUTION_TIMESTAMP_FORMAT) {
                Ok(t) => t,
                Err(_) => {
                    drops.bad_timestamp += 1;
                    debug_drop(
                        record,
                        &format!("dropped: unparsable timestamp {:?}", record.time.trim()),
                    );
                    continue;
                }
            };
        if record.values.is_empty() {
            drops.all_missing += 1;
            debug_drop(record, "dropped: every pollutant field empty");
            continue;
        }
        readings.push((timestamp, record.values));
    }

    // Stage one: daily means, ignoring missing values per field.
    let mut daily: BTreeMap<NaiveDate, MeanAcc> = BTreeMap::new();
    for (timestamp, values) in &readings {
        daily.entry(timestamp.date()).or_default().add(values);
    }

    // Stage two: monthly means of the daily means.
    let mut monthly: BTreeMap<YearMonth, MeanAcc> = BTreeMap::new();
    for (day, acc) in &daily {
        let day_means = acc.means();
        monthly
            .entry(YearMonth::from_date(*day))
            .or_default()
            .add(&day_means);
    }

    let mut points = Vec::new();
    for (month, acc) in monthly {
        if !in_analysis_window(month) {
            continue;
        }
        let mut values = acc.means();
        for spec in POLLUTANT_REGISTRY {
            let finished = match values.get(spec.pollutant) {
                Some(v) => Some(round2(v)),
                None if spec.zero_fill_when_missing => Some(0.0),
                None => None,
            };
            values.set(spec.pollutant, finished);
        }
        points.push(MonthlyPollutionPoint { month, values });
    }

    (points, drops)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
