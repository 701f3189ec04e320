/// Development mode utilities for running the pipeline offline.
///
/// When the live feeds are unreachable, or a hermetic run is wanted, this
/// module writes synthetic raw files in the exact upstream layouts, so
/// every stage downstream of acquisition runs unchanged against them.
use chrono::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::PipelineConfig;
use crate::logging::{self, DataSource};
use crate::model::{AcquireError, POLLUTION_TIMESTAMP_FORMAT, YearMonth};
use crate::pollutants::{POLLUTANT_REGISTRY, Pollutant};

// ---------------------------------------------------------------------------
// Feed shape
// ---------------------------------------------------------------------------

/// First month covered by the synthetic feeds. Starts before the analysis
/// window so the window cut is exercised.
const FEED_START: YearMonth = YearMonth::new(2013, 1);

/// Last month covered by the synthetic feeds, past the window's far edge.
const FEED_END: YearMonth = YearMonth::new(2019, 3);

/// The single monitoring station the air-quality rows report.
const STATION: &str = "Pinheiros";

/// The TRS instrument goes dark from this month on. TRS is on the
/// zero-fill list, so those months come out as 0.0 in the final series.
pub const TRS_RETIRED: YearMonth = YearMonth::new(2016, 1);

/// The SO2 instrument goes dark from this month on. SO2 is not on the
/// zero-fill list, so those months stay missing all the way to the store.
pub const SO2_RETIRED: YearMonth = YearMonth::new(2018, 7);

/// Paths and row counts of one generated pair of feeds.
#[derive(Debug)]
pub struct SyntheticFeeds {
    pub deforestation_csv: PathBuf,
    pub pollution_csv: PathBuf,
    pub deforestation_rows: usize,
    pub pollution_rows: usize,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Writes both synthetic feeds under the configured data directory and
/// returns their paths, standing in for the live acquisition stage.
///
/// A fixed `synthetic_seed` reproduces the same feeds run after run; with
/// no seed each run draws fresh data.
pub fn generate_feeds(config: &PipelineConfig) -> Result<SyntheticFeeds, AcquireError> {
    let mut rng = match config.synthetic_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let deforestation_csv = config.deforestation_csv();
    let deforestation_rows = write_deforestation_feed(&mut rng, &deforestation_csv)?;
    logging::info(
        DataSource::System,
        None,
        &format!(
            "synthetic deforestation feed: {} rows at {}",
            deforestation_rows,
            deforestation_csv.display()
        ),
    );

    let kaggle_dir = config.kaggle_dir();
    fs::create_dir_all(&kaggle_dir).map_err(|e| AcquireError::Io(e.to_string()))?;
    let pollution_csv = kaggle_dir.join("sao-paulo-air-pollution.csv");
    let pollution_rows = write_pollution_feed(&mut rng, &pollution_csv)?;
    logging::info(
        DataSource::System,
        None,
        &format!(
            "synthetic pollution feed: {} rows at {}",
            pollution_rows,
            pollution_csv.display()
        ),
    );

    Ok(SyntheticFeeds {
        deforestation_csv,
        pollution_csv,
        deforestation_rows,
        pollution_rows,
    })
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

fn io_error(err: csv::Error) -> AcquireError {
    AcquireError::Io(err.to_string())
}

/// Writes the event-log feed: one row per alert, `+00` timestamps, mixed
/// deforestation and degradation tags. Roughly one month in eight carries
/// no alerts at all, which the cleaning stage later fills by interpolation.
fn write_deforestation_feed(rng: &mut StdRng, path: &Path) -> Result<usize, AcquireError> {
    let mut writer = csv::Writer::from_path(path).map_err(io_error)?;
    writer
        .write_record([
            "objectid",
            "date",
            "data_type",
            "orig_oid",
            "orig_fname",
            "gfwid",
            "globalid",
            "ha_eck_iv",
            "date_alias",
            "shape_Length",
            "shape_Area",
        ])
        .map_err(io_error)?;

    let mut rows = 0usize;
    let mut object_id = 1i64;
    let mut month = FEED_START;
    while month <= FEED_END {
        if rng.gen_bool(0.12) {
            month = month.succ();
            continue;
        }
        for _ in 0..rng.gen_range(1..=6) {
            let day = month.first_day() + Duration::days(rng.gen_range(0..28));
            let stamp = day
                .and_hms_opt(rng.gen_range(0..24), rng.gen_range(0..60), 0)
                .expect("generated clock fields are in range");
            let stamp_txt = format!("{}+00", stamp.format("%Y/%m/%d %H:%M:%S"));
            let tag = if rng.gen_bool(0.2) {
                "degradation"
            } else {
                "deforestation"
            };
            writer
                .write_record([
                    object_id.to_string(),
                    stamp_txt.clone(),
                    tag.to_string(),
                    object_id.to_string(),
                    format!("glad_alerts_{}", month.year),
                    format!("GFW{:07}", object_id),
                    format!("{{{:08}}}", object_id),
                    format!("{:.4}", rng.gen_range(0.5..80.0)),
                    stamp_txt,
                    format!("{:.6}", rng.gen_range(0.001..0.2)),
                    format!("{:.6}", rng.gen_range(0.000001..0.004)),
                ])
                .map_err(io_error)?;
            rows += 1;
            object_id += 1;
        }
        month = month.succ();
    }

    writer.flush().map_err(|e| AcquireError::Io(e.to_string()))?;
    Ok(rows)
}

/// Writes the station feed: four readings a day, a leading unnamed index
/// column, and per-instrument availability. Whole-row outages appear in
/// the real feed too; cleaning drops them.
fn write_pollution_feed(rng: &mut StdRng, path: &Path) -> Result<usize, AcquireError> {
    let mut writer = csv::Writer::from_path(path).map_err(io_error)?;

    let mut header: Vec<&str> = vec!["", "time", "id"];
    header.extend(POLLUTANT_REGISTRY.iter().map(|s| s.raw_column));
    writer.write_record(&header).map_err(io_error)?;

    let mut rows = 0usize;
    let mut seq = 0i64;
    let end_exclusive = FEED_END.succ().first_day();
    for day in FEED_START
        .first_day()
        .iter_days()
        .take_while(|d| *d < end_exclusive)
    {
        let month = YearMonth::from_date(day);
        for hour in [1u32, 7, 13, 19] {
            let stamp = day
                .and_hms_opt(hour, 0, 0)
                .expect("generated clock fields are in range");
            let mut record: Vec<String> = Vec::with_capacity(3 + POLLUTANT_REGISTRY.len());
            record.push(seq.to_string());
            record.push(stamp.format(POLLUTION_TIMESTAMP_FORMAT).to_string());
            record.push(STATION.to_string());

            if rng.gen_bool(0.01) {
                record.extend(POLLUTANT_REGISTRY.iter().map(|_| String::new()));
            } else {
                for spec in POLLUTANT_REGISTRY {
                    let present = match spec.pollutant {
                        Pollutant::Trs => month < TRS_RETIRED && rng.gen_bool(0.6),
                        Pollutant::So2 => month < SO2_RETIRED && rng.gen_bool(0.95),
                        Pollutant::Benzene | Pollutant::Toluene => rng.gen_bool(0.3),
                        _ => rng.gen_bool(0.97),
                    };
                    record.push(if present {
                        format!("{:.2}", sample_value(rng, spec.pollutant))
                    } else {
                        String::new()
                    });
                }
            }

            writer.write_record(&record).map_err(io_error)?;
            rows += 1;
            seq += 1;
        }
    }

    writer.flush().map_err(|e| AcquireError::Io(e.to_string()))?;
    Ok(rows)
}

/// Concentration ranges per instrument, loosely matching the real station
/// (CO in ppm, everything else in ug/m3).
fn sample_value(rng: &mut StdRng, pollutant: Pollutant) -> f64 {
    match pollutant {
        Pollutant::Pm10 => rng.gen_range(12.0..70.0),
        Pollutant::Trs => rng.gen_range(1.0..8.0),
        Pollutant::O3 => rng.gen_range(20.0..110.0),
        Pollutant::No2 => rng.gen_range(15.0..80.0),
        Pollutant::Co => rng.gen_range(0.2..1.6),
        Pollutant::Pm25 => rng.gen_range(6.0..40.0),
        Pollutant::So2 => rng.gen_range(1.0..12.0),
        Pollutant::Benzene => rng.gen_range(0.4..3.0),
        Pollutant::Toluene => rng.gen_range(1.0..10.0),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{deforestation, pollution};
    use std::fs;

    fn seeded_config(dir: &Path, seed: u64) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.data_dir = dir.to_path_buf();
        config.synthetic = true;
        config.synthetic_seed = Some(seed);
        config
    }

    #[test]
    fn test_generated_feeds_parse_with_the_loaders() {
        let dir = tempfile::tempdir().unwrap();
        let config = seeded_config(dir.path(), 7);

        let feeds = generate_feeds(&config).unwrap();

        let events = deforestation::load_records(&feeds.deforestation_csv).unwrap();
        assert_eq!(
            events.len(),
            feeds.deforestation_rows,
            "every generated event row must load"
        );
        assert!(
            events.iter().all(|r| r.area_ha.is_some()),
            "generated events always carry an area"
        );

        let readings = pollution::load_records(&feeds.pollution_csv).unwrap();
        assert_eq!(
            readings.len(),
            feeds.pollution_rows,
            "every generated reading row must load"
        );
        assert!(readings.iter().all(|r| r.station_id == STATION));
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();

        let feeds_a = generate_feeds(&seeded_config(dir_a.path(), 42)).unwrap();
        let feeds_b = generate_feeds(&seeded_config(dir_b.path(), 42)).unwrap();

        assert_eq!(
            fs::read_to_string(&feeds_a.deforestation_csv).unwrap(),
            fs::read_to_string(&feeds_b.deforestation_csv).unwrap(),
            "same seed must reproduce the event feed byte for byte"
        );
        assert_eq!(
            fs::read_to_string(&feeds_a.pollution_csv).unwrap(),
            fs::read_to_string(&feeds_b.pollution_csv).unwrap(),
            "same seed must reproduce the station feed byte for byte"
        );
    }

    #[test]
    fn test_retired_instruments_stay_dark() {
        let dir = tempfile::tempdir().unwrap();
        let feeds = generate_feeds(&seeded_config(dir.path(), 3)).unwrap();

        let readings = pollution::load_records(&feeds.pollution_csv).unwrap();
        for reading in &readings {
            let month = YearMonth::new(
                reading.time[..4].parse().unwrap(),
                reading.time[5..7].parse().unwrap(),
            );
            if month >= TRS_RETIRED {
                assert!(
                    reading.values.trs.is_none(),
                    "TRS must be absent from {} on",
                    TRS_RETIRED
                );
            }
            if month >= SO2_RETIRED {
                assert!(
                    reading.values.so2.is_none(),
                    "SO2 must be absent from {} on",
                    SO2_RETIRED
                );
            }
        }
    }
}
