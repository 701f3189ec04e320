/// Run orchestration, acquisition through persistence and the closing
/// summary.
///
/// Strictly sequential, mirroring the data dependencies: both raw feeds
/// must exist before cleaning, both monthly series before alignment.
/// Persistence is guarded per table so one failed store never blocks the
/// other.
use std::error::Error;
use std::path::PathBuf;

use crate::align;
use crate::analysis;
use crate::config::PipelineConfig;
use crate::dev_mode;
use crate::ingest;
use crate::logging::{self, DataSource};
use crate::model::AcquireError;
use crate::normalize::{deforestation, pollution};
use crate::retry;
use crate::store;

/// What one run did, stage by stage.
#[derive(Debug)]
pub struct RunSummary {
    pub deforestation_events: usize,
    pub pollution_readings: usize,
    pub deforestation_months: usize,
    pub pollution_months: usize,
    pub aligned_months: usize,
    pub deforestation_write: Result<usize, rusqlite::Error>,
    pub pollution_write: Result<usize, rusqlite::Error>,
}

/// Executes one full run against the given configuration.
///
/// Acquisition and loading errors are fatal and nothing is persisted.
/// Cleaning drops and per-table write failures are diagnostics carried in
/// the summary; they never abort the run.
pub fn run(config: &PipelineConfig) -> Result<RunSummary, Box<dyn Error>> {
    config.ensure_data_dir()?;

    let (deforestation_csv, pollution_csv) = acquire(config)?;

    let events = deforestation::load_records(&deforestation_csv)?;
    let (deforestation_monthly, event_drops) = deforestation::monthly_totals(&events);
    logging::log_discard_summary(
        DataSource::ArcGis,
        "deforestation cleaning",
        event_drops.input,
        event_drops.kept(),
    );

    let readings = pollution::load_records(&pollution_csv)?;
    let (pollution_monthly, reading_drops) = pollution::monthly_means(&readings);
    logging::log_discard_summary(
        DataSource::Kaggle,
        "pollution cleaning",
        reading_drops.input,
        reading_drops.kept(),
    );

    let aligned = align::align(&deforestation_monthly, &pollution_monthly);

    let deforestation_write =
        store::write_deforestation(&config.deforestation_db(), &deforestation_monthly);
    logging::log_write_result(store::DEFORESTATION_TABLE, &deforestation_write);

    let pollution_write = store::write_pollution(&config.pollution_db(), &pollution_monthly);
    logging::log_write_result(store::POLLUTION_TABLE, &pollution_write);

    analysis::log_summary(&aligned);

    Ok(RunSummary {
        deforestation_events: events.len(),
        pollution_readings: readings.len(),
        deforestation_months: deforestation_monthly.len(),
        pollution_months: pollution_monthly.len(),
        aligned_months: aligned.len(),
        deforestation_write,
        pollution_write,
    })
}

/// Produces the two raw files, synthetically or from the live sources.
/// Pollution first, then deforestation; each live download sits behind
/// the retry policy.
fn acquire(config: &PipelineConfig) -> Result<(PathBuf, PathBuf), AcquireError> {
    if config.synthetic {
        let feeds = dev_mode::generate_feeds(config)?;
        return Ok((feeds.deforestation_csv, feeds.pollution_csv));
    }

    let policy = config.retry_policy();
    let client = ingest::http_client()?;

    let pollution_csv = retry::with_retry(
        &policy,
        DataSource::Kaggle,
        "pollution dataset download",
        || {
            ingest::kaggle::download_dataset(
                &config.kaggle_bin,
                &config.kaggle_dataset,
                &config.kaggle_dir(),
            )
        },
    )?;

    let deforestation_csv = config.deforestation_csv();
    retry::with_retry(
        &policy,
        DataSource::ArcGis,
        "deforestation export download",
        || ingest::arcgis::download_csv(&client, &config.deforestation_url, &deforestation_csv),
    )?;

    Ok((deforestation_csv, pollution_csv))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_run_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PipelineConfig::default();
        config.data_dir = dir.path().to_path_buf();
        config.synthetic = true;
        config.synthetic_seed = Some(11);

        let summary = run(&config).unwrap();

        assert!(summary.deforestation_events > 0);
        assert!(summary.pollution_readings > 0);
        assert!(summary.deforestation_months > 0);
        assert!(summary.pollution_months > 0);
        assert!(
            summary.aligned_months
                <= summary.deforestation_months.min(summary.pollution_months),
            "the join cannot exceed either input series"
        );

        assert_eq!(
            summary.deforestation_write.as_ref().unwrap(),
            &summary.deforestation_months,
            "every deforestation month must be persisted"
        );
        assert_eq!(
            summary.pollution_write.as_ref().unwrap(),
            &summary.pollution_months,
            "every pollution month must be persisted"
        );

        assert!(config.deforestation_db().exists());
        assert!(config.pollution_db().exists());
    }

    #[test]
    fn test_synthetic_acquire_lands_inside_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PipelineConfig::default();
        config.data_dir = dir.path().to_path_buf();
        config.synthetic = true;
        config.synthetic_seed = Some(5);
        config.ensure_data_dir().unwrap();

        let (deforestation_csv, pollution_csv) = acquire(&config).unwrap();
        assert!(deforestation_csv.starts_with(dir.path()));
        assert!(pollution_csv.starts_with(dir.path()));
        assert!(deforestation_csv.exists());
        assert!(pollution_csv.exists());
    }
}
