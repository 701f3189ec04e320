/// Acquisition layer for the two raw feeds.
///
/// Each submodule implements the `fetch -> raw file path` contract for one
/// source. Both run strictly sequentially inside the retry wrapper; there
/// is no parallel fan-out and no degraded partial-success mode.
///
/// Submodules:
/// - `arcgis`: HTTP download of the deforestation event-log CSV export.
/// - `kaggle`: external retrieval-tool invocation for the air-quality feed.

use std::time::Duration;

use crate::model::AcquireError;

pub mod arcgis;
pub mod kaggle;

/// Total per-request timeout, covering connect and body read. Generous
/// because the event-log export is a bulk CSV, not an API call.
const HTTP_TIMEOUT_SECS: u64 = 120;

/// Build the blocking HTTP client shared by acquisition calls.
pub fn http_client() -> Result<reqwest::blocking::Client, AcquireError> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()
        .map_err(|e| AcquireError::Transport(e.to_string()))
}
