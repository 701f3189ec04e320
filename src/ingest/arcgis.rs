/// ArcGIS Hub export client
///
/// Downloads the deforestation event-log CSV export over plain HTTP GET.
/// The export endpoint streams the full dataset as delimited text; there
/// is no pagination and no query surface beyond the fixed URL.

use std::fs;
use std::path::Path;

use crate::model::AcquireError;

/// CSV export endpoint of the deforestation event log.
pub const EXPORT_URL: &str = "https://hub.arcgis.com/api/v3/datasets/9c4a16f9520447349159fa30abcea08b_2/downloads/data?format=csv&spatialRefId=3857&where=1%3D1";

/// Fetch the CSV export and write it to `dest`.
///
/// The full payload is read into memory before any file is touched, so a
/// failed fetch leaves the previous run's file intact. On success any
/// stale file at `dest` is removed and the fresh payload written, which
/// makes re-runs idempotent.
pub fn download_csv(
    client: &reqwest::blocking::Client,
    url: &str,
    dest: &Path,
) -> Result<(), AcquireError> {
    let response = client
        .get(url)
        .send()
        .map_err(|e| AcquireError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AcquireError::HttpStatus(status.as_u16()));
    }

    let body = response
        .bytes()
        .map_err(|e| AcquireError::Transport(e.to_string()))?;

    if dest.exists() {
        fs::remove_file(dest).map_err(|e| AcquireError::Io(e.to_string()))?;
    }
    fs::write(dest, &body).map_err(|e| AcquireError::Io(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_url_requests_csv_format() {
        assert!(EXPORT_URL.starts_with("https://hub.arcgis.com/"));
        assert!(
            EXPORT_URL.contains("format=csv"),
            "export must be requested as delimited text"
        );
    }

    #[test]
    fn test_export_url_pins_the_dataset() {
        assert!(EXPORT_URL.contains("9c4a16f9520447349159fa30abcea08b_2"));
    }
}
