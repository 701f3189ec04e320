/// Kaggle dataset retrieval
///
/// Fetches the air-quality feed by invoking the external `kaggle` CLI,
/// which downloads the dataset archive and extracts it in place. The
/// extracted CSV is then located at a deterministic relative position:
/// the first `.csv` under the download directory in sorted path order.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use walkdir::WalkDir;

use crate::model::AcquireError;

/// Dataset slug of the hourly air-quality measurements.
pub const POLLUTION_DATASET_SLUG: &str = "danlessa/air-pollution-at-so-paulo-brazil-since-2013";

/// Run `<bin> datasets download -d <slug> -p <dest_dir> --unzip` and
/// return the path of the extracted CSV.
///
/// The destination directory is cleared first so only the fresh
/// extraction can be found; a leftover CSV from an earlier run must not
/// satisfy the lookup. Launch failure, nonzero exit, and a missing CSV
/// after extraction are all retryable acquisition errors.
pub fn download_dataset(bin: &str, slug: &str, dest_dir: &Path) -> Result<PathBuf, AcquireError> {
    if dest_dir.exists() {
        fs::remove_dir_all(dest_dir).map_err(|e| AcquireError::Io(e.to_string()))?;
    }
    fs::create_dir_all(dest_dir).map_err(|e| AcquireError::Io(e.to_string()))?;

    let status = Command::new(bin)
        .args(["datasets", "download", "-d", slug, "-p"])
        .arg(dest_dir)
        .arg("--unzip")
        .status()
        .map_err(|e| AcquireError::Tool(format!("failed to launch {}: {}", bin, e)))?;

    if !status.success() {
        return Err(AcquireError::Tool(format!("{} exited with {}", bin, status)));
    }

    find_extracted_csv(dest_dir)
}

/// Locate the extracted delimited-text file under `dir`.
///
/// Walks recursively because the archive may extract into a subdirectory;
/// candidates are sorted by full path so repeated runs pick the same file.
pub fn find_extracted_csv(dir: &Path) -> Result<PathBuf, AcquireError> {
    let mut candidates: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .map(|ext| ext.eq_ignore_ascii_case("csv"))
                .unwrap_or(false)
        })
        .collect();
    candidates.sort();

    candidates
        .into_iter()
        .next()
        .ok_or_else(|| AcquireError::MissingFile(dir.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_extracted_csv_picks_first_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("a.csv"), "x").unwrap();
        fs::write(dir.path().join("b.csv"), "y").unwrap();
        fs::write(dir.path().join("archive.zip"), "z").unwrap();

        let found = find_extracted_csv(dir.path()).unwrap();
        assert_eq!(
            found,
            dir.path().join("b.csv"),
            "top-level b.csv sorts before nested/a.csv"
        );
    }

    #[test]
    fn test_find_extracted_csv_ignores_non_csv_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("readme.txt"), "x").unwrap();
        fs::write(dir.path().join("archive.zip"), "y").unwrap();

        match find_extracted_csv(dir.path()) {
            Err(AcquireError::MissingFile(p)) => assert_eq!(p, dir.path()),
            other => panic!("expected MissingFile, got {:?}", other),
        }
    }

    #[test]
    fn test_find_extracted_csv_accepts_uppercase_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("DATA.CSV"), "x").unwrap();
        assert!(find_extracted_csv(dir.path()).is_ok());
    }

    #[test]
    fn test_download_dataset_reports_launch_failure_as_tool_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("kaggle");
        let result = download_dataset("/nonexistent/kaggle-cli", POLLUTION_DATASET_SLUG, &dest);
        match result {
            Err(AcquireError::Tool(msg)) => {
                assert!(msg.contains("failed to launch"), "got message: {}", msg)
            }
            other => panic!("expected Tool error, got {:?}", other),
        }
    }

    #[test]
    fn test_download_dataset_clears_stale_extraction_first() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("kaggle");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("stale.csv"), "old run").unwrap();

        // Launch fails, but the stale extraction must already be gone.
        let result = download_dataset("/nonexistent/kaggle-cli", POLLUTION_DATASET_SLUG, &dest);
        assert!(result.is_err());
        assert!(
            !dest.join("stale.csv").exists(),
            "stale CSV from a previous run should have been removed"
        );
    }
}
