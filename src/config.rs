/// Pipeline configuration
///
/// One `PipelineConfig` is resolved at process start and threaded into
/// every component that touches a path or a knob. Resolution order:
/// built-in defaults, then an optional `pipeline.toml` overlay, then
/// environment overrides, then CLI flags. Nothing reads ambient global
/// state after startup.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::logging::{self, DataSource};
use crate::retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY_SECS};

/// Default overlay file looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "pipeline.toml";

/// Environment override for the working data directory.
pub const ENV_DATA_DIR: &str = "PIPELINE_DATA_DIR";

/// Environment override for the retrieval tool executable. Lets
/// virtualenv installs point at their own `kaggle` binary.
pub const ENV_KAGGLE_BIN: &str = "KAGGLE_BIN";

// ---------------------------------------------------------------------------
// Configuration value
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Working data directory; created if missing, never fatal.
    pub data_dir: PathBuf,
    /// CSV export endpoint for the deforestation event log.
    pub deforestation_url: String,
    /// Dataset slug passed to the external retrieval tool.
    pub kaggle_dataset: String,
    /// Executable name or path of the external retrieval tool.
    pub kaggle_bin: String,
    /// Synthetic-data mode. Must be selected explicitly, never inferred.
    pub synthetic: bool,
    /// RNG seed for reproducible synthetic feeds.
    pub synthetic_seed: Option<u64>,
    /// Acquisition retry budget.
    pub retry_max_attempts: u32,
    /// Fixed delay between acquisition attempts, in seconds.
    pub retry_delay_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            deforestation_url: crate::ingest::arcgis::EXPORT_URL.to_string(),
            kaggle_dataset: crate::ingest::kaggle::POLLUTION_DATASET_SLUG.to_string(),
            kaggle_bin: "kaggle".to_string(),
            synthetic: false,
            synthetic_seed: None,
            retry_max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file. Absent keys fall back to the
    /// built-in defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e.to_string()))?;
        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e.to_string()))
    }

    /// Resolve the file layer: an explicitly-given path, or the default
    /// overlay if one exists in the working directory. A missing default
    /// overlay is normal; an unreadable or malformed file is reported and
    /// replaced by defaults (configuration problems are never fatal).
    pub fn resolve(explicit_path: Option<&Path>) -> Self {
        let path = match explicit_path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                if !default.exists() {
                    return Self::default();
                }
                default
            }
        };

        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                logging::warn(
                    DataSource::System,
                    None,
                    &format!("{}; using built-in defaults", e),
                );
                Self::default()
            }
        }
    }

    /// Apply environment overrides on top of the file layer.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| env::var(key).ok());
    }

    /// Environment application with an injectable lookup, so the override
    /// logic is testable without mutating process globals.
    pub fn apply_env_from<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = get(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(bin) = get(ENV_KAGGLE_BIN) {
            self.kaggle_bin = bin;
        }
    }

    /// Create the working data directory if it does not exist yet.
    pub fn ensure_data_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_max_attempts,
            delay: Duration::from_secs(self.retry_delay_secs),
        }
    }

    // Derived paths. All raw and persisted files live under data_dir.

    pub fn deforestation_csv(&self) -> PathBuf {
        self.data_dir.join("deforestation.csv")
    }

    /// Directory the retrieval tool downloads and extracts into.
    pub fn kaggle_dir(&self) -> PathBuf {
        self.data_dir.join("kaggle")
    }

    pub fn deforestation_db(&self) -> PathBuf {
        self.data_dir.join("deforestation.db")
    }

    pub fn pollution_db(&self) -> PathBuf {
        self.data_dir.join("air_pollution.db")
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    Read(PathBuf, String),
    Parse(PathBuf, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read(path, msg) => {
                write!(f, "could not read config {}: {}", path.display(), msg)
            }
            ConfigError::Parse(path, msg) => {
                write!(f, "could not parse config {}: {}", path.display(), msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
