//! Application Settings

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default settings file, without extension
pub const DEFAULT_SETTINGS_FILE: &str = "config/settings";

/// Environment variable prefix, e.g. `PLANT_METRICS__BIND_ADDR`
pub const ENV_PREFIX: &str = "PLANT_METRICS";

/// Server settings, read from an optional file and overridden by the environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Listen address
    pub bind_addr: String,
    /// JSON document mapping each plant's columns to canonical fields
    pub mapping_path: PathBuf,
    /// Uploaded exports are kept here and reprocessed at startup
    pub raw_data_dir: PathBuf,
    /// `<plant>_clean.csv` output directory
    pub processed_data_dir: PathBuf,
    pub log_level: String,
    pub log_json: bool,
    /// Reprocess every export in `raw_data_dir` before serving
    pub process_on_startup: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            mapping_path: PathBuf::from("config/mapping.json"),
            raw_data_dir: PathBuf::from("data/raw"),
            processed_data_dir: PathBuf::from("data/processed"),
            log_level: "info".to_string(),
            log_json: false,
            process_on_startup: true,
        }
    }
}

impl Settings {
    /// Load settings from `file` (any format the `config` crate detects) and the environment
    pub fn load(file: Option<&str>) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(file.unwrap_or(DEFAULT_SETTINGS_FILE)).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()
    }
}
