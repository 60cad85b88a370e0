//! Service configuration
//!
//! Read from `config.json`. Locally the file is looked up in the working
//! directory; in a cluster (`OCP_ENV` set) it is read from `CONFIG_PATH`.
//! Every key is optional and a missing file means all defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::batch::DEFAULT_WORKERS;
use crate::error::ConfigError;
use crate::loan::ValidationOptions;

/// Name of the config file
pub const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the worker limit
pub const WORKERS_ENV: &str = "MORTGAGE_WORKERS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Maximum loans computed concurrently
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Directory for per-loan cashflow documents
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory prefix for the log file (concatenated with `log_file`)
    #[serde(default = "default_log_path", alias = "LOG_PATH")]
    pub log_path: String,

    #[serde(default = "default_log_file", alias = "LOG_FILE")]
    pub log_file: String,

    /// Write one JSON document per loan after computing it
    #[serde(default)]
    pub persist_results: bool,

    /// Acknowledge batches immediately and compute out-of-band
    #[serde(default)]
    pub async_dispatch: bool,

    /// Reject transition rows that do not sum to 1.0
    #[serde(default)]
    pub strict_transition_rows: bool,
}

fn default_workers() -> usize { DEFAULT_WORKERS }
fn default_output_dir() -> PathBuf { PathBuf::from("output") }
fn default_log_path() -> String { "./logs/".to_string() }
fn default_log_file() -> String { "mortgage_cashflow.log".to_string() }

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            output_dir: default_output_dir(),
            log_path: default_log_path(),
            log_file: default_log_file(),
            persist_results: false,
            async_dispatch: false,
            strict_transition_rows: false,
        }
    }
}

impl ServiceConfig {
    /// Resolve, read and validate the configuration from the environment
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path(
            std::env::var_os("OCP_ENV").is_some(),
            std::env::var("CONFIG_PATH").ok().as_deref(),
        );
        log::info!("Reading in config from: {}", path.display());

        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            log::warn!("Config file {} not found, using defaults", path.display());
            Self::default()
        };

        if let Ok(raw) = std::env::var(WORKERS_ENV) {
            config.workers = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: WORKERS_ENV,
                reason: format!("expected a positive integer, got {raw:?}"),
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Read a specific config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidValue {
                key: "workers",
                reason: "worker limit must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Full path of the log file
    pub fn log_file_path(&self) -> PathBuf {
        PathBuf::from(format!("{}{}", self.log_path, self.log_file))
    }

    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            strict_transition_rows: self.strict_transition_rows,
        }
    }
}

/// Location of the config file: `./config.json` locally, `CONFIG_PATH` + file in a cluster
pub fn config_path(in_cluster: bool, config_dir: Option<&str>) -> PathBuf {
    match (in_cluster, config_dir) {
        (true, Some(dir)) => PathBuf::from(format!("{dir}{CONFIG_FILE}")),
        _ => PathBuf::from(".").join(CONFIG_FILE),
    }
}
