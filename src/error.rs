//! Error types for loan validation, batch dispatch, configuration and I/O

use std::path::PathBuf;
use thiserror::Error;

/// Reasons a single loan descriptor is rejected before any computation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("loan ID cannot be empty")]
    EmptyId,

    #[error("loan ID must be at most {max} characters, got {len}")]
    IdTooLong { len: usize, max: usize },

    #[error("WAM must be between 1 and 480 months, got {0}")]
    WamOutOfRange(i64),

    #[error("WAC must be between 0 and 30 percent, got {0}")]
    WacOutOfRange(f64),

    #[error("face value must be positive and at most 1e8, got {0}")]
    FaceOutOfRange(f64),

    #[error("CPR must be in [0, 1), got {0}")]
    CprOutOfRange(f64),

    #[error("{state} transition must have {expected} entries, got {len}")]
    TransitionLength {
        state: &'static str,
        expected: usize,
        len: usize,
    },

    #[error("{state} transition entry {index} must be a non-negative number, got {value}")]
    TransitionEntry {
        state: &'static str,
        index: usize,
        value: f64,
    },

    #[error("{state} transition must sum to 1.0, got {sum}")]
    TransitionRowSum { state: &'static str, sum: f64 },

    #[error("SMM array must have {expected} entries (one per period), got {len}")]
    SmmLength { expected: usize, len: usize },

    #[error("SMM entry {index} must be in [0, 1], got {value}")]
    SmmEntry { index: usize, value: f64 },
}

/// Failure of a whole batch request.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("loan {index} ({loan_id}) failed validation: {source}")]
    InvalidLoan {
        index: usize,
        loan_id: String,
        #[source]
        source: ValidationError,
    },

    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("worker for loan {index} exited without a result")]
    WorkerLost { index: usize },
}

impl BatchError {
    /// Input index of the offending loan, when the error is a validation failure.
    pub fn loan_index(&self) -> Option<usize> {
        match self {
            BatchError::InvalidLoan { index, .. } => Some(*index),
            BatchError::Pool(_) | BatchError::WorkerLost { .. } => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize cashflow for loan {loan_id}: {source}")]
    Serialize {
        loan_id: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid loan JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid loan CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("unsupported loan file extension for {0} (expected .json or .csv)")]
    UnsupportedFormat(PathBuf),
}
