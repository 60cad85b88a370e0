//! Per-loan result persistence

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::amortization::{AmortizationTable, LoanCashflow};
use crate::error::PersistError;
use crate::loan::LoanDescriptor;

/// Destination for finished loan cashflows
pub trait ResultSink: Send + Sync {
    /// Persist one loan's result; `batch_time` is shared by every loan in the batch
    fn persist(
        &self,
        loan: &LoanDescriptor,
        result: &LoanCashflow,
        batch_time: &DateTime<Local>,
    ) -> Result<(), PersistError>;
}

/// Layout of a persisted cashflow document
#[derive(Serialize)]
struct CashflowDocument<'a> {
    mortgage: &'a LoanDescriptor,
    local_date: String,
    amort_table: &'a AmortizationTable,
}

/// Writes one pretty-printed JSON document per loan into a directory
#[derive(Debug, Clone)]
pub struct JsonFileWriter {
    output_dir: PathBuf,
}

impl JsonFileWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// File path for a loan: `cashflow_<id>_<YYYYmmdd_HHMMSS>.json`.
    ///
    /// [`write`](Self::write) appends `_1`, `_2`, ... when that name is taken.
    pub fn file_path(&self, loan_id: &str, written_at: &DateTime<Local>) -> PathBuf {
        self.output_dir.join(format!(
            "cashflow_{}_{}.json",
            sanitize_id(loan_id),
            written_at.format("%Y%m%d_%H%M%S")
        ))
    }

    /// Write a loan's document and return the path written
    pub fn write(
        &self,
        loan: &LoanDescriptor,
        result: &LoanCashflow,
        batch_time: &DateTime<Local>,
    ) -> Result<PathBuf, PersistError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| PersistError::CreateDir {
            path: self.output_dir.clone(),
            source,
        })?;

        let (path, file) = create_unique(self.file_path(&loan.id, &Local::now()))?;
        let doc = CashflowDocument {
            mortgage: loan,
            local_date: batch_time.to_rfc3339(),
            amort_table: &result.cashflow,
        };

        let write_err = |source| PersistError::Write {
            path: path.clone(),
            source,
        };
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &doc).map_err(|source| PersistError::Serialize {
            loan_id: loan.id.clone(),
            source,
        })?;
        writer.write_all(b"\n").map_err(write_err)?;
        writer.flush().map_err(write_err)?;

        log::info!("Cashflow data saved to: {}", path.display());
        Ok(path)
    }
}

impl ResultSink for JsonFileWriter {
    fn persist(
        &self,
        loan: &LoanDescriptor,
        result: &LoanCashflow,
        batch_time: &DateTime<Local>,
    ) -> Result<(), PersistError> {
        self.write(loan, result, batch_time).map(|_| ())
    }
}

/// Create `base`, or the first free `<stem>_<n>.json` beside it.
///
/// Loans with the same sanitized ID written in the same second never
/// overwrite each other.
fn create_unique(base: PathBuf) -> Result<(PathBuf, File), PersistError> {
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("cashflow")
        .to_string();

    let mut path = base;
    let mut n = 0u32;
    loop {
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                n += 1;
                path = path.with_file_name(format!("{stem}_{n}.json"));
            }
            Err(source) => return Err(PersistError::Write { path, source }),
        }
    }
}

/// Keep IDs from escaping the output directory or producing odd file names
fn sanitize_id(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
