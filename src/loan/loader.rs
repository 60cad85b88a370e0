//! Load loan batches from JSON or CSV files

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;

use super::LoanDescriptor;
use crate::error::LoadError;

/// One row of a loan tape in CSV form.
///
/// Transition rows are not representable in the flat CSV layout; loans that
/// need custom roll rates must come in as JSON.
#[derive(Debug, Deserialize)]
struct LoanRow {
    id: String,
    wam: i64,
    wac: f64,
    face: f64,
    #[serde(default)]
    prepay_cpr: Option<f64>,
    #[serde(default)]
    static_dq: Option<bool>,
}

impl From<LoanRow> for LoanDescriptor {
    fn from(row: LoanRow) -> Self {
        let mut loan = LoanDescriptor::new(row.id, 0, row.wac, row.face)
            .with_cpr(row.prepay_cpr.unwrap_or(0.0))
            .with_static_dq(row.static_dq.unwrap_or(false));
        loan.wam = row.wam;
        loan
    }
}

/// Load loans from a `.json` (array of descriptors) or `.csv` file
pub fn load_loans(path: impl AsRef<Path>) -> Result<Vec<LoanDescriptor>, LoadError> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let loans = match ext.as_deref() {
        Some("json") => load_loans_from_json(reader)?,
        Some("csv") => load_loans_from_reader(reader)?,
        _ => return Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    };

    log::info!("Loaded {} loans from {}", loans.len(), path.display());
    Ok(loans)
}

/// Parse a JSON array of loan descriptors
pub fn load_loans_from_json<R: Read>(reader: R) -> Result<Vec<LoanDescriptor>, LoadError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Parse a CSV loan tape with header `id,wam,wac,face[,prepay_cpr][,static_dq]`
pub fn load_loans_from_reader<R: Read>(reader: R) -> Result<Vec<LoanDescriptor>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut loans = Vec::new();
    for row in rdr.deserialize::<LoanRow>() {
        loans.push(row?.into());
    }
    Ok(loans)
}
