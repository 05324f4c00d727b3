//! Reads the backing ledger file into raw rows.
//!
//! The source is a delimited tabular export of the measurement report with
//! one header row naming the columns (see [`RawLedgerRow`] for the expected
//! names). A missing file is a recoverable [`LedgerError::SourceUnavailable`]
//! so the caller can fall back to an alternate location or prompt the user.

use std::path::Path;

use log::info;

use crate::error::{LedgerError, Result};
use crate::schema::RawLedgerRow;

/// Loads all raw rows from one CSV file.
pub fn load_raw_rows(path: impl AsRef<Path>) -> Result<Vec<RawLedgerRow>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(LedgerError::SourceUnavailable {
            path: path.to_path_buf(),
        });
    }

    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: RawLedgerRow = record?;
        rows.push(row);
    }

    info!("Loaded {} raw rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Tries a list of candidate locations in order and loads the first one
/// that exists; the surrounding application keeps such a list because the
/// report file moves between machines. Returns [`LedgerError::SourceUnavailable`]
/// for the last candidate when none exists, prompting the caller to request
/// an alternate source.
pub fn load_first_available<P: AsRef<Path>>(candidates: &[P]) -> Result<Vec<RawLedgerRow>> {
    let mut last_missing = None;
    for candidate in candidates {
        match load_raw_rows(candidate) {
            Err(LedgerError::SourceUnavailable { path }) => last_missing = Some(path),
            other => return other,
        }
    }
    Err(LedgerError::SourceUnavailable {
        path: last_missing.unwrap_or_default(),
    })
}
