use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("No ledger rows found for period: {period}")]
    NoDataForPeriod { period: String },

    #[error("Period set must contain at least one token")]
    EmptyPeriodSet,

    #[error("Duplicate period token in period set: {0}")]
    DuplicatePeriodToken(String),

    #[error("Ledger source not found: {path}")]
    SourceUnavailable { path: PathBuf },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
