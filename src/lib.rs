//! # Measurement Ledger
//!
//! A library for deriving reporting views from a sparse monthly
//! billing/measurement ledger (one row per client per reporting period).
//!
//! ## Core Concepts
//!
//! - **Ledger snapshot**: an immutable, typed row set produced by one load;
//!   a reload replaces the whole snapshot and all derived results
//! - **Status timeline**: one lifecycle code per period per client, with
//!   gaps filled by a small state machine (pending after an open period,
//!   inactive forever after a closed one)
//! - **Reconciliation**: expected-vs-invoiced differences outside a 0.05
//!   currency-unit tolerance band
//! - **Month comparison**: per-measurement-code deltas of the
//!   reconciliation inputs between two selected periods
//!
//! ## Example
//!
//! ```rust,ignore
//! use measurement_ledger::{LedgerSnapshot, PeriodSet};
//!
//! let periods = PeriodSet::for_year_prefix("24");
//! let snapshot = LedgerSnapshot::load("RELATORIO_GERAL.csv", periods)?;
//!
//! let timelines = snapshot.timelines_with_responsible();
//! let discrepancies = snapshot.discrepancies();
//! let comparison = snapshot.compare_months("2401", "2402")?;
//! ```

pub mod comparison;
pub mod error;
pub mod export;
pub mod loader;
pub mod normalizer;
pub mod reconciliation;
pub mod schema;
pub mod summary;
pub mod timeline;

pub use comparison::{compare_months, DeltaColumn, MonthComparison, MonthDeltaRecord};
pub use error::{LedgerError, Result};
pub use export::{
    export_comparison, export_discrepancies, export_summary, export_timelines,
    timestamped_export_path,
};
pub use loader::{load_first_available, load_raw_rows};
pub use normalizer::{normalize, normalize_row, parse_number};
pub use reconciliation::{
    compute_discrepancies, expected_value, DiscrepancyRecord, ReconciliationEngine,
    DEFAULT_TOLERANCE,
};
pub use schema::{LedgerRow, PeriodSet, RawLedgerRow, StatusCode};
pub use summary::{summarize, LedgerSummary, PeriodSummary, ValueTotals};
pub use timeline::{
    build_timelines, build_timelines_with_responsible, classify, ClientTimeline,
};

use std::path::Path;

use log::{debug, info};

/// An immutable snapshot of the normalized ledger plus the reporting
/// horizon. All derivations are pure functions of the snapshot and are
/// recomputed on demand; after a reload the caller must discard results
/// computed against the old snapshot.
pub struct LedgerSnapshot {
    rows: Vec<LedgerRow>,
    periods: PeriodSet,
}

impl LedgerSnapshot {
    pub fn new(rows: Vec<LedgerRow>, periods: PeriodSet) -> Self {
        debug!(
            "Snapshot created with {} rows over {} periods",
            rows.len(),
            periods.len()
        );
        Self { rows, periods }
    }

    pub fn from_raw(raw_rows: &[RawLedgerRow], periods: PeriodSet) -> Self {
        Self::new(normalizer::normalize(raw_rows), periods)
    }

    /// Loads and normalizes the backing file in one step.
    pub fn load(path: impl AsRef<Path>, periods: PeriodSet) -> Result<Self> {
        let raw = loader::load_raw_rows(path)?;
        info!("Building ledger snapshot from {} raw rows", raw.len());
        Ok(Self::from_raw(&raw, periods))
    }

    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    pub fn periods(&self) -> &PeriodSet {
        &self.periods
    }

    pub fn timelines(&self) -> Vec<ClientTimeline> {
        timeline::build_timelines(&self.rows, &self.periods)
    }

    pub fn timelines_with_responsible(&self) -> Vec<ClientTimeline> {
        timeline::build_timelines_with_responsible(&self.rows, &self.periods)
    }

    pub fn discrepancies(&self) -> Vec<DiscrepancyRecord> {
        reconciliation::compute_discrepancies(&self.rows)
    }

    pub fn compare_months(&self, period_a: &str, period_b: &str) -> Result<MonthComparison> {
        comparison::compare_months(&self.rows, period_a, period_b)
    }

    pub fn summary(&self) -> LedgerSummary {
        summary::summarize(&self.rows, &self.periods)
    }
}
