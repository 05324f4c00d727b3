//! Expected-vs-invoiced reconciliation.
//!
//! The expected value combines the projected measurement with its
//! deductions, discounts and additive adjustments. Differences inside a
//! small tolerance band are treated as zero to absorb currency-rounding
//! noise without masking real billing disagreements.

use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::schema::LedgerRow;

/// Tolerance band for currency comparisons, in currency units.
pub const DEFAULT_TOLERANCE: f64 = 0.05;

/// The reconciliation formula shared by the discrepancy and month-comparison
/// engines, so the sign conventions can never drift apart:
/// `projected − maintenance − discount + excess + fine + adjustments`.
pub fn expected_value(
    projected: f64,
    maintenance: f64,
    discount: f64,
    excess: f64,
    fine: f64,
    adjustments: f64,
) -> f64 {
    projected - maintenance - discount + excess + fine + adjustments
}

/// [`expected_value`] over a row, with an unknown projected value treated
/// as 0 (the month-comparison convention for one-sided records).
pub fn row_expected_or_zero(row: &LedgerRow) -> f64 {
    expected_value(
        row.projected_value.unwrap_or(0.0),
        row.maintenance_deduction,
        row.commercial_discount,
        row.excess_distance,
        row.contractual_fine,
        row.adjustments,
    )
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Collapses values inside the tolerance band to exactly 0.
pub(crate) fn apply_tolerance(value: f64, tolerance: f64) -> f64 {
    if value.abs() <= tolerance {
        0.0
    } else {
        value
    }
}

/// One ledger row whose invoiced amount disagrees with the expected amount
/// beyond tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DiscrepancyRecord {
    pub period_code: String,
    pub client: String,
    pub measurement_id: String,
    pub responsible_party: String,
    pub raw_status: String,
    pub invoiced_value: f64,
    pub projected_value: f64,
    pub maintenance_deduction: f64,
    pub commercial_discount: f64,
    pub excess_distance: f64,
    pub contractual_fine: f64,
    pub adjustments: f64,
    /// `expected − invoiced`, rounded to 2 decimals.
    pub difference: f64,
}

pub struct ReconciliationEngine {
    tolerance: f64,
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    pub fn with_tolerance(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Returns one record per row where `|expected − invoiced|` exceeds the
    /// tolerance after rounding to 2 decimals.
    ///
    /// Rows with an unknown projected or invoiced value never reconcile to a
    /// number and are excluded rather than reported; callers that care about
    /// incomplete data can scan the rows for `None` values directly.
    pub fn compute_discrepancies(&self, rows: &[LedgerRow]) -> Vec<DiscrepancyRecord> {
        let records: Vec<DiscrepancyRecord> = rows
            .iter()
            .filter_map(|row| self.check_row(row))
            .collect();

        debug!(
            "Reconciliation found {} discrepancies in {} rows",
            records.len(),
            rows.len()
        );

        records
    }

    fn check_row(&self, row: &LedgerRow) -> Option<DiscrepancyRecord> {
        let projected = row.projected_value?;
        let invoiced = row.invoiced_value?;

        let expected = expected_value(
            projected,
            row.maintenance_deduction,
            row.commercial_discount,
            row.excess_distance,
            row.contractual_fine,
            row.adjustments,
        );
        let difference = apply_tolerance(round2(expected - invoiced), self.tolerance);
        if difference == 0.0 {
            return None;
        }

        Some(DiscrepancyRecord {
            period_code: row.period_code.clone(),
            client: row.client.clone(),
            measurement_id: row.measurement_id.clone(),
            responsible_party: row.responsible_party.clone(),
            raw_status: row.raw_status.clone(),
            invoiced_value: invoiced,
            projected_value: projected,
            maintenance_deduction: row.maintenance_deduction,
            commercial_discount: row.commercial_discount,
            excess_distance: row.excess_distance,
            contractual_fine: row.contractual_fine,
            adjustments: row.adjustments,
            difference,
        })
    }
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// [`ReconciliationEngine::compute_discrepancies`] with the default
/// tolerance.
pub fn compute_discrepancies(rows: &[LedgerRow]) -> Vec<DiscrepancyRecord> {
    ReconciliationEngine::new().compute_discrepancies(rows)
}
