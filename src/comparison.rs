//! Month-over-month deltas of the reconciliation inputs.
//!
//! Rows from two selected periods are matched by measurement code (the
//! portion of the measurement id before the first `-`) and compared column
//! by column, reusing the reconciliation formula for the aggregate
//! difference so the two engines share one set of sign conventions.

use std::collections::HashMap;

use log::{debug, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::reconciliation::{apply_tolerance, round2, row_expected_or_zero, DEFAULT_TOLERANCE};
use crate::schema::LedgerRow;

/// Numeric columns of a [`MonthDeltaRecord`], in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeltaColumn {
    DifferenceValue,
    ProjectedValue,
    MaintenanceDeduction,
    CommercialDiscount,
    ExcessDistance,
    ContractualFine,
    Adjustments,
    UnitsRented,
    UnitsReserve,
}

impl DeltaColumn {
    pub const ALL: [DeltaColumn; 9] = [
        DeltaColumn::DifferenceValue,
        DeltaColumn::ProjectedValue,
        DeltaColumn::MaintenanceDeduction,
        DeltaColumn::CommercialDiscount,
        DeltaColumn::ExcessDistance,
        DeltaColumn::ContractualFine,
        DeltaColumn::Adjustments,
        DeltaColumn::UnitsRented,
        DeltaColumn::UnitsReserve,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            DeltaColumn::DifferenceValue => "difference_value",
            DeltaColumn::ProjectedValue => "projected_value",
            DeltaColumn::MaintenanceDeduction => "maintenance_deduction",
            DeltaColumn::CommercialDiscount => "commercial_discount",
            DeltaColumn::ExcessDistance => "excess_distance",
            DeltaColumn::ContractualFine => "contractual_fine",
            DeltaColumn::Adjustments => "adjustments",
            DeltaColumn::UnitsRented => "units_rented",
            DeltaColumn::UnitsReserve => "units_reserve",
        }
    }
}

/// Signed deltas for one measurement code present in either selected period.
/// Unknown numeric inputs count as 0 here; a one-sided code mirrors its
/// period's raw values (positive for the first period, negative for the
/// second), not a netting against the invoiced amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MonthDeltaRecord {
    /// Which period(s) the record came from: "A", "B", or "A vs B".
    pub period_label: String,
    pub client: String,
    pub measurement_code: String,
    pub projected_value: f64,
    pub maintenance_deduction: f64,
    pub commercial_discount: f64,
    pub excess_distance: f64,
    pub contractual_fine: f64,
    pub adjustments: f64,
    pub units_rented: f64,
    pub units_reserve: f64,
    /// Delta of the reconciliation-formula expected value, after tolerance.
    pub difference_value: f64,
}

impl MonthDeltaRecord {
    pub fn value(&self, column: DeltaColumn) -> f64 {
        match column {
            DeltaColumn::DifferenceValue => self.difference_value,
            DeltaColumn::ProjectedValue => self.projected_value,
            DeltaColumn::MaintenanceDeduction => self.maintenance_deduction,
            DeltaColumn::CommercialDiscount => self.commercial_discount,
            DeltaColumn::ExcessDistance => self.excess_distance,
            DeltaColumn::ContractualFine => self.contractual_fine,
            DeltaColumn::Adjustments => self.adjustments,
            DeltaColumn::UnitsRented => self.units_rented,
            DeltaColumn::UnitsReserve => self.units_reserve,
        }
    }
}

/// Result of comparing two periods: the delta records plus the column set
/// that survived pruning (columns that are zero in every record are
/// dropped to keep the output readable).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MonthComparison {
    pub period_a: String,
    pub period_b: String,
    pub records: Vec<MonthDeltaRecord>,
    pub columns: Vec<DeltaColumn>,
}

/// Compares the reconciliation inputs of two periods, keyed by measurement
/// code. Fails with [`LedgerError::NoDataForPeriod`] when either period has
/// no rows; that aborts this call only.
pub fn compare_months(
    rows: &[LedgerRow],
    period_a: &str,
    period_b: &str,
) -> Result<MonthComparison> {
    let rows_a: Vec<&LedgerRow> = rows.iter().filter(|r| r.period_code == period_a).collect();
    let rows_b: Vec<&LedgerRow> = rows.iter().filter(|r| r.period_code == period_b).collect();

    if rows_a.is_empty() {
        return Err(LedgerError::NoDataForPeriod {
            period: period_a.to_string(),
        });
    }
    if rows_b.is_empty() {
        return Err(LedgerError::NoDataForPeriod {
            period: period_b.to_string(),
        });
    }

    let keyed_a = key_by_code(&rows_a, period_a);
    let keyed_b = key_by_code(&rows_b, period_b);

    // Union of codes in first-encounter order: period A's codes in row
    // order, then period B's codes not already seen.
    let mut codes: Vec<&str> = Vec::new();
    for row in rows_a.iter().chain(rows_b.iter()) {
        let code = row.measurement_code();
        if !codes.contains(&code) {
            codes.push(code);
        }
    }

    let records: Vec<MonthDeltaRecord> = codes
        .iter()
        .map(|code| {
            let a = keyed_a.get(code).copied();
            let b = keyed_b.get(code).copied();
            match (a, b) {
                (Some(a), Some(b)) => delta_record(code, a, b, period_a, period_b),
                (Some(a), None) => one_sided_record(code, a, period_a, 1.0),
                (None, Some(b)) => one_sided_record(code, b, period_b, -1.0),
                (None, None) => unreachable!("code came from one of the two periods"),
            }
        })
        .collect();

    let columns = retained_columns(&records);

    debug!(
        "Compared {} vs {}: {} codes, {} columns retained",
        period_a,
        period_b,
        records.len(),
        columns.len()
    );

    Ok(MonthComparison {
        period_a: period_a.to_string(),
        period_b: period_b.to_string(),
        records,
        columns,
    })
}

/// First row per code wins, matching the source report. Duplicates within a
/// period are a data-quality problem, so they are logged rather than
/// silently absorbed.
fn key_by_code<'a>(rows: &[&'a LedgerRow], period: &str) -> HashMap<&'a str, &'a LedgerRow> {
    let mut keyed: HashMap<&str, &LedgerRow> = HashMap::new();
    for row in rows {
        let code = row.measurement_code();
        if keyed.contains_key(code) {
            warn!(
                "Duplicate measurement code {} in period {}; keeping the first row",
                code, period
            );
        } else {
            keyed.insert(code, row);
        }
    }
    keyed
}

fn delta_record(
    code: &str,
    a: &LedgerRow,
    b: &LedgerRow,
    period_a: &str,
    period_b: &str,
) -> MonthDeltaRecord {
    let difference = round2(row_expected_or_zero(b) - row_expected_or_zero(a));
    MonthDeltaRecord {
        period_label: format!("{} vs {}", period_a, period_b),
        client: a.client.clone(),
        measurement_code: code.to_string(),
        projected_value: round2(
            b.projected_value.unwrap_or(0.0) - a.projected_value.unwrap_or(0.0),
        ),
        maintenance_deduction: round2(b.maintenance_deduction - a.maintenance_deduction),
        commercial_discount: round2(b.commercial_discount - a.commercial_discount),
        excess_distance: round2(b.excess_distance - a.excess_distance),
        contractual_fine: round2(b.contractual_fine - a.contractual_fine),
        adjustments: round2(b.adjustments - a.adjustments),
        units_rented: round2(b.units_rented.unwrap_or(0.0) - a.units_rented.unwrap_or(0.0)),
        units_reserve: round2(b.units_reserve.unwrap_or(0.0) - a.units_reserve.unwrap_or(0.0)),
        difference_value: apply_tolerance(difference, DEFAULT_TOLERANCE),
    }
}

fn one_sided_record(code: &str, row: &LedgerRow, period: &str, sign: f64) -> MonthDeltaRecord {
    let difference = round2(sign * row_expected_or_zero(row));
    MonthDeltaRecord {
        period_label: period.to_string(),
        client: row.client.clone(),
        measurement_code: code.to_string(),
        projected_value: round2(sign * row.projected_value.unwrap_or(0.0)),
        maintenance_deduction: round2(sign * row.maintenance_deduction),
        commercial_discount: round2(sign * row.commercial_discount),
        excess_distance: round2(sign * row.excess_distance),
        contractual_fine: round2(sign * row.contractual_fine),
        adjustments: round2(sign * row.adjustments),
        units_rented: round2(sign * row.units_rented.unwrap_or(0.0)),
        units_reserve: round2(sign * row.units_reserve.unwrap_or(0.0)),
        difference_value: apply_tolerance(difference, DEFAULT_TOLERANCE),
    }
}

fn retained_columns(records: &[MonthDeltaRecord]) -> Vec<DeltaColumn> {
    DeltaColumn::ALL
        .into_iter()
        .filter(|column| records.iter().any(|record| record.value(*column) != 0.0))
        .collect()
}
