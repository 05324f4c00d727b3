//! Coerces raw ledger text fields into typed [`LedgerRow`] values.
//!
//! Column policy (matching the source report):
//! - the five deduction/fee columns default to 0 when absent or non-numeric;
//! - invoiced/projected values and the two quantity columns stay unknown
//!   (`None`) instead, so consumers can tell "known zero" from "no data";
//! - text columns are trimmed; the period code stays text to preserve
//!   leading zeros.

use log::{debug, warn};

use crate::schema::{LedgerRow, RawLedgerRow};

/// Parses a numeric cell. Accepts plain decimal text as well as the source
/// locale's comma decimal separator with optional `.` thousands grouping
/// ("1.234,56"). Returns `None` for anything else.
pub fn parse_number(raw: Option<&str>) -> Option<f64> {
    let text = raw?.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(value) = text.parse::<f64>() {
        return value.is_finite().then_some(value);
    }
    // Locale fallback: "1.234,56" -> "1234.56"
    let normalized = text.replace('.', "").replace(',', ".");
    normalized
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn trimmed(raw: &Option<String>) -> String {
    raw.as_deref().unwrap_or("").trim().to_string()
}

/// [`parse_number`] plus a data-quality warning when a non-empty cell is
/// dropped as unparseable. An absent or blank cell is ordinary missing data
/// and stays silent.
fn parse_cell(raw: &Option<String>, column: &str) -> Option<f64> {
    let value = parse_number(raw.as_deref());
    if value.is_none() {
        if let Some(text) = raw.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            warn!("Dropping unparseable {} cell: {:?}", column, text);
        }
    }
    value
}

/// Converts one raw row into a typed row. Never fails: missing identity
/// fields become empty strings (and are filtered later by the consumers
/// that require them).
pub fn normalize_row(raw: &RawLedgerRow) -> LedgerRow {
    LedgerRow {
        client: trimmed(&raw.client),
        period_code: trimmed(&raw.period_code),
        measurement_id: trimmed(&raw.measurement_id),
        raw_status: trimmed(&raw.raw_status),
        responsible_party: trimmed(&raw.responsible_party),
        invoiced_value: parse_cell(&raw.invoiced_value, "invoiced_value"),
        projected_value: parse_cell(&raw.projected_value, "projected_value"),
        maintenance_deduction: parse_cell(&raw.maintenance_deduction, "maintenance_deduction")
            .unwrap_or(0.0),
        commercial_discount: parse_cell(&raw.commercial_discount, "commercial_discount")
            .unwrap_or(0.0),
        excess_distance: parse_cell(&raw.excess_distance, "excess_distance").unwrap_or(0.0),
        contractual_fine: parse_cell(&raw.contractual_fine, "contractual_fine").unwrap_or(0.0),
        adjustments: parse_cell(&raw.adjustments, "adjustments").unwrap_or(0.0),
        units_rented: parse_cell(&raw.units_rented, "units_rented"),
        units_reserve: parse_cell(&raw.units_reserve, "units_reserve"),
    }
}

/// Normalizes a whole raw collection. Does not mutate its input; a reload
/// produces a brand-new row set.
pub fn normalize(raw_rows: &[RawLedgerRow]) -> Vec<LedgerRow> {
    let rows: Vec<LedgerRow> = raw_rows.iter().map(normalize_row).collect();
    debug!("Normalized {} ledger rows", rows.len());
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(field: &str) -> Option<String> {
        Some(field.to_string())
    }

    #[test]
    fn test_parse_number_plain_and_locale() {
        assert_eq!(parse_number(Some("1500.25")), Some(1500.25));
        assert_eq!(parse_number(Some("  42 ")), Some(42.0));
        assert_eq!(parse_number(Some("1.234,56")), Some(1234.56));
        assert_eq!(parse_number(Some("980,10")), Some(980.10));
        assert_eq!(parse_number(Some("n/a")), None);
        assert_eq!(parse_number(Some("")), None);
        assert_eq!(parse_number(None), None);
    }

    #[test]
    fn test_deduction_columns_default_to_zero() {
        let row = normalize_row(&RawLedgerRow {
            client: raw("ACME"),
            period_code: raw("2401"),
            measurement_id: raw("1001-1"),
            raw_status: raw("ATIVO"),
            maintenance_deduction: raw("not a number"),
            ..Default::default()
        });

        assert_eq!(row.maintenance_deduction, 0.0);
        assert_eq!(row.commercial_discount, 0.0);
        assert_eq!(row.excess_distance, 0.0);
        assert_eq!(row.contractual_fine, 0.0);
        assert_eq!(row.adjustments, 0.0);
    }

    #[test]
    fn test_value_columns_stay_unknown() {
        let row = normalize_row(&RawLedgerRow {
            invoiced_value: raw("pending"),
            units_rented: None,
            ..Default::default()
        });

        assert_eq!(row.invoiced_value, None);
        assert_eq!(row.projected_value, None);
        assert_eq!(row.units_rented, None);
        assert_eq!(row.units_reserve, None);
    }

    #[test]
    fn test_unparseable_cells_are_dropped_like_blank_ones() {
        // A garbage cell is dropped (and warned about); a blank cell is
        // ordinary missing data. Both land on the same typed value.
        let garbage = normalize_row(&RawLedgerRow {
            invoiced_value: raw("R$ ???"),
            contractual_fine: raw("tbd"),
            ..Default::default()
        });
        let blank = normalize_row(&RawLedgerRow {
            invoiced_value: raw("  "),
            contractual_fine: None,
            ..Default::default()
        });

        assert_eq!(garbage.invoiced_value, None);
        assert_eq!(blank.invoiced_value, None);
        assert_eq!(garbage.contractual_fine, 0.0);
        assert_eq!(blank.contractual_fine, 0.0);
    }

    #[test]
    fn test_period_code_keeps_leading_zeros() {
        let row = normalize_row(&RawLedgerRow {
            period_code: raw(" 0401 "),
            ..Default::default()
        });
        assert_eq!(row.period_code, "0401");
    }

    #[test]
    fn test_normalize_does_not_drop_rows() {
        let rows = normalize(&[RawLedgerRow::default(), RawLedgerRow::default()]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].client, "");
    }
}
