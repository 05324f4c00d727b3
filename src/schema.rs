use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// One ledger row exactly as read from the backing spreadsheet/CSV, before
/// any typing. Every field is optional text; the [`Normalizer`](crate::normalizer)
/// decides what "missing" means per column.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawLedgerRow {
    #[schemars(description = "Client name, the identity key for timeline grouping")]
    pub client: Option<String>,

    #[schemars(
        description = "Reporting period token, e.g. '2401' for the first period of the year. Kept as text to preserve leading zeros."
    )]
    pub period_code: Option<String>,

    #[schemars(
        description = "Billing reference in the form '<4-digit-code>-<suffix>'. The code portion matches the same billing item across periods."
    )]
    pub measurement_id: Option<String>,

    #[schemars(description = "Free-text measurement status, e.g. 'ATIVO' or 'FINALIZADO'")]
    pub raw_status: Option<String>,

    #[schemars(description = "Person/team accountable for the measurement in this period")]
    pub responsible_party: Option<String>,

    #[schemars(description = "Amount actually invoiced. Left unknown when absent or non-numeric.")]
    pub invoiced_value: Option<String>,

    #[schemars(description = "Projected measurement value. Left unknown when absent or non-numeric.")]
    pub projected_value: Option<String>,

    #[schemars(description = "Maintenance deduction. Defaults to 0 when absent or non-numeric.")]
    pub maintenance_deduction: Option<String>,

    #[schemars(description = "Commercial discount. Defaults to 0 when absent or non-numeric.")]
    pub commercial_discount: Option<String>,

    #[schemars(description = "Excess distance charge. Defaults to 0 when absent or non-numeric.")]
    pub excess_distance: Option<String>,

    #[schemars(description = "Contractual fine. Defaults to 0 when absent or non-numeric.")]
    pub contractual_fine: Option<String>,

    #[schemars(description = "Adjustments and additions. Defaults to 0 when absent or non-numeric.")]
    pub adjustments: Option<String>,

    #[schemars(description = "Units rented this period. Left unknown when absent or non-numeric.")]
    pub units_rented: Option<String>,

    #[schemars(description = "Units held in reserve this period. Left unknown when absent or non-numeric.")]
    pub units_reserve: Option<String>,
}

impl RawLedgerRow {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(RawLedgerRow)
    }

    /// JSON Schema describing the loader contract, for documenting the
    /// expected column layout to the surrounding application.
    pub fn schema_as_json() -> Result<String> {
        let schema = Self::generate_json_schema();
        Ok(serde_json::to_string_pretty(&schema)?)
    }
}

/// One typed observation of a client in one reporting period.
///
/// Produced once per load by the normalizer and immutable thereafter; a new
/// load replaces the whole set. `Option<f64>` columns distinguish "unknown"
/// from "known zero".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LedgerRow {
    pub client: String,
    pub period_code: String,
    pub measurement_id: String,
    pub raw_status: String,
    pub responsible_party: String,
    pub invoiced_value: Option<f64>,
    pub projected_value: Option<f64>,
    pub maintenance_deduction: f64,
    pub commercial_discount: f64,
    pub excess_distance: f64,
    pub contractual_fine: f64,
    pub adjustments: f64,
    pub units_rented: Option<f64>,
    pub units_reserve: Option<f64>,
}

impl LedgerRow {
    /// The measurement code: the portion of the measurement id before the
    /// first `-`. A malformed id without a `-` yields the whole string.
    pub fn measurement_code(&self) -> &str {
        self.measurement_id
            .split('-')
            .next()
            .unwrap_or(&self.measurement_id)
    }
}

/// Lifecycle status of a client's billing relationship in one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum StatusCode {
    /// Measurement in progress ("ATIVO", "AG. FAT.", "PARCIAL").
    Open,
    /// Measurement finalized ("FINALIZADO").
    Closed,
    /// Any other non-empty status string.
    Other,
    /// First data-less period after an open one; at most one per timeline.
    Pending,
    /// Data-less period after the client closed out.
    Inactive,
    /// No information for this period.
    Empty,
}

impl StatusCode {
    /// Single-letter display symbol used in status matrices and exports.
    pub fn symbol(&self) -> &'static str {
        match self {
            StatusCode::Open => "A",
            StatusCode::Closed => "F",
            StatusCode::Other => "O",
            StatusCode::Pending => "P",
            StatusCode::Inactive => "X",
            StatusCode::Empty => "",
        }
    }
}

/// Ordered, duplicate-free list of period tokens defining the reporting
/// horizon. The canonical set is 12 consecutive months of one year, but any
/// non-empty token list is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PeriodSet {
    tokens: Vec<String>,
}

impl PeriodSet {
    pub fn new(tokens: Vec<String>) -> Result<Self> {
        if tokens.is_empty() {
            return Err(LedgerError::EmptyPeriodSet);
        }
        for (i, token) in tokens.iter().enumerate() {
            if tokens[..i].contains(token) {
                return Err(LedgerError::DuplicatePeriodToken(token.clone()));
            }
        }
        Ok(Self { tokens })
    }

    /// The canonical 12-month set for a two-digit year prefix:
    /// `for_year_prefix("24")` yields "2401" through "2412".
    pub fn for_year_prefix(prefix: &str) -> Self {
        let tokens = (1..=12).map(|m| format!("{}{:02}", prefix, m)).collect();
        Self { tokens }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.tokens.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_generation() {
        let schema_json = RawLedgerRow::schema_as_json().unwrap();
        assert!(schema_json.contains("period_code"));
        assert!(schema_json.contains("measurement_id"));
        assert!(schema_json.contains("invoiced_value"));
    }

    #[test]
    fn test_measurement_code() {
        let mut row = sample_row();
        assert_eq!(row.measurement_code(), "1001");

        row.measurement_id = "10015".to_string();
        assert_eq!(row.measurement_code(), "10015");
    }

    #[test]
    fn test_period_set_for_year_prefix() {
        let periods = PeriodSet::for_year_prefix("24");
        assert_eq!(periods.len(), 12);
        assert_eq!(periods.tokens().first().unwrap(), "2401");
        assert_eq!(periods.tokens().last().unwrap(), "2412");
    }

    #[test]
    fn test_period_set_rejects_empty_and_duplicates() {
        assert!(matches!(
            PeriodSet::new(vec![]),
            Err(LedgerError::EmptyPeriodSet)
        ));
        assert!(matches!(
            PeriodSet::new(vec!["2401".to_string(), "2401".to_string()]),
            Err(LedgerError::DuplicatePeriodToken(_))
        ));
    }

    #[test]
    fn test_ledger_row_serialization_round_trip() {
        let row = sample_row();
        let json = serde_json::to_string(&row).unwrap();
        let back: LedgerRow = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }

    fn sample_row() -> LedgerRow {
        LedgerRow {
            client: "ACME".to_string(),
            period_code: "2401".to_string(),
            measurement_id: "1001-3".to_string(),
            raw_status: "ATIVO".to_string(),
            responsible_party: "Ana".to_string(),
            invoiced_value: Some(1000.0),
            projected_value: Some(1000.0),
            maintenance_deduction: 0.0,
            commercial_discount: 0.0,
            excess_distance: 0.0,
            contractual_fine: 0.0,
            adjustments: 0.0,
            units_rented: Some(4.0),
            units_reserve: None,
        }
    }
}
