//! Aggregate totals over the ledger: overall and per reporting period.
//!
//! These feed the closing-report cards and charts of the surrounding
//! application: value totals per period, the net of the variable columns,
//! and per-period counts of first-seen and closed clients.

use std::collections::{HashMap, HashSet};

use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::schema::{LedgerRow, PeriodSet, StatusCode};
use crate::timeline::classify;

/// Sums of the numeric ledger columns over some row subset. Unknown values
/// contribute nothing (unknown is not zero, but it cannot be summed either).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValueTotals {
    pub row_count: usize,
    pub invoiced_value: f64,
    pub projected_value: f64,
    pub maintenance_deduction: f64,
    pub commercial_discount: f64,
    pub excess_distance: f64,
    pub contractual_fine: f64,
    pub adjustments: f64,
    pub units_rented: f64,
}

impl ValueTotals {
    fn add(&mut self, row: &LedgerRow) {
        self.row_count += 1;
        self.invoiced_value += row.invoiced_value.unwrap_or(0.0);
        self.projected_value += row.projected_value.unwrap_or(0.0);
        self.maintenance_deduction += row.maintenance_deduction;
        self.commercial_discount += row.commercial_discount;
        self.excess_distance += row.excess_distance;
        self.contractual_fine += row.contractual_fine;
        self.adjustments += row.adjustments;
        self.units_rented += row.units_rented.unwrap_or(0.0);
    }

    /// Net effect of the variable columns on the expected value:
    /// `−maintenance − discount + excess + fine + adjustments`.
    pub fn variables_net(&self) -> f64 {
        -self.maintenance_deduction - self.commercial_discount
            + self.excess_distance
            + self.contractual_fine
            + self.adjustments
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PeriodSummary {
    pub period_code: String,
    pub totals: ValueTotals,
    /// Clients whose first ledger appearance falls in this period.
    pub new_clients: usize,
    /// Distinct clients with a closed status in this period.
    pub closed_clients: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LedgerSummary {
    pub overall: ValueTotals,
    pub periods: Vec<PeriodSummary>,
}

/// Aggregates the whole row set: overall totals plus one summary per token
/// of the period set, in period order. Rows whose period code is not in the
/// set still count toward the overall totals.
pub fn summarize(rows: &[LedgerRow], periods: &PeriodSet) -> LedgerSummary {
    let mut overall = ValueTotals::default();
    let mut per_period: HashMap<&str, ValueTotals> = HashMap::new();
    let mut new_clients: HashMap<&str, usize> = HashMap::new();
    let mut closed_clients: HashMap<&str, HashSet<&str>> = HashMap::new();
    let mut seen_clients: HashSet<&str> = HashSet::new();

    for row in rows {
        overall.add(row);
        per_period
            .entry(row.period_code.as_str())
            .or_default()
            .add(row);

        if !row.client.is_empty() && seen_clients.insert(row.client.as_str()) {
            *new_clients.entry(row.period_code.as_str()).or_default() += 1;
        }
        if classify(&row.raw_status) == StatusCode::Closed && !row.client.is_empty() {
            closed_clients
                .entry(row.period_code.as_str())
                .or_default()
                .insert(row.client.as_str());
        }
    }

    let period_summaries: Vec<PeriodSummary> = periods
        .iter()
        .map(|token| PeriodSummary {
            period_code: token.clone(),
            totals: per_period.remove(token.as_str()).unwrap_or_default(),
            new_clients: new_clients.get(token.as_str()).copied().unwrap_or(0),
            closed_clients: closed_clients
                .get(token.as_str())
                .map(HashSet::len)
                .unwrap_or(0),
        })
        .collect();

    debug!(
        "Summarized {} rows into {} period summaries",
        overall.row_count,
        period_summaries.len()
    );

    LedgerSummary {
        overall,
        periods: period_summaries,
    }
}
