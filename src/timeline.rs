//! Derives per-client status timelines from sparse per-period ledger rows.
//!
//! Each client gets exactly one [`StatusCode`] per token of the injected
//! [`PeriodSet`], in fixed chronological order. Periods with ledger data are
//! classified from the raw status text; gaps are filled by a small state
//! machine so that an open client shows a single pending marker and a closed
//! client shows inactive markers for the rest of the horizon.

use std::collections::HashMap;

use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::schema::{LedgerRow, PeriodSet, StatusCode};

/// Derived status sequence for one client. Pure function of the current row
/// set; recomputed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClientTimeline {
    /// First 4 characters of the code portion of the client's earliest
    /// measurement id.
    pub measurement_code_prefix: String,
    pub client: String,
    /// Most recent non-empty responsible party, scanning periods in reverse.
    /// Only populated by [`build_timelines_with_responsible`].
    pub responsible_party: Option<String>,
    /// One entry per period token, in period-set order.
    pub statuses: Vec<StatusCode>,
}

/// Maps the free-text status to a lifecycle code. Comparison is on the
/// trimmed, upper-cased text.
pub fn classify(raw_status: &str) -> StatusCode {
    match raw_status.trim().to_uppercase().as_str() {
        "ATIVO" | "AG. FAT." | "PARCIAL" => StatusCode::Open,
        "FINALIZADO" => StatusCode::Closed,
        _ => StatusCode::Other,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastObserved {
    Unknown,
    Open,
    Closed,
    Other,
    Pending,
}

/// Gap-filling state carried across a client's periods. `pending_emitted`
/// is tracked separately from the last observation: once a pending marker
/// has been emitted, a later observed open period followed by another gap
/// must yield empty, never a second pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TimelineState {
    last: LastObserved,
    pending_emitted: bool,
}

impl TimelineState {
    fn initial() -> Self {
        Self {
            last: LastObserved::Unknown,
            pending_emitted: false,
        }
    }

    /// Pure transition: given the classified status for this period (or
    /// `None` when the client has no row), returns the emitted code and the
    /// next state.
    fn step(self, observed: Option<StatusCode>) -> (StatusCode, Self) {
        match observed {
            Some(code) => {
                let last = match code {
                    StatusCode::Open => LastObserved::Open,
                    StatusCode::Closed => LastObserved::Closed,
                    _ => LastObserved::Other,
                };
                (code, Self { last, ..self })
            }
            None => match self.last {
                LastObserved::Open if !self.pending_emitted => (
                    StatusCode::Pending,
                    Self {
                        last: LastObserved::Pending,
                        pending_emitted: true,
                    },
                ),
                // A closed client never reopens: every later gap stays inactive.
                LastObserved::Closed => (StatusCode::Inactive, self),
                _ => (StatusCode::Empty, self),
            },
        }
    }
}

/// Builds one timeline per client, in first-encounter order of clients.
///
/// Rows missing any of client, period code, status, or measurement id are
/// dropped before grouping; a client with no remaining row is excluded
/// entirely rather than reported as an error.
pub fn build_timelines(rows: &[LedgerRow], periods: &PeriodSet) -> Vec<ClientTimeline> {
    build(rows, periods, false)
}

/// Variant of [`build_timelines`] that also attaches the responsible party:
/// the first non-empty value found scanning the periods in reverse
/// chronological order.
pub fn build_timelines_with_responsible(
    rows: &[LedgerRow],
    periods: &PeriodSet,
) -> Vec<ClientTimeline> {
    build(rows, periods, true)
}

fn build(rows: &[LedgerRow], periods: &PeriodSet, with_responsible: bool) -> Vec<ClientTimeline> {
    let usable: Vec<&LedgerRow> = rows.iter().filter(|r| has_required_fields(r)).collect();

    // First-encounter order of clients; this is the display order downstream.
    let mut client_order: Vec<&str> = Vec::new();
    let mut by_client: HashMap<&str, Vec<&LedgerRow>> = HashMap::new();
    for row in &usable {
        let entry = by_client.entry(row.client.as_str()).or_default();
        if entry.is_empty() {
            client_order.push(row.client.as_str());
        }
        entry.push(row);
    }

    let timelines: Vec<ClientTimeline> = client_order
        .iter()
        .map(|client| {
            let client_rows = &by_client[client];

            // Period lookup; a later duplicate row for the same period
            // overwrites the earlier one, matching the source report.
            let mut by_period: HashMap<&str, &LedgerRow> = HashMap::new();
            for row in client_rows {
                by_period.insert(row.period_code.as_str(), row);
            }

            let mut state = TimelineState::initial();
            let mut statuses = Vec::with_capacity(periods.len());
            for token in periods.iter() {
                let observed = by_period
                    .get(token.as_str())
                    .map(|row| classify(&row.raw_status));
                let (code, next) = state.step(observed);
                statuses.push(code);
                state = next;
            }

            let responsible_party = if with_responsible {
                periods
                    .iter()
                    .rev()
                    .filter_map(|token| by_period.get(token.as_str()))
                    .map(|row| row.responsible_party.trim())
                    .find(|party| !party.is_empty())
                    .map(str::to_string)
            } else {
                None
            };

            ClientTimeline {
                measurement_code_prefix: code_prefix(client_rows[0]),
                client: client.to_string(),
                responsible_party,
                statuses,
            }
        })
        .collect();

    debug!(
        "Built {} timelines from {} usable rows over {} periods",
        timelines.len(),
        usable.len(),
        periods.len()
    );

    timelines
}

fn has_required_fields(row: &LedgerRow) -> bool {
    !row.client.is_empty()
        && !row.period_code.is_empty()
        && !row.raw_status.is_empty()
        && !row.measurement_id.is_empty()
}

fn code_prefix(row: &LedgerRow) -> String {
    row.measurement_code().chars().take(4).collect()
}
