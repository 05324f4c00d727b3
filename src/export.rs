//! Writes derived result collections to tabular files.
//!
//! The exporter never mutates the records it is given; it only projects
//! them onto CSV rows. Destination paths come from the caller; a helper
//! builds the timestamped filenames the surrounding application uses.

use std::path::{Path, PathBuf};

use chrono::Local;
use log::info;

use crate::comparison::MonthComparison;
use crate::error::Result;
use crate::reconciliation::DiscrepancyRecord;
use crate::schema::PeriodSet;
use crate::summary::LedgerSummary;
use crate::timeline::ClientTimeline;

/// Timestamped destination like `Status_Matrix_05-08-2024_14-30-00.csv`,
/// matching the naming convention of the report exports.
pub fn timestamped_export_path(dir: impl AsRef<Path>, label: &str) -> PathBuf {
    let stamp = Local::now().format("%d-%m-%Y_%H-%M-%S");
    dir.as_ref().join(format!("{}_{}.csv", label, stamp))
}

/// Writes the status matrix: one row per client, one column per period
/// token, cells carrying the single-letter status symbols.
pub fn export_timelines(
    timelines: &[ClientTimeline],
    periods: &PeriodSet,
    path: impl AsRef<Path>,
) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec![
        "measurement_code_prefix".to_string(),
        "client".to_string(),
        "responsible_party".to_string(),
    ];
    header.extend(periods.iter().cloned());
    writer.write_record(&header)?;

    for timeline in timelines {
        let mut record = vec![
            timeline.measurement_code_prefix.clone(),
            timeline.client.clone(),
            timeline.responsible_party.clone().unwrap_or_default(),
        ];
        record.extend(timeline.statuses.iter().map(|s| s.symbol().to_string()));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    info!("Exported {} timelines to {}", timelines.len(), path.display());
    Ok(())
}

/// Writes the reconciliation report, one row per discrepancy.
pub fn export_discrepancies(
    records: &[DiscrepancyRecord],
    path: impl AsRef<Path>,
) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    info!(
        "Exported {} discrepancies to {}",
        records.len(),
        path.display()
    );
    Ok(())
}

/// Writes a month comparison using only the retained (non-all-zero)
/// numeric columns.
pub fn export_comparison(comparison: &MonthComparison, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec!["period", "client", "measurement_code"];
    header.extend(comparison.columns.iter().map(|c| c.header()));
    writer.write_record(&header)?;

    for record in &comparison.records {
        let mut row = vec![
            record.period_label.clone(),
            record.client.clone(),
            record.measurement_code.clone(),
        ];
        row.extend(
            comparison
                .columns
                .iter()
                .map(|column| format!("{:.2}", record.value(*column))),
        );
        writer.write_record(&row)?;
    }

    writer.flush()?;
    info!(
        "Exported comparison {} vs {} to {}",
        comparison.period_a,
        comparison.period_b,
        path.display()
    );
    Ok(())
}

/// Writes the per-period summary table.
pub fn export_summary(summary: &LedgerSummary, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record([
        "period_code",
        "row_count",
        "invoiced_value",
        "projected_value",
        "maintenance_deduction",
        "commercial_discount",
        "excess_distance",
        "contractual_fine",
        "adjustments",
        "variables_net",
        "units_rented",
        "new_clients",
        "closed_clients",
    ])?;

    for period in &summary.periods {
        let t = &period.totals;
        writer.write_record([
            period.period_code.clone(),
            t.row_count.to_string(),
            format!("{:.2}", t.invoiced_value),
            format!("{:.2}", t.projected_value),
            format!("{:.2}", t.maintenance_deduction),
            format!("{:.2}", t.commercial_discount),
            format!("{:.2}", t.excess_distance),
            format!("{:.2}", t.contractual_fine),
            format!("{:.2}", t.adjustments),
            format!("{:.2}", t.variables_net()),
            format!("{:.2}", t.units_rented),
            period.new_clients.to_string(),
            period.closed_clients.to_string(),
        ])?;
    }

    writer.flush()?;
    info!("Exported summary to {}", path.display());
    Ok(())
}
