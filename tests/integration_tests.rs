use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use measurement_ledger::{
    export_comparison, export_discrepancies, export_summary, export_timelines, DeltaColumn,
    LedgerSnapshot, PeriodSet, StatusCode,
};

const LEDGER_HEADER: &str = "client,period_code,measurement_id,raw_status,responsible_party,invoiced_value,projected_value,maintenance_deduction,commercial_discount,excess_distance,contractual_fine,adjustments,units_rented,units_reserve";

fn write_fixture(name: &str, rows: &[&str]) -> Result<PathBuf> {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "measurement-ledger-it-{}-{}.csv",
        std::process::id(),
        name
    ));
    let mut file = std::fs::File::create(&path)?;
    writeln!(file, "{}", LEDGER_HEADER)?;
    for row in rows {
        writeln!(file, "{}", row)?;
    }
    Ok(path)
}

fn temp_out(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "measurement-ledger-it-out-{}-{}",
        std::process::id(),
        name
    ));
    path
}

#[test]
fn test_full_pipeline_from_csv_to_exports() -> Result<()> {
    let fixture = write_fixture(
        "pipeline",
        &[
            // ACME: open Jan, closed Apr, invoiced short in Apr.
            "ACME,2401,1001-1,ATIVO,Ana,1000.00,1000.00,0,0,0,0,0,,",
            "ACME,2404,1001-4,FINALIZADO,Ana,950.00,1000.00,0,0,0,0,0,,",
            // BETA: active both months, reconciles cleanly, values grow.
            "BETA,2401,2002-1,ATIVO,Bruno,500.00,500.00,0,0,0,0,0,2,0",
            "BETA,2402,2002-2,ATIVO,Bruno,600.00,600.00,0,0,0,0,0,2,0",
            // GAMA: appears only in February; deductions in play.
            "GAMA,2402,3003-1,AG. FAT.,Carla,880.00,1000.00,100.00,50.00,20.00,5.00,5.00,,",
        ],
    )?;

    let snapshot = LedgerSnapshot::load(&fixture, PeriodSet::for_year_prefix("24"))?;
    std::fs::remove_file(&fixture).ok();

    // Timelines: ACME goes open -> pending -> empty -> closed -> inactive.
    let timelines = snapshot.timelines_with_responsible();
    assert_eq!(timelines.len(), 3);

    let acme = &timelines[0];
    assert_eq!(acme.client, "ACME");
    assert_eq!(acme.measurement_code_prefix, "1001");
    assert_eq!(acme.responsible_party.as_deref(), Some("Ana"));
    use StatusCode::*;
    assert_eq!(
        acme.statuses,
        vec![
            Open, Pending, Empty, Closed, Inactive, Inactive, Inactive, Inactive, Inactive,
            Inactive, Inactive, Inactive
        ]
    );

    // Reconciliation: ACME in 2404 is 50 short; GAMA nets out
    // (1000 - 100 - 50 + 20 + 5 + 5 = 880 invoiced).
    let discrepancies = snapshot.discrepancies();
    assert_eq!(discrepancies.len(), 1);
    assert_eq!(discrepancies[0].client, "ACME");
    assert_eq!(discrepancies[0].period_code, "2404");
    assert_eq!(discrepancies[0].difference, 50.0);

    // Month comparison: BETA grows by 100, GAMA only in February.
    let comparison = snapshot.compare_months("2401", "2402")?;
    let beta = comparison
        .records
        .iter()
        .find(|r| r.measurement_code == "2002")
        .unwrap();
    assert_eq!(beta.projected_value, 100.0);
    assert_eq!(beta.difference_value, 100.0);

    let gama = comparison
        .records
        .iter()
        .find(|r| r.measurement_code == "3003")
        .unwrap();
    assert_eq!(gama.period_label, "2402");
    assert_eq!(gama.projected_value, -1000.0);
    assert_eq!(gama.difference_value, -880.0);

    // Units columns are zero everywhere in the deltas, so they are pruned.
    assert!(!comparison.columns.contains(&DeltaColumn::UnitsReserve));

    // Summary: totals and client counts line up with the fixture.
    let summary = snapshot.summary();
    assert_eq!(summary.overall.row_count, 5);
    assert_eq!(summary.periods[0].new_clients, 2);
    assert_eq!(summary.periods[1].new_clients, 1);
    assert_eq!(summary.periods[3].closed_clients, 1);

    // Exports: every collection lands on disk without mutating anything.
    let timelines_out = temp_out("timelines.csv");
    let discrepancies_out = temp_out("discrepancies.csv");
    let comparison_out = temp_out("comparison.csv");
    let summary_out = temp_out("summary.csv");

    export_timelines(&timelines, snapshot.periods(), &timelines_out)?;
    export_discrepancies(&discrepancies, &discrepancies_out)?;
    export_comparison(&comparison, &comparison_out)?;
    export_summary(&summary, &summary_out)?;

    let matrix = std::fs::read_to_string(&timelines_out)?;
    assert!(matrix.contains("1001,ACME,Ana,A,P,,F,X,X,X,X,X,X,X,X"));

    let report = std::fs::read_to_string(&discrepancies_out)?;
    assert!(report.contains("ACME"));
    assert!(report.contains("50"));

    for path in [&timelines_out, &discrepancies_out, &comparison_out, &summary_out] {
        std::fs::remove_file(path).ok();
    }

    Ok(())
}

#[test]
fn test_reload_replaces_the_snapshot() -> Result<()> {
    let first = write_fixture("reload-a", &["ACME,2401,1001-1,ATIVO,Ana,100,100,0,0,0,0,0,,"])?;
    let second = write_fixture(
        "reload-b",
        &[
            "ACME,2401,1001-1,ATIVO,Ana,100,100,0,0,0,0,0,,",
            "BETA,2401,2002-1,ATIVO,Bruno,200,200,0,0,0,0,0,,",
        ],
    )?;

    let periods = PeriodSet::for_year_prefix("24");
    let snapshot_a = LedgerSnapshot::load(&first, periods.clone())?;
    let snapshot_b = LedgerSnapshot::load(&second, periods)?;
    std::fs::remove_file(&first).ok();
    std::fs::remove_file(&second).ok();

    assert_eq!(snapshot_a.timelines().len(), 1);
    assert_eq!(snapshot_b.timelines().len(), 2);

    Ok(())
}

#[test]
fn test_comparison_for_missing_period_is_an_error() -> Result<()> {
    let fixture = write_fixture(
        "missing-period",
        &["ACME,2401,1001-1,ATIVO,Ana,100,100,0,0,0,0,0,,"],
    )?;

    let snapshot = LedgerSnapshot::load(&fixture, PeriodSet::for_year_prefix("24"))?;
    std::fs::remove_file(&fixture).ok();

    assert!(snapshot.compare_months("2401", "2411").is_err());
    Ok(())
}
