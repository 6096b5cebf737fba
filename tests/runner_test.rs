//! Tests for the cost-gated query runner: gate behavior, the degraded
//! retrieval path, and artifact persistence.

mod common;

use std::fs;
use std::sync::Arc;

use common::FixtureWarehouse;
use querylog::runner::{self, GateConfirm, RunOutcome, RunnerOptions};

/// Scripted confirmation: answers with a fixed response and records whether
/// it was consulted.
struct ScriptedConfirm {
    response: bool,
    called: bool,
}

impl ScriptedConfirm {
    fn new(response: bool) -> Self {
        Self {
            response,
            called: false,
        }
    }
}

impl GateConfirm for ScriptedConfirm {
    fn confirm(&mut self, _gigabytes: f64, _estimated_cost_usd: f64) -> bool {
        self.called = true;
        self.response
    }
}

fn write_sql(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("query.sql");
    fs::write(&path, "SELECT 1").unwrap();
    path
}

#[tokio::test]
async fn test_declined_gate_executes_nothing_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let sql_path = write_sql(dir.path());

    let mut warehouse = FixtureWarehouse::new();
    warehouse.dry_run_bytes = 150 * (1u64 << 30); // 150 GB, over the gate
    let warehouse = Arc::new(warehouse);

    let mut confirm = ScriptedConfirm::new(false);
    let outcome = runner::run_query_file(
        warehouse.as_ref(),
        &sql_path,
        &RunnerOptions::default(),
        &mut confirm,
    )
    .await
    .unwrap();

    assert!(confirm.called);
    assert!(matches!(outcome, RunOutcome::Declined { .. }));
    assert!(warehouse.execute_calls.lock().unwrap().is_empty());
    assert!(!dir.path().join("query.query_stats.json").exists());
}

#[tokio::test]
async fn test_below_threshold_runs_without_confirmation() {
    let dir = tempfile::tempdir().unwrap();
    let sql_path = write_sql(dir.path());

    let mut warehouse = FixtureWarehouse::new();
    warehouse.dry_run_bytes = 1 << 30; // 1 GB
    let warehouse = Arc::new(warehouse);

    let mut confirm = ScriptedConfirm::new(false);
    let outcome = runner::run_query_file(
        warehouse.as_ref(),
        &sql_path,
        &RunnerOptions::default(),
        &mut confirm,
    )
    .await
    .unwrap();

    assert!(!confirm.called);
    let RunOutcome::Completed(summary) = outcome else {
        panic!("expected completion");
    };
    assert_eq!(summary.rows, 1);
    assert!(!summary.degraded);

    // Diagnostics always land next to the query file.
    let diag: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join("query.query_stats.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(diag["job_id"], "job_fixture");
    assert_eq!(diag["row_count"], 1);
}

#[tokio::test]
async fn test_accepted_gate_proceeds() {
    let dir = tempfile::tempdir().unwrap();
    let sql_path = write_sql(dir.path());

    let mut warehouse = FixtureWarehouse::new();
    warehouse.dry_run_bytes = 200 * (1u64 << 30);
    let warehouse = Arc::new(warehouse);

    let mut confirm = ScriptedConfirm::new(true);
    let outcome = runner::run_query_file(
        warehouse.as_ref(),
        &sql_path,
        &RunnerOptions::default(),
        &mut confirm,
    )
    .await
    .unwrap();

    assert!(confirm.called);
    assert!(matches!(outcome, RunOutcome::Completed(_)));
    assert_eq!(*warehouse.execute_calls.lock().unwrap(), vec![true]);
}

#[tokio::test]
async fn test_force_skips_dry_run_and_gate() {
    let dir = tempfile::tempdir().unwrap();
    let sql_path = write_sql(dir.path());

    let mut warehouse = FixtureWarehouse::new();
    warehouse.dry_run_bytes = u64::MAX; // would trip the gate if consulted
    let warehouse = Arc::new(warehouse);

    let mut confirm = ScriptedConfirm::new(false);
    let options = RunnerOptions {
        force: true,
        output_file: None,
    };
    let outcome = runner::run_query_file(warehouse.as_ref(), &sql_path, &options, &mut confirm)
        .await
        .unwrap();

    assert!(!confirm.called);
    let RunOutcome::Completed(summary) = outcome else {
        panic!("expected completion");
    };
    assert!(summary.estimate.is_none());
}

#[tokio::test]
async fn test_permission_denied_falls_back_to_paged_retrieval() {
    let dir = tempfile::tempdir().unwrap();
    let sql_path = write_sql(dir.path());

    let mut warehouse = FixtureWarehouse::new();
    warehouse.bulk_denied = true;
    let warehouse = Arc::new(warehouse);

    let mut confirm = ScriptedConfirm::new(true);
    let outcome = runner::run_query_file(
        warehouse.as_ref(),
        &sql_path,
        &RunnerOptions::default(),
        &mut confirm,
    )
    .await
    .unwrap();

    let RunOutcome::Completed(summary) = outcome else {
        panic!("expected completion");
    };
    assert!(summary.degraded);
    assert_eq!(summary.rows, 1);
    // Bulk attempted first, then the paged fallback.
    assert_eq!(*warehouse.execute_calls.lock().unwrap(), vec![true, false]);
    // Diagnostics are written even on the degraded path.
    assert!(dir.path().join("query.query_stats.json").exists());
}

#[tokio::test]
async fn test_results_saved_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let sql_path = write_sql(dir.path());
    let out_path = dir.path().join("out/result.csv");

    let warehouse = Arc::new(FixtureWarehouse::new());
    let mut confirm = ScriptedConfirm::new(true);
    let options = RunnerOptions {
        force: false,
        output_file: Some(out_path.clone()),
    };

    let outcome = runner::run_query_file(warehouse.as_ref(), &sql_path, &options, &mut confirm)
        .await
        .unwrap();

    let RunOutcome::Completed(summary) = outcome else {
        panic!("expected completion");
    };
    assert_eq!(summary.results_path.as_deref(), Some(out_path.as_path()));
    assert_eq!(fs::read_to_string(&out_path).unwrap(), "total\n42\n");
}
