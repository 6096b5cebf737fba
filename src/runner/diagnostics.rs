//! Execution diagnostics persistence.
//!
//! After every execution the runner writes a structured record next to the
//! source query file: destination table (when the query produced one),
//! byte/slot/cache counters, and the full execution-plan stage tree.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::mirror::layout;
use crate::warehouse::QueryExecution;
use crate::worker::protocol::PlanStage;

/// Suffix of the diagnostics artifact, appended to the query file stem.
pub const DIAGNOSTICS_SUFFIX: &str = ".query_stats.json";

/// The persisted diagnostics record. Destination table first: it is the
/// value operators reach for when chaining off a query's temporary table.
#[derive(Debug, Serialize)]
pub struct QueryDiagnostics {
    pub destination_table: Option<String>,
    pub row_count: usize,
    pub job_id: Option<String>,
    pub total_bytes_processed: u64,
    pub total_bytes_billed: u64,
    pub billing_tier: Option<i64>,
    pub total_slot_ms: u64,
    pub cache_hit: Option<bool>,
    pub num_dml_affected_rows: u64,
    pub query_plan: Vec<PlanStage>,
}

impl QueryDiagnostics {
    pub fn from_execution(execution: &QueryExecution) -> Self {
        Self {
            destination_table: execution.destination.as_ref().map(|d| d.full_name()),
            row_count: execution.rows.len(),
            job_id: execution.stats.job_id.clone(),
            total_bytes_processed: execution.stats.total_bytes_processed,
            total_bytes_billed: execution.stats.total_bytes_billed,
            billing_tier: execution.stats.billing_tier,
            total_slot_ms: execution.stats.total_slot_ms,
            cache_hit: execution.stats.cache_hit,
            num_dml_affected_rows: execution.stats.num_dml_affected_rows,
            query_plan: execution.plan.clone(),
        }
    }
}

/// Diagnostics artifact path for a source query file:
/// `<dir>/<stem>.query_stats.json`.
pub fn diagnostics_path(sql_path: &Path) -> PathBuf {
    let stem = sql_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("query");
    sql_path.with_file_name(format!("{stem}{DIAGNOSTICS_SUFFIX}"))
}

/// Write the diagnostics record as pretty-printed JSON.
pub fn write_diagnostics(path: &Path, diagnostics: &QueryDiagnostics) -> io::Result<()> {
    let json = serde_json::to_string_pretty(diagnostics)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    layout::write_atomic(path, &(json + "\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warehouse::TableIdentity;
    use crate::worker::protocol::JobStats;

    #[test]
    fn test_diagnostics_path_sibling_with_suffix() {
        let path = diagnostics_path(Path::new("/work/reports/traffic.sql"));
        assert_eq!(path, PathBuf::from("/work/reports/traffic.query_stats.json"));
    }

    #[test]
    fn test_from_execution_captures_destination_and_counters() {
        let execution = QueryExecution {
            columns: vec![],
            rows: vec![vec![serde_json::json!(1)], vec![serde_json::json!(2)]],
            stats: JobStats {
                job_id: Some("job_123".to_string()),
                total_bytes_processed: 1024,
                total_bytes_billed: 2048,
                billing_tier: Some(1),
                total_slot_ms: 77,
                cache_hit: Some(false),
                num_dml_affected_rows: 0,
            },
            plan: vec![],
            destination: Some(TableIdentity::new("p", "_temp", "anon123")),
        };

        let diag = QueryDiagnostics::from_execution(&execution);
        assert_eq!(diag.destination_table.as_deref(), Some("p._temp.anon123"));
        assert_eq!(diag.row_count, 2);
        assert_eq!(diag.total_bytes_billed, 2048);
        assert_eq!(diag.cache_hit, Some(false));
    }

    #[test]
    fn test_write_diagnostics_round_trips_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q.query_stats.json");

        let diag = QueryDiagnostics {
            destination_table: None,
            row_count: 0,
            job_id: None,
            total_bytes_processed: 0,
            total_bytes_billed: 0,
            billing_tier: None,
            total_slot_ms: 0,
            cache_hit: None,
            num_dml_affected_rows: 0,
            query_plan: vec![],
        };
        write_diagnostics(&path, &diag).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert!(value["destination_table"].is_null());
        assert_eq!(value["row_count"], 0);
        assert!(value["query_plan"].as_array().unwrap().is_empty());
    }
}
