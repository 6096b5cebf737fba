//! Protocol types for warehouse worker communication.
//!
//! The worker speaks newline-delimited JSON over stdin/stdout. Every request
//! carries the warehouse scope (billing project and region); responses come
//! back as loosely-typed JSON and are converted to the crate's owned types
//! at the `warehouse` boundary.

use serde::{Deserialize, Serialize};

/// Method names served by the worker.
pub mod methods {
    /// Enumerate tables visible to the registry, with schema definitions.
    pub const LIST_TABLES: &str = "catalog.list_tables";
    /// Fetch up to N sample rows plus column metadata for one table.
    pub const SAMPLE_ROWS: &str = "table.sample_rows";
    /// Fetch completed query jobs from the audit log over a lookback window.
    pub const USAGE_HISTORY: &str = "jobs.usage_history";
    /// Zero-execution cost estimate for a query.
    pub const DRY_RUN: &str = "query.dry_run";
    /// Execute a query and return rows, statistics and the plan tree.
    pub const EXECUTE: &str = "query.execute";
}

// ============================================================================
// Request/Response Envelope
// ============================================================================

/// Request envelope sent to the worker.
#[derive(Debug, Clone, Serialize)]
pub struct RequestEnvelope {
    /// Unique request ID for correlation.
    pub id: String,
    /// Method name (e.g., "catalog.list_tables").
    pub method: String,
    /// Method-specific parameters.
    pub params: serde_json::Value,
}

/// Response envelope received from the worker.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseEnvelope {
    /// Request ID this response corresponds to.
    pub id: String,
    /// Whether the request succeeded.
    pub success: bool,
    /// Result data (present if success = true).
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    /// Error information (present if success = false).
    #[serde(default)]
    pub error: Option<ErrorInfo>,
}

/// Error information in a failed response.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorInfo {
    /// Error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

// ============================================================================
// Scope Parameters (included in all requests)
// ============================================================================

/// Warehouse execution scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeParams {
    /// Billing / query-execution project.
    pub project_id: String,
    /// Regional execution scope (e.g., "eu", "us").
    pub region: String,
}

// ============================================================================
// Catalog Parameters
// ============================================================================

/// Parameters for `catalog.list_tables`.
#[derive(Debug, Clone, Serialize)]
pub struct ListTablesParams {
    #[serde(flatten)]
    pub scope: ScopeParams,
    /// Regex over schema (dataset) names; omitted means no filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_filter: Option<String>,
    /// Regex over table names; omitted means no filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_filter: Option<String>,
}

/// One catalog row from `catalog.list_tables`.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogRow {
    /// Catalog (project) the table lives in.
    pub catalog: String,
    /// Schema (dataset) name.
    pub schema: String,
    /// Table name.
    pub table: String,
    /// Collapsed name for templated/sharded table families.
    #[serde(default)]
    pub wildcard_name: Option<String>,
    /// Schema-definition source text.
    pub definition: String,
}

/// Response from `catalog.list_tables`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListTablesResponse {
    pub tables: Vec<CatalogRow>,
}

// ============================================================================
// Sample Row Parameters
// ============================================================================

/// Parameters for `table.sample_rows`.
#[derive(Debug, Clone, Serialize)]
pub struct SampleRowsParams {
    #[serde(flatten)]
    pub scope: ScopeParams,
    /// Catalog (project) the table lives in.
    pub catalog: String,
    /// Schema (dataset) name.
    pub schema: String,
    /// Table name.
    pub table: String,
    /// Maximum number of rows to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Column metadata returned with sample rows.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ColumnMeta {
    /// Column name.
    pub name: String,
    /// Declared warehouse type (e.g., "STRING", "GEOGRAPHY").
    pub data_type: String,
}

/// Response from `table.sample_rows`.
#[derive(Debug, Clone, Deserialize)]
pub struct SampleRowsResponse {
    /// Total row count of the table (not the sample).
    pub total_rows: u64,
    /// Column metadata, in declaration order.
    pub columns: Vec<ColumnMeta>,
    /// Sample rows, cells aligned with `columns`.
    pub rows: Vec<Vec<serde_json::Value>>,
}

// ============================================================================
// Audit Log Parameters
// ============================================================================

/// Parameters for `jobs.usage_history`.
///
/// The worker restricts results to completed, error-free, query-type jobs
/// whose creation time falls within the lookback window.
#[derive(Debug, Clone, Serialize)]
pub struct UsageHistoryParams {
    #[serde(flatten)]
    pub scope: ScopeParams,
    /// Trailing number of days of job history to return.
    pub lookback_days: u32,
}

/// A table referenced by a logged job.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferencedTable {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

/// One qualifying job from the audit log.
#[derive(Debug, Clone, Deserialize)]
pub struct JobRow {
    /// Unique job identifier.
    pub job_id: String,
    /// The query text the job executed.
    pub query: String,
    /// Tables the query referenced.
    #[serde(default)]
    pub referenced_tables: Vec<ReferencedTable>,
}

/// Response from `jobs.usage_history`.
#[derive(Debug, Clone, Deserialize)]
pub struct UsageHistoryResponse {
    pub jobs: Vec<JobRow>,
}

// ============================================================================
// Query Execution Parameters
// ============================================================================

/// Parameters for `query.dry_run`.
#[derive(Debug, Clone, Serialize)]
pub struct DryRunParams {
    #[serde(flatten)]
    pub scope: ScopeParams,
    /// SQL to estimate.
    pub sql: String,
}

/// Response from `query.dry_run`.
#[derive(Debug, Clone, Deserialize)]
pub struct DryRunResponse {
    /// Bytes the query would process.
    pub total_bytes_processed: u64,
}

/// Parameters for `query.execute`.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteParams {
    #[serde(flatten)]
    pub scope: ScopeParams,
    /// SQL to execute.
    pub sql: String,
    /// Use the bulk-retrieval transport. Requires an extra permission; the
    /// worker rejects with PERMISSION_DENIED when it is missing.
    pub bulk: bool,
}

/// Job-level statistics reported after execution.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct JobStats {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub total_bytes_processed: u64,
    #[serde(default)]
    pub total_bytes_billed: u64,
    #[serde(default)]
    pub billing_tier: Option<i64>,
    #[serde(default)]
    pub total_slot_ms: u64,
    #[serde(default)]
    pub cache_hit: Option<bool>,
    #[serde(default)]
    pub num_dml_affected_rows: u64,
}

/// One step within an execution-plan stage.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlanStep {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub substeps: Vec<String>,
}

/// One stage of the execution plan tree.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlanStage {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub shuffle_output_bytes: u64,
    #[serde(default)]
    pub shuffle_output_bytes_spilled: u64,
    #[serde(default)]
    pub records_read: u64,
    #[serde(default)]
    pub records_written: u64,
    #[serde(default)]
    pub steps: Vec<PlanStep>,
    #[serde(default)]
    pub input_stages: Vec<i64>,
}

/// Response from `query.execute`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteResponse {
    /// Result column metadata, in declaration order.
    pub columns: Vec<ColumnMeta>,
    /// Result rows, cells aligned with `columns`.
    pub rows: Vec<Vec<serde_json::Value>>,
    /// Job statistics.
    #[serde(default)]
    pub stats: JobStats,
    /// Execution-plan stage tree.
    #[serde(default)]
    pub plan: Vec<PlanStage>,
    /// Destination table, when the query produced one.
    #[serde(default)]
    pub destination: Option<ReferencedTable>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_envelope_serializes_flat_scope() {
        let params = ListTablesParams {
            scope: ScopeParams {
                project_id: "acme-analytics".to_string(),
                region: "eu".to_string(),
            },
            dataset_filter: Some("^prod_".to_string()),
            table_filter: None,
        };
        let value = serde_json::to_value(&params).unwrap();

        assert_eq!(value["project_id"], "acme-analytics");
        assert_eq!(value["region"], "eu");
        assert_eq!(value["dataset_filter"], "^prod_");
        // Absent filters are omitted entirely, not serialized as null.
        assert!(value.get("table_filter").is_none());
    }

    #[test]
    fn test_response_envelope_with_error() {
        let raw = r#"{"id":"abc","success":false,"error":{"code":"PERMISSION_DENIED","message":"no readsessions"}}"#;
        let resp: ResponseEnvelope = serde_json::from_str(raw).unwrap();
        assert!(!resp.success);
        assert!(resp.result.is_none());
        let err = resp.error.unwrap();
        assert_eq!(err.code, "PERMISSION_DENIED");
    }

    #[test]
    fn test_sample_rows_response_defaults() {
        let raw = r#"{"total_rows":42,"columns":[{"name":"id","data_type":"INT64"}],"rows":[[1]]}"#;
        let resp: SampleRowsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.total_rows, 42);
        assert_eq!(resp.columns.len(), 1);
        assert_eq!(resp.rows.len(), 1);
    }
}
