//! Owned types for catalog, sample and audit-log data.
//!
//! Everything crossing the worker boundary is converted into these types on
//! ingestion; loosely-typed JSON never flows into the synchronizer, miner or
//! ranking logic. Row cell values stay `serde_json::Value` deliberately —
//! they are opaque payload rendered by the preview formatter.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::worker::protocol::{
    CatalogRow, ColumnMeta, ExecuteResponse, JobRow, PlanStage, ReferencedTable,
    SampleRowsResponse,
};

/// Three-part table name: catalog (project), schema (dataset), table.
///
/// Forms the unique key of a mirrored table and its deterministic relative
/// filesystem path `catalog/schema/table/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableIdentity {
    pub catalog: String,
    pub schema: String,
    pub table: String,
}

impl TableIdentity {
    pub fn new(
        catalog: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            catalog: catalog.into(),
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// All three parts present and non-empty.
    pub fn is_complete(&self) -> bool {
        !self.catalog.is_empty() && !self.schema.is_empty() && !self.table.is_empty()
    }

    /// Dotted form, `catalog.schema.table`.
    pub fn full_name(&self) -> String {
        format!("{}.{}.{}", self.catalog, self.schema, self.table)
    }

    /// Relative path `catalog/schema/table`.
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(&self.catalog)
            .join(&self.schema)
            .join(&self.table)
    }
}

impl fmt::Display for TableIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.catalog, self.schema, self.table)
    }
}

impl From<ReferencedTable> for TableIdentity {
    fn from(r: ReferencedTable) -> Self {
        Self {
            catalog: r.project_id,
            schema: r.dataset_id,
            table: r.table_id,
        }
    }
}

/// One table from the remote registry: identity plus schema-definition text.
///
/// Produced fresh on every catalog fetch, never mutated; the definition text
/// is persisted verbatim as the table's `definition.sql`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub identity: TableIdentity,
    /// Collapsed name for templated/sharded table families; equals the table
    /// name for ordinary tables.
    pub wildcard_name: String,
    /// Schema-definition source, possibly multi-line.
    pub definition: String,
}

impl CatalogEntry {
    /// Convert a raw catalog row, trimming fields and defaulting the
    /// wildcard name to the table name.
    pub fn from_row(row: CatalogRow) -> Self {
        let table = row.table.trim().to_string();
        let wildcard_name = row
            .wildcard_name
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .unwrap_or_else(|| table.clone());

        Self {
            identity: TableIdentity {
                catalog: row.catalog.trim().to_string(),
                schema: row.schema.trim().to_string(),
                table,
            },
            wildcard_name,
            definition: row.definition.trim().to_string(),
        }
    }
}

/// Optional regex predicates over schema and table names.
///
/// Predicates are conjunctive and vacuously satisfied when absent: a table
/// is accepted when every supplied predicate matches.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilters {
    dataset: Option<regex::Regex>,
    table: Option<regex::Regex>,
}

impl CatalogFilters {
    /// Build filters from optional pattern strings.
    ///
    /// # Errors
    ///
    /// Returns the regex compile error for an invalid pattern; an invalid
    /// filter is a configuration error and fatal for the run.
    pub fn from_patterns(
        dataset: Option<&str>,
        table: Option<&str>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            dataset: dataset.map(regex::Regex::new).transpose()?,
            table: table.map(regex::Regex::new).transpose()?,
        })
    }

    /// Whether a (schema, table) pair satisfies both predicates.
    pub fn accepts(&self, schema: &str, table: &str) -> bool {
        if let Some(re) = &self.dataset {
            if !re.is_match(schema) {
                return false;
            }
        }
        if let Some(re) = &self.table {
            if !re.is_match(table) {
                return false;
            }
        }
        true
    }

    /// Dataset pattern string for the wire, if any.
    pub fn dataset_pattern(&self) -> Option<String> {
        self.dataset.as_ref().map(|re| re.as_str().to_string())
    }

    /// Table pattern string for the wire, if any.
    pub fn table_pattern(&self) -> Option<String> {
        self.table.as_ref().map(|re| re.as_str().to_string())
    }
}

/// Sample rows plus column metadata for one table.
#[derive(Debug, Clone)]
pub struct TableSample {
    /// Total rows in the table (not the sample size).
    pub total_rows: u64,
    /// Column metadata in declaration order.
    pub columns: Vec<ColumnMeta>,
    /// Sample rows; each cell aligns with `columns`.
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl From<SampleRowsResponse> for TableSample {
    fn from(r: SampleRowsResponse) -> Self {
        Self {
            total_rows: r.total_rows,
            columns: r.columns,
            rows: r.rows,
        }
    }
}

/// One completed query job from the audit log.
#[derive(Debug, Clone)]
pub struct JobRecord {
    /// Unique job identifier; usage counts are distinct over this.
    pub job_id: String,
    /// Query text the job executed.
    pub query: String,
    /// Tables the query referenced.
    pub referenced: Vec<TableIdentity>,
}

impl From<JobRow> for JobRecord {
    fn from(row: JobRow) -> Self {
        Self {
            job_id: row.job_id,
            query: row.query,
            referenced: row.referenced_tables.into_iter().map(Into::into).collect(),
        }
    }
}

/// Result of a zero-execution cost estimate.
#[derive(Debug, Clone, Copy)]
pub struct DryRunEstimate {
    /// Bytes the query would process.
    pub bytes_processed: u64,
}

impl DryRunEstimate {
    /// Estimated data volume in gigabytes (binary).
    pub fn gigabytes(&self) -> f64 {
        self.bytes_processed as f64 / (1u64 << 30) as f64
    }

    /// Estimated monetary cost at a fixed per-terabyte rate.
    pub fn cost_usd(&self, price_per_tb: f64) -> f64 {
        self.bytes_processed as f64 / (1u64 << 40) as f64 * price_per_tb
    }
}

/// Result of a real query execution.
#[derive(Debug, Clone)]
pub struct QueryExecution {
    /// Result column metadata in declaration order.
    pub columns: Vec<ColumnMeta>,
    /// Result rows; each cell aligns with `columns`.
    pub rows: Vec<Vec<serde_json::Value>>,
    /// Job statistics (bytes, slots, cache hit).
    pub stats: crate::worker::protocol::JobStats,
    /// Execution-plan stage tree.
    pub plan: Vec<PlanStage>,
    /// Destination table, when the query produced one.
    pub destination: Option<TableIdentity>,
}

impl From<ExecuteResponse> for QueryExecution {
    fn from(r: ExecuteResponse) -> Self {
        Self {
            columns: r.columns,
            rows: r.rows,
            stats: r.stats,
            plan: r.plan,
            destination: r.destination.map(Into::into),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_path_and_name() {
        let id = TableIdentity::new("p", "d", "t");
        assert_eq!(id.full_name(), "p.d.t");
        assert_eq!(id.relative_path(), PathBuf::from("p/d/t"));
        assert!(id.is_complete());
        assert!(!TableIdentity::new("p", "", "t").is_complete());
    }

    #[test]
    fn test_identity_ordering_is_catalog_schema_table() {
        let mut ids = vec![
            TableIdentity::new("p", "d", "b"),
            TableIdentity::new("p", "c", "z"),
            TableIdentity::new("p", "d", "a"),
        ];
        ids.sort();
        assert_eq!(ids[0].full_name(), "p.c.z");
        assert_eq!(ids[1].full_name(), "p.d.a");
        assert_eq!(ids[2].full_name(), "p.d.b");
    }

    #[test]
    fn test_catalog_entry_wildcard_defaults_to_table() {
        let entry = CatalogEntry::from_row(CatalogRow {
            catalog: " p ".to_string(),
            schema: "d".to_string(),
            table: "events_2024 ".to_string(),
            wildcard_name: None,
            definition: "CREATE TABLE ...\n".to_string(),
        });
        assert_eq!(entry.identity.catalog, "p");
        assert_eq!(entry.wildcard_name, "events_2024");
        assert_eq!(entry.definition, "CREATE TABLE ...");
    }

    #[test]
    fn test_catalog_entry_keeps_explicit_wildcard() {
        let entry = CatalogEntry::from_row(CatalogRow {
            catalog: "p".to_string(),
            schema: "d".to_string(),
            table: "events_20240101".to_string(),
            wildcard_name: Some("events_*".to_string()),
            definition: String::new(),
        });
        assert_eq!(entry.wildcard_name, "events_*");
        assert_eq!(entry.identity.table, "events_20240101");
    }

    #[test]
    fn test_filters_conjunctive_and_vacuous() {
        let filters = CatalogFilters::from_patterns(Some("^prod_"), None).unwrap();
        assert!(filters.accepts("prod_x", "sales"));
        assert!(!filters.accepts("staging_x", "sales"));

        let both = CatalogFilters::from_patterns(Some("^prod_"), Some("^fact_")).unwrap();
        assert!(both.accepts("prod_x", "fact_sales"));
        assert!(!both.accepts("prod_x", "dim_sales"));

        let none = CatalogFilters::default();
        assert!(none.accepts("anything", "at_all"));
    }

    #[test]
    fn test_filters_invalid_pattern_is_error() {
        assert!(CatalogFilters::from_patterns(Some("("), None).is_err());
    }

    #[test]
    fn test_dry_run_estimate_math() {
        let est = DryRunEstimate {
            bytes_processed: 150 * (1u64 << 30),
        };
        assert!((est.gigabytes() - 150.0).abs() < 1e-9);
        // 150 GiB at $6.25/TiB.
        let cost = est.cost_usd(6.25);
        assert!((cost - 150.0 / 1024.0 * 6.25).abs() < 1e-9);
    }
}
