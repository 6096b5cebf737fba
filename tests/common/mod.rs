//! Scripted Warehouse fixture shared by the integration tests.
//!
//! The fixture is stateless across runs: mirror/usage state lives on disk,
//! so each "run" constructs a fresh fixture over the same temp directory.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use querylog::warehouse::{
    CatalogEntry, CatalogFilters, DryRunEstimate, JobRecord, QueryExecution, TableIdentity,
    TableSample, Warehouse, WarehouseResult,
};
use querylog::worker::protocol::{ColumnMeta, JobStats};
use querylog::worker::WorkerError;

pub struct FixtureWarehouse {
    pub catalog: Vec<CatalogEntry>,
    /// Samples by table; tables without one fail their fetch.
    pub samples: HashMap<TableIdentity, TableSample>,
    pub jobs: Vec<JobRecord>,
    pub dry_run_bytes: u64,
    /// Reject bulk-transport executions with PERMISSION_DENIED.
    pub bulk_denied: bool,
    /// Tables fetched via sample_rows, in call order.
    pub sample_calls: Mutex<Vec<TableIdentity>>,
    /// `bulk` flag of each execute call, in call order.
    pub execute_calls: Mutex<Vec<bool>>,
}

impl FixtureWarehouse {
    pub fn new() -> Self {
        Self {
            catalog: Vec::new(),
            samples: HashMap::new(),
            jobs: Vec::new(),
            dry_run_bytes: 0,
            bulk_denied: false,
            sample_calls: Mutex::new(Vec::new()),
            execute_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_table(mut self, catalog: &str, schema: &str, table: &str, definition: &str) -> Self {
        let identity = TableIdentity::new(catalog, schema, table);
        self.samples.insert(identity.clone(), default_sample());
        self.catalog.push(CatalogEntry {
            identity,
            wildcard_name: table.to_string(),
            definition: definition.to_string(),
        });
        self
    }

    /// Make this table's sample fetch fail.
    pub fn without_sample(mut self, catalog: &str, schema: &str, table: &str) -> Self {
        self.samples
            .remove(&TableIdentity::new(catalog, schema, table));
        self
    }

    pub fn with_job(mut self, job_id: &str, query: &str, refs: &[(&str, &str, &str)]) -> Self {
        self.jobs.push(JobRecord {
            job_id: job_id.to_string(),
            query: query.to_string(),
            referenced: refs
                .iter()
                .map(|(c, s, t)| TableIdentity::new(*c, *s, *t))
                .collect(),
        });
        self
    }

    pub fn sample_call_count(&self) -> usize {
        self.sample_calls.lock().unwrap().len()
    }
}

pub fn default_sample() -> TableSample {
    TableSample {
        total_rows: 100,
        columns: vec![
            ColumnMeta {
                name: "id".to_string(),
                data_type: "INT64".to_string(),
            },
            ColumnMeta {
                name: "name".to_string(),
                data_type: "STRING".to_string(),
            },
        ],
        rows: vec![
            vec![json!(1), json!("alice")],
            vec![json!(2), json!("bob")],
        ],
    }
}

pub fn default_execution() -> QueryExecution {
    QueryExecution {
        columns: vec![
            ColumnMeta {
                name: "total".to_string(),
                data_type: "INT64".to_string(),
            },
        ],
        rows: vec![vec![json!(42)]],
        stats: JobStats {
            job_id: Some("job_fixture".to_string()),
            total_bytes_processed: 1024,
            total_bytes_billed: 1024,
            billing_tier: Some(1),
            total_slot_ms: 10,
            cache_hit: Some(false),
            num_dml_affected_rows: 0,
        },
        plan: vec![],
        destination: None,
    }
}

#[async_trait]
impl Warehouse for FixtureWarehouse {
    async fn fetch_catalog(&self, filters: &CatalogFilters) -> WarehouseResult<Vec<CatalogEntry>> {
        let mut entries: Vec<CatalogEntry> = self
            .catalog
            .iter()
            .filter(|e| filters.accepts(&e.identity.schema, &e.identity.table))
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.identity.cmp(&b.identity));
        Ok(entries)
    }

    async fn sample_rows(
        &self,
        table: &TableIdentity,
        _limit: u32,
    ) -> WarehouseResult<TableSample> {
        self.sample_calls.lock().unwrap().push(table.clone());
        self.samples
            .get(table)
            .cloned()
            .ok_or_else(|| WorkerError::TableNotFound(table.full_name()))
    }

    async fn usage_history(&self, _lookback_days: u32) -> WarehouseResult<Vec<JobRecord>> {
        Ok(self.jobs.clone())
    }

    async fn dry_run(&self, _sql: &str) -> WarehouseResult<DryRunEstimate> {
        Ok(DryRunEstimate {
            bytes_processed: self.dry_run_bytes,
        })
    }

    async fn execute(&self, _sql: &str, bulk: bool) -> WarehouseResult<QueryExecution> {
        self.execute_calls.lock().unwrap().push(bulk);
        if bulk && self.bulk_denied {
            return Err(WorkerError::PermissionDenied(
                "missing bulk read permission".to_string(),
            ));
        }
        Ok(default_execution())
    }
}
