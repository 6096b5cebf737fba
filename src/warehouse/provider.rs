//! Warehouse trait definition and the worker-backed implementation.
//!
//! The `Warehouse` trait abstracts over the remote registry, sample-row and
//! audit-log interfaces so the mirror, miner and runner can be driven by
//! scripted fixtures in tests. The production implementation delegates every
//! call to the `WorkerClient`.

use std::sync::Arc;

use async_trait::async_trait;

use super::types::{
    CatalogEntry, CatalogFilters, DryRunEstimate, JobRecord, QueryExecution, TableIdentity,
    TableSample,
};
use crate::worker::protocol::{self, methods, ScopeParams};
use crate::worker::{WorkerClient, WorkerError};

/// Result type for warehouse operations.
pub type WarehouseResult<T> = Result<T, WorkerError>;

/// Trait for the remote warehouse interfaces the tool consumes.
///
/// One implementation talks to the real warehouse through the worker; tests
/// inject fixtures. All methods are single network round trips — callers own
/// any fan-out (the preview pool bounds its own concurrency).
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Fetch every visible table satisfying the filters, with definitions.
    ///
    /// Ordered by (catalog, schema, table) ascending. Any remote error is
    /// fatal for the run: there is no partial-catalog result.
    async fn fetch_catalog(&self, filters: &CatalogFilters) -> WarehouseResult<Vec<CatalogEntry>>;

    /// Fetch up to `limit` sample rows plus column metadata for one table.
    async fn sample_rows(&self, table: &TableIdentity, limit: u32)
        -> WarehouseResult<TableSample>;

    /// Fetch completed, error-free query jobs within the lookback window.
    async fn usage_history(&self, lookback_days: u32) -> WarehouseResult<Vec<JobRecord>>;

    /// Zero-execution cost estimate for a query.
    async fn dry_run(&self, sql: &str) -> WarehouseResult<DryRunEstimate>;

    /// Execute a query. `bulk` selects the bulk-retrieval transport, which
    /// may fail with `WorkerError::PermissionDenied`.
    async fn execute(&self, sql: &str, bulk: bool) -> WarehouseResult<QueryExecution>;
}

/// `Warehouse` implementation backed by the worker process.
pub struct WorkerWarehouse {
    /// The worker client for RPC calls.
    client: Arc<WorkerClient>,
    /// Cached scope parameters to avoid repeated allocations.
    scope: ScopeParams,
}

impl WorkerWarehouse {
    /// Create a new worker-backed warehouse.
    pub fn new(
        client: Arc<WorkerClient>,
        project_id: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            client,
            scope: ScopeParams {
                project_id: project_id.into(),
                region: region.into(),
            },
        }
    }

    /// Create a new worker-backed warehouse with an owned client.
    pub fn with_client(
        client: WorkerClient,
        project_id: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::new(Arc::new(client), project_id, region)
    }

    #[inline]
    fn scope(&self) -> ScopeParams {
        self.scope.clone()
    }

    /// Billing project this warehouse is scoped to.
    pub fn project_id(&self) -> &str {
        &self.scope.project_id
    }

    /// Regional execution scope.
    pub fn region(&self) -> &str {
        &self.scope.region
    }
}

#[async_trait]
impl Warehouse for WorkerWarehouse {
    async fn fetch_catalog(&self, filters: &CatalogFilters) -> WarehouseResult<Vec<CatalogEntry>> {
        let response: protocol::ListTablesResponse = self
            .client
            .request(
                methods::LIST_TABLES,
                protocol::ListTablesParams {
                    scope: self.scope(),
                    dataset_filter: filters.dataset_pattern(),
                    table_filter: filters.table_pattern(),
                },
            )
            .await?;

        // The worker applies the filters server-side; re-validate at the
        // typed boundary and enforce deterministic ordering.
        let mut entries: Vec<CatalogEntry> = response
            .tables
            .into_iter()
            .map(CatalogEntry::from_row)
            .filter(|e| filters.accepts(&e.identity.schema, &e.identity.table))
            .collect();
        entries.sort_by(|a, b| a.identity.cmp(&b.identity));

        Ok(entries)
    }

    async fn sample_rows(
        &self,
        table: &TableIdentity,
        limit: u32,
    ) -> WarehouseResult<TableSample> {
        let response: protocol::SampleRowsResponse = self
            .client
            .request(
                methods::SAMPLE_ROWS,
                protocol::SampleRowsParams {
                    scope: self.scope(),
                    catalog: table.catalog.clone(),
                    schema: table.schema.clone(),
                    table: table.table.clone(),
                    limit: Some(limit),
                },
            )
            .await?;

        Ok(response.into())
    }

    async fn usage_history(&self, lookback_days: u32) -> WarehouseResult<Vec<JobRecord>> {
        let response: protocol::UsageHistoryResponse = self
            .client
            .request(
                methods::USAGE_HISTORY,
                protocol::UsageHistoryParams {
                    scope: self.scope(),
                    lookback_days,
                },
            )
            .await?;

        Ok(response.jobs.into_iter().map(Into::into).collect())
    }

    async fn dry_run(&self, sql: &str) -> WarehouseResult<DryRunEstimate> {
        let response: protocol::DryRunResponse = self
            .client
            .request(
                methods::DRY_RUN,
                protocol::DryRunParams {
                    scope: self.scope(),
                    sql: sql.to_string(),
                },
            )
            .await?;

        Ok(DryRunEstimate {
            bytes_processed: response.total_bytes_processed,
        })
    }

    async fn execute(&self, sql: &str, bulk: bool) -> WarehouseResult<QueryExecution> {
        let response: protocol::ExecuteResponse = self
            .client
            .request(
                methods::EXECUTE,
                protocol::ExecuteParams {
                    scope: self.scope(),
                    sql: sql.to_string(),
                    bulk,
                },
            )
            .await?;

        Ok(response.into())
    }
}
