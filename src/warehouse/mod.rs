//! Typed warehouse boundary.
//!
//! Rows coming back from the worker are loosely-typed JSON; this module
//! converts them into owned structs on ingestion and defines the `Warehouse`
//! trait the mirror, usage miner and query runner are written against.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Warehouse                            │
//! │  fetch_catalog() │ sample_rows() │ usage_history()          │
//! │  dry_run()       │ execute()                                │
//! └─────────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     WorkerWarehouse                         │
//! │              (NDJSON over stdin/stdout)                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod provider;
mod types;

pub use provider::{Warehouse, WarehouseResult, WorkerWarehouse};
pub use types::{
    CatalogEntry, CatalogFilters, DryRunEstimate, JobRecord, QueryExecution, TableIdentity,
    TableSample,
};
