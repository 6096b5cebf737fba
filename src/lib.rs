//! # querylog
//!
//! Mirrors a warehouse schema registry onto a local directory tree,
//! enriches each mirrored table with a usage profile mined from
//! query-execution logs, and provides a cost-gated ad-hoc query runner.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │              Warehouse Worker (subprocess)               │
//! │     catalog │ sample rows │ audit log │ dry run/execute  │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [worker: NDJSON client]
//! ┌─────────────────────────────────────────────────────────┐
//! │            Warehouse (typed async boundary)              │
//! └─────────────────────────────────────────────────────────┘
//!            │                    │                  │
//!            ▼                    ▼                  ▼
//! ┌──────────────────┐  ┌──────────────────┐  ┌──────────────┐
//! │      mirror       │  │      usage       │  │    runner    │
//! │ sync + staleness  │  │ miner + ranking  │  │  cost gate   │
//! │ preview pool      │  │ leaderboard      │  │ diagnostics  │
//! └──────────────────┘  └──────────────────┘  └──────────────┘
//!            │                    │                  │
//!            ▼                    ▼                  ▼
//!   root/cat/schema/table/{definition,preview,usage}.sql
//!   root/HIGH_USAGE_TABLES.md        <query>.query_stats.json
//! ```
//!
//! The mirror and the usage miner share the directory tree but never each
//! other's artifacts; the runner is an independent entry point.

pub mod config;
pub mod mirror;
pub mod runner;
pub mod usage;
pub mod warehouse;
pub mod worker;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::mirror::{build_mirror, MirrorOptions, MirrorReport};
    pub use crate::runner::{run_query_file, RunOutcome, RunnerOptions};
    pub use crate::usage::{mine_usage, UsageRecord, UsageRunReport};
    pub use crate::warehouse::{
        CatalogEntry, CatalogFilters, TableIdentity, Warehouse, WorkerWarehouse,
    };
    pub use crate::worker::{WorkerClient, WorkerError};
}
