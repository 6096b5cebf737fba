//! Usage mining: audit log → per-table usage artifacts + leaderboard.
//!
//! Runs against the audit log and the already-materialized mirror tree; it
//! only ever writes `usage.sql` artifacts and the leaderboard, never schema
//! or preview artifacts.

pub mod miner;
pub mod report;

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::mirror::layout::{self, LEADERBOARD_FILE};
use crate::warehouse::{CatalogFilters, Warehouse};
use crate::worker::WorkerError;

pub use miner::{aggregate_usage, UsageRecord, SAMPLE_QUERY_LIMIT};
pub use report::{render_leaderboard, render_usage_queries, UsageWriteReport, LEADERBOARD_LIMIT};

/// Errors fatal to a usage mining run.
#[derive(Debug, Error)]
pub enum UsageError {
    /// Audit log or catalog could not be fetched at all.
    #[error("audit log fetch failed: {0}")]
    Remote(#[from] WorkerError),

    /// The mirror tree does not exist; it must be built first.
    #[error("mirror directory {0} does not exist; build the mirror first")]
    MissingMirror(std::path::PathBuf),

    /// The leaderboard document could not be written.
    #[error("failed to write leaderboard: {0}")]
    Leaderboard(#[from] std::io::Error),
}

/// Result of one usage mining run.
#[derive(Debug)]
pub struct UsageRunReport {
    /// Qualifying jobs returned by the audit log.
    pub jobs: usize,
    /// Tables with at least one qualifying job.
    pub records: usize,
    /// Per-table artifact accounting.
    pub write: UsageWriteReport,
    /// Tables ranked into the leaderboard (materialized tables only).
    pub ranked: usize,
}

/// Mine the audit log and materialize usage artifacts under `root`.
///
/// Fetches the job history and the filtered catalog (both fatal on remote
/// error), aggregates usage, writes one `usage.sql` per materialized table,
/// and renders the leaderboard over the materialized tables only.
pub async fn mine_usage(
    warehouse: Arc<dyn Warehouse>,
    filters: &CatalogFilters,
    root: &Path,
    lookback_days: u32,
) -> Result<UsageRunReport, UsageError> {
    if !root.is_dir() {
        return Err(UsageError::MissingMirror(root.to_path_buf()));
    }

    // The audit log and the catalog are independent reads.
    let (jobs, catalog) = futures::try_join!(
        warehouse.usage_history(lookback_days),
        warehouse.fetch_catalog(filters)
    )?;

    let records = aggregate_usage(&jobs, &catalog);

    // Leaderboard membership requires the table to exist on disk; ranking
    // order is already established by the aggregation.
    let materialized: Vec<UsageRecord> = records
        .iter()
        .filter(|r| root.join(r.identity.relative_path()).is_dir())
        .cloned()
        .collect();

    let leaderboard_path = root.join(LEADERBOARD_FILE);
    layout::write_atomic(&leaderboard_path, &render_leaderboard(&materialized))?;

    let write = report::write_usage_artifacts(root, &records);

    Ok(UsageRunReport {
        jobs: jobs.len(),
        records: records.len(),
        write,
        ranked: materialized.len().min(LEADERBOARD_LIMIT),
    })
}
