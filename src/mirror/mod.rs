//! Catalog mirror: fetch, synchronize, preview.
//!
//! ```text
//! Catalog Fetcher ──► Directory Synchronizer ──► Preview Fetch Pool
//!  (one RPC, fatal      (staleness decisions,      (bounded workers,
//!   on any error)        per-item recovery)         sentinel on failure)
//! ```
//!
//! The synchronizer owns every decision about what gets written under a
//! table directory; the pool only writes the preview artifacts it was
//! dispatched.

pub mod layout;
pub mod pool;
pub mod preview;
pub mod staleness;
pub mod sync;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::warehouse::{CatalogFilters, Warehouse};
use crate::worker::WorkerError;

pub use pool::{FetchReport, PreviewOutcome, PreviewWrite};
pub use staleness::{PreviewState, ERROR_SENTINEL};
pub use sync::{PreviewTask, SyncReport};

/// Errors fatal to a mirror run.
///
/// Per-table failures are not errors; they are counted in the report.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// The remote catalog could not be fetched at all.
    #[error("catalog fetch failed: {0}")]
    Catalog(#[from] WorkerError),

    /// The mirror root could not be created.
    #[error("cannot create mirror root {path}: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Knobs for one mirror build.
#[derive(Debug, Clone)]
pub struct MirrorOptions {
    /// Root directory of the mirrored tree.
    pub root: PathBuf,
    /// Whether to fetch preview artifacts.
    pub enable_preview: bool,
    /// Maximum sample rows per preview.
    pub max_preview_rows: u32,
    /// Fixed width of the fetch pool.
    pub fetch_workers: usize,
}

impl Default for MirrorOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("tables"),
            enable_preview: true,
            max_preview_rows: 10,
            fetch_workers: pool::DEFAULT_WORKERS,
        }
    }
}

/// Result of one mirror build.
#[derive(Debug)]
pub struct MirrorReport {
    /// Tables returned by the catalog fetch.
    pub tables: usize,
    /// Synchronizer counts.
    pub sync: SyncReport,
    /// Pool counts.
    pub fetch: FetchReport,
    /// Per-task outcomes in completion order.
    pub outcomes: Vec<PreviewOutcome>,
}

/// Build or refresh the mirror under `options.root`.
///
/// Fetches the filtered catalog (fatal on any remote error), synchronizes
/// the directory tree, then drains the preview fetch pool. Partial per-table
/// failures are reflected in the report, not the error path.
pub async fn build_mirror(
    warehouse: Arc<dyn Warehouse>,
    filters: &CatalogFilters,
    options: &MirrorOptions,
) -> Result<MirrorReport, MirrorError> {
    let entries = warehouse.fetch_catalog(filters).await?;

    std::fs::create_dir_all(&options.root).map_err(|e| MirrorError::Root {
        path: options.root.clone(),
        source: e,
    })?;

    let sync_outcome = sync::sync_entries(&options.root, &entries, options.enable_preview);

    let (outcomes, fetch) = pool::fetch_previews(
        warehouse,
        sync_outcome.tasks,
        options.fetch_workers,
        options.max_preview_rows,
    )
    .await;

    Ok(MirrorReport {
        tables: entries.len(),
        sync: sync_outcome.report,
        fetch,
        outcomes,
    })
}
