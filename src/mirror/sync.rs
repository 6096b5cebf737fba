//! Directory synchronizer.
//!
//! Walks the fetched catalog, materializes each table's directory, rewrites
//! the schema-definition artifact, and decides per table whether the preview
//! artifact must be refreshed. The staleness decision uses the state
//! observed *before* the definition is overwritten: the persisted definition
//! is the previous run's, and it is the comparison baseline for this run.
//!
//! A failure on one table never aborts the others; failures are counted and
//! reported.

use std::path::{Path, PathBuf};

use crate::mirror::layout::{self, DEFINITION_FILE, PREVIEW_FILE};
use crate::mirror::staleness::{self, PreviewState};
use crate::warehouse::{CatalogEntry, TableIdentity};

/// One preview fetch the synchronizer decided is required.
#[derive(Debug, Clone)]
pub struct PreviewTask {
    pub table: TableIdentity,
    pub preview_path: PathBuf,
}

/// Per-run synchronizer accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Tables whose preview artifact did not exist yet.
    pub created: usize,
    /// Tables whose existing preview was stale and re-enqueued.
    pub updated: usize,
    /// Tables whose preview is current (no fetch issued).
    pub skipped: usize,
    /// Tables that failed to process (malformed entry, I/O error).
    pub errored: usize,
}

/// Result of a synchronizer pass.
#[derive(Debug, Default)]
pub struct SyncOutcome {
    /// Preview fetches to dispatch to the pool.
    pub tasks: Vec<PreviewTask>,
    /// Aggregate counts.
    pub report: SyncReport,
}

/// Synchronize the directory tree under `root` with the fetched catalog.
///
/// Creates table directories as needed (idempotent, never destructive to
/// siblings), rewrites every `definition.sql`, and returns the preview
/// fetch tasks. With `enable_preview` off, definitions are still refreshed
/// but no fetches are enqueued.
pub fn sync_entries(root: &Path, entries: &[CatalogEntry], enable_preview: bool) -> SyncOutcome {
    let mut outcome = SyncOutcome::default();

    for entry in entries {
        match sync_entry(root, entry, enable_preview) {
            Ok(EntrySync::Enqueue { task, existed }) => {
                if existed {
                    outcome.report.updated += 1;
                } else {
                    outcome.report.created += 1;
                }
                outcome.tasks.push(task);
            }
            Ok(EntrySync::Fresh) => outcome.report.skipped += 1,
            Err(reason) => {
                eprintln!("sync: skipping {}: {}", entry.identity, reason);
                outcome.report.errored += 1;
            }
        }
    }

    outcome
}

enum EntrySync {
    /// Preview fetch required; `existed` when a preview artifact was already
    /// on disk (stale or error-marked).
    Enqueue { task: PreviewTask, existed: bool },
    /// Preview current, nothing to do.
    Fresh,
}

fn sync_entry(
    root: &Path,
    entry: &CatalogEntry,
    enable_preview: bool,
) -> Result<EntrySync, String> {
    if !entry.identity.is_complete() || entry.wildcard_name.is_empty() {
        return Err("catalog entry has empty identity fields".to_string());
    }

    let dir = layout::table_dir(root, entry);
    std::fs::create_dir_all(&dir).map_err(|e| format!("creating {}: {}", dir.display(), e))?;

    let definition_path = dir.join(DEFINITION_FILE);
    let preview_path = dir.join(PREVIEW_FILE);

    // Observe before overwriting: the persisted definition is the previous
    // run's baseline.
    let previous_definition = staleness::read_persisted_definition(&definition_path);
    let preview_state = staleness::classify_preview(&preview_path);

    layout::write_atomic(&definition_path, &entry.definition)
        .map_err(|e| format!("writing {}: {}", definition_path.display(), e))?;

    if !enable_preview {
        return Ok(EntrySync::Fresh);
    }

    if staleness::needs_refresh(
        &preview_state,
        previous_definition.as_deref(),
        &entry.definition,
    ) {
        Ok(EntrySync::Enqueue {
            task: PreviewTask {
                table: entry.identity.clone(),
                preview_path,
            },
            existed: preview_state != PreviewState::Missing,
        })
    } else {
        Ok(EntrySync::Fresh)
    }
}
