//! Cost-gated ad-hoc query runner.
//!
//! Linear state machine:
//!
//! ```text
//! READ_SOURCE → DRY_RUN → (GATE) → EXECUTE → PERSIST_RESULTS → PERSIST_DIAGNOSTICS
//! ```
//!
//! The gate blocks on explicit confirmation when the estimated data volume
//! exceeds the threshold; declining aborts cleanly with no artifacts
//! written. The bulk-retrieval transport falls back to paged retrieval when
//! the caller lacks the required permission, surfaced as a warning.

pub mod diagnostics;
pub mod export;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::warehouse::{DryRunEstimate, Warehouse};
use crate::worker::WorkerError;

pub use diagnostics::{diagnostics_path, QueryDiagnostics};

/// Gate threshold on estimated data volume, in gigabytes.
pub const GATE_THRESHOLD_GB: f64 = 100.0;

/// Fixed on-demand price per terabyte processed.
pub const PRICE_PER_TB_USD: f64 = 6.25;

/// Errors fatal to a runner invocation.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("cannot read query file {path}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("dry run failed: {0}")]
    DryRun(#[source] WorkerError),

    #[error("query execution failed: {0}")]
    Execute(#[source] WorkerError),

    #[error("failed to save results: {0}")]
    SaveResults(#[source] io::Error),
}

/// Source of the gate confirmation, injected so tests can script it.
pub trait GateConfirm {
    /// Return `true` to proceed with an over-threshold query.
    fn confirm(&mut self, gigabytes: f64, estimated_cost_usd: f64) -> bool;
}

/// Interactive confirmation on stdin (y/N, default no).
pub struct StdinConfirm;

impl GateConfirm for StdinConfirm {
    fn confirm(&mut self, gigabytes: f64, estimated_cost_usd: f64) -> bool {
        eprintln!(
            "WARNING: estimated data volume {gigabytes:.2} GB exceeds the {GATE_THRESHOLD_GB:.0} GB threshold (~${estimated_cost_usd:.4})"
        );

        let stdin = io::stdin();
        loop {
            eprint!("Proceed anyway? (y/N): ");
            let _ = io::stderr().flush();

            let mut line = String::new();
            if stdin.lock().read_line(&mut line).is_err() {
                return false;
            }
            match line.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => return true,
                "n" | "no" | "" => return false,
                _ => eprintln!("Please answer 'y' or 'n'."),
            }
        }
    }
}

/// Runner invocation options.
#[derive(Debug, Clone, Default)]
pub struct RunnerOptions {
    /// Skip the dry run and gate entirely.
    pub force: bool,
    /// Where to save result rows (format by extension); absent skips saving.
    pub output_file: Option<PathBuf>,
}

/// How a runner invocation ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// The gate was declined: nothing executed, nothing written.
    Declined { estimate: DryRunEstimate },
    /// The query ran to completion.
    Completed(RunSummary),
}

/// Summary of a completed run.
#[derive(Debug)]
pub struct RunSummary {
    /// Cost estimate, absent when the run was forced.
    pub estimate: Option<DryRunEstimate>,
    /// Result rows retrieved.
    pub rows: usize,
    /// Result column names.
    pub columns: Vec<String>,
    /// Bulk retrieval was unavailable and the paged path was used.
    pub degraded: bool,
    /// Where results were saved, if requested.
    pub results_path: Option<PathBuf>,
    /// Where diagnostics were written; absent only if the write failed.
    pub diagnostics_path: Option<PathBuf>,
}

/// Execute the query in `sql_path` through the full state machine.
pub async fn run_query_file(
    warehouse: &dyn Warehouse,
    sql_path: &Path,
    options: &RunnerOptions,
    confirm: &mut dyn GateConfirm,
) -> Result<RunOutcome, RunnerError> {
    // READ_SOURCE
    let sql = std::fs::read_to_string(sql_path).map_err(|e| RunnerError::Source {
        path: sql_path.to_path_buf(),
        source: e,
    })?;

    // DRY_RUN + GATE
    let estimate = if options.force {
        None
    } else {
        let estimate = warehouse.dry_run(&sql).await.map_err(RunnerError::DryRun)?;
        let gigabytes = estimate.gigabytes();
        if gigabytes > GATE_THRESHOLD_GB
            && !confirm.confirm(gigabytes, estimate.cost_usd(PRICE_PER_TB_USD))
        {
            return Ok(RunOutcome::Declined { estimate });
        }
        Some(estimate)
    };

    // EXECUTE, falling back to paged retrieval on a permission failure.
    let (execution, degraded) = match warehouse.execute(&sql, true).await {
        Ok(execution) => (execution, false),
        Err(e) if e.is_permission_denied() => {
            eprintln!("run: bulk retrieval unavailable ({e}); falling back to paged retrieval");
            let execution = warehouse
                .execute(&sql, false)
                .await
                .map_err(RunnerError::Execute)?;
            (execution, true)
        }
        Err(e) => return Err(RunnerError::Execute(e)),
    };

    // PERSIST_RESULTS
    let results_path = match &options.output_file {
        Some(path) => {
            export::save_results(&execution.columns, &execution.rows, path)
                .map_err(RunnerError::SaveResults)?;
            Some(path.clone())
        }
        None => None,
    };

    // PERSIST_DIAGNOSTICS — always attempted after execution, even on the
    // degraded retrieval path; a write failure is a warning, not an error.
    let diag_path = diagnostics::diagnostics_path(sql_path);
    let diagnostics = QueryDiagnostics::from_execution(&execution);
    let diagnostics_path = match diagnostics::write_diagnostics(&diag_path, &diagnostics) {
        Ok(()) => Some(diag_path),
        Err(e) => {
            eprintln!("run: could not write diagnostics to {}: {}", diag_path.display(), e);
            None
        }
    };

    Ok(RunOutcome::Completed(RunSummary {
        estimate,
        rows: execution.rows.len(),
        columns: execution.columns.iter().map(|c| c.name.clone()).collect(),
        degraded,
        results_path,
        diagnostics_path,
    }))
}
