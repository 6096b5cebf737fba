//! Bounded-concurrency preview fetch pool.
//!
//! Each task is a single round trip against a rate/quota-limited remote API,
//! so the pool is a small fixed number of workers consuming a shared queue —
//! never one task per table. Workers share nothing but the queue and the
//! results channel; tasks are independent and complete in arbitrary order.
//!
//! A failed fetch writes an artifact beginning with the error sentinel
//! instead of propagating: the artifact reads as stale on the next run, so
//! the fetch retries itself, and the failure reason stays on disk for the
//! operator.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::mirror::layout;
use crate::mirror::preview;
use crate::mirror::sync::PreviewTask;
use crate::warehouse::{TableIdentity, Warehouse};

/// Default pool width.
pub const DEFAULT_WORKERS: usize = 4;

/// How a preview task ended.
#[derive(Debug, Clone)]
pub enum PreviewWrite {
    /// Sample fetched and artifact written.
    Fetched,
    /// Fetch failed; sentinel artifact written with the reason.
    ErrorMarked(String),
    /// Artifact could not be written at all (local I/O failure).
    Failed(String),
}

/// Per-task outcome, reported in completion order.
#[derive(Debug, Clone)]
pub struct PreviewOutcome {
    pub table: TableIdentity,
    pub write: PreviewWrite,
}

/// Aggregate pool accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchReport {
    pub fetched: usize,
    pub error_marked: usize,
    pub failed: usize,
}

/// Fetch and persist previews for all tasks under bounded concurrency.
///
/// Returns per-task outcomes in completion order plus aggregate counts.
/// Individual failures never abort the run.
pub async fn fetch_previews(
    warehouse: Arc<dyn Warehouse>,
    tasks: Vec<PreviewTask>,
    workers: usize,
    max_rows: u32,
) -> (Vec<PreviewOutcome>, FetchReport) {
    if tasks.is_empty() {
        return (Vec::new(), FetchReport::default());
    }

    let task_count = tasks.len();
    let (task_tx, task_rx) = mpsc::channel::<PreviewTask>(task_count);
    for task in tasks {
        // Capacity equals the task count, so send cannot fail.
        task_tx.send(task).await.expect("task queue closed");
    }
    drop(task_tx);

    let queue = Arc::new(Mutex::new(task_rx));
    let (result_tx, mut result_rx) = mpsc::channel::<PreviewOutcome>(task_count);

    let width = workers.clamp(1, task_count);
    for _ in 0..width {
        let queue = queue.clone();
        let warehouse = warehouse.clone();
        let result_tx = result_tx.clone();

        tokio::spawn(async move {
            loop {
                // Hold the queue lock only for the dequeue, not the fetch.
                let task = { queue.lock().await.recv().await };
                let Some(task) = task else { break };

                let outcome = run_task(warehouse.as_ref(), &task, max_rows).await;
                if result_tx.send(outcome).await.is_err() {
                    break;
                }
            }
        });
    }
    drop(result_tx);

    let mut outcomes = Vec::with_capacity(task_count);
    let mut report = FetchReport::default();
    while let Some(outcome) = result_rx.recv().await {
        match &outcome.write {
            PreviewWrite::Fetched => report.fetched += 1,
            PreviewWrite::ErrorMarked(_) => report.error_marked += 1,
            PreviewWrite::Failed(_) => report.failed += 1,
        }
        outcomes.push(outcome);
    }

    (outcomes, report)
}

async fn run_task(warehouse: &dyn Warehouse, task: &PreviewTask, max_rows: u32) -> PreviewOutcome {
    let (content, write) = match warehouse.sample_rows(&task.table, max_rows).await {
        Ok(sample) => (
            preview::render_preview(&task.table, &sample),
            PreviewWrite::Fetched,
        ),
        Err(e) => {
            let reason = e.to_string();
            (
                preview::render_fetch_error(&task.table, &reason),
                PreviewWrite::ErrorMarked(reason),
            )
        }
    };

    match layout::write_atomic(&task.preview_path, &content) {
        Ok(()) => PreviewOutcome {
            table: task.table.clone(),
            write,
        },
        Err(e) => PreviewOutcome {
            table: task.table.clone(),
            write: PreviewWrite::Failed(e.to_string()),
        },
    }
}
