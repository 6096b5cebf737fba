//! Usage artifact and leaderboard rendering.
//!
//! The per-table artifact lists each sample query as an executable,
//! uncommented SQL statement between comment-only separators, so the file
//! can be opened and run statement-by-statement in any SQL editor.

use std::path::Path;

use crate::mirror::layout::{self, USAGE_FILE};
use crate::usage::miner::UsageRecord;

/// Rows rendered into the leaderboard document.
pub const LEADERBOARD_LIMIT: usize = 200;

/// Render the `usage.sql` body for one table.
pub fn render_usage_queries(record: &UsageRecord) -> String {
    if record.sample_queries.is_empty() {
        return "-- No usage queries found for this table\n".to_string();
    }

    let mut lines = Vec::new();
    lines.push("-- Usage queries for this table".to_string());
    lines.push(format!(
        "-- Total queries found: {} (showing top {})",
        record.total_queries,
        record.sample_queries.len()
    ));
    lines.push(String::new());

    for (i, query) in record.sample_queries.iter().enumerate() {
        lines.push(format!("-- Query {}:", i + 1));
        lines.push(format!("-- {}", "-".repeat(50)));
        lines.push(String::new());
        lines.push(query.trim().to_string());
        lines.push(String::new());
        lines.push(format!("-- {}", "=".repeat(80)));
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Render the ranked leaderboard document.
///
/// `records` must already be restricted to tables materialized on disk and
/// sorted by `(-total_queries, full_table_name)`.
pub fn render_leaderboard(records: &[UsageRecord]) -> String {
    let mut lines = Vec::new();
    lines.push("# High Usage Tables - Query Analysis".to_string());
    lines.push(String::new());

    if !records.is_empty() {
        lines.push(format!("## Top {LEADERBOARD_LIMIT} Most Used Tables"));
        lines.push(String::new());
        for (i, record) in records.iter().take(LEADERBOARD_LIMIT).enumerate() {
            lines.push(format!(
                "{:2}. **{}** - {} queries",
                i + 1,
                record.full_table_name(),
                record.total_queries
            ));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Accounting for the per-table artifact pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageWriteReport {
    /// Usage artifacts written.
    pub written: usize,
    /// Records skipped because the table directory does not exist yet.
    pub missing_dir: usize,
    /// Records that failed to write.
    pub errored: usize,
}

/// Write `usage.sql` under every record's table directory.
///
/// Records whose directory is absent are skipped with a warning — the
/// mirror must be built first. Write failures are counted, never fatal.
pub fn write_usage_artifacts(root: &Path, records: &[UsageRecord]) -> UsageWriteReport {
    let mut report = UsageWriteReport::default();

    for record in records {
        let table_dir = root.join(record.identity.relative_path());
        if !table_dir.is_dir() {
            eprintln!(
                "usage: table directory does not exist, skipping {} (build the mirror first)",
                record.identity
            );
            report.missing_dir += 1;
            continue;
        }

        let path = table_dir.join(USAGE_FILE);
        match layout::write_atomic(&path, &render_usage_queries(record)) {
            Ok(()) => report.written += 1,
            Err(e) => {
                eprintln!("usage: failed to write {}: {}", path.display(), e);
                report.errored += 1;
            }
        }
    }

    report
}
