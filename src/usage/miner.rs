//! Usage aggregation over audit-log jobs.
//!
//! Raw jobs fan out over their referenced tables, so counting rows would
//! overcount: one job referencing a table through two access paths must
//! contribute once. Counts are therefore distinct over job identifiers.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;

use crate::warehouse::{CatalogEntry, JobRecord, TableIdentity};

/// Maximum sample queries kept per table.
pub const SAMPLE_QUERY_LIMIT: usize = 10;

/// Prefix of anonymous/temporary table names in the audit log.
const TEMP_TABLE_PREFIX: &str = "anon";

/// Mined usage for one table. Rebuilt wholesale each run from the lookback
/// window; never merged with prior state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageRecord {
    pub identity: TableIdentity,
    /// Up to ten distinct query texts, descending lexical order of the text.
    ///
    /// The sort key is the query text itself: deterministic, but a
    /// convenience heuristic rather than a relevance or recency ranking.
    pub sample_queries: Vec<String>,
    /// Distinct jobs referencing the table within the window.
    pub total_queries: u64,
}

impl UsageRecord {
    pub fn full_table_name(&self) -> String {
        self.identity.full_name()
    }
}

/// Whether a referenced table lives in a system or temporary namespace.
///
/// Datasets beginning with an underscore and anonymous result tables are
/// never usage targets.
pub fn is_system_reference(identity: &TableIdentity) -> bool {
    identity.schema.starts_with('_') || identity.table.starts_with(TEMP_TABLE_PREFIX)
}

/// Aggregate audit-log jobs into per-table usage records.
///
/// References are resolved against the known catalog (already filtered);
/// system/temporary references and references to unknown tables are
/// discarded. Only tables with at least one qualifying job are returned,
/// ranked by `(-total_queries, full_table_name ascending)`.
pub fn aggregate_usage(jobs: &[JobRecord], catalog: &[CatalogEntry]) -> Vec<UsageRecord> {
    let known: HashSet<&TableIdentity> = catalog.iter().map(|e| &e.identity).collect();

    let mut by_table: HashMap<&TableIdentity, (HashSet<&str>, BTreeSet<&str>)> = HashMap::new();

    for job in jobs {
        for reference in &job.referenced {
            if is_system_reference(reference) {
                continue;
            }
            let Some(&identity) = known.get(reference) else {
                continue;
            };

            let (job_ids, queries) = by_table.entry(identity).or_default();
            job_ids.insert(job.job_id.as_str());
            queries.insert(job.query.as_str());
        }
    }

    let mut records: Vec<UsageRecord> = by_table
        .into_iter()
        .filter(|(_, (job_ids, _))| !job_ids.is_empty())
        .map(|(identity, (job_ids, queries))| UsageRecord {
            identity: identity.clone(),
            sample_queries: queries
                .iter()
                .rev()
                .take(SAMPLE_QUERY_LIMIT)
                .map(|q| q.to_string())
                .collect(),
            total_queries: job_ids.len() as u64,
        })
        .collect();

    records.sort_by(|a, b| {
        b.total_queries
            .cmp(&a.total_queries)
            .then_with(|| a.full_table_name().cmp(&b.full_table_name()))
    });

    records
}
