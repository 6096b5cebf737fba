//! Preview artifact rendering.
//!
//! A preview is a comment-rendered, fixed-width sample of a table: header
//! metadata (total row count, sample size), column names, then up to N data
//! rows. Oversized values and large geospatial/binary types are truncated to
//! a hard cap with an explicit marker so a single GEOGRAPHY cell cannot
//! balloon the artifact.

use crate::mirror::staleness::ERROR_SENTINEL;
use crate::warehouse::{TableIdentity, TableSample};

/// Hard cap on a rendered field value, in characters.
pub const MAX_FIELD_CHARS: usize = 100;

/// Fixed column width of the rendered grid.
const COLUMN_WIDTH: usize = 20;

/// Marker appended to truncated values.
const TRUNCATION_MARKER: &str = "... [TRUNCATED]";

/// Declared types rendered as truncated regardless of length.
fn is_large_value_type(data_type: &str) -> bool {
    matches!(data_type, "GEOGRAPHY" | "GEOMETRY")
}

/// Render one cell value for preview display.
///
/// NULL renders as `NULL`; strings render unquoted; nested values render as
/// compact JSON. Values of large geospatial types, or whose textual form
/// exceeds `max_chars`, are cut to a `max_chars` prefix plus the truncation
/// marker.
pub fn format_field(value: &serde_json::Value, data_type: &str, max_chars: usize) -> String {
    let text = match value {
        serde_json::Value::Null => return "NULL".to_string(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    if is_large_value_type(data_type) || text.chars().count() > max_chars {
        let truncated: String = text.chars().take(max_chars).collect();
        return format!("{truncated}{TRUNCATION_MARKER}");
    }

    text
}

/// Render the preview artifact for a fetched sample.
///
/// The declared row count in the header is always the number of body rows;
/// field truncation can never change it.
pub fn render_preview(table: &TableIdentity, sample: &TableSample) -> String {
    if sample.rows.is_empty() {
        return "-- No data available in this table\n".to_string();
    }

    let mut lines = Vec::new();
    lines.push(format!("-- Preview of table: {table}"));
    lines.push(format!("-- Total rows in table: {}", sample.total_rows));
    lines.push(format!("-- Showing first {} rows", sample.rows.len()));
    lines.push(String::new());

    let header = sample
        .columns
        .iter()
        .map(|c| format!("{:<COLUMN_WIDTH$}", c.name))
        .collect::<Vec<_>>()
        .join(" ");
    lines.push(format!("-- {header}"));
    lines.push(format!(
        "-- {}",
        "-".repeat(COLUMN_WIDTH * sample.columns.len())
    ));

    for row in &sample.rows {
        let rendered = row
            .iter()
            .zip(&sample.columns)
            .map(|(value, column)| {
                format!(
                    "{:<COLUMN_WIDTH$}",
                    format_field(value, &column.data_type, MAX_FIELD_CHARS)
                )
            })
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(format!("-- {rendered}"));
    }

    lines.join("\n") + "\n"
}

/// Render the artifact body for a failed preview fetch.
///
/// Begins with the reserved error sentinel so the artifact reads as stale on
/// the next run and the fetch is retried, while leaving a human-readable
/// trace of the failure.
pub fn render_fetch_error(table: &TableIdentity, reason: &str) -> String {
    format!("{ERROR_SENTINEL} for {table}: {reason}\n")
}
