//! Filesystem layout of the mirrored tree.
//!
//! Every table maps to `root/catalog/schema/wildcard_name/` holding up to
//! three artifacts. Writes are atomic at single-artifact granularity: a
//! temp sibling is written first and renamed into place, so an interrupted
//! run never leaves a half-written artifact.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::warehouse::CatalogEntry;

/// Schema-definition artifact, persisted verbatim from the registry.
pub const DEFINITION_FILE: &str = "definition.sql";

/// Sample-data preview artifact.
pub const PREVIEW_FILE: &str = "preview.sql";

/// Mined usage artifact.
pub const USAGE_FILE: &str = "usage.sql";

/// Global usage leaderboard, written at the tree root.
pub const LEADERBOARD_FILE: &str = "HIGH_USAGE_TABLES.md";

/// Directory a catalog entry mirrors into.
///
/// Sharded table families collapse onto their wildcard name, so one
/// directory serves the whole family.
pub fn table_dir(root: &Path, entry: &CatalogEntry) -> PathBuf {
    root.join(&entry.identity.catalog)
        .join(&entry.identity.schema)
        .join(&entry.wildcard_name)
}

/// Write `content` to `path` atomically (temp sibling, then rename).
pub fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "artifact path has no file name"))?;
    let tmp = path.with_file_name(format!("{file_name}.tmp"));

    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warehouse::TableIdentity;

    fn entry(table: &str, wildcard: &str) -> CatalogEntry {
        CatalogEntry {
            identity: TableIdentity::new("p", "d", table),
            wildcard_name: wildcard.to_string(),
            definition: String::new(),
        }
    }

    #[test]
    fn test_table_dir_uses_wildcard_name() {
        let root = PathBuf::from("/mirror");
        assert_eq!(
            table_dir(&root, &entry("events_20240101", "events_*")),
            PathBuf::from("/mirror/p/d/events_*")
        );
        assert_eq!(
            table_dir(&root, &entry("sales", "sales")),
            PathBuf::from("/mirror/p/d/sales")
        );
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("definition.sql");

        write_atomic(&path, "v1").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "v1");

        write_atomic(&path, "v2").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "v2");

        // No temp sibling left behind.
        assert!(!path.with_file_name("definition.sql.tmp").exists());
    }
}
