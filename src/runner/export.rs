//! Result export by file extension.
//!
//! `.json` writes an array of row objects; `.csv` (and any unrecognized
//! extension) writes delimited text with a header row. Cells are rendered
//! the same way previews render them: NULL empty, strings raw, nested
//! values as compact JSON.

use std::fs;
use std::io;
use std::path::Path;

use serde_json::Value;

use crate::worker::protocol::ColumnMeta;

/// Save result rows to `path`, format chosen by extension.
pub fn save_results(columns: &[ColumnMeta], rows: &[Vec<Value>], path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("json") => write_json(columns, rows, path),
        Some("csv") => write_csv(columns, rows, path),
        _ => {
            eprintln!(
                "run: unknown output extension for {}, defaulting to CSV",
                path.display()
            );
            write_csv(columns, rows, path)
        }
    }
}

fn write_json(columns: &[ColumnMeta], rows: &[Vec<Value>], path: &Path) -> io::Result<()> {
    let objects: Vec<serde_json::Map<String, Value>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .zip(row)
                .map(|(col, cell)| (col.name.clone(), cell.clone()))
                .collect()
        })
        .collect();

    let json = serde_json::to_string_pretty(&objects)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(path, json + "\n")
}

fn write_csv(columns: &[ColumnMeta], rows: &[Vec<Value>], path: &Path) -> io::Result<()> {
    let mut out = String::new();

    let header = columns
        .iter()
        .map(|c| csv_escape(&c.name))
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&header);
    out.push('\n');

    for row in rows {
        let line = row
            .iter()
            .map(|cell| csv_escape(&cell_text(cell)))
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&line);
        out.push('\n');
    }

    fs::write(path, out)
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Quote a field when it contains a delimiter, quote or newline.
fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn columns(names: &[&str]) -> Vec<ColumnMeta> {
        names
            .iter()
            .map(|n| ColumnMeta {
                name: n.to_string(),
                data_type: "STRING".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_save_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        save_results(
            &columns(&["id", "name"]),
            &[vec![json!(1), json!("a,b")], vec![json!(2), json!(null)]],
            &path,
        )
        .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "id,name\n1,\"a,b\"\n2,\n");
    }

    #[test]
    fn test_save_json_row_objects() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        save_results(
            &columns(&["id", "name"]),
            &[vec![json!(1), json!("alice")]],
            &path,
        )
        .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["id"], 1);
        assert_eq!(value[0]["name"], "alice");
    }

    #[test]
    fn test_unknown_extension_defaults_to_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.data");

        save_results(&columns(&["id"]), &[vec![json!(7)]], &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "id\n7\n");
    }
}
