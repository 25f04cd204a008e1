//! Loads stored transaction documents from disk.

use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::{fs, path::Path};
use tracing::debug;

/// Pulls the record documents out of a parsed file. Individual documents
/// are left unchecked so one bad record cannot fail the whole file.
fn into_documents(file: Value) -> Option<Vec<Value>> {
    match file {
        Value::Array(documents) => Some(documents),
        Value::Object(mut map) => match map.remove("transactions") {
            Some(Value::Array(documents)) => Some(documents),
            _ => None,
        },
        _ => None,
    }
}

/// Reads record documents from a `.json`, `.yaml` or `.yml` file.
///
/// The file holds either a list of records or a map with a `transactions`
/// list.
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<Value>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read records file: {}", path.display()))?;

    let file: Value = match extension.as_str() {
        "json" => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse records file: {}", path.display()))?,
        "yaml" | "yml" => serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse records file: {}", path.display()))?,
        other => bail!(
            "Unsupported records format '{}' for {}, expected json or yaml",
            other,
            path.display()
        ),
    };

    let records = into_documents(file).with_context(|| {
        format!(
            "Records file {} must hold a list of records or a `transactions` list",
            path.display()
        )
    })?;
    debug!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}
