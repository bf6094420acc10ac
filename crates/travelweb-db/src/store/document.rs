//! Persisted form of a [`TableStore`](super::TableStore).
//!
//! ```json
//! {
//!   "data": { "blogs": [ { "id": 1, ... } ] },
//!   "indexes": { "blogs": { "nextId": 2 } },
//!   "lastModified": "2024-05-01T08:30:00.000Z"
//! }
//! ```
//!
//! Declared column metadata travels under an optional `schema` key.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{ColumnDescriptor, Record, SqlValue};
use crate::error::Result;

/// Whole-store document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDocument {
    /// Records per table.
    #[serde(default)]
    pub data: BTreeMap<String, Vec<Record>>,

    /// Auto-increment state per table.
    #[serde(default)]
    pub indexes: BTreeMap<String, TableIndex>,

    /// Declared columns per table (emulated relational stores only).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schema: BTreeMap<String, Vec<ColumnDescriptor>>,

    /// Time of the last write, RFC 3339.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

/// Auto-increment state of one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableIndex {
    pub next_id: i64,
}

impl StoreDocument {
    /// Read a document from disk. A missing file yields `None`.
    pub async fn load(path: &Path) -> Result<Option<Self>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the whole document: temp file in the same directory, then rename.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec_pretty(self)?;
        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp = path.with_file_name(tmp_name);

        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Consistency problems: duplicate integer ids, or a `nextId` that does
    /// not exceed the largest id in its table.
    pub fn integrity_problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        for (table, rows) in &self.data {
            let mut seen = HashSet::new();
            let mut max_id = 0;
            for id in rows.iter().filter_map(|r| r.get("id").and_then(integer_id)) {
                if !seen.insert(id) {
                    problems.push(format!("{}: duplicate id {}", table, id));
                }
                max_id = max_id.max(id);
            }

            match self.indexes.get(table) {
                Some(index) if index.next_id <= max_id => problems.push(format!(
                    "{}: nextId {} does not exceed max id {}",
                    table, index.next_id, max_id
                )),
                None if max_id > 0 => problems.push(format!("{}: missing nextId", table)),
                _ => {}
            }
        }

        problems
    }
}

fn integer_id(value: &SqlValue) -> Option<i64> {
    match value {
        SqlValue::Int(n) => Some(*n),
        SqlValue::UInt(n) => i64::try_from(*n).ok(),
        _ => None,
    }
}
