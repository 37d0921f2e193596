//! JSON dataset format read by the `rangepage` binary.
//!
//! ```json
//! { "tables": [{ "name": "songs", "primary_key": ["id"],
//!                "indexes": [{ "name": "year", "key_path": ["year"] }],
//!                "rows": [{ "id": 1, "year": 1999 }] }] }
//! ```
//!
//! Tables without a `primary_key` keep their keys outside the record; their
//! rows are written as `{ "key": ..., "record": { ... } }`.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::storage::memory::{Key, MemoryStore, Record, TableSchema};

use super::CliError;

/// Top-level dataset document.
#[derive(Clone, Debug, Deserialize)]
pub struct Dataset {
    /// Tables to create, in order.
    pub tables: Vec<DatasetTable>,
}

/// One table: its schema plus initial rows.
#[derive(Clone, Debug, Deserialize)]
pub struct DatasetTable {
    /// Table layout.
    #[serde(flatten)]
    pub schema: TableSchema,
    /// Rows inserted after the table is created.
    #[serde(default)]
    pub rows: Vec<DatasetRow>,
}

/// A row, with or without an explicit primary key.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum DatasetRow {
    /// Row for a table whose keys live outside the record.
    Keyed {
        /// Primary key.
        key: Key,
        /// Stored record.
        record: Record,
    },
    /// Row whose primary key is read from the record.
    Plain(Record),
}

impl Dataset {
    /// Creates every table and inserts its rows.
    pub fn load_into(self, store: &MemoryStore) -> Result<(), CliError> {
        for table in self.tables {
            let name = table.schema.name.clone();
            store.create_table(table.schema)?;
            let rows = table.rows.len();
            for row in table.rows {
                match row {
                    DatasetRow::Keyed { key, record } => store.put_with_key(&name, key, record)?,
                    DatasetRow::Plain(record) => store.put(&name, record)?,
                };
            }
            info!(table = %name, rows, "cli.dataset.table_loaded");
        }
        Ok(())
    }
}

/// Parses a dataset document into a fresh store.
pub fn dataset_from_str(json: &str) -> Result<MemoryStore, CliError> {
    let dataset: Dataset = serde_json::from_str(json)?;
    let store = MemoryStore::new();
    dataset.load_into(&store)?;
    Ok(store)
}

/// Reads and loads a dataset file.
pub fn load_dataset(path: &Path) -> Result<MemoryStore, CliError> {
    dataset_from_str(&fs::read_to_string(path)?)
}
