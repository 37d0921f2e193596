#![forbid(unsafe_code)]

//! In-memory ordered store with secondary indexes.
//!
//! Tables live behind a lock as copy-on-write snapshots. Cursors hold the
//! snapshot they were opened against, so a cursor parked in a page token keeps
//! reading a consistent view while writers move on.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::storage::{
    Items, IndexMeta, KeyExtractor, RangeStore, ScanRequest, StoreCursor, PRIMARY_INDEX,
};
use crate::types::{Result, StoreError};

mod cursor;

pub use cursor::MemoryCursor;

/// Key value stored in an index. Ordering is `Int < Text < Array`, arrays
/// compare element-wise.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    /// Signed integer key.
    Int(i64),
    /// UTF-8 string key.
    Text(String),
    /// Compound or multi-valued key.
    Array(Vec<Key>),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(v) => write!(f, "{v}"),
            Key::Text(v) => write!(f, "{v:?}"),
            Key::Array(items) => {
                write!(f, "[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Int(i64::from(value))
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Text(value.to_owned())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Text(value)
    }
}

impl From<Vec<Key>> for Key {
    fn from(value: Vec<Key>) -> Self {
        Key::Array(value)
    }
}

/// Record stored in a table: field name to value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Key>);

impl Record {
    /// Empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter.
    pub fn with(mut self, field: &str, value: impl Into<Key>) -> Self {
        self.insert(field, value);
        self
    }

    /// Sets `field` to `value`.
    pub fn insert(&mut self, field: &str, value: impl Into<Key>) {
        self.0.insert(field.to_owned(), value.into());
    }

    /// Value of `field`, if present.
    pub fn get(&self, field: &str) -> Option<&Key> {
        self.0.get(field)
    }
}

/// Declaration of a secondary index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSchema {
    /// Index name; must not be empty.
    pub name: String,
    /// Fields making up the key; more than one yields an array key.
    pub key_path: Vec<String>,
    /// Reject two records with the same indexed key.
    #[serde(default)]
    pub unique: bool,
    /// Index each element of an array value separately.
    #[serde(default)]
    pub multi_entry: bool,
}

impl IndexSchema {
    /// Single-field index.
    pub fn new(name: &str, field: &str) -> Self {
        Self::compound(name, &[field])
    }

    /// Index over several fields.
    pub fn compound(name: &str, fields: &[&str]) -> Self {
        Self {
            name: name.to_owned(),
            key_path: fields.iter().map(|f| (*f).to_owned()).collect(),
            unique: false,
            multi_entry: false,
        }
    }

    /// Marks the index unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks the index multi-entry.
    pub fn multi_entry(mut self) -> Self {
        self.multi_entry = true;
        self
    }
}

/// Declaration of a table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name.
    pub name: String,
    /// Fields holding the primary key; empty when keys are supplied out of band.
    #[serde(default)]
    pub primary_key: Vec<String>,
    /// Secondary indexes.
    #[serde(default)]
    pub indexes: Vec<IndexSchema>,
}

impl TableSchema {
    /// Table whose primary key is read from `field`.
    pub fn inbound(name: &str, field: &str) -> Self {
        Self {
            name: name.to_owned(),
            primary_key: vec![field.to_owned()],
            indexes: Vec::new(),
        }
    }

    /// Table whose primary keys are supplied with each put.
    pub fn outbound(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            primary_key: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Adds a secondary index.
    pub fn index(mut self, index: IndexSchema) -> Self {
        self.indexes.push(index);
        self
    }

    fn is_outbound(&self) -> bool {
        self.primary_key.is_empty()
    }

    fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for index in &self.indexes {
            if index.name.is_empty() {
                return Err(StoreError::Invalid("secondary index name must not be empty"));
            }
            if index.key_path.is_empty() {
                return Err(StoreError::Invalid("secondary index requires a key path"));
            }
            if index.multi_entry && index.key_path.len() != 1 {
                return Err(StoreError::Invalid("multi-entry index must cover one field"));
            }
            if !seen.insert(index.name.as_str()) {
                return Err(StoreError::Invalid("duplicate index name"));
            }
        }
        Ok(())
    }
}

/// Indexed key to the primary keys of the records carrying it.
pub(crate) type IndexTree = BTreeMap<Key, BTreeSet<Key>>;

#[derive(Clone, Debug)]
pub(crate) struct TableData {
    schema: TableSchema,
    rows: BTreeMap<Key, Record>,
    indexes: BTreeMap<String, IndexTree>,
}

impl TableData {
    fn new(schema: TableSchema) -> Self {
        let mut indexes = BTreeMap::new();
        indexes.insert(PRIMARY_INDEX.to_owned(), IndexTree::new());
        for index in &schema.indexes {
            indexes.insert(index.name.clone(), IndexTree::new());
        }
        Self {
            schema,
            rows: BTreeMap::new(),
            indexes,
        }
    }

    pub(crate) fn tree(&self, index: &str) -> Result<&IndexTree> {
        self.indexes.get(index).ok_or(StoreError::NotFound("index"))
    }

    pub(crate) fn row(&self, primary_key: &Key) -> Option<&Record> {
        self.rows.get(primary_key)
    }

    fn insert_row(&mut self, primary_key: Key, record: Record) -> Result<()> {
        for index in self.schema.indexes.iter().filter(|index| index.unique) {
            let tree = self.indexes.get(&index.name).ok_or(StoreError::NotFound("index"))?;
            for key in index_keys(index, &record) {
                let clash = tree
                    .get(&key)
                    .is_some_and(|owners| owners.iter().any(|owner| owner != &primary_key));
                if clash {
                    return Err(StoreError::Invalid("unique index constraint violated"));
                }
            }
        }
        self.remove_row(&primary_key)?;
        for index in &self.schema.indexes {
            let tree = self
                .indexes
                .get_mut(&index.name)
                .ok_or(StoreError::NotFound("index"))?;
            for key in index_keys(index, &record) {
                tree.entry(key).or_default().insert(primary_key.clone());
            }
        }
        self.indexes
            .get_mut(PRIMARY_INDEX)
            .ok_or(StoreError::Corruption("primary index missing"))?
            .entry(primary_key.clone())
            .or_default()
            .insert(primary_key.clone());
        self.rows.insert(primary_key, record);
        Ok(())
    }

    fn remove_row(&mut self, primary_key: &Key) -> Result<bool> {
        let Some(old) = self.rows.remove(primary_key) else {
            return Ok(false);
        };
        for index in &self.schema.indexes {
            let tree = self
                .indexes
                .get_mut(&index.name)
                .ok_or(StoreError::NotFound("index"))?;
            for key in index_keys(index, &old) {
                detach(tree, &key, primary_key);
            }
        }
        let primary = self
            .indexes
            .get_mut(PRIMARY_INDEX)
            .ok_or(StoreError::Corruption("primary index missing"))?;
        detach(primary, primary_key, primary_key);
        Ok(true)
    }
}

fn detach(tree: &mut IndexTree, key: &Key, primary_key: &Key) {
    if let Some(owners) = tree.get_mut(key) {
        owners.remove(primary_key);
        if owners.is_empty() {
            tree.remove(key);
        }
    }
}

fn extract(key_path: &[String], record: &Record) -> Option<Key> {
    match key_path {
        [] => None,
        [field] => record.get(field).cloned(),
        fields => fields
            .iter()
            .map(|field| record.get(field).cloned())
            .collect::<Option<Vec<_>>>()
            .map(Key::Array),
    }
}

fn index_keys(index: &IndexSchema, record: &Record) -> Vec<Key> {
    match extract(&index.key_path, record) {
        None => Vec::new(),
        Some(Key::Array(items)) if index.multi_entry => items
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
        Some(key) => vec![key],
    }
}

fn extractor(key_path: Vec<String>) -> KeyExtractor<Key, Record> {
    Arc::new(move |record: &Record| extract(&key_path, record))
}

/// Reference [`RangeStore`] over ordered in-memory maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<BTreeMap<String, Arc<TableData>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a table.
    pub fn create_table(&self, schema: TableSchema) -> Result<()> {
        schema.validate()?;
        let mut tables = self.tables.write();
        if tables.contains_key(&schema.name) {
            return Err(StoreError::Invalid("table already exists"));
        }
        trace!(table = %schema.name, indexes = schema.indexes.len(), "memory.create_table");
        tables.insert(schema.name.clone(), Arc::new(TableData::new(schema)));
        Ok(())
    }

    /// Inserts or replaces a record whose primary key is part of the record.
    pub fn put(&self, table: &str, record: Record) -> Result<Key> {
        let mut tables = self.tables.write();
        let data = Arc::make_mut(tables.get_mut(table).ok_or(StoreError::NotFound("table"))?);
        if data.schema.is_outbound() {
            return Err(StoreError::Invalid("table expects an explicit primary key"));
        }
        let primary_key = extract(&data.schema.primary_key, &record)
            .ok_or(StoreError::Invalid("record missing primary key"))?;
        data.insert_row(primary_key.clone(), record)?;
        Ok(primary_key)
    }

    /// Inserts or replaces a record under an explicit primary key.
    pub fn put_with_key(&self, table: &str, primary_key: Key, record: Record) -> Result<Key> {
        let mut tables = self.tables.write();
        let data = Arc::make_mut(tables.get_mut(table).ok_or(StoreError::NotFound("table"))?);
        if !data.schema.is_outbound() {
            return Err(StoreError::Invalid("table derives primary keys from records"));
        }
        data.insert_row(primary_key.clone(), record)?;
        Ok(primary_key)
    }

    /// Removes a record, returning whether it existed.
    pub fn delete(&self, table: &str, primary_key: &Key) -> Result<bool> {
        let mut tables = self.tables.write();
        let data = Arc::make_mut(tables.get_mut(table).ok_or(StoreError::NotFound("table"))?);
        data.remove_row(primary_key)
    }

    /// Number of records in `table`.
    pub fn len(&self, table: &str) -> Result<usize> {
        Ok(self.snapshot(table)?.rows.len())
    }

    /// Returns `true` when `table` holds no records.
    pub fn is_empty(&self, table: &str) -> Result<bool> {
        Ok(self.len(table)? == 0)
    }

    fn snapshot(&self, table: &str) -> Result<Arc<TableData>> {
        self.tables
            .read()
            .get(table)
            .cloned()
            .ok_or(StoreError::NotFound("table"))
    }
}

impl RangeStore for MemoryStore {
    type Key = Key;
    type Record = Record;
    type Cursor = MemoryCursor;

    fn get_all(&self, request: &ScanRequest<Key>) -> Result<Items<Key, Record>> {
        let limit = request.limit.unwrap_or(usize::MAX);
        let mut items = Items::empty(request.values);
        if limit == 0 {
            return Ok(items);
        }
        let Some(mut cursor) = self.open_cursor(request)? else {
            return Ok(items);
        };
        while items.len() < limit {
            match cursor.next_entry()? {
                Some(entry) => items.push_entry(entry)?,
                None => break,
            }
        }
        trace!(
            table = %request.table,
            index = %request.index,
            returned = items.len(),
            "memory.get_all"
        );
        Ok(items)
    }

    fn open_cursor(&self, request: &ScanRequest<Key>) -> Result<Option<MemoryCursor>> {
        let table = self.snapshot(&request.table)?;
        table.tree(&request.index)?;
        if request.range.is_empty() {
            return Ok(None);
        }
        let cursor = MemoryCursor::new(table, request);
        if cursor.is_exhausted()? {
            return Ok(None);
        }
        Ok(Some(cursor))
    }

    fn get(&self, table: &str, keys: &[Key]) -> Result<Vec<Option<Record>>> {
        let data = self.snapshot(table)?;
        Ok(keys.iter().map(|key| data.row(key).cloned()).collect())
    }

    fn compare_keys(&self, a: &Key, b: &Key) -> Result<Ordering> {
        Ok(a.cmp(b))
    }

    fn index(&self, table: &str, index: &str) -> Result<IndexMeta<Key, Record>> {
        let data = self.snapshot(table)?;
        if index == PRIMARY_INDEX {
            let key_path = data.schema.primary_key.clone();
            return Ok(IndexMeta {
                name: PRIMARY_INDEX.to_owned(),
                key_length: key_path.len(),
                multi_entry: false,
                unique: true,
                is_primary: true,
                extract_key: extractor(key_path),
            });
        }
        let schema = data
            .schema
            .indexes
            .iter()
            .find(|candidate| candidate.name == index)
            .ok_or(StoreError::NotFound("index"))?;
        Ok(IndexMeta {
            name: schema.name.clone(),
            key_length: schema.key_path.len(),
            multi_entry: schema.multi_entry,
            unique: schema.unique,
            is_primary: false,
            extract_key: extractor(schema.key_path.clone()),
        })
    }
}
