//! Document stores the raw loan records are exported from.

use crate::config::StoreConfig;
use crate::data::table::DataTable;
use crate::error::ErrorKind;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;

/// A single raw record.
pub type Document = Map<String, Value>;

/// Read access to a collection-oriented document store.
pub trait DocumentStore: Send + Sync {
    /// Fetch every document of `collection`.
    fn fetch_all(&self, collection: &str) -> Result<Vec<Document>, ErrorKind>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// Build the store selected in configuration.
pub fn open_store(config: &StoreConfig) -> Box<dyn DocumentStore> {
    match config {
        StoreConfig::Jsonl { root } => Box::new(JsonlDocumentStore::new(root.clone())),
        StoreConfig::Sqlite { db_path } => Box::new(SqliteDocumentStore::new(db_path.clone())),
    }
}

/// Flatten documents into a table. Columns appear in first-seen order; a
/// document lacking a field contributes `Null`.
pub fn documents_to_table(documents: &[Document]) -> DataTable {
    let mut columns: Vec<String> = Vec::new();
    for doc in documents {
        for key in doc.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = documents
        .iter()
        .map(|doc| {
            columns
                .iter()
                .map(|col| doc.get(col).cloned().unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    DataTable::new(columns, rows)
}

// ---------------------------------------------------------------------------
// JsonlDocumentStore
// ---------------------------------------------------------------------------

/// Directory of `<collection>.jsonl` (one object per line) or
/// `<collection>.json` (array of objects) files.
pub struct JsonlDocumentStore {
    root: PathBuf,
}

impl JsonlDocumentStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl DocumentStore for JsonlDocumentStore {
    fn fetch_all(&self, collection: &str) -> Result<Vec<Document>, ErrorKind> {
        let jsonl = self.root.join(format!("{collection}.jsonl"));
        if jsonl.exists() {
            let content = std::fs::read_to_string(&jsonl).map_err(|e| ErrorKind::io(&jsonl, e))?;
            let mut documents = Vec::new();
            for (lineno, line) in content.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<Value>(line)? {
                    Value::Object(doc) => documents.push(doc),
                    _ => {
                        return Err(ErrorKind::store(format!(
                            "{}:{}: expected a JSON object",
                            jsonl.display(),
                            lineno + 1
                        )));
                    }
                }
            }
            return Ok(documents);
        }

        let json = self.root.join(format!("{collection}.json"));
        if json.exists() {
            let content = std::fs::read_to_string(&json).map_err(|e| ErrorKind::io(&json, e))?;
            return match serde_json::from_str::<Value>(&content)? {
                Value::Array(items) => items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(doc) => Ok(doc),
                        _ => Err(ErrorKind::store(format!(
                            "{}: every array element must be an object",
                            json.display()
                        ))),
                    })
                    .collect(),
                _ => Err(ErrorKind::store(format!(
                    "{}: expected an array of objects",
                    json.display()
                ))),
            };
        }

        Err(ErrorKind::store(format!(
            "collection `{collection}` not found under {}",
            self.root.display()
        )))
    }

    fn describe(&self) -> String {
        format!("jsonl:{}", self.root.display())
    }
}

// ---------------------------------------------------------------------------
// SqliteDocumentStore
// ---------------------------------------------------------------------------

/// SQLite database where each collection is a table and each row a document.
pub struct SqliteDocumentStore {
    db_path: PathBuf,
}

impl SqliteDocumentStore {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn fetch_all(&self, collection: &str) -> Result<Vec<Document>, ErrorKind> {
        if !self.db_path.exists() {
            return Err(ErrorKind::store(format!(
                "database {} does not exist",
                self.db_path.display()
            )));
        }
        let conn = rusqlite::Connection::open_with_flags(
            &self.db_path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        )?;
        let query = format!("SELECT * FROM \"{}\"", collection.replace('"', "\"\""));
        let mut stmt = conn.prepare(&query)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut documents = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut doc = Document::new();
            for (i, col) in columns.iter().enumerate() {
                let value = match row.get_ref(i)? {
                    rusqlite::types::ValueRef::Null => Value::Null,
                    rusqlite::types::ValueRef::Integer(n) => Value::from(n),
                    rusqlite::types::ValueRef::Real(f) => serde_json::Number::from_f64(f)
                        .map(Value::Number)
                        .unwrap_or(Value::Null),
                    rusqlite::types::ValueRef::Text(t) => {
                        Value::String(String::from_utf8_lossy(t).into_owned())
                    }
                    rusqlite::types::ValueRef::Blob(_) => {
                        return Err(ErrorKind::store(format!(
                            "column `{col}` of `{collection}` holds a blob"
                        )));
                    }
                };
                doc.insert(col.clone(), value);
            }
            documents.push(doc);
        }
        Ok(documents)
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.db_path.display())
    }
}

// ---------------------------------------------------------------------------
// InMemoryDocumentStore
// ---------------------------------------------------------------------------

/// Collections held in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryDocumentStore {
    collections: HashMap<String, Vec<Document>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, collection: &str, documents: Vec<Document>) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .extend(documents);
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn fetch_all(&self, collection: &str) -> Result<Vec<Document>, ErrorKind> {
        self.collections
            .get(collection)
            .cloned()
            .ok_or_else(|| ErrorKind::store(format!("collection `{collection}` not found")))
    }

    fn describe(&self) -> String {
        format!("memory:{} collections", self.collections.len())
    }
}
