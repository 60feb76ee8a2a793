//! In-memory tabular data and its delimited-text representation.

use crate::error::ErrorKind;
use crate::persistence::ensure_parent;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// A table of rows sharing one header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl DataTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Index of `name`, or a schema error naming the column.
    pub fn require_column(&self, name: &str) -> Result<usize, ErrorKind> {
        self.column_index(name)
            .ok_or_else(|| ErrorKind::schema(format!("column `{name}` not found in table")))
    }

    /// All values of one column, in row order. Short rows read as `Null`.
    pub fn column_values(&self, name: &str) -> Result<Vec<&Value>, ErrorKind> {
        let idx = self.require_column(name)?;
        Ok(self
            .rows
            .iter()
            .map(|row| row.get(idx).unwrap_or(&Value::Null))
            .collect())
    }

    /// Remove a column if present. Returns whether it existed.
    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        self.columns.remove(idx);
        for row in &mut self.rows {
            if idx < row.len() {
                row.remove(idx);
            }
        }
        true
    }

    /// Replace every string cell equal to `token` with `Null`. Returns the count.
    pub fn replace_token_with_null(&mut self, token: &str) -> usize {
        let mut replaced = 0;
        for cell in self.rows.iter_mut().flat_map(|row| row.iter_mut()) {
            if matches!(cell, Value::String(s) if s == token) {
                *cell = Value::Null;
                replaced += 1;
            }
        }
        replaced
    }

    /// New table holding the rows at `indices`, in that order.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }

    /// Read a CSV file with a header row.
    pub fn read_csv(path: &Path) -> Result<Self, ErrorKind> {
        let file = std::fs::File::open(path).map_err(|e| ErrorKind::io(path, e))?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(parse_cell).collect());
        }
        Ok(Self { columns, rows })
    }

    /// Write the table as CSV with a header row.
    pub fn write_csv(&self, path: &Path) -> Result<(), ErrorKind> {
        ensure_parent(path)?;
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(render_cell))?;
        }
        writer.flush().map_err(|e| ErrorKind::io(path, e))?;
        Ok(())
    }
}

/// Interpret a raw text cell: empty is null, then integer, float, string.
pub fn parse_cell(raw: &str) -> Value {
    let s = raw.trim();
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    Value::String(s.to_string())
}

/// Render a cell for delimited text output.
pub fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Numeric view of a cell. Numeric strings are accepted; null is `None`.
pub fn as_f64(value: &Value) -> Result<Option<f64>, ErrorKind> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        Value::Bool(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ErrorKind::invalid_data(format!("`{s}` is not numeric"))),
        other => Err(ErrorKind::invalid_data(format!("`{other}` is not numeric"))),
    }
}

/// Categorical view of a cell. Null is `None`.
pub fn as_category(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(render_cell(other)),
    }
}
