//! Read-only access to the claims warehouse
//!
//! The rest of the crate only ever talks to the warehouse through
//! [`DataStore::run_query`]: SQL text in, rows out. `SqliteStore` backs it with
//! a local SQLite file; tests substitute their own implementations.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use thiserror::Error;

/// A single cell returned by the warehouse
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view; numeric text is accepted since some drivers return
    /// NUMBER columns as strings
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Real(n) => Some(*n),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Null => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Real(n) if n.fract() == 0.0 => Some(*n as i64),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Real(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Real(n)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// One result row: column names with their values, in select order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, Value)>,
}

impl Row {
    /// Append a column
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.cells.push((column.into(), value.into()));
    }

    /// Builder-style setter; replaces an existing column of the same name
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        match self
            .cells
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
        {
            Some((_, existing)) => *existing = value,
            None => self.cells.push((column.to_string(), value)),
        }
        self
    }

    /// Look up a column by name (case-insensitive, like unquoted SQL identifiers)
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Errors raised by a data store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Warehouse not found at {0}")]
    NotFound(PathBuf),

    #[error("Failed to open warehouse at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Query failed: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("{0}")]
    Unavailable(String),
}

/// The capability every warehouse backend provides
pub trait DataStore: Send + Sync {
    /// Execute a read query and return all rows
    fn run_query(&self, sql: &str) -> Result<Vec<Row>, StoreError>;
}

impl<T: DataStore + ?Sized> DataStore for Arc<T> {
    fn run_query(&self, sql: &str) -> Result<Vec<Row>, StoreError> {
        (**self).run_query(sql)
    }
}

impl<T: DataStore + ?Sized> DataStore for &T {
    fn run_query(&self, sql: &str) -> Result<Vec<Row>, StoreError> {
        (**self).run_query(sql)
    }
}

/// SQLite-backed warehouse, opened read-only
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open an existing warehouse file without write access
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(path = %path.display(), "opened warehouse");

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Wrap an existing connection (e.g. an in-memory database)
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            path: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl DataStore for SqliteStore {
    fn run_query(&self, sql: &str) -> Result<Vec<Row>, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stmt = conn.prepare(sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mapped = stmt.query_map([], |sql_row| {
            let mut row = Row::default();
            for (i, name) in names.iter().enumerate() {
                let value = match sql_row.get_ref(i)? {
                    ValueRef::Null => Value::Null,
                    ValueRef::Integer(n) => Value::Integer(n),
                    ValueRef::Real(n) => Value::Real(n),
                    ValueRef::Text(t) | ValueRef::Blob(t) => {
                        Value::Text(String::from_utf8_lossy(t).into_owned())
                    }
                };
                row.push(name.clone(), value);
            }
            Ok(row)
        })?;

        let rows = mapped.collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(rows = rows.len(), "warehouse query returned");
        Ok(rows)
    }
}
