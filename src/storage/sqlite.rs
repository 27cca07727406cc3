//! SQLite-backed storage implementation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rusqlite::fallible_iterator::FallibleIterator;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Batch, Connection, OpenFlags, Statement};
use serde_json::{Number, Value};

use crate::storage::{Opener, QueryOutput, Storage, StorageError};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens `<data_dir>/<name>.db`, creating the directory and file as needed.
#[derive(Debug, Clone)]
pub struct SqliteOpener {
    data_dir: PathBuf,
}

impl SqliteOpener {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Returns the file backing database `name`.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{name}.db"))
    }
}

impl Opener for SqliteOpener {
    type Storage = SqliteStorage;

    fn open(&self, name: &str) -> Result<SqliteStorage, StorageError> {
        std::fs::create_dir_all(&self.data_dir)?;
        SqliteStorage::open(&self.path_for(name))
    }
}

/// A single SQLite connection.
///
/// The connection is only ever used by one thread, so SQLite's own mutexes
/// are disabled.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(Self { conn })
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }
}

impl Storage for SqliteStorage {
    /// Runs every statement in `sql` in order and returns the output of the
    /// last one.
    ///
    /// Each statement takes as many of the remaining `params` as it has
    /// placeholders. Statements that already ran stay applied if a later one
    /// fails.
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<QueryOutput, StorageError> {
        let bound = params
            .iter()
            .map(to_sql_value)
            .collect::<Result<Vec<_>, _>>()?;

        let mut remaining = &bound[..];
        let mut last = QueryOutput::default();
        let mut batch = Batch::new(&self.conn, sql);
        while let Some(mut stmt) = batch.next()? {
            let wanted = stmt.parameter_count();
            if remaining.len() < wanted {
                return Err(StorageError::new(format!(
                    "not enough parameters: statement wants {wanted}, {} left",
                    remaining.len()
                )));
            }
            let (now, rest) = remaining.split_at(wanted);
            remaining = rest;
            last = run_statement(&mut stmt, now)?;
        }

        if !remaining.is_empty() {
            return Err(StorageError::new(format!(
                "too many parameters: {} unused",
                remaining.len()
            )));
        }
        Ok(last)
    }
}

/// Executes one prepared statement and drains its rows.
fn run_statement(
    stmt: &mut Statement<'_>,
    params: &[SqlValue],
) -> Result<QueryOutput, StorageError> {
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(columns.len());
        for idx in 0..columns.len() {
            values.push(from_sql_value(row.get_ref(idx)?));
        }
        out.push(values);
    }

    Ok(QueryOutput {
        columns,
        rows: out,
    })
}

/// Converts a JSON parameter into a bindable SQLite value.
fn to_sql_value(value: &Value) -> Result<SqlValue, StorageError> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(SqlValue::Integer(i)),
            None => n
                .as_f64()
                .map(SqlValue::Real)
                .ok_or_else(|| StorageError::new(format!("unsupported numeric parameter: {n}"))),
        },
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        Value::Array(_) | Value::Object(_) => Err(StorageError::new(format!(
            "unsupported parameter type: {value}"
        ))),
    }
}

/// Converts a SQLite cell into JSON. Blobs become base64 strings.
fn from_sql_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(BASE64.encode(b)),
    }
}
