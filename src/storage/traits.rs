//! Storage trait definitions.

use serde_json::Value;

use crate::storage::StorageError;

/// The materialized result of one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutput {
    /// Column names in the order the engine reports them.
    pub columns: Vec<String>,
    /// Row values, positionally aligned with `columns`.
    pub rows: Vec<Vec<Value>>,
}

/// One open handle to a database.
///
/// Implementations are blocking and are driven from a dedicated worker
/// thread, so they need `Send` but never `Sync`: exactly one thread uses a
/// handle for its whole life.
pub trait Storage: Send + 'static {
    /// Runs `sql` with positional `params` and returns every result row.
    ///
    /// Statements that produce no result set return empty columns and rows.
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<QueryOutput, StorageError>;
}

/// Opens storage handles by database name.
///
/// # Thread Safety
///
/// `open` is called from the new database's worker thread, so openers are
/// shared across threads.
pub trait Opener: Send + Sync + 'static {
    type Storage: Storage;

    /// Opens (creating if needed) the database called `name`.
    fn open(&self, name: &str) -> Result<Self::Storage, StorageError>;
}
